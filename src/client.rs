// src/client.rs

use crate::{config::AppConfig, error::*};
use anyhow::anyhow;
use log::{debug, warn};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use reqwest::{IntoUrl, Method, Response, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;

/// 路径段中需要转义的字符，保证参数不会改变请求路径
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Clone)]
pub struct RobustClient {
    pub client: ClientWithMiddleware,
    /// 不带重试中间件，用于只发送一次的写请求
    single_shot: ClientWithMiddleware,
    config: Arc<AppConfig>,
    token: Option<String>,
}

impl RobustClient {
    pub fn new(config: Arc<AppConfig>) -> AppResult<Self> {
        let retry_policy =
            ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let inner = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .build()?;
        let client = ClientBuilder::new(inner.clone())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();
        let single_shot = ClientBuilder::new(inner).build();

        Ok(Self {
            client,
            single_shot,
            config,
            token: None,
        })
    }

    /// 之后的所有请求都带上 Bearer Token
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    fn request<T: IntoUrl>(&self, method: Method, url: T) -> RequestBuilder {
        self.authorize(self.client.request(method, url))
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn check_status(url: &str, res: Response) -> AppResult<Response> {
        match res.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AppError::TokenInvalid),
            StatusCode::NOT_FOUND => Err(AppError::NotFound(url.to_string())),
            _ => Ok(res.error_for_status()?),
        }
    }

    pub async fn get(&self, url: &str) -> AppResult<Response> {
        let res = self.request(Method::GET, url).send().await?;
        Self::check_status(url, res)
    }

    /// 只发送一次，不经过重试中间件
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> AppResult<Response> {
        let res = self
            .authorize(self.single_shot.request(Method::POST, url))
            .json(body)
            .send()
            .await?;
        Self::check_status(url, res)
    }

    /// 用参数替换模板中的占位符，按配置的后端地址依次生成候选 URL。
    /// 参数按路径段转义，`{base}` 原样替换。
    pub fn expand_urls(&self, url_template: &str, params: &[(&str, &str)]) -> Vec<String> {
        let mut path = url_template.to_string();
        for (key, val) in params {
            let encoded = utf8_percent_encode(val, PATH_SEGMENT).to_string();
            path = path.replace(&format!("{{{}}}", key), &encoded);
        }
        self.config
            .api_bases
            .iter()
            .map(|base| path.replace("{base}", base))
            .collect()
    }

    /// 认证失败和资源不存在对所有后端都一样，不再尝试其他地址
    fn is_final(err: &AppError) -> bool {
        matches!(err, AppError::TokenInvalid | AppError::NotFound(_))
    }

    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        url_template: &str,
        params: &[(&str, &str)],
    ) -> AppResult<T> {
        let mut last_error = None;
        for url in self.expand_urls(url_template, params) {
            match self.get(&url).await {
                Ok(res) => {
                    let bytes = res.bytes().await?;
                    debug!("从 '{}' 获取到 {} 字节", url, bytes.len());
                    return serde_json::from_slice(&bytes)
                        .map_err(|source| AppError::ApiParseFailed { url, source });
                }
                Err(e) if Self::is_final(&e) => return Err(e),
                Err(e) => {
                    // 暂时性错误只记录日志，继续尝试下一个后端
                    warn!("后端 '{}' 请求失败: {:?}", url, e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or(AppError::Other(anyhow!("所有后端均请求失败"))))
    }

    /// 写请求只发往第一个后端，失败直接返回，由调用方记录
    pub async fn send_json<B: Serialize + ?Sized>(
        &self,
        url_template: &str,
        params: &[(&str, &str)],
        body: &B,
    ) -> AppResult<()> {
        let url = self
            .expand_urls(url_template, params)
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Other(anyhow!("未配置后端地址")))?;
        self.post_json(&url, body).await?;
        Ok(())
    }
}
