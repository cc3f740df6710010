// src/config.rs

pub mod token;

use crate::{
    cli::Cli,
    constants::{self, api::templates},
    error::{AppError, AppResult},
};
use anyhow::{Context, anyhow};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NetworkConfig {
    pub api_bases: Option<Vec<String>>,
    pub connect_timeout_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlayerConfig {
    pub seek_slack_secs: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accesstoken: Option<String>,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub url_templates: HashMap<String, String>,
    #[serde(default)]
    pub player: PlayerConfig,
}

impl ExternalConfig {
    pub(crate) fn default_app_config() -> Self {
        let url_templates = HashMap::from([
            (
                templates::COURSE_STRUCTURE.into(),
                "{base}/api/courses/{course_id}/structure".into(),
            ),
            (
                templates::PROGRESS_UPDATE.into(),
                "{base}/api/lectures/{lecture_id}/progress".into(),
            ),
        ]);

        // 为 NetworkConfig 提供一组稳健的默认值
        let network_config = NetworkConfig {
            api_bases: Some(vec!["http://127.0.0.1:8000".into()]),
            connect_timeout_secs: Some(10),
            timeout_secs: Some(30),
            max_retries: Some(3),
        };

        Self {
            accesstoken: None,
            network: network_config,
            url_templates,
            player: PlayerConfig {
                seek_slack_secs: Some(constants::DEFAULT_SEEK_SLACK_SECS),
            },
        }
    }

    /// 读取配置文件；文件不存在时写入一份默认配置。
    /// 读到的配置会经过 `normalize` 补齐和校验。
    pub fn load_or_create(path: &Path) -> AppResult<Self> {
        if path.is_file() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("读取配置文件 '{}' 失败", path.display()))?;
            let parsed: Self = serde_json::from_str(&content)
                .with_context(|| format!("解析配置文件 '{}' 失败", path.display()))?;
            Ok(parsed.normalize())
        } else {
            info!("配置文件 {:?} 不存在，将创建默认配置。", path);
            let config = Self::default_app_config();
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)?;
            }
            fs::write(path, serde_json::to_string_pretty(&config)?)?;
            Ok(config)
        }
    }

    /// 缺失的 URL 模板用默认值补齐；不含 `{base}` 的模板无法切换后端，丢弃并回退默认值。
    /// 非法的拖动容差被忽略。
    fn normalize(mut self) -> Self {
        let defaults = Self::default_app_config();
        for (key, default_template) in defaults.url_templates {
            let usable = self
                .url_templates
                .get(&key)
                .is_some_and(|t| t.contains("{base}"));
            if !usable {
                if self.url_templates.contains_key(&key) {
                    warn!("URL 模板 '{}' 缺少 {{base}} 占位符，使用默认模板", key);
                }
                self.url_templates.insert(key, default_template);
            }
        }
        if let Some(slack) = self.player.seek_slack_secs
            && !(slack.is_finite() && slack >= 0.0)
        {
            warn!("配置中的拖动容差 {} 无效，使用默认值", slack);
            self.player.seek_slack_secs = None;
        }
        self
    }
}

/// `~/.lecture-progress/config.json`
pub fn config_path() -> AppResult<PathBuf> {
    let path = dirs::home_dir()
        .ok_or_else(|| AppError::Other(anyhow!("无法获取用户主目录")))?
        .join(constants::CONFIG_DIR_NAME)
        .join(constants::CONFIG_FILE_NAME);
    Ok(path)
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_bases: Vec<String>,
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub max_retries: u32,
    pub url_templates: HashMap<String, String>,
    pub seek_slack: f64,
}

impl AppConfig {
    /// 合并命令行参数与已加载的配置文件，命令行优先
    pub fn new(args: &Cli, external_config: &ExternalConfig) -> AppResult<Self> {
        let external_config = external_config.clone();

        let api_bases = match &args.api_base {
            Some(base) => vec![base.clone()],
            None => external_config.network.api_bases.unwrap_or_default(),
        };
        // 只校验格式，末尾的 '/' 去掉以便拼接模板
        let api_bases = api_bases
            .into_iter()
            .map(|base| {
                url::Url::parse(&base)?;
                Ok(base.trim_end_matches('/').to_string())
            })
            .collect::<AppResult<Vec<_>>>()?;
        if api_bases.is_empty() {
            return Err(AppError::UserInputError(
                "未配置后端地址，请使用 --api-base 指定".to_string(),
            ));
        }

        let url_templates = external_config.url_templates;

        let seek_slack = args
            .seek_slack
            .or(external_config.player.seek_slack_secs)
            .filter(|s| s.is_finite() && *s >= 0.0)
            .unwrap_or(constants::DEFAULT_SEEK_SLACK_SECS);

        Ok(Self {
            api_bases,
            user_agent: constants::USER_AGENT.into(),
            connect_timeout: Duration::from_secs(
                external_config.network.connect_timeout_secs.unwrap_or(10),
            ),
            timeout: Duration::from_secs(external_config.network.timeout_secs.unwrap_or(30)),
            max_retries: external_config.network.max_retries.unwrap_or(3),
            url_templates,
            seek_slack,
        })
    }

    pub fn template(&self, key: &str) -> AppResult<&str> {
        self.url_templates
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| AppError::Other(anyhow::anyhow!("缺少 URL 模板 '{}'", key)))
    }
}

#[cfg(feature = "testing")]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_bases: vec!["http://127.0.0.1:8000".to_string()],
            user_agent: "test-agent/1.0".to_string(),
            connect_timeout: Duration::from_secs(5),
            timeout: Duration::from_secs(15),
            max_retries: 3,
            url_templates: ExternalConfig::default_app_config().url_templates,
            seek_slack: constants::DEFAULT_SEEK_SLACK_SECS,
        }
    }
}
