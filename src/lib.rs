// src/lib.rs

pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod models;
pub mod player;
pub mod symbols;
pub mod tracker;
pub mod ui;
pub mod utils;
pub mod workflows;

use crate::{
    api::CourseApi,
    cli::Cli,
    client::RobustClient,
    config::{AppConfig, ExternalConfig, token},
    error::AppResult,
};
use log::{debug, info};
use std::sync::{Arc, atomic::AtomicBool};

/// 一次课程学习会话所需的共享状态
#[derive(Clone)]
pub struct SessionContext {
    pub config: Arc<AppConfig>,
    pub api: Arc<CourseApi>,
    pub args: Arc<Cli>,
    pub cancellation_token: Arc<AtomicBool>,
}

/// 库的公共入口点，由 `main.rs` 调用
pub async fn run_from_cli(args: Arc<Cli>, cancellation_token: Arc<AtomicBool>) -> AppResult<()> {
    debug!("CLI 参数: {:?}", args);

    let external_config = ExternalConfig::load_or_create(&config::config_path()?)?;
    let config = Arc::new(AppConfig::new(&args, &external_config)?);
    debug!("加载的应用配置: {:?}", config);

    let token = match token::resolve_token(
        args.token.as_deref(),
        std::env::var(token::TOKEN_ENV_VAR).ok(),
        &external_config,
    ) {
        Some((token, source)) => {
            info!("从{}加载 Access Token", source);
            Some(token)
        }
        None => {
            info!("未找到 Access Token，以匿名方式访问后端");
            None
        }
    };

    let http_client = Arc::new(RobustClient::new(config.clone())?.with_token(token));
    let api = Arc::new(CourseApi::new(http_client, config.clone()));

    let context = SessionContext {
        config,
        api,
        args: args.clone(),
        cancellation_token,
    };

    if args.interactive {
        workflows::run_interactive(context).await
    } else if let Some(replay_file) = &args.replay {
        workflows::run_replay(replay_file, context).await
    } else {
        workflows::run_outline(context).await
    }
}
