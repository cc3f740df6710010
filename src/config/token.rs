// src/config/token.rs

use crate::config::ExternalConfig;
use log::debug;
use std::fmt;

/// 读取 Token 的环境变量名
pub const TOKEN_ENV_VAR: &str = "ACCESS_TOKEN";

/// Access Token 的来源，按优先级从高到低排列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    CommandLine,
    Environment,
    ConfigFile,
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TokenSource::CommandLine => "命令行参数",
            TokenSource::Environment => "环境变量 (ACCESS_TOKEN)",
            TokenSource::ConfigFile => "本地配置文件",
        };
        f.write_str(label)
    }
}

/// 按 命令行 > 环境变量 > 配置文件 的顺序选出第一个非空 Token。
/// 配置文件由调用方加载一次后传入。
pub fn resolve_token(
    cli_token: Option<&str>,
    env_token: Option<String>,
    external: &ExternalConfig,
) -> Option<(String, TokenSource)> {
    let candidates = [
        (cli_token.map(str::to_string), TokenSource::CommandLine),
        (env_token, TokenSource::Environment),
        (external.accesstoken.clone(), TokenSource::ConfigFile),
    ];
    let found = candidates.into_iter().find_map(|(token, source)| {
        token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .map(|t| (t, source))
    });
    match &found {
        Some((_, source)) => debug!("使用来自{}的 Token", source),
        None => debug!("未在任何位置找到可用的 Token"),
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_token(token: Option<&str>) -> ExternalConfig {
        ExternalConfig {
            accesstoken: token.map(str::to_string),
            ..ExternalConfig::default_app_config()
        }
    }

    #[test]
    fn test_command_line_token_wins() {
        let external = config_with_token(Some("from-file"));
        let (token, source) =
            resolve_token(Some("from-cli"), Some("from-env".into()), &external).unwrap();
        assert_eq!(token, "from-cli");
        assert_eq!(source, TokenSource::CommandLine);
    }

    #[test]
    fn test_blank_values_fall_through() {
        let external = config_with_token(Some("from-file"));
        let (token, source) = resolve_token(Some(""), Some("   ".into()), &external).unwrap();
        assert_eq!(token, "from-file");
        assert_eq!(source, TokenSource::ConfigFile);

        let (_, source) = resolve_token(None, Some("from-env".into()), &external).unwrap();
        assert_eq!(source, TokenSource::Environment);
    }

    #[test]
    fn test_no_token_anywhere() {
        assert!(resolve_token(None, None, &config_with_token(None)).is_none());
    }
}
