// src/player.rs

//! 播放器事件。交互模式与回放文件都使用同一套一行一事件的语法：
//!
//! ```text
//! open <lecture_id>
//! time <t> [duration]
//! seek <t>
//! ended
//! viewed
//! status
//! ```

use crate::{error::AppError, utils};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    Open(String),
    TimeUpdate { current_time: f64, duration: Option<f64> },
    Seeking(f64),
    Ended,
    Viewed,
    Status,
}

fn parse_time_arg(keyword: &str, arg: Option<&str>) -> Result<f64, AppError> {
    let arg = arg.ok_or_else(|| AppError::UserInputError(format!("'{}' 缺少时间参数", keyword)))?;
    utils::parse_time(arg)
        .ok_or_else(|| AppError::UserInputError(format!("无法识别的时间 '{}'", arg)))
}

impl FromStr for PlayerEvent {
    type Err = AppError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let keyword = parts
            .next()
            .ok_or_else(|| AppError::UserInputError("空的事件".to_string()))?
            .to_lowercase();

        let event = match keyword.as_str() {
            "open" => {
                let id = parts
                    .next()
                    .ok_or_else(|| AppError::UserInputError("'open' 缺少课时 ID".to_string()))?;
                PlayerEvent::Open(id.to_string())
            }
            "time" => {
                let current_time = parse_time_arg("time", parts.next())?;
                let duration = match parts.next() {
                    Some(d) => Some(parse_time_arg("time", Some(d))?),
                    None => None,
                };
                PlayerEvent::TimeUpdate { current_time, duration }
            }
            "seek" => PlayerEvent::Seeking(parse_time_arg("seek", parts.next())?),
            "ended" => PlayerEvent::Ended,
            "viewed" => PlayerEvent::Viewed,
            "status" => PlayerEvent::Status,
            other => {
                return Err(AppError::UserInputError(format!("未知的事件 '{}'", other)));
            }
        };

        if let Some(extra) = parts.next() {
            return Err(AppError::UserInputError(format!("多余的参数 '{}'", extra)));
        }
        Ok(event)
    }
}

/// 从回放文件内容中解析事件，忽略空行和 `#` 注释。
/// 返回 (行号, 原始行, 解析结果)。
pub fn parse_script(content: &str) -> Vec<(usize, &str, Result<PlayerEvent, AppError>)> {
    content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.split('#').next().unwrap_or("").trim()))
        .filter(|(_, line)| !line.is_empty())
        .map(|(n, line)| (n, line, line.parse()))
        .collect()
}
