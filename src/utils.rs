// src/utils.rs

use regex::Regex;
use std::sync::LazyLock;

static CLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:(\d+):)?(\d{1,2}):(\d{1,2}(?:\.\d+)?)$").unwrap());

/// 解析时间，支持纯秒数 (`90`, `90.5`) 与 `mm:ss` / `hh:mm:ss`
pub fn parse_time(text: &str) -> Option<f64> {
    let text = text.trim();
    if let Some(caps) = CLOCK_RE.captures(text) {
        let hours: f64 = caps.get(1).map_or(Ok(0.0), |m| m.as_str().parse()).ok()?;
        let minutes: f64 = caps[2].parse().ok()?;
        let seconds: f64 = caps[3].parse().ok()?;
        if seconds >= 60.0 || (caps.get(1).is_some() && minutes >= 60.0) {
            return None;
        }
        return Some(hours * 3600.0 + minutes * 60.0 + seconds);
    }
    text.parse::<f64>().ok().filter(|t| t.is_finite() && *t >= 0.0)
}

/// 以 `m:ss` 或 `h:mm:ss` 格式显示秒数
pub fn format_duration(secs: f64) -> String {
    if !secs.is_finite() || secs <= 0.0 {
        return "0:00".to_string();
    }
    let total = secs.round() as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

pub fn truncate_text(text: &str, max_width: usize) -> String {
    let mut width = 0;
    let mut end_pos = 0;
    for (i, c) in text.char_indices() {
        width += if c.is_ascii() { 1 } else { 2 };
        if width > max_width.saturating_sub(3) {
            end_pos = i;
            break;
        }
    }
    if end_pos == 0 { text.to_string() } else { format!("{}...", &text[..end_pos]) }
}

/// 文本进度条，宽度以字符计
pub fn progress_bar(percent: f64, width: usize) -> String {
    let ratio = if percent.is_finite() { (percent / 100.0).clamp(0.0, 1.0) } else { 0.0 };
    let filled = (ratio * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("90"), Some(90.0));
        assert_eq!(parse_time(" 90.5 "), Some(90.5));
        assert_eq!(parse_time("1:30"), Some(90.0));
        assert_eq!(parse_time("01:02:03"), Some(3723.0));
        assert_eq!(parse_time("0:05.5"), Some(5.5));

        // 非法输入
        assert_eq!(parse_time("1:75"), None);
        assert_eq!(parse_time("1:60:00"), None);
        assert_eq!(parse_time("-3"), None);
        assert_eq!(parse_time("NaN"), None);
        assert_eq!(parse_time("abc"), None);
        assert_eq!(parse_time(""), None);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "0:00");
        assert_eq!(format_duration(59.6), "1:00");
        assert_eq!(format_duration(125.0), "2:05");
        assert_eq!(format_duration(3723.0), "1:02:03");
        assert_eq!(format_duration(f64::NAN), "0:00");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("abcdefghijklmnop", 10), "abcdefg...");
        // 中文按双倍宽度计算
        assert_eq!(truncate_text("一二三四五六", 8), "一二...");
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(50.0, 10), "█████░░░░░");
        assert_eq!(progress_bar(150.0, 4), "████");
        assert_eq!(progress_bar(f64::NAN, 4), "░░░░");
    }
}
