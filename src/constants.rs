// src/constants.rs

pub const UI_WIDTH: usize = 88;
pub const TITLE_TRUNCATE_LENGTH: usize = 60;
pub const CONFIG_DIR_NAME: &str = concat!(".", clap::crate_name!());
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const LOG_FILE_NAME: &str = concat!(clap::crate_name!(), ".log");
pub const LOG_FALLBACK_FILE_NAME: &str = "fallback.log";
pub const USER_AGENT: &str = concat!(clap::crate_name!(), "/", clap::crate_version!());

/// 默认的拖动容差 (秒)，用于容忍缓冲和取整带来的微小偏差
pub const DEFAULT_SEEK_SLACK_SECS: f64 = 5.0;
/// 播放进度达到该百分比时视为看完
pub const COMPLETION_PERCENT: f64 = 100.0;

pub mod api {
    pub mod templates {
        pub const COURSE_STRUCTURE: &str = "COURSE_STRUCTURE";
        pub const PROGRESS_UPDATE: &str = "PROGRESS_UPDATE";
    }
    pub mod content_types {
        pub const VIDEO: &str = "video";
        pub const DOCUMENT: &str = "document";
        pub const PDF: &str = "pdf";
    }
}
