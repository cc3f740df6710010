// src/models/mod.rs

pub mod api;

use crate::error::AppError;
use crate::symbols;
use chrono::{DateTime, Local};
use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};

/// 课时内容。`content_type` 字符串只在数据获取边界处校验一次。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LectureContent {
    Video { url: String },
    Document { url: String },
}

impl LectureContent {
    pub fn url(&self) -> &str {
        match self {
            LectureContent::Video { url } | LectureContent::Document { url } => url,
        }
    }

    pub fn is_video(&self) -> bool {
        matches!(self, LectureContent::Video { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            LectureContent::Video { .. } => "视频",
            LectureContent::Document { .. } => "文档",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lecture {
    pub id: String,
    pub title: String,
    pub content: LectureContent,
    /// 时长 (秒)，文档类课时通常为 0
    pub duration: f64,
    pub watched: bool,
    pub position: u32,
    /// 后端记录的上次观看位置，用于续播
    pub last_watched_time: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub id: String,
    pub title: String,
    /// 已按 `position` 排序，顺序即解锁链
    pub lectures: Vec<Lecture>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub sections: Vec<Section>,
}

impl Course {
    /// 按章节顺序、再按课时顺序展开的全部课时
    pub fn lectures(&self) -> impl Iterator<Item = &Lecture> {
        self.sections.iter().flat_map(|s| s.lectures.iter())
    }

    pub fn lectures_mut(&mut self) -> impl Iterator<Item = &mut Lecture> {
        self.sections.iter_mut().flat_map(|s| s.lectures.iter_mut())
    }

    /// 查找课时及其所属章节
    pub fn locate(&self, lecture_id: &str) -> Option<(&Lecture, &Section)> {
        self.sections.iter().find_map(|section| {
            section
                .lectures
                .iter()
                .find(|l| l.id == lecture_id)
                .map(|lecture| (lecture, section))
        })
    }

    pub fn lecture_mut(&mut self, lecture_id: &str) -> Option<&mut Lecture> {
        self.lectures_mut().find(|l| l.id == lecture_id)
    }

    pub fn summary(&self) -> CourseSummary {
        let total = self.lectures().count();
        let completed = self.lectures().filter(|l| l.watched).count();
        let percent = if total == 0 {
            0.0
        } else {
            completed as f64 / total as f64 * 100.0
        };
        CourseSummary {
            completed,
            total,
            percent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CourseSummary {
    pub completed: usize,
    pub total: usize,
    pub percent: f64,
}

impl CourseSummary {
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

/// 单个课时在当前会话中的播放状态，不做持久化
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackState {
    pub current_time: f64,
    /// 用户通过正常播放合法到达的最远位置，只增不减
    pub last_confirmed_time: f64,
    pub progress_percent: f64,
    pub started: bool,
    /// 播放器最近一次上报的有效时长，0 表示尚未上报
    pub duration: f64,
}

impl PlaybackState {
    /// 从后端记录的续播位置恢复
    pub fn resume_from(last_watched_time: f64) -> Self {
        let t = if last_watched_time.is_finite() && last_watched_time > 0.0 {
            last_watched_time
        } else {
            0.0
        };
        Self {
            current_time: t,
            last_confirmed_time: t,
            ..Default::default()
        }
    }

    /// 播放器上报过时长时以其为准，否则使用后端记录的时长
    pub fn effective_duration(&self, fallback: f64) -> f64 {
        if self.duration > 0.0 {
            self.duration
        } else {
            fallback
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LectureState {
    Locked,
    NotStarted,
    InProgress,
    Watched,
}

impl LectureState {
    pub fn get_display_info(
        &self,
    ) -> (
        &'static ColoredString,
        fn(ColoredString) -> ColoredString,
        &'static str,
    ) {
        match self {
            LectureState::Watched => (&symbols::OK, |s| s.green(), "已学完"),
            LectureState::InProgress => (&symbols::PLAYING, |s| s.cyan(), "学习中"),
            LectureState::NotStarted => (&symbols::OPEN, |s| s.normal(), "未开始"),
            LectureState::Locked => (&symbols::LOCKED, |s| s.dimmed(), "未解锁"),
        }
    }
}

/// 推送到后端进度接口的请求体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub lecture_id: String,
    pub progress_percent: f64,
    pub last_watched_time: f64,
    pub watched: bool,
    pub updated_at: DateTime<Local>,
}

impl ProgressUpdate {
    pub fn new(lecture_id: &str, state: &PlaybackState, watched: bool) -> Self {
        Self {
            lecture_id: lecture_id.to_string(),
            progress_percent: state.progress_percent,
            last_watched_time: state.last_confirmed_time,
            watched,
            updated_at: Local::now(),
        }
    }
}

/// 后端调用失败的分类，调用方据此统一处理
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SyncStatus {
    TokenError,
    NotFound,
    HttpError,
    NetworkError,
    ConnectionError,
    TimeoutError,
    DecodeError,
    UnexpectedError,
}

impl SyncStatus {
    pub fn get_display_info(
        &self,
    ) -> (
        &'static ColoredString,
        fn(ColoredString) -> ColoredString,
        &'static str,
    ) {
        match self {
            SyncStatus::TokenError => (&symbols::ERROR, |s| s.red(), "认证失败 (Token无效)"),
            SyncStatus::NotFound => (&symbols::WARN, |s| s.yellow(), "资源不存在 (链接或ID错误)"),
            SyncStatus::HttpError => (&symbols::ERROR, |s| s.red(), "服务器返回错误"),
            SyncStatus::NetworkError => (&symbols::ERROR, |s| s.red(), "网络请求失败"),
            SyncStatus::ConnectionError => (&symbols::ERROR, |s| s.red(), "无法建立连接"),
            SyncStatus::TimeoutError => (&symbols::WARN, |s| s.yellow(), "网络连接超时"),
            SyncStatus::DecodeError => (&symbols::ERROR, |s| s.red(), "服务器响应格式无效"),
            SyncStatus::UnexpectedError => {
                (&symbols::ERROR, |s| s.red(), "发生未预期的程序错误")
            }
        }
    }
}

impl From<&AppError> for SyncStatus {
    fn from(error: &AppError) -> Self {
        match error {
            AppError::TokenInvalid => SyncStatus::TokenError,
            AppError::NotFound(_) => SyncStatus::NotFound,
            AppError::Network(err)
            | AppError::NetworkMiddleware(reqwest_middleware::Error::Reqwest(err)) => {
                if err.is_timeout() {
                    SyncStatus::TimeoutError
                } else if err.is_connect() {
                    SyncStatus::ConnectionError
                } else if err.is_status() {
                    SyncStatus::HttpError
                } else if err.is_decode() {
                    SyncStatus::DecodeError
                } else {
                    SyncStatus::NetworkError
                }
            }
            AppError::NetworkMiddleware(_) => SyncStatus::NetworkError,
            AppError::ApiParseFailed { .. }
            | AppError::Json(_)
            | AppError::InvalidCourseData(_) => SyncStatus::DecodeError,
            _ => SyncStatus::UnexpectedError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lecture(id: &str, watched: bool) -> Lecture {
        Lecture {
            id: id.to_string(),
            title: id.to_uppercase(),
            content: LectureContent::Video {
                url: format!("https://cdn.example.com/{}.mp4", id),
            },
            duration: 120.0,
            watched,
            position: 0,
            last_watched_time: 0.0,
        }
    }

    #[test]
    fn test_course_summary_counts_watched_lectures() {
        let course = Course {
            id: "c1".into(),
            title: "课程".into(),
            sections: vec![
                Section {
                    id: "s1".into(),
                    title: "第一章".into(),
                    lectures: vec![lecture("a", true), lecture("b", false)],
                },
                Section {
                    id: "s2".into(),
                    title: "第二章".into(),
                    lectures: vec![lecture("c", true), lecture("d", false)],
                },
            ],
        };
        let summary = course.summary();
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.percent, 50.0);
        assert!(!summary.is_complete());

        // 空课程不算完成
        let empty = Course {
            id: "c2".into(),
            title: "空".into(),
            sections: vec![],
        };
        assert!(!empty.summary().is_complete());
    }

    #[test]
    fn test_locate_returns_owning_section() {
        let course = Course {
            id: "c1".into(),
            title: "课程".into(),
            sections: vec![
                Section {
                    id: "s1".into(),
                    title: "第一章".into(),
                    lectures: vec![lecture("a", false)],
                },
                Section {
                    id: "s2".into(),
                    title: "第二章".into(),
                    lectures: vec![lecture("b", false)],
                },
            ],
        };
        let (found, section) = course.locate("b").unwrap();
        assert_eq!(found.id, "b");
        assert_eq!(section.id, "s2");
        assert!(course.locate("zzz").is_none());
    }

    #[test]
    fn test_resume_from_ignores_invalid_positions() {
        assert_eq!(PlaybackState::resume_from(f64::NAN), PlaybackState::default());
        assert_eq!(PlaybackState::resume_from(-3.0), PlaybackState::default());
        let resumed = PlaybackState::resume_from(42.0);
        assert_eq!(resumed.last_confirmed_time, 42.0);
        assert!(!resumed.started);
    }

    #[test]
    fn test_sync_status_from_app_error() {
        assert_eq!(SyncStatus::from(&AppError::TokenInvalid), SyncStatus::TokenError);
        assert_eq!(
            SyncStatus::from(&AppError::NotFound("x".into())),
            SyncStatus::NotFound
        );
        assert_eq!(
            SyncStatus::from(&AppError::InvalidCourseData("bad".into())),
            SyncStatus::DecodeError
        );
        assert_eq!(
            SyncStatus::from(&AppError::UserInterrupt),
            SyncStatus::UnexpectedError
        );
    }
}
