// src/models/api.rs

use super::{Course, Lecture, LectureContent, Section};
use crate::{constants::api::content_types, error::AppError};
use serde::Deserialize;

// --- 课程结构 (Course Structure) API 响应结构体 ---

#[derive(Deserialize, Debug, Clone)]
pub struct CourseStructureResponse {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub sections: Vec<SectionItem>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SectionItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub lectures: Vec<LectureItem>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct LectureItem {
    pub id: String,
    pub title: String,
    pub content_type: String,
    #[serde(alias = "video_url", alias = "pdf_url")]
    pub url: String,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub watched: bool,
    #[serde(default)]
    pub position: u32,
    #[serde(default)]
    pub last_watched_time: Option<f64>,
}

fn parse_content(content_type: &str, url: String) -> Option<LectureContent> {
    match content_type.trim().to_lowercase().as_str() {
        content_types::VIDEO => Some(LectureContent::Video { url }),
        content_types::DOCUMENT | content_types::PDF => Some(LectureContent::Document { url }),
        _ => None,
    }
}

fn sanitize_seconds(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

impl TryFrom<LectureItem> for Lecture {
    type Error = AppError;

    fn try_from(item: LectureItem) -> Result<Self, Self::Error> {
        let content = parse_content(&item.content_type, item.url).ok_or_else(|| {
            AppError::InvalidCourseData(format!(
                "课时 '{}' 的内容类型 '{}' 无法识别",
                item.id, item.content_type
            ))
        })?;
        Ok(Lecture {
            id: item.id,
            title: item.title,
            content,
            duration: sanitize_seconds(item.duration),
            watched: item.watched,
            position: item.position,
            last_watched_time: sanitize_seconds(item.last_watched_time),
        })
    }
}

impl TryFrom<SectionItem> for Section {
    type Error = AppError;

    fn try_from(item: SectionItem) -> Result<Self, Self::Error> {
        let mut lectures = item
            .lectures
            .into_iter()
            .map(Lecture::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        // 稳定排序，position 相同时保留后端给出的顺序
        lectures.sort_by_key(|l| l.position);
        Ok(Section {
            id: item.id,
            title: item.title,
            lectures,
        })
    }
}

impl TryFrom<CourseStructureResponse> for Course {
    type Error = AppError;

    fn try_from(resp: CourseStructureResponse) -> Result<Self, Self::Error> {
        let sections = resp
            .sections
            .into_iter()
            .map(Section::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Course {
            id: resp.id,
            title: resp.title,
            sections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_conversion_sorts_and_tags_content() {
        let body = r#"{
            "id": "c1",
            "title": "Rust 入门",
            "sections": [{
                "id": "s1",
                "title": "第一章",
                "lectures": [
                    {"id": "l2", "title": "讲义", "content_type": "PDF", "pdf_url": "https://x/l2.pdf", "position": 1},
                    {"id": "l1", "title": "开篇", "content_type": "Video", "video_url": "https://x/l1.mp4",
                     "duration": 120, "watched": true, "position": 0, "last_watched_time": 120}
                ]
            }]
        }"#;
        let resp: CourseStructureResponse = serde_json::from_str(body).unwrap();
        let course = Course::try_from(resp).unwrap();
        let lectures = &course.sections[0].lectures;

        assert_eq!(lectures[0].id, "l1");
        assert!(lectures[0].content.is_video());
        assert_eq!(lectures[0].duration, 120.0);
        assert!(lectures[0].watched);

        assert_eq!(lectures[1].id, "l2");
        assert_eq!(
            lectures[1].content,
            LectureContent::Document {
                url: "https://x/l2.pdf".into()
            }
        );
        assert_eq!(lectures[1].duration, 0.0);
        assert_eq!(lectures[1].last_watched_time, 0.0);
    }

    #[test]
    fn test_unknown_content_type_rejects_course() {
        let body = r#"{
            "id": "c1", "title": "t",
            "sections": [{"id": "s1", "title": "s", "lectures": [
                {"id": "l1", "title": "测验", "content_type": "quiz", "url": "https://x/q"}
            ]}]
        }"#;
        let resp: CourseStructureResponse = serde_json::from_str(body).unwrap();
        let err = Course::try_from(resp).unwrap_err();
        assert!(matches!(err, AppError::InvalidCourseData(msg) if msg.contains("quiz")));
    }

    #[test]
    fn test_negative_duration_is_clamped() {
        assert_eq!(sanitize_seconds(Some(-5.0)), 0.0);
        assert_eq!(sanitize_seconds(Some(f64::NAN)), 0.0);
        assert_eq!(sanitize_seconds(None), 0.0);
        assert_eq!(sanitize_seconds(Some(30.5)), 30.5);
    }
}
