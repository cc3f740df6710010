// src/api.rs

use crate::{
    client::RobustClient,
    config::AppConfig,
    constants::api::templates,
    error::*,
    models::{Course, ProgressUpdate, api::CourseStructureResponse},
};
use async_trait::async_trait;
use dashmap::DashMap;
use log::{debug, info};
use std::sync::Arc;

/// 进度持久化的接缝。调用方以"发出即忘"的方式使用，失败只记录日志。
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn push_progress(&self, update: &ProgressUpdate) -> AppResult<()>;
}

/// 后端课程接口的类型化封装
pub struct CourseApi {
    http_client: Arc<RobustClient>,
    config: Arc<AppConfig>,
    cache: DashMap<String, Course>,
}

impl CourseApi {
    pub fn new(http_client: Arc<RobustClient>, config: Arc<AppConfig>) -> Self {
        Self {
            http_client,
            config,
            cache: DashMap::new(),
        }
    }

    /// 获取课程结构。同一会话内每门课程只请求一次。
    pub async fn fetch_course(&self, course_id: &str) -> AppResult<Course> {
        if let Some(entry) = self.cache.get(course_id) {
            debug!("课程结构缓存命中: {}", course_id);
            return Ok(entry.value().clone());
        }
        debug!("课程结构缓存未命中，从网络获取: {}", course_id);
        let url_template = self.config.template(templates::COURSE_STRUCTURE)?;
        let response: CourseStructureResponse = self
            .http_client
            .fetch_json(url_template, &[("course_id", course_id)])
            .await?;
        let course = Course::try_from(response)?;
        info!(
            "已加载课程 '{}'，共 {} 个章节、{} 个课时",
            course.title,
            course.sections.len(),
            course.lectures().count()
        );

        self.cache.insert(course_id.to_string(), course.clone());
        Ok(course)
    }
}

#[async_trait]
impl ProgressSink for CourseApi {
    async fn push_progress(&self, update: &ProgressUpdate) -> AppResult<()> {
        let url_template = self.config.template(templates::PROGRESS_UPDATE)?;
        self.http_client
            .send_json(url_template, &[("lecture_id", update.lecture_id.as_str())], update)
            .await?;
        debug!(
            "已同步课时 '{}' 的进度: {:.1}% @ {:.1}s",
            update.lecture_id, update.progress_percent, update.last_watched_time
        );
        Ok(())
    }
}
