// src/tracker/session.rs

use super::guard::{self, EndOutcome, SeekDecision};
use crate::{
    constants::{COMPLETION_PERCENT, DEFAULT_SEEK_SLACK_SECS},
    error::{AppError, AppResult},
    models::{Course, CourseSummary, Lecture, LectureState, PlaybackState, ProgressUpdate},
};
use log::{debug, info, warn};
use std::collections::HashMap;

/// 会话级的播放状态存储：当前课时 + 每个课时的播放进度。
/// 只由持有播放器的一方读写。
#[derive(Debug, Default, Clone)]
pub struct SessionStore {
    current_lecture: Option<String>,
    playback: HashMap<String, PlaybackState>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_lecture(&self) -> Option<&str> {
        self.current_lecture.as_deref()
    }

    pub fn set_current_lecture(&mut self, lecture_id: &str) {
        self.current_lecture = Some(lecture_id.to_string());
    }

    pub fn playback(&self, lecture_id: &str) -> Option<&PlaybackState> {
        self.playback.get(lecture_id)
    }

    /// 获取课时的播放状态，不存在时用给定的续播位置初始化
    pub fn playback_or_resume(&mut self, lecture_id: &str, resume_at: f64) -> &mut PlaybackState {
        self.playback
            .entry(lecture_id.to_string())
            .or_insert_with(|| PlaybackState::resume_from(resume_at))
    }
}

/// 大纲中的一行
#[derive(Debug, Clone)]
pub struct OutlineRow {
    pub section_title: String,
    pub lecture_id: String,
    pub title: String,
    pub content_label: &'static str,
    pub duration: f64,
    pub state: LectureState,
    pub progress_percent: f64,
    pub is_current: bool,
}

pub struct LectureProgressTracker {
    course: Course,
    store: SessionStore,
    seek_slack: f64,
}

impl LectureProgressTracker {
    pub fn new(course: Course) -> Self {
        Self::with_seek_slack(course, DEFAULT_SEEK_SLACK_SECS)
    }

    pub fn with_seek_slack(course: Course, seek_slack: f64) -> Self {
        Self {
            course,
            store: SessionStore::new(),
            seek_slack,
        }
    }

    pub fn course(&self) -> &Course {
        &self.course
    }

    pub fn summary(&self) -> CourseSummary {
        self.course.summary()
    }

    pub fn lecture_state(&self, lecture_id: &str) -> Option<LectureState> {
        self.course.locate(lecture_id).map(|(lecture, section)| {
            guard::lecture_state(lecture, section, self.store.playback(lecture_id))
        })
    }

    pub fn current_lecture(&self) -> Option<&Lecture> {
        self.store
            .current_lecture()
            .and_then(|id| self.course.locate(id))
            .map(|(lecture, _)| lecture)
    }

    pub fn current_playback(&self) -> Option<&PlaybackState> {
        self.store.current_lecture().and_then(|id| self.store.playback(id))
    }

    /// 第一个未学完且已解锁的课时，用于"继续学习"
    pub fn resume_target(&self) -> Option<&Lecture> {
        self.course.sections.iter().find_map(|section| {
            section
                .lectures
                .iter()
                .find(|l| !l.watched && !guard::is_locked(l, section))
        })
    }

    pub fn open_lecture(&mut self, lecture_id: &str) -> AppResult<&Lecture> {
        let (lecture, section) = self
            .course
            .locate(lecture_id)
            .ok_or_else(|| AppError::LectureNotFound(lecture_id.to_string()))?;
        if !lecture.watched && guard::is_locked(lecture, section) {
            warn!("尝试打开未解锁的课时 '{}'", lecture_id);
            return Err(AppError::LectureLocked(lecture.title.clone()));
        }
        let resume_at = lecture.last_watched_time;
        debug!("打开课时 '{}'，续播位置 {:.1}s", lecture_id, resume_at);
        self.store.set_current_lecture(lecture_id);
        self.store.playback_or_resume(lecture_id, resume_at);
        self.current_lecture().ok_or(AppError::NoActiveLecture)
    }

    fn active_id(&self) -> AppResult<String> {
        self.store
            .current_lecture()
            .map(str::to_string)
            .ok_or(AppError::NoActiveLecture)
    }

    /// 处理播放器的 time-update 事件。状态有变化时返回需要推送的进度。
    pub fn time_update(
        &mut self,
        current_time: f64,
        duration: f64,
    ) -> AppResult<Option<ProgressUpdate>> {
        let id = self.active_id()?;
        let resume_at = self.lecture_ref(&id)?.last_watched_time;
        let state = self.store.playback_or_resume(&id, resume_at);
        if !state.apply_time_update(current_time, duration) {
            return Ok(None);
        }
        let state = *state;

        let lecture = self.lecture_mut(&id)?;
        if !lecture.watched && state.progress_percent >= COMPLETION_PERCENT {
            info!("课时 '{}' 播放进度达到 100%，标记为已学完", id);
            lecture.watched = true;
        }
        Ok(Some(ProgressUpdate::new(&id, &state, lecture.watched)))
    }

    /// 处理播放器的 seeking 事件
    pub fn seek(&mut self, requested_time: f64) -> AppResult<SeekDecision> {
        let id = self.active_id()?;
        let lecture = self.lecture_ref(&id)?;
        let (backend_duration, watched, resume_at) =
            (lecture.duration, lecture.watched, lecture.last_watched_time);
        let slack = self.seek_slack;
        let state = self.store.playback_or_resume(&id, resume_at);
        let fully_watched = watched || state.progress_percent >= COMPLETION_PERCENT;
        let duration = state.effective_duration(backend_duration);

        let decision = guard::on_seek_attempt(
            requested_time,
            state.last_confirmed_time,
            duration,
            slack,
            fully_watched,
        );
        if !decision.allowed {
            debug!(
                "拒绝拖动: 课时 '{}' 请求 {:.1}s，最后确认 {:.1}s",
                id, requested_time, decision.last_confirmed_time
            );
        }
        state.current_time = decision.corrected_time;
        state.last_confirmed_time = decision.last_confirmed_time;
        Ok(decision)
    }

    /// 处理播放器的 ended 事件
    pub fn playback_ended(&mut self) -> AppResult<(ProgressUpdate, EndOutcome)> {
        let id = self.active_id()?;
        let lecture = self.lecture_ref(&id)?;
        let (backend_duration, resume_at) = (lecture.duration, lecture.last_watched_time);
        let state = self.store.playback_or_resume(&id, resume_at);
        let duration = state.effective_duration(backend_duration);
        state.started = true;
        state.progress_percent = COMPLETION_PERCENT;
        if duration > 0.0 {
            state.current_time = duration;
            state.last_confirmed_time = state.last_confirmed_time.max(duration);
        }
        let state = *state;

        let outcome = guard::on_playback_ended(&id, self.course.lectures_mut());
        info!("课时 '{}' 播放结束: {}", id, outcome_label(&outcome));
        Ok((ProgressUpdate::new(&id, &state, true), outcome))
    }

    /// 文档类课时的显式完成信号。视频课时必须通过播放完成。
    pub fn mark_viewed(&mut self) -> AppResult<(ProgressUpdate, EndOutcome)> {
        let id = self.active_id()?;
        if self.lecture_ref(&id)?.content.is_video() {
            return Err(AppError::UserInputError(
                "视频课时需要完整播放后才能标记为已学完".to_string(),
            ));
        }
        self.playback_ended()
    }

    pub fn outline(&self) -> Vec<OutlineRow> {
        let current = self.store.current_lecture();
        self.course
            .sections
            .iter()
            .flat_map(|section| {
                section.lectures.iter().map(move |lecture| {
                    let playback = self.store.playback(&lecture.id);
                    OutlineRow {
                        section_title: section.title.clone(),
                        lecture_id: lecture.id.clone(),
                        title: lecture.title.clone(),
                        content_label: lecture.content.label(),
                        duration: lecture.duration,
                        state: guard::lecture_state(lecture, section, playback),
                        progress_percent: if lecture.watched {
                            COMPLETION_PERCENT
                        } else {
                            playback.map_or(0.0, |p| p.progress_percent)
                        },
                        is_current: current == Some(lecture.id.as_str()),
                    }
                })
            })
            .collect()
    }

    fn lecture_ref(&self, lecture_id: &str) -> AppResult<&Lecture> {
        self.course
            .locate(lecture_id)
            .map(|(lecture, _)| lecture)
            .ok_or_else(|| AppError::LectureNotFound(lecture_id.to_string()))
    }

    fn lecture_mut(&mut self, lecture_id: &str) -> AppResult<&mut Lecture> {
        self.course
            .lecture_mut(lecture_id)
            .ok_or_else(|| AppError::LectureNotFound(lecture_id.to_string()))
    }
}

fn outcome_label(outcome: &EndOutcome) -> String {
    match outcome {
        EndOutcome::Next(next) => format!("下一课时 '{}'", next.id),
        EndOutcome::CourseCompleted => "课程已全部完成".to_string(),
        EndOutcome::UnknownLecture => "课时不存在".to_string(),
    }
}
