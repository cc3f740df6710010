// src/tracker/guard.rs

//! 解锁链与拖动守卫的纯函数实现。这里的函数都没有副作用，
//! 非法输入一律返回"保持原状态"而不是报错。

use crate::{
    constants::COMPLETION_PERCENT,
    models::{Lecture, LectureState, PlaybackState, Section},
};
use log::trace;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeUpdate {
    pub progress_percent: f64,
    pub last_confirmed_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekDecision {
    pub allowed: bool,
    /// 播放器应跳转到的位置；被拒绝时为最后确认位置
    pub corrected_time: f64,
    pub last_confirmed_time: f64,
}

impl SeekDecision {
    fn reject(last_confirmed_time: f64) -> Self {
        Self {
            allowed: false,
            corrected_time: last_confirmed_time,
            last_confirmed_time,
        }
    }

    fn accept(requested: f64, last_confirmed_time: f64) -> Self {
        Self {
            allowed: true,
            corrected_time: requested,
            last_confirmed_time: last_confirmed_time.max(requested),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EndOutcome {
    /// 按课程展开顺序的下一个课时
    Next(Lecture),
    /// 已是课程的最后一个课时
    CourseCompleted,
    /// 课时 ID 不在列表中，未做任何修改
    UnknownLecture,
}

fn is_valid_time(t: f64) -> bool {
    t.is_finite() && t >= 0.0
}

fn is_valid_duration(d: f64) -> bool {
    d.is_finite() && d > 0.0
}

/// 章节中第一个课时总是解锁；其余课时仅当前一个课时已学完时解锁。
/// 不属于该章节的课时视为锁定。
pub fn is_locked(lecture: &Lecture, section: &Section) -> bool {
    match section.lectures.iter().position(|l| l.id == lecture.id) {
        Some(0) => false,
        Some(i) => !section.lectures[i - 1].watched,
        None => true,
    }
}

pub fn on_time_update(
    current_time: f64,
    duration: f64,
    last_confirmed_time: f64,
) -> Option<TimeUpdate> {
    if !is_valid_time(current_time)
        || !is_valid_duration(duration)
        || !is_valid_time(last_confirmed_time)
    {
        trace!(
            "忽略非法的播放进度: current={}, duration={}, confirmed={}",
            current_time, duration, last_confirmed_time
        );
        return None;
    }
    let progress_percent = (current_time / duration * 100.0).min(COMPLETION_PERCENT);
    Some(TimeUpdate {
        progress_percent,
        last_confirmed_time: last_confirmed_time.max(current_time),
    })
}

pub fn on_seek_attempt(
    requested_time: f64,
    last_confirmed_time: f64,
    duration: f64,
    threshold: f64,
    watched: bool,
) -> SeekDecision {
    let last_confirmed_time = if is_valid_time(last_confirmed_time) {
        last_confirmed_time
    } else {
        0.0
    };
    if !is_valid_time(requested_time) {
        return SeekDecision::reject(last_confirmed_time);
    }
    if watched {
        return SeekDecision::accept(requested_time, last_confirmed_time);
    }
    let threshold = if is_valid_time(threshold) { threshold } else { 0.0 };

    if requested_time > last_confirmed_time + threshold {
        return SeekDecision::reject(last_confirmed_time);
    }
    // 时长未知时 (元数据尚未加载) 只能按前进规则判断
    if is_valid_duration(duration) {
        let frontier = duration - threshold;
        if requested_time >= frontier && last_confirmed_time < frontier {
            return SeekDecision::reject(last_confirmed_time);
        }
    }
    SeekDecision::accept(requested_time, last_confirmed_time)
}

/// 将课时标记为已学完，并返回按课程展开顺序的下一个课时
pub fn on_playback_ended<'a, I>(lecture_id: &str, lectures: I) -> EndOutcome
where
    I: IntoIterator<Item = &'a mut Lecture>,
{
    let mut iter = lectures.into_iter();
    while let Some(lecture) = iter.next() {
        if lecture.id == lecture_id {
            lecture.watched = true;
            return match iter.next() {
                Some(next) => EndOutcome::Next(next.clone()),
                None => EndOutcome::CourseCompleted,
            };
        }
    }
    EndOutcome::UnknownLecture
}

pub fn lecture_state(
    lecture: &Lecture,
    section: &Section,
    playback: Option<&PlaybackState>,
) -> LectureState {
    if lecture.watched {
        LectureState::Watched
    } else if is_locked(lecture, section) {
        LectureState::Locked
    } else if playback.is_some_and(|p| p.started) {
        LectureState::InProgress
    } else {
        LectureState::NotStarted
    }
}

impl PlaybackState {
    /// 应用一次播放进度回调，非法输入时保持原状态
    pub fn apply_time_update(&mut self, current_time: f64, duration: f64) -> bool {
        match on_time_update(current_time, duration, self.last_confirmed_time) {
            Some(update) => {
                let changed = !self.started
                    || update.progress_percent != self.progress_percent
                    || update.last_confirmed_time != self.last_confirmed_time;
                self.current_time = current_time;
                self.progress_percent = update.progress_percent;
                self.last_confirmed_time = update.last_confirmed_time;
                self.duration = duration;
                self.started = true;
                changed
            }
            None => false,
        }
    }
}
