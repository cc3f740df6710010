// src/workflows.rs

use crate::{
    SessionContext,
    api::ProgressSink,
    error::{AppError, AppResult},
    models::{ProgressUpdate, SyncStatus},
    player::{self, PlayerEvent},
    symbols,
    tracker::{EndOutcome, LectureProgressTracker},
    ui, utils,
};
use anyhow::anyhow;
use colored::*;
use log::{debug, error, info, warn};
use std::{io, path::Path, sync::Arc, sync::atomic::Ordering};
use tokio::task::JoinHandle;

/// 把播放器事件交给追踪器处理，并在后台推送进度
pub struct PlaybackSession {
    tracker: LectureProgressTracker,
    sink: Arc<dyn ProgressSink>,
    pending: Vec<JoinHandle<()>>,
}

impl PlaybackSession {
    pub fn new(tracker: LectureProgressTracker, sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            tracker,
            sink,
            pending: Vec::new(),
        }
    }

    pub fn tracker(&self) -> &LectureProgressTracker {
        &self.tracker
    }

    /// 发出即忘：失败只记录日志，本地状态不回滚
    fn sync(&mut self, update: ProgressUpdate) {
        let sink = Arc::clone(&self.sink);
        self.pending.retain(|handle| !handle.is_finished());
        self.pending.push(tokio::spawn(async move {
            if let Err(e) = sink.push_progress(&update).await {
                let (_, _, reason) = SyncStatus::from(&e).get_display_info();
                error!(
                    "课时 '{}' 进度同步失败 ({}): {}",
                    update.lecture_id, reason, e
                );
            }
        }));
    }

    /// 等待所有尚未完成的进度推送，返回等待的数量
    pub async fn flush(&mut self) -> usize {
        let handles: Vec<_> = self.pending.drain(..).collect();
        let count = handles.len();
        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                warn!("进度推送任务异常退出: {}", e);
            }
        }
        count
    }

    pub fn print_status(&self) {
        ui::print_outline(&self.tracker.course().title, &self.tracker.outline());
        ui::print_summary(&self.tracker.summary());
    }

    pub fn apply(&mut self, event: PlayerEvent) -> AppResult<()> {
        debug!("处理播放器事件: {:?}", event);
        match event {
            PlayerEvent::Open(id) => {
                let lecture = self.tracker.open_lecture(&id)?;
                ui::info(&format!(
                    "正在学习: {} ({}, {})",
                    lecture.title.bold(),
                    lecture.content.label(),
                    utils::format_duration(lecture.duration)
                ));
                if !lecture.content.is_video() {
                    ui::plain(&format!(
                        "    文档地址: {}，阅读完成后输入 'viewed'",
                        lecture.content.url()
                    ));
                } else if lecture.last_watched_time > 0.0 {
                    ui::plain(&format!(
                        "    从 {} 继续播放",
                        utils::format_duration(lecture.last_watched_time)
                    ));
                }
            }
            PlayerEvent::TimeUpdate { current_time, duration } => {
                let lecture = self.tracker.current_lecture().ok_or(AppError::NoActiveLecture)?;
                let was_watched = lecture.watched;
                let duration = duration.unwrap_or_else(|| {
                    self.tracker
                        .current_playback()
                        .map_or(lecture.duration, |p| p.effective_duration(lecture.duration))
                });
                if let Some(update) = self.tracker.time_update(current_time, duration)? {
                    ui::plain(&format!(
                        "    {} {:.0}%",
                        utils::progress_bar(update.progress_percent, 30),
                        update.progress_percent
                    ));
                    let completed = update.watched && !was_watched;
                    self.sync(update);
                    if completed {
                        ui::success("本课时已学完，下一课时已解锁。");
                    }
                }
            }
            PlayerEvent::Seeking(requested) => {
                let decision = self.tracker.seek(requested)?;
                if decision.allowed {
                    ui::info(&format!(
                        "跳转到 {}",
                        utils::format_duration(decision.corrected_time)
                    ));
                } else {
                    ui::warn(&format!(
                        "不能跳过尚未观看的内容，已回到 {}",
                        utils::format_duration(decision.corrected_time)
                    ));
                }
            }
            PlayerEvent::Ended => {
                let (update, outcome) = self.tracker.playback_ended()?;
                self.finish_lecture(update, outcome);
            }
            PlayerEvent::Viewed => {
                let (update, outcome) = self.tracker.mark_viewed()?;
                self.finish_lecture(update, outcome);
            }
            PlayerEvent::Status => self.print_status(),
        }
        Ok(())
    }

    fn finish_lecture(&mut self, update: ProgressUpdate, outcome: EndOutcome) {
        self.sync(update);
        match outcome {
            EndOutcome::Next(next) => {
                ui::success("本课时已学完。");
                ui::info(&format!("下一课时: {} [{}]", next.title.bold(), next.id));
            }
            EndOutcome::CourseCompleted => {
                info!("课程 '{}' 已全部完成", self.tracker.course().id);
                ui::success("恭喜，课程已全部完成!");
            }
            EndOutcome::UnknownLecture => {
                warn!("播放结束事件对应的课时不在课程中");
            }
        }
    }
}

async fn open_session(context: &SessionContext) -> AppResult<PlaybackSession> {
    let course = context.api.fetch_course(&context.args.course).await?;
    let tracker = LectureProgressTracker::with_seek_slack(course, context.config.seek_slack);
    let sink: Arc<dyn ProgressSink> = context.api.clone();
    Ok(PlaybackSession::new(tracker, sink))
}

fn print_resume_hint(session: &PlaybackSession) {
    if let Some(lecture) = session.tracker().resume_target() {
        ui::info(&format!("继续学习: {} [{}]", lecture.title, lecture.id));
    }
}

/// 只显示课程大纲
pub(crate) async fn run_outline(context: SessionContext) -> AppResult<()> {
    let session = open_session(&context).await?;
    session.print_status();
    print_resume_hint(&session);
    Ok(())
}

/// 运行交互模式
pub(crate) async fn run_interactive(context: SessionContext) -> AppResult<()> {
    let mut session = open_session(&context).await?;
    session.print_status();
    print_resume_hint(&session);

    ui::print_header("交互模式");
    ui::plain(&format!(
        "可用事件: open <ID> | time <秒> [时长] | seek <秒> | ended | viewed | status。直接按回车或 {} 退出。",
        *symbols::CTRL_C
    ));

    let result = loop {
        if context.cancellation_token.load(Ordering::Relaxed) {
            break Err(AppError::UserInterrupt);
        }
        match ui::prompt("请输入播放器事件", None) {
            Ok(input) if !input.is_empty() => {
                let outcome = input.parse::<PlayerEvent>().and_then(|event| session.apply(event));
                if let Err(e) = outcome {
                    log::error!("交互模式事件 '{}' 失败: {}", input, e);
                    match e {
                        AppError::UserInputError(msg) => ui::warn(&msg),
                        other => ui::error(&other.to_string()),
                    }
                }
            }
            Ok(_) => break Ok(()),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break Ok(()),
            Err(_) => break Err(AppError::UserInterrupt),
        }
    };

    let flushed = session.flush().await;
    debug!("退出前等待了 {} 个进度推送", flushed);
    ui::plain("");
    ui::info("退出交互模式。");
    result
}

/// 运行回放模式：按顺序执行文件中的播放器事件
pub(crate) async fn run_replay(replay_file: &Path, context: SessionContext) -> AppResult<()> {
    let content = std::fs::read_to_string(replay_file).map_err(|e| {
        log::error!("读取回放文件 '{}' 失败: {}", replay_file.display(), e);
        AppError::from(e)
    })?;
    let events = player::parse_script(&content);
    if events.is_empty() {
        warn!("回放文件 '{}' 为空或不含有效行。", replay_file.display());
        ui::warn(&format!("回放文件 '{}' 为空。", replay_file.display()));
        return Ok(());
    }

    let mut session = open_session(&context).await?;
    ui::print_header(&format!(
        "开始回放 {} 个事件 (按 {} 可随时退出)",
        events.len(),
        *symbols::CTRL_C
    ));

    let (mut applied, mut skipped, mut failed) = (0, 0, 0);
    for (line_no, line, parsed) in events {
        if context.cancellation_token.load(Ordering::Relaxed) {
            session.flush().await;
            return Err(AppError::UserInterrupt);
        }
        ui::print_sub_header(&format!("第 {} 行: {}", line_no, line));
        let event = match parsed {
            Ok(event) => event,
            Err(e) => {
                warn!("回放文件第 {} 行无法解析: {}", line_no, e);
                ui::warn(&format!("跳过无效事件: {}", e));
                skipped += 1;
                continue;
            }
        };
        match session.apply(event) {
            Ok(()) => applied += 1,
            Err(e) => {
                failed += 1;
                log::error!("回放事件 '{}' 失败: {}", line, e);
                ui::error(&format!("处理事件时发生错误: {}", e));
            }
        }
    }

    session.flush().await;
    session.print_status();

    ui::print_header("回放报告");
    println!(
        "{} | {} | {} | 总计: {}",
        format!("成功事件: {}", applied).green(),
        format!("跳过事件: {}", skipped).yellow(),
        format!("失败事件: {}", failed).red(),
        applied + skipped + failed
    );
    if failed > 0 {
        Err(AppError::Other(anyhow!("{} 个回放事件执行失败。", failed)))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Course, Lecture, LectureContent, Section};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        updates: Mutex<Vec<ProgressUpdate>>,
        fail: bool,
    }

    #[async_trait]
    impl ProgressSink for RecordingSink {
        async fn push_progress(&self, update: &ProgressUpdate) -> AppResult<()> {
            self.updates.lock().unwrap().push(update.clone());
            if self.fail {
                Err(AppError::NotFound("progress".into()))
            } else {
                Ok(())
            }
        }
    }

    fn course() -> Course {
        let video = |id: &str, position| Lecture {
            id: id.to_string(),
            title: format!("课时 {}", id),
            content: LectureContent::Video {
                url: format!("https://cdn.example.com/{}.mp4", id),
            },
            duration: 120.0,
            watched: false,
            position,
            last_watched_time: 0.0,
        };
        Course {
            id: "c1".into(),
            title: "示例课程".into(),
            sections: vec![Section {
                id: "s1".into(),
                title: "第一章".into(),
                lectures: vec![video("a", 0), video("b", 1)],
            }],
        }
    }

    #[tokio::test]
    async fn test_session_pushes_progress_for_state_changes() {
        let sink = Arc::new(RecordingSink::default());
        let mut session = PlaybackSession::new(LectureProgressTracker::new(course()), sink.clone());

        for line in ["open a", "time 30", "time 30", "seek 100", "ended"] {
            session.apply(line.parse().unwrap()).unwrap();
        }
        session.flush().await;

        let updates = sink.updates.lock().unwrap();
        // 重复的 time-update 和被拒绝的拖动都不产生推送
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].progress_percent, 25.0);
        assert!(!updates[0].watched);
        assert!(updates[1].watched);
        assert_eq!(updates[1].progress_percent, 100.0);
    }

    #[tokio::test]
    async fn test_failed_push_keeps_local_state() {
        let sink = Arc::new(RecordingSink {
            fail: true,
            ..Default::default()
        });
        let mut session = PlaybackSession::new(LectureProgressTracker::new(course()), sink.clone());

        session.apply("open a".parse().unwrap()).unwrap();
        session.apply("ended".parse().unwrap()).unwrap();
        session.flush().await;

        assert_eq!(sink.updates.lock().unwrap().len(), 1);
        // 本地状态仍然认为已学完，下一课时可以打开
        assert!(session.tracker().course().sections[0].lectures[0].watched);
        assert!(session.apply("open b".parse().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_locked_lecture_event_fails() {
        let sink = Arc::new(RecordingSink::default());
        let mut session = PlaybackSession::new(LectureProgressTracker::new(course()), sink);
        let err = session.apply("open b".parse().unwrap()).unwrap_err();
        assert!(matches!(err, AppError::LectureLocked(_)));
    }
}
