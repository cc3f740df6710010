// src/tracker/mod.rs

mod guard;
mod session;

pub use guard::{
    EndOutcome, SeekDecision, TimeUpdate, is_locked, lecture_state, on_playback_ended,
    on_seek_attempt, on_time_update,
};
pub use session::{LectureProgressTracker, OutlineRow, SessionStore};
