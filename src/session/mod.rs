pub mod manager;
pub mod recorder;
pub mod summary;

pub use manager::*;
pub use recorder::*;
pub use summary::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::backend::{BackendError, SessionMetrics};
use crate::interview::{format_elapsed, SessionClock, READY_TO_START};
use crate::media::MediaError;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Interview session has already ended")]
    AlreadyEnded,
    #[error("Question {index} is out of range ({available} questions loaded)")]
    QuestionOutOfRange { index: usize, available: usize },
    #[error("Session not ready to end (audio processed: {audio}, video processed: {video})")]
    NotReady { audio: bool, video: bool },
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Media(#[from] MediaError),
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Camera side of the session lifecycle.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraPhase {
    Idle,
    Requested,
    Live,
    Unavailable,
}

/// Everything the live-session page tracks, owned by one `InterviewSession`.
#[derive(Clone, Debug)]
pub struct SessionState {
    pub session_id: Uuid,
    pub clock: SessionClock,
    pub camera: CameraPhase,
    pub recording: bool,
    pub audio_processed: bool,
    pub video_processed: bool,
    pub questions: Vec<String>,
    pub selected_question: Option<usize>,
    pub emotion_label: String,
    pub greeting: String,
    pub elapsed_display: String,
    pub ended: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            clock: SessionClock::start(),
            camera: CameraPhase::Idle,
            recording: false,
            audio_processed: false,
            video_processed: false,
            questions: Vec::new(),
            selected_question: None,
            emotion_label: READY_TO_START.to_string(),
            greeting: String::new(),
            elapsed_display: format_elapsed(std::time::Duration::ZERO),
            ended: false,
        }
    }

    /// The "end interview" control is enabled only once both processed
    /// flags are set.
    pub fn can_end(&self) -> bool {
        self.audio_processed && self.video_processed && !self.ended
    }

    pub fn selected_text(&self) -> Option<&str> {
        self.selected_question
            .and_then(|index| self.questions.get(index))
            .map(String::as_str)
    }

    pub fn metrics(&self) -> SessionMetrics {
        SessionMetrics {
            session_duration: self.clock.elapsed_ms(),
            questions_answered: u32::from(self.selected_question.is_some()),
            total_questions: self.questions.len() as u32,
            audio_processed: self.audio_processed,
            video_processed: self.video_processed,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_end_needs_both_flags() {
        let mut state = SessionState::new();
        assert!(!state.can_end());
        state.audio_processed = true;
        assert!(!state.can_end());
        state.video_processed = true;
        assert!(state.can_end());
        state.ended = true;
        assert!(!state.can_end());
    }

    #[test]
    fn test_metrics_count_selection_as_one_answer() {
        let mut state = SessionState::new();
        state.questions = vec!["a".into(), "b".into(), "c".into()];
        assert_eq!(state.metrics().questions_answered, 0);
        state.selected_question = Some(2);
        let metrics = state.metrics();
        assert_eq!(metrics.questions_answered, 1);
        assert_eq!(metrics.total_questions, 3);
        assert_eq!(state.selected_text(), Some("c"));
    }
}
