use std::time::Duration;
use thiserror::Error;

use crate::gate::QuizError;

/// Errors surfaced by time sources and the lesson session.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlayerError {
    /// The direct media backend could not load the file.
    #[error("Media failed to load: {0}")]
    MediaLoad(String),

    /// The embedded third-party player never initialized.
    #[error("Embedded player failed to initialize: {0}")]
    EmbedInit(String),

    /// A backend error after the media became ready.
    #[error("Playback error: {0}")]
    Playback(String),

    #[error("Player did not become ready within {0:?}")]
    ReadyTimeout(Duration),

    #[error("Player is not ready")]
    NotReady,

    /// Controls are inert while a checkpoint quiz is on screen.
    #[error("Controls are locked while a quiz is active")]
    QuizActive,

    #[error("Quiz error: {0}")]
    Quiz(#[from] QuizError),

    /// Server-side answer validation failed; the quiz stays open for retry.
    #[error("Answer submission failed: {0}")]
    Submission(String),

    #[error("Invalid media source: {0}")]
    InvalidSource(String),

    #[error("Fullscreen unavailable: {0}")]
    Fullscreen(String),

    #[error("Player session disconnected")]
    Disconnected,
}

impl PlayerError {
    /// Whether this error leaves the player in its persistent fallback state.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PlayerError::MediaLoad(_)
                | PlayerError::EmbedInit(_)
                | PlayerError::Playback(_)
                | PlayerError::ReadyTimeout(_)
                | PlayerError::InvalidSource(_)
        )
    }

    /// Message shown in the fallback overlay.
    pub fn fallback_message(&self) -> String {
        match self {
            PlayerError::MediaLoad(_) | PlayerError::InvalidSource(_) => {
                "This video could not be loaded. Reload the lesson to try again.".to_string()
            }
            PlayerError::EmbedInit(_) | PlayerError::ReadyTimeout(_) => {
                "The video player could not start. Reload the lesson to try again.".to_string()
            }
            other => format!("Playback stopped: {}", other),
        }
    }
}
