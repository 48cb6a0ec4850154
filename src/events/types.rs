use serde::{Deserialize, Serialize};

use crate::gate::Verdict;
use crate::models::{CheckpointId, VideoId};

/// Lifecycle notification emitted by a playback session
#[derive(Debug, Clone, Serialize)]
pub struct SessionEvent {
    pub id: String,
    pub event_type: EventType,
    pub video_id: VideoId,
    pub payload: EventPayload,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl SessionEvent {
    pub fn new(event_type: EventType, video_id: VideoId, payload: EventPayload) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event_type,
            video_id,
            payload,
            timestamp: chrono::Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EventType {
    // Lifecycle
    SessionReady,
    SessionFallback,
    SessionClosed,

    // Playback
    PlaybackStarted,
    PlaybackPaused,
    PlaybackResumed,
    PlaybackCompleted,
    SeekClamped,

    // Checkpoints
    QuizPresented,
    QuizResolved,
    SubmissionFailed,
}

#[derive(Debug, Clone, Serialize)]
pub enum EventPayload {
    Lesson {
        title: String,
        duration: f64,
        checkpoint_count: usize,
        resume_at: f64,
    },
    Playback {
        position: f64,
        duration: f64,
    },
    Seek {
        requested: f64,
        target: f64,
    },
    Quiz {
        checkpoint_id: CheckpointId,
        trigger_time: f64,
        verdict: Option<Verdict>,
    },
    Error {
        message: String,
    },
    None,
}

impl EventType {
    /// Dotted name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::SessionReady => "session.ready",
            EventType::SessionFallback => "session.fallback",
            EventType::SessionClosed => "session.closed",
            EventType::PlaybackStarted => "playback.started",
            EventType::PlaybackPaused => "playback.paused",
            EventType::PlaybackResumed => "playback.resumed",
            EventType::PlaybackCompleted => "playback.completed",
            EventType::SeekClamped => "playback.seek_clamped",
            EventType::QuizPresented => "quiz.presented",
            EventType::QuizResolved => "quiz.resolved",
            EventType::SubmissionFailed => "quiz.submission_failed",
        }
    }
}
