//! Client side of the lesson backend's HTTP contract.

pub mod client;
pub mod demo;
pub mod errors;
pub mod types;

use async_trait::async_trait;

use crate::models::{Checkpoint, CheckpointId, Lesson, OptionId, ResumePoint, VideoId};

pub use client::LessonApiClient;
pub use demo::{DEMO_EMBEDDED_VIDEO_ID, DEMO_VIDEO_ID, DemoLessonApi};
pub use errors::ApiError;
pub use types::{AnswerRequest, AnswerResponse, ProgressUpdate};

/// Operations a playback session needs from the lesson backend.
#[async_trait]
pub trait LessonApi: Send + Sync {
    async fn fetch_lesson(&self, video_id: &VideoId) -> Result<Lesson, ApiError>;

    /// Checkpoints in the order the backend serves them.
    async fn fetch_checkpoints(&self, video_id: &VideoId) -> Result<Vec<Checkpoint>, ApiError>;

    /// Last saved position; a learner with no record gets the zero default.
    async fn fetch_resume(&self, video_id: &VideoId) -> Result<ResumePoint, ApiError>;

    async fn report_progress(&self, update: &ProgressUpdate) -> Result<(), ApiError>;

    /// Server-side verdict for a chosen option.
    async fn submit_answer(
        &self,
        checkpoint_id: &CheckpointId,
        option_id: &OptionId,
    ) -> Result<bool, ApiError>;
}
