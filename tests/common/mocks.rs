use async_trait::async_trait;
use quizgate::api::{ApiError, LessonApi, ProgressUpdate};
use quizgate::models::{Checkpoint, CheckpointId, Lesson, OptionId, ResumePoint, VideoId};
use std::sync::Mutex;

/// Lesson backend kept in memory; records every progress report.
pub struct MockLessonApi {
    pub lesson: Lesson,
    pub checkpoints: Vec<Checkpoint>,
    pub resume: ResumePoint,
    reports: Mutex<Vec<ProgressUpdate>>,
}

impl MockLessonApi {
    pub fn new(lesson: Lesson, checkpoints: Vec<Checkpoint>) -> Self {
        Self {
            lesson,
            checkpoints,
            resume: ResumePoint::default(),
            reports: Mutex::new(Vec::new()),
        }
    }

    pub fn with_resume(mut self, resume: ResumePoint) -> Self {
        self.resume = resume;
        self
    }

    pub fn reports(&self) -> Vec<ProgressUpdate> {
        self.reports.lock().unwrap().clone()
    }

    pub fn completion_reports(&self) -> usize {
        self.reports().iter().filter(|r| r.is_completion()).count()
    }
}

#[async_trait]
impl LessonApi for MockLessonApi {
    async fn fetch_lesson(&self, video_id: &VideoId) -> Result<Lesson, ApiError> {
        if video_id == &self.lesson.id {
            Ok(self.lesson.clone())
        } else {
            Err(ApiError::NotFound(video_id.to_string()))
        }
    }

    async fn fetch_checkpoints(&self, _video_id: &VideoId) -> Result<Vec<Checkpoint>, ApiError> {
        Ok(self.checkpoints.clone())
    }

    async fn fetch_resume(&self, _video_id: &VideoId) -> Result<ResumePoint, ApiError> {
        Ok(self.resume)
    }

    async fn report_progress(&self, update: &ProgressUpdate) -> Result<(), ApiError> {
        self.reports.lock().unwrap().push(update.clone());
        Ok(())
    }

    async fn submit_answer(
        &self,
        checkpoint_id: &CheckpointId,
        option_id: &OptionId,
    ) -> Result<bool, ApiError> {
        self.checkpoints
            .iter()
            .find(|c| &c.id == checkpoint_id)
            .map(|c| c.is_correct(option_id))
            .ok_or_else(|| ApiError::NotFound(checkpoint_id.to_string()))
    }
}
