use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::errors::ApiError;
use super::types::ProgressUpdate;
use super::LessonApi;
use crate::models::{
    Checkpoint, CheckpointId, EMBEDDED_VIDEO_TYPE, Lesson, OptionId, QuizOption, ResumePoint,
    VideoId,
};

pub const DEMO_VIDEO_ID: &str = "demo";
pub const DEMO_EMBEDDED_VIDEO_ID: &str = "demo-embedded";

/// In-memory lesson backend serving a short built-in lesson, used for
/// offline runs of the terminal player.
pub struct DemoLessonApi {
    lessons: Vec<Lesson>,
    checkpoints: Vec<Checkpoint>,
    resume: RwLock<ResumePoint>,
    reports: RwLock<Vec<ProgressUpdate>>,
}

impl DemoLessonApi {
    pub fn new() -> Self {
        let lessons = vec![
            Lesson {
                id: VideoId::from(DEMO_VIDEO_ID),
                title: "How plants make food".to_string(),
                description: Some("A one minute primer on photosynthesis".to_string()),
                url: "https://media.example.com/lessons/photosynthesis.mp4".to_string(),
                video_type: None,
                duration: 60.0,
                quizzes: Vec::new(),
            },
            Lesson {
                id: VideoId::from(DEMO_EMBEDDED_VIDEO_ID),
                title: "How plants make food (hosted)".to_string(),
                description: None,
                url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
                video_type: Some(EMBEDDED_VIDEO_TYPE.to_string()),
                duration: 60.0,
                quizzes: Vec::new(),
            },
        ];

        let checkpoints = vec![
            Checkpoint::new(
                "demo-q1",
                5.0,
                "Which organelle carries out photosynthesis?",
                vec![
                    QuizOption::new("demo-q1-a", "Chloroplast", true),
                    QuizOption::new("demo-q1-b", "Mitochondrion", false),
                    QuizOption::new("demo-q1-c", "Nucleus", false),
                ],
            ),
            Checkpoint::new(
                "demo-q2",
                10.0,
                "Which gas do plants absorb?",
                vec![
                    QuizOption::new("demo-q2-a", "Oxygen", false),
                    QuizOption::new("demo-q2-b", "Carbon dioxide", true),
                ],
            ),
            Checkpoint::new(
                "demo-q3",
                15.0,
                "What pigment makes leaves green?",
                vec![
                    QuizOption::new("demo-q3-a", "Melanin", false),
                    QuizOption::new("demo-q3-b", "Carotene", false),
                    QuizOption::new("demo-q3-c", "Chlorophyll", true),
                ],
            ),
        ];

        Self {
            lessons,
            checkpoints,
            resume: RwLock::new(ResumePoint::default()),
            reports: RwLock::new(Vec::new()),
        }
    }

    /// Progress reports received so far, oldest first.
    pub async fn reports(&self) -> Vec<ProgressUpdate> {
        self.reports.read().await.clone()
    }

    fn lesson(&self, video_id: &VideoId) -> Result<&Lesson, ApiError> {
        self.lessons
            .iter()
            .find(|lesson| &lesson.id == video_id)
            .ok_or_else(|| ApiError::NotFound(format!("video {}", video_id)))
    }

    fn checkpoint(&self, checkpoint_id: &CheckpointId) -> Result<&Checkpoint, ApiError> {
        self.checkpoints
            .iter()
            .find(|c| &c.id == checkpoint_id)
            .ok_or_else(|| ApiError::NotFound(format!("quiz {}", checkpoint_id)))
    }
}

impl Default for DemoLessonApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LessonApi for DemoLessonApi {
    async fn fetch_lesson(&self, video_id: &VideoId) -> Result<Lesson, ApiError> {
        let lesson = self.lesson(video_id)?.clone();
        info!("Serving demo lesson '{}'", lesson.title);
        Ok(lesson)
    }

    async fn fetch_checkpoints(&self, video_id: &VideoId) -> Result<Vec<Checkpoint>, ApiError> {
        self.lesson(video_id)?;
        Ok(self.checkpoints.clone())
    }

    async fn fetch_resume(&self, video_id: &VideoId) -> Result<ResumePoint, ApiError> {
        self.lesson(video_id)?;
        Ok(*self.resume.read().await)
    }

    async fn report_progress(&self, update: &ProgressUpdate) -> Result<(), ApiError> {
        self.lesson(&update.video_id)?;
        debug!("Demo progress report: {:?}", update);
        {
            let mut resume = self.resume.write().await;
            if let Some(current_time) = update.current_time {
                resume.current_time = current_time;
            }
            if update.is_completion() {
                resume.completed = true;
            }
        }
        self.reports.write().await.push(update.clone());
        Ok(())
    }

    async fn submit_answer(
        &self,
        checkpoint_id: &CheckpointId,
        option_id: &OptionId,
    ) -> Result<bool, ApiError> {
        Ok(self.checkpoint(checkpoint_id)?.is_correct(option_id))
    }
}
