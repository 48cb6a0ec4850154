#![cfg(test)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::api::{ApiError, LessonApi, ProgressUpdate};
use crate::models::{
    Checkpoint, CheckpointId, Lesson, OptionId, QuizOption, ResumePoint, VideoId,
};
use crate::player::{SourceEvent, SourceKind, TickMode, TimeSource};
use crate::utils::errors::PlayerError;

/// Checkpoint with options `opt-a`, `opt-b` and `opt-c`, `correct` being the
/// right answer.
pub fn checkpoint(id: &str, trigger_time: f64, correct: &str) -> Checkpoint {
    let options = ["opt-a", "opt-b", "opt-c"]
        .iter()
        .map(|option| QuizOption::new(*option, format!("Answer {}", option), *option == correct))
        .collect();
    Checkpoint::new(id, trigger_time, format!("Question {}?", id), options)
}

/// Directly playable lesson record.
pub fn lesson(id: &str, duration: f64) -> Lesson {
    Lesson {
        id: VideoId::from(id),
        title: format!("Lesson {}", id),
        description: None,
        url: format!("https://cdn.example.com/{}.mp4", id),
        video_type: None,
        duration,
        quizzes: Vec::new(),
    }
}

/// In-memory lesson backend that records every report it receives.
#[derive(Default)]
pub struct RecordingApi {
    lesson: Option<Lesson>,
    checkpoints: Vec<Checkpoint>,
    resume: ResumePoint,
    reports: Mutex<Vec<ProgressUpdate>>,
    answers: Mutex<Vec<(CheckpointId, OptionId)>>,
    fail_progress: AtomicBool,
    fail_answers: AtomicBool,
}

impl RecordingApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lesson(mut self, lesson: Lesson) -> Self {
        self.lesson = Some(lesson);
        self
    }

    pub fn with_checkpoints(mut self, checkpoints: Vec<Checkpoint>) -> Self {
        self.checkpoints = checkpoints;
        self
    }

    pub fn with_resume(mut self, resume: ResumePoint) -> Self {
        self.resume = resume;
        self
    }

    pub fn fail_progress(&self, fail: bool) {
        self.fail_progress.store(fail, Ordering::SeqCst);
    }

    pub fn fail_answers(&self, fail: bool) {
        self.fail_answers.store(fail, Ordering::SeqCst);
    }

    pub fn reports(&self) -> Vec<ProgressUpdate> {
        self.reports.lock().unwrap().clone()
    }

    pub fn completion_count(&self) -> usize {
        self.reports().iter().filter(|r| r.is_completion()).count()
    }

    pub fn answers(&self) -> Vec<(CheckpointId, OptionId)> {
        self.answers.lock().unwrap().clone()
    }

    /// Yield until at least `count` reports arrived.
    pub async fn wait_for_reports(&self, count: usize) -> Vec<ProgressUpdate> {
        loop {
            let reports = self.reports();
            if reports.len() >= count {
                return reports;
            }
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl LessonApi for RecordingApi {
    async fn fetch_lesson(&self, video_id: &VideoId) -> Result<Lesson, ApiError> {
        self.lesson
            .clone()
            .filter(|lesson| &lesson.id == video_id)
            .ok_or_else(|| ApiError::NotFound(format!("video {}", video_id)))
    }

    async fn fetch_checkpoints(&self, _video_id: &VideoId) -> Result<Vec<Checkpoint>, ApiError> {
        Ok(self.checkpoints.clone())
    }

    async fn fetch_resume(&self, _video_id: &VideoId) -> Result<ResumePoint, ApiError> {
        Ok(self.resume)
    }

    async fn report_progress(&self, update: &ProgressUpdate) -> Result<(), ApiError> {
        if self.fail_progress.load(Ordering::SeqCst) {
            return Err(ApiError::Network("connection refused".to_string()));
        }
        self.reports.lock().unwrap().push(update.clone());
        Ok(())
    }

    async fn submit_answer(
        &self,
        checkpoint_id: &CheckpointId,
        option_id: &OptionId,
    ) -> Result<bool, ApiError> {
        if self.fail_answers.load(Ordering::SeqCst) {
            return Err(ApiError::ServerError {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        self.answers
            .lock()
            .unwrap()
            .push((checkpoint_id.clone(), option_id.clone()));
        self.checkpoints
            .iter()
            .find(|c| &c.id == checkpoint_id)
            .map(|c| c.is_correct(option_id))
            .ok_or_else(|| ApiError::NotFound(format!("quiz {}", checkpoint_id)))
    }
}

/// Backend call made by a session, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceCall {
    Load(f64),
    Play,
    Pause,
    Seek(f64),
    SetVolume(f64),
    SetMuted(bool),
    Teardown,
}

#[derive(Default)]
struct ScriptState {
    calls: Vec<SourceCall>,
    current_time: f64,
    duration: f64,
}

/// Backend whose events are pushed by the test through [`ScriptedControl`].
pub struct ScriptedSource {
    tick_mode: TickMode,
    state: Arc<Mutex<ScriptState>>,
    events: mpsc::UnboundedReceiver<SourceEvent>,
}

#[derive(Clone)]
pub struct ScriptedControl {
    state: Arc<Mutex<ScriptState>>,
    events: mpsc::UnboundedSender<SourceEvent>,
}

impl ScriptedSource {
    pub fn new(tick_mode: TickMode) -> (Self, ScriptedControl) {
        let state = Arc::new(Mutex::new(ScriptState::default()));
        let (tx, rx) = mpsc::unbounded_channel();
        let source = Self {
            tick_mode,
            state: state.clone(),
            events: rx,
        };
        (source, ScriptedControl { state, events: tx })
    }

    fn record(&self, call: SourceCall) {
        self.state.lock().unwrap().calls.push(call);
    }
}

impl ScriptedControl {
    fn send(&self, event: SourceEvent) {
        // the session may already have torn the source down
        let _ = self.events.send(event);
    }

    pub fn ready(&self, duration: f64) {
        self.state.lock().unwrap().duration = duration;
        self.send(SourceEvent::Ready { duration });
    }

    pub fn tick(&self, time: f64) {
        self.state.lock().unwrap().current_time = time;
        self.send(SourceEvent::Tick { time });
    }

    pub fn playing(&self) {
        self.send(SourceEvent::Playing);
    }

    pub fn paused(&self) {
        self.send(SourceEvent::Paused);
    }

    pub fn ended(&self) {
        self.send(SourceEvent::Ended);
    }

    pub fn error(&self, error: PlayerError) {
        self.send(SourceEvent::Error(error));
    }

    pub fn calls(&self) -> Vec<SourceCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn last_seek(&self) -> Option<f64> {
        self.calls().iter().rev().find_map(|call| match call {
            SourceCall::Seek(target) => Some(*target),
            _ => None,
        })
    }
}

#[async_trait]
impl TimeSource for ScriptedSource {
    fn kind(&self) -> SourceKind {
        match self.tick_mode {
            TickMode::Continuous => SourceKind::Direct,
            TickMode::Polled(_) => SourceKind::Embedded,
        }
    }

    fn tick_mode(&self) -> TickMode {
        self.tick_mode
    }

    fn current_time(&self) -> f64 {
        self.state.lock().unwrap().current_time
    }

    fn duration(&self) -> f64 {
        self.state.lock().unwrap().duration
    }

    async fn load(&mut self, start_at: f64) -> Result<(), PlayerError> {
        let mut state = self.state.lock().unwrap();
        state.current_time = start_at;
        state.calls.push(SourceCall::Load(start_at));
        Ok(())
    }

    async fn play(&mut self) -> Result<(), PlayerError> {
        self.record(SourceCall::Play);
        Ok(())
    }

    async fn pause(&mut self) -> Result<(), PlayerError> {
        self.record(SourceCall::Pause);
        Ok(())
    }

    async fn seek(&mut self, target: f64) -> Result<(), PlayerError> {
        self.record(SourceCall::Seek(target));
        Ok(())
    }

    async fn set_volume(&mut self, volume: f64) -> Result<(), PlayerError> {
        self.record(SourceCall::SetVolume(volume));
        Ok(())
    }

    async fn set_muted(&mut self, muted: bool) -> Result<(), PlayerError> {
        self.record(SourceCall::SetMuted(muted));
        Ok(())
    }

    async fn next_event(&mut self) -> Option<SourceEvent> {
        self.events.recv().await
    }

    async fn teardown(&mut self) {
        self.record(SourceCall::Teardown);
        self.events.close();
    }
}
