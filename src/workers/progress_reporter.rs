use std::sync::Arc;
use tracing::{debug, info, trace};

use crate::api::{LessonApi, ProgressUpdate};
use crate::models::VideoId;

/// Pushes resume positions and the completion flag to the lesson backend.
///
/// Reports are fire-and-forget: each one runs on its own task and failures
/// are logged and dropped.
pub struct ProgressReporter {
    api: Arc<dyn LessonApi>,
    video_id: VideoId,
    interval_secs: u64,
    last_reported_second: Option<u64>,
    completion_sent: bool,
}

impl ProgressReporter {
    pub fn new(api: Arc<dyn LessonApi>, video_id: VideoId, interval_secs: u64) -> Self {
        Self {
            api,
            video_id,
            interval_secs: interval_secs.max(1),
            last_reported_second: None,
            completion_sent: false,
        }
    }

    /// For a video the backend already records as completed.
    pub fn with_completion_recorded(mut self) -> Self {
        self.completion_sent = true;
        self
    }

    pub fn completion_sent(&self) -> bool {
        self.completion_sent
    }

    /// Report the position if this tick lands on a reporting second.
    /// Returns whether a report was dispatched.
    pub fn on_tick(&mut self, time: f64) -> bool {
        if !time.is_finite() || time < 0.0 {
            return false;
        }
        let second = time.floor() as u64;
        if second % self.interval_secs != 0 || self.last_reported_second == Some(second) {
            return false;
        }
        self.last_reported_second = Some(second);

        trace!("Reporting progress {:.2}s for {}", time, self.video_id);
        self.dispatch(ProgressUpdate::position(self.video_id.clone(), time));
        true
    }

    /// Send the completion flag once per session. Returns whether it was sent
    /// by this call.
    pub fn mark_completed(&mut self) -> bool {
        if self.completion_sent {
            return false;
        }
        self.completion_sent = true;
        info!("Video {} completed", self.video_id);
        self.dispatch(ProgressUpdate::completion(self.video_id.clone()));
        true
    }

    fn dispatch(&self, update: ProgressUpdate) {
        let api = Arc::clone(&self.api);
        tokio::spawn(async move {
            if let Err(e) = api.report_progress(&update).await {
                debug!("Progress report for {} dropped: {}", update.video_id, e);
            }
        });
    }
}
