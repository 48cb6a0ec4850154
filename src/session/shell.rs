use serde::Serialize;
use tracing::debug;

use crate::gate::{Marker, QuizView};
use crate::models::{PlaybackState, VideoId, fraction};
use crate::utils::errors::PlayerError;

/// What covers the video surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Overlay {
    /// Waiting for the backend to report metadata.
    Loading,
    None,
    Quiz(QuizView),
    /// Persistent failure state; playback is over for this session.
    Fallback { message: String },
}

/// Snapshot of everything a front-end needs to draw the player.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShellView {
    pub video_id: VideoId,
    pub title: String,
    pub playback: PlaybackState,
    pub max_watched: f64,
    pub seek_ceiling: f64,
    pub markers: Vec<Marker>,
    pub overlay: Overlay,
    pub controls_visible: bool,
    pub completed: bool,
}

impl ShellView {
    pub fn loading(video_id: VideoId, title: String, volume: f64) -> Self {
        Self {
            video_id,
            title,
            playback: PlaybackState::new(volume),
            max_watched: 0.0,
            seek_ceiling: 0.0,
            markers: Vec::new(),
            overlay: Overlay::Loading,
            controls_visible: false,
            completed: false,
        }
    }

    pub fn progress_fraction(&self) -> f64 {
        self.playback.progress_fraction()
    }

    /// Portion of the bar the learner has unlocked by watching.
    pub fn watched_fraction(&self) -> f64 {
        fraction(self.max_watched, self.playback.duration)
    }

    pub fn quiz(&self) -> Option<&QuizView> {
        match &self.overlay {
            Overlay::Quiz(quiz) => Some(quiz),
            _ => None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.overlay, Overlay::Fallback { .. })
    }
}

/// Controls show while the pointer is over the player or playback is
/// stopped, and never over a quiz or the fallback screen.
pub fn controls_visible(overlay: &Overlay, pointer_inside: bool, is_playing: bool) -> bool {
    match overlay {
        Overlay::None => pointer_inside || !is_playing,
        Overlay::Loading | Overlay::Quiz(_) | Overlay::Fallback { .. } => false,
    }
}

/// Platform fullscreen toggle.
pub trait FullscreenControl: Send {
    fn enter(&mut self) -> Result<(), PlayerError>;
    fn exit(&mut self) -> Result<(), PlayerError>;
}

/// For front-ends without a window to resize.
#[derive(Debug, Default)]
pub struct HeadlessFullscreen;

impl FullscreenControl for HeadlessFullscreen {
    fn enter(&mut self) -> Result<(), PlayerError> {
        debug!("Fullscreen requested on a headless front-end");
        Ok(())
    }

    fn exit(&mut self) -> Result<(), PlayerError> {
        Ok(())
    }
}
