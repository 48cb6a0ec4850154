use async_trait::async_trait;
use std::time::Duration;

use crate::utils::errors::PlayerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Media file played by a platform media element.
    Direct,
    /// Third-party hosted player with its own engine.
    Embedded,
}

/// How often a backend reports the playback position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickMode {
    /// One tick per native time update.
    Continuous,
    /// Position is sampled by a timer at the given interval.
    Polled(Duration),
}

impl TickMode {
    pub fn is_polled(&self) -> bool {
        matches!(self, TickMode::Polled(_))
    }
}

/// Normalized backend notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    /// Metadata is available. Emitted once per load.
    Ready { duration: f64 },
    Tick { time: f64 },
    Playing,
    Paused,
    Ended,
    Error(PlayerError),
}

/// Uniform contract over the playback backends.
///
/// All positions are seconds from the start of the media. `play`, `pause` and
/// `seek` only request a change; the resulting state arrives later through
/// [`TimeSource::next_event`].
#[async_trait]
pub trait TimeSource: Send {
    fn kind(&self) -> SourceKind;

    fn tick_mode(&self) -> TickMode;

    fn current_time(&self) -> f64;

    /// 0 until metadata has loaded.
    fn duration(&self) -> f64;

    /// Begin loading; `start_at` becomes the initial position once the media
    /// is ready.
    async fn load(&mut self, start_at: f64) -> Result<(), PlayerError>;

    async fn play(&mut self) -> Result<(), PlayerError>;

    async fn pause(&mut self) -> Result<(), PlayerError>;

    async fn seek(&mut self, target: f64) -> Result<(), PlayerError>;

    /// 0.0 to 1.0
    async fn set_volume(&mut self, volume: f64) -> Result<(), PlayerError>;

    async fn set_muted(&mut self, muted: bool) -> Result<(), PlayerError>;

    /// Next backend notification, `None` once the backend is gone.
    ///
    /// Cancel safe: dropping the future before completion loses no event.
    async fn next_event(&mut self) -> Option<SourceEvent>;

    /// Release timers, listeners and the underlying engine.
    async fn teardown(&mut self);
}
