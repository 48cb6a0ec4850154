use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, trace};

use super::traits::{SourceEvent, SourceKind, TickMode, TimeSource};
use crate::utils::errors::PlayerError;

/// Player states reported by the embedded engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddedState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
}

impl EmbeddedState {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(EmbeddedState::Unstarted),
            0 => Some(EmbeddedState::Ended),
            1 => Some(EmbeddedState::Playing),
            2 => Some(EmbeddedState::Paused),
            3 => Some(EmbeddedState::Buffering),
            5 => Some(EmbeddedState::Cued),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddedEvent {
    Ready,
    StateChange(i32),
    Error { code: i32 },
}

/// Human readable description of an engine error code.
pub fn describe_error_code(code: i32) -> &'static str {
    match code {
        2 => "invalid video id",
        5 => "the player could not play this video",
        100 => "video not found or private",
        101 | 150 => "the owner does not allow embedded playback",
        _ => "unknown player error",
    }
}

/// Handle to a third-party embedded player engine.
///
/// The engine reports state changes but no continuous position updates, so
/// the position has to be sampled.
pub trait EmbeddedPlayerApi: Send + Sync {
    /// Create the player for `video_id`, starting at a whole second offset.
    fn load_video(&self, video_id: &str, start_seconds: u64) -> Result<(), PlayerError>;
    fn play_video(&self);
    fn pause_video(&self);
    fn seek_to(&self, seconds: f64, allow_seek_ahead: bool);
    fn current_time(&self) -> f64;
    fn duration(&self) -> f64;
    fn mute(&self);
    fn un_mute(&self);
    /// 0 to 100
    fn set_volume(&self, volume: u8);
    fn destroy(&self);
}

/// Backend for videos hosted by the embedded player. Owns one polling task
/// while the engine reports `Playing`.
pub struct EmbeddedSource {
    engine: Arc<dyn EmbeddedPlayerApi>,
    events: mpsc::UnboundedReceiver<EmbeddedEvent>,
    video_id: String,
    poll_interval: Duration,
    tick_tx: mpsc::UnboundedSender<f64>,
    tick_rx: mpsc::UnboundedReceiver<f64>,
    poller: Option<JoinHandle<()>>,
    ready: bool,
    destroyed: bool,
}

impl EmbeddedSource {
    pub fn new(
        engine: Arc<dyn EmbeddedPlayerApi>,
        events: mpsc::UnboundedReceiver<EmbeddedEvent>,
        video_id: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        Self {
            engine,
            events,
            video_id: video_id.into(),
            poll_interval,
            tick_tx,
            tick_rx,
            poller: None,
            ready: false,
            destroyed: false,
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    fn start_poller(&mut self) {
        if self.is_polling() {
            return;
        }

        let engine = Arc::clone(&self.engine);
        let tick_tx = self.tick_tx.clone();
        let period = self.poll_interval;

        trace!("Starting position poller every {:?}", period);
        self.poller = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if tick_tx.send(engine.current_time()).is_err() {
                    break;
                }
            }
        }));
    }

    fn stop_poller(&mut self) {
        if let Some(handle) = self.poller.take() {
            trace!("Stopping position poller");
            handle.abort();
        }
        // Samples taken before the stop describe a position that is no longer current
        while self.tick_rx.try_recv().is_ok() {}
    }

    fn translate(&mut self, event: EmbeddedEvent) -> Option<SourceEvent> {
        match event {
            EmbeddedEvent::Ready => {
                if self.ready {
                    return None;
                }
                self.ready = true;
                let duration = self.engine.duration();
                debug!("Embedded player ready for {} ({:.1}s)", self.video_id, duration);
                Some(SourceEvent::Ready {
                    duration: if duration.is_finite() { duration.max(0.0) } else { 0.0 },
                })
            }
            EmbeddedEvent::StateChange(code) => match EmbeddedState::from_code(code)? {
                EmbeddedState::Playing => {
                    self.start_poller();
                    Some(SourceEvent::Playing)
                }
                EmbeddedState::Paused => {
                    self.stop_poller();
                    Some(SourceEvent::Paused)
                }
                EmbeddedState::Ended => {
                    self.stop_poller();
                    Some(SourceEvent::Ended)
                }
                EmbeddedState::Buffering | EmbeddedState::Cued | EmbeddedState::Unstarted => {
                    trace!("Embedded state {:?}", code);
                    None
                }
            },
            EmbeddedEvent::Error { code } => {
                let message = format!("{} (code {})", describe_error_code(code), code);
                error!("Embedded player error for {}: {}", self.video_id, message);
                self.stop_poller();
                let error = if self.ready {
                    PlayerError::Playback(message)
                } else {
                    PlayerError::EmbedInit(message)
                };
                Some(SourceEvent::Error(error))
            }
        }
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.stop_poller();
        self.engine.destroy();
    }
}

#[async_trait]
impl TimeSource for EmbeddedSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Embedded
    }

    fn tick_mode(&self) -> TickMode {
        TickMode::Polled(self.poll_interval)
    }

    fn current_time(&self) -> f64 {
        self.engine.current_time()
    }

    fn duration(&self) -> f64 {
        let duration = self.engine.duration();
        if duration.is_finite() { duration.max(0.0) } else { 0.0 }
    }

    async fn load(&mut self, start_at: f64) -> Result<(), PlayerError> {
        let start_seconds = start_at.max(0.0).floor() as u64;
        debug!(
            "Loading embedded video {} (start at {}s)",
            self.video_id, start_seconds
        );
        self.engine.load_video(&self.video_id, start_seconds)
    }

    async fn play(&mut self) -> Result<(), PlayerError> {
        if !self.ready {
            return Err(PlayerError::NotReady);
        }
        self.engine.play_video();
        Ok(())
    }

    async fn pause(&mut self) -> Result<(), PlayerError> {
        if self.ready {
            self.engine.pause_video();
        }
        Ok(())
    }

    async fn seek(&mut self, target: f64) -> Result<(), PlayerError> {
        if !self.ready {
            return Err(PlayerError::NotReady);
        }
        self.engine.seek_to(target.max(0.0), true);
        Ok(())
    }

    async fn set_volume(&mut self, volume: f64) -> Result<(), PlayerError> {
        let scaled = (volume.clamp(0.0, 1.0) * 100.0).round() as u8;
        self.engine.set_volume(scaled);
        Ok(())
    }

    async fn set_muted(&mut self, muted: bool) -> Result<(), PlayerError> {
        if muted {
            self.engine.mute();
        } else {
            self.engine.un_mute();
        }
        Ok(())
    }

    async fn next_event(&mut self) -> Option<SourceEvent> {
        loop {
            tokio::select! {
                event = self.events.recv() => {
                    if let Some(event) = self.translate(event?) {
                        return Some(event);
                    }
                }
                Some(time) = self.tick_rx.recv() => {
                    return Some(SourceEvent::Tick { time });
                }
            }
        }
    }

    async fn teardown(&mut self) {
        debug!("Tearing down embedded player for {}", self.video_id);
        self.destroy();
        self.events.close();
    }
}

impl Drop for EmbeddedSource {
    fn drop(&mut self) {
        self.destroy();
    }
}
