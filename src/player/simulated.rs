//! Clock driven stand-ins for the platform media element and the embedded
//! player engine. Positions advance with `tokio::time`, so tests running on a
//! paused clock stay deterministic.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace};
use url::Url;

use super::direct::{ElementEvent, MediaElement};
use super::embedded::{EmbeddedEvent, EmbeddedPlayerApi};
use crate::utils::errors::PlayerError;

const ENDED_CHECK_INTERVAL: Duration = Duration::from_millis(100);

/// Position of a virtual playhead that advances in real (tokio) time while
/// playing.
#[derive(Debug, Clone)]
pub struct Playhead {
    offset: f64,
    anchor: Option<Instant>,
    duration: f64,
}

impl Playhead {
    pub fn new(duration: f64) -> Self {
        Self {
            offset: 0.0,
            anchor: None,
            duration: duration.max(0.0),
        }
    }

    pub fn position(&self) -> f64 {
        match self.anchor {
            Some(anchor) => (self.offset + anchor.elapsed().as_secs_f64()).min(self.duration),
            None => self.offset,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn at_end(&self) -> bool {
        self.position() >= self.duration
    }

    pub fn play(&mut self) {
        if self.anchor.is_none() {
            if self.at_end() {
                self.offset = 0.0;
            }
            self.anchor = Some(Instant::now());
        }
    }

    pub fn pause(&mut self) {
        self.offset = self.position();
        self.anchor = None;
    }

    pub fn seek(&mut self, target: f64) {
        self.offset = target.clamp(0.0, self.duration);
        if self.anchor.is_some() {
            self.anchor = Some(Instant::now());
        }
    }
}

/// Knobs shared by both simulated backends.
#[derive(Debug, Clone)]
pub struct SimulatedMedia {
    pub duration: f64,
    pub load_delay: Duration,
    /// Interval between time updates of the simulated media element.
    pub frame_interval: Duration,
    /// Fail loading with this message (direct) or error code (embedded).
    pub fail_load: Option<String>,
}

impl SimulatedMedia {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            load_delay: Duration::from_millis(50),
            frame_interval: Duration::from_millis(250),
            fail_load: None,
        }
    }

    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail_load = Some(message.into());
        self
    }
}

fn lock(playhead: &Mutex<Playhead>) -> MutexGuard<'_, Playhead> {
    // A poisoned playhead still holds a usable position
    playhead.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Simulated media element firing time updates every frame interval.
pub struct SimulatedMediaElement {
    media: SimulatedMedia,
    playhead: Arc<Mutex<Playhead>>,
    events: mpsc::UnboundedSender<ElementEvent>,
    driver: Option<JoinHandle<()>>,
    volume: f64,
    muted: bool,
}

impl SimulatedMediaElement {
    pub fn new(media: SimulatedMedia) -> (Self, mpsc::UnboundedReceiver<ElementEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let playhead = Arc::new(Mutex::new(Playhead::new(media.duration)));
        (
            Self {
                media,
                playhead,
                events,
                driver: None,
                volume: 1.0,
                muted: false,
            },
            rx,
        )
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    fn spawn_driver(&mut self) {
        let media = self.media.clone();
        let playhead = Arc::clone(&self.playhead);
        let events = self.events.clone();

        self.driver = Some(tokio::spawn(async move {
            tokio::time::sleep(media.load_delay).await;
            if let Some(message) = media.fail_load {
                let _ = events.send(ElementEvent::Error { message });
                return;
            }
            if events
                .send(ElementEvent::LoadedMetadata {
                    duration: media.duration,
                })
                .is_err()
            {
                return;
            }

            let mut frames = tokio::time::interval(media.frame_interval);
            frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                frames.tick().await;
                let (playing, position, ended) = {
                    let mut head = lock(&playhead);
                    let playing = head.is_playing();
                    let ended = playing && head.at_end();
                    if ended {
                        head.pause();
                    }
                    (playing, head.position(), ended)
                };
                if !playing {
                    continue;
                }
                let mut sent = events.send(ElementEvent::TimeUpdate {
                    current_time: position,
                });
                if ended {
                    sent = sent
                        .and_then(|_| events.send(ElementEvent::Pause))
                        .and_then(|_| events.send(ElementEvent::Ended));
                }
                if sent.is_err() {
                    break;
                }
            }
        }));
    }
}

impl MediaElement for SimulatedMediaElement {
    fn load(&mut self, url: &Url) -> Result<(), PlayerError> {
        debug!("Simulated media element loading {}", url);
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
        *lock(&self.playhead) = Playhead::new(self.media.duration);
        self.spawn_driver();
        Ok(())
    }

    fn play(&mut self) -> Result<(), PlayerError> {
        let started = {
            let mut head = lock(&self.playhead);
            let was_playing = head.is_playing();
            head.play();
            !was_playing
        };
        if started {
            let _ = self.events.send(ElementEvent::Play);
        }
        Ok(())
    }

    fn pause(&mut self) {
        let stopped = {
            let mut head = lock(&self.playhead);
            let was_playing = head.is_playing();
            head.pause();
            was_playing
        };
        if stopped {
            let _ = self.events.send(ElementEvent::Pause);
        }
    }

    fn set_current_time(&mut self, seconds: f64) {
        let position = {
            let mut head = lock(&self.playhead);
            head.seek(seconds);
            head.position()
        };
        trace!("Simulated element seeked to {:.2}", position);
        let _ = self.events.send(ElementEvent::TimeUpdate {
            current_time: position,
        });
    }

    fn current_time(&self) -> f64 {
        lock(&self.playhead).position()
    }

    fn duration(&self) -> f64 {
        if self.driver.is_some() {
            self.media.duration
        } else {
            f64::NAN
        }
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn release(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
        lock(&self.playhead).pause();
    }
}

impl Drop for SimulatedMediaElement {
    fn drop(&mut self) {
        self.release();
    }
}

#[derive(Default)]
struct EngineState {
    loaded: bool,
    volume: u8,
    muted: bool,
    tasks: Vec<JoinHandle<()>>,
    destroyed: bool,
}

/// Simulated embedded engine: state changes as numeric codes, no position
/// updates.
pub struct SimulatedEmbeddedPlayer {
    media: SimulatedMedia,
    playhead: Arc<Mutex<Playhead>>,
    events: mpsc::UnboundedSender<EmbeddedEvent>,
    state: Mutex<EngineState>,
}

impl SimulatedEmbeddedPlayer {
    pub fn new(media: SimulatedMedia) -> (Arc<Self>, mpsc::UnboundedReceiver<EmbeddedEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let playhead = Arc::new(Mutex::new(Playhead::new(media.duration)));
        let player = Arc::new(Self {
            media,
            playhead,
            events,
            state: Mutex::new(EngineState {
                volume: 100,
                ..EngineState::default()
            }),
        });
        (player, rx)
    }

    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn volume(&self) -> u8 {
        self.state().volume
    }

    pub fn is_muted(&self) -> bool {
        self.state().muted
    }

    pub fn is_destroyed(&self) -> bool {
        self.state().destroyed
    }

    fn send_state(&self, code: i32) {
        let _ = self.events.send(EmbeddedEvent::StateChange(code));
    }
}

impl EmbeddedPlayerApi for SimulatedEmbeddedPlayer {
    fn load_video(&self, video_id: &str, start_seconds: u64) -> Result<(), PlayerError> {
        debug!(
            "Simulated embedded player loading {} at {}s",
            video_id, start_seconds
        );
        let media = self.media.clone();
        let playhead = Arc::clone(&self.playhead);
        let events = self.events.clone();

        let init = tokio::spawn(async move {
            tokio::time::sleep(media.load_delay).await;
            if media.fail_load.is_some() {
                let _ = events.send(EmbeddedEvent::Error { code: 100 });
                return;
            }
            lock(&playhead).seek(start_seconds as f64);
            let _ = events.send(EmbeddedEvent::Ready);
            let _ = events.send(EmbeddedEvent::StateChange(5));
        });

        let playhead = Arc::clone(&self.playhead);
        let events = self.events.clone();
        let watcher = tokio::spawn(async move {
            let mut checks = tokio::time::interval(ENDED_CHECK_INTERVAL);
            checks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                checks.tick().await;
                let ended = {
                    let mut head = lock(&playhead);
                    let ended = head.is_playing() && head.at_end();
                    if ended {
                        head.pause();
                    }
                    ended
                };
                if ended && events.send(EmbeddedEvent::StateChange(0)).is_err() {
                    break;
                }
            }
        });

        let mut state = self.state();
        state.loaded = true;
        state.tasks.push(init);
        state.tasks.push(watcher);
        Ok(())
    }

    fn play_video(&self) {
        let started = {
            let mut head = lock(&self.playhead);
            let was_playing = head.is_playing();
            head.play();
            !was_playing
        };
        if started {
            self.send_state(1);
        }
    }

    fn pause_video(&self) {
        let stopped = {
            let mut head = lock(&self.playhead);
            let was_playing = head.is_playing();
            head.pause();
            was_playing
        };
        if stopped {
            self.send_state(2);
        }
    }

    fn seek_to(&self, seconds: f64, _allow_seek_ahead: bool) {
        lock(&self.playhead).seek(seconds);
    }

    fn current_time(&self) -> f64 {
        lock(&self.playhead).position()
    }

    fn duration(&self) -> f64 {
        if self.state().loaded {
            self.media.duration
        } else {
            0.0
        }
    }

    fn mute(&self) {
        self.state().muted = true;
    }

    fn un_mute(&self) {
        self.state().muted = false;
    }

    fn set_volume(&self, volume: u8) {
        self.state().volume = volume.min(100);
    }

    fn destroy(&self) {
        let mut state = self.state();
        state.destroyed = true;
        for task in state.tasks.drain(..) {
            task.abort();
        }
        lock(&self.playhead).pause();
    }
}
