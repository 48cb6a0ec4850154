use std::time::Duration;
use tracing::info;
use url::Url;

use super::direct::DirectSource;
use super::embedded::EmbeddedSource;
use super::simulated::{SimulatedEmbeddedPlayer, SimulatedMedia, SimulatedMediaElement};
use super::traits::TimeSource;
use crate::models::MediaSource;
use crate::utils::errors::PlayerError;

/// Builds the platform backends for a lesson.
///
/// `duration_hint` is the duration advertised by the lesson record; real
/// backends learn the duration from the media itself.
pub trait BackendFactory: Send + Sync {
    fn direct(&self, url: &Url, duration_hint: f64) -> Result<Box<dyn TimeSource>, PlayerError>;

    fn embedded(
        &self,
        video_id: &str,
        duration_hint: f64,
    ) -> Result<Box<dyn TimeSource>, PlayerError>;
}

/// Pick the backend matching the lesson's media source.
pub fn create_source(
    factory: &dyn BackendFactory,
    source: &MediaSource,
    duration_hint: f64,
) -> Result<Box<dyn TimeSource>, PlayerError> {
    match source {
        MediaSource::Direct { url } => {
            info!("Creating direct media backend for {}", url);
            factory.direct(url, duration_hint)
        }
        MediaSource::Embedded { video_id } => {
            info!("Creating embedded player backend for {}", video_id);
            factory.embedded(video_id, duration_hint)
        }
    }
}

/// Backends driven by the simulated media element and engine.
#[derive(Debug, Clone)]
pub struct SimulatedBackendFactory {
    poll_interval: Duration,
    load_delay: Duration,
    fail_load: Option<String>,
}

impl SimulatedBackendFactory {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            load_delay: Duration::from_millis(50),
            fail_load: None,
        }
    }

    pub fn with_load_delay(mut self, load_delay: Duration) -> Self {
        self.load_delay = load_delay;
        self
    }

    /// Every backend built by this factory fails to load.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail_load = Some(message.into());
        self
    }

    fn media(&self, duration: f64) -> SimulatedMedia {
        SimulatedMedia {
            duration,
            load_delay: self.load_delay,
            fail_load: self.fail_load.clone(),
            ..SimulatedMedia::new(duration)
        }
    }
}

impl BackendFactory for SimulatedBackendFactory {
    fn direct(&self, url: &Url, duration_hint: f64) -> Result<Box<dyn TimeSource>, PlayerError> {
        if duration_hint <= 0.0 {
            return Err(PlayerError::InvalidSource(format!(
                "simulated media needs a duration: {}",
                url
            )));
        }
        let (element, events) = SimulatedMediaElement::new(self.media(duration_hint));
        Ok(Box::new(DirectSource::new(
            Box::new(element),
            events,
            url.clone(),
        )))
    }

    fn embedded(
        &self,
        video_id: &str,
        duration_hint: f64,
    ) -> Result<Box<dyn TimeSource>, PlayerError> {
        if duration_hint <= 0.0 {
            return Err(PlayerError::InvalidSource(format!(
                "simulated media needs a duration: {}",
                video_id
            )));
        }
        let (engine, events) = SimulatedEmbeddedPlayer::new(self.media(duration_hint));
        Ok(Box::new(EmbeddedSource::new(
            engine,
            events,
            video_id,
            self.poll_interval,
        )))
    }
}
