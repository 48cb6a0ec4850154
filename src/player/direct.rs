use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, error, trace};
use url::Url;

use super::traits::{SourceEvent, SourceKind, TickMode, TimeSource};
use crate::utils::errors::PlayerError;

/// Notifications raised by a platform media element.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementEvent {
    LoadedMetadata { duration: f64 },
    TimeUpdate { current_time: f64 },
    Play,
    Pause,
    Ended,
    Error { message: String },
}

/// A platform media element able to play a single file.
pub trait MediaElement: Send {
    fn load(&mut self, url: &Url) -> Result<(), PlayerError>;
    fn play(&mut self) -> Result<(), PlayerError>;
    fn pause(&mut self);
    fn set_current_time(&mut self, seconds: f64);
    fn current_time(&self) -> f64;
    /// Not finite until metadata has loaded.
    fn duration(&self) -> f64;
    fn set_volume(&mut self, volume: f64);
    fn set_muted(&mut self, muted: bool);
    fn release(&mut self);
}

/// Backend for directly playable media. Ticks once per native time update.
pub struct DirectSource {
    element: Box<dyn MediaElement>,
    events: mpsc::UnboundedReceiver<ElementEvent>,
    url: Url,
    pending_start: Option<f64>,
    duration: f64,
    ready: bool,
    released: bool,
}

impl DirectSource {
    pub fn new(
        element: Box<dyn MediaElement>,
        events: mpsc::UnboundedReceiver<ElementEvent>,
        url: Url,
    ) -> Self {
        Self {
            element,
            events,
            url,
            pending_start: None,
            duration: 0.0,
            ready: false,
            released: false,
        }
    }

    /// Translate one element event; `None` means nothing to report.
    fn translate(&mut self, event: ElementEvent) -> Option<SourceEvent> {
        match event {
            ElementEvent::LoadedMetadata { duration } => {
                if self.ready {
                    return None;
                }
                self.ready = true;
                self.duration = if duration.is_finite() && duration > 0.0 {
                    duration
                } else {
                    0.0
                };
                if let Some(start) = self.pending_start.take() {
                    let start = if self.duration > 0.0 {
                        start.min(self.duration)
                    } else {
                        start
                    };
                    debug!("Applying initial position {:.1}s", start);
                    self.element.set_current_time(start);
                }
                Some(SourceEvent::Ready {
                    duration: self.duration,
                })
            }
            ElementEvent::TimeUpdate { current_time } => {
                trace!("timeupdate {:.2}", current_time);
                Some(SourceEvent::Tick { time: current_time })
            }
            ElementEvent::Play => Some(SourceEvent::Playing),
            ElementEvent::Pause => Some(SourceEvent::Paused),
            ElementEvent::Ended => Some(SourceEvent::Ended),
            ElementEvent::Error { message } => {
                error!("Media element error for {}: {}", self.url, message);
                let error = if self.ready {
                    PlayerError::Playback(message)
                } else {
                    PlayerError::MediaLoad(message)
                };
                Some(SourceEvent::Error(error))
            }
        }
    }
}

#[async_trait]
impl TimeSource for DirectSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Direct
    }

    fn tick_mode(&self) -> TickMode {
        TickMode::Continuous
    }

    fn current_time(&self) -> f64 {
        self.element.current_time()
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    async fn load(&mut self, start_at: f64) -> Result<(), PlayerError> {
        debug!("Loading direct media {} (start at {:.1}s)", self.url, start_at);
        if start_at > 0.0 {
            self.pending_start = Some(start_at);
        }
        self.element.load(&self.url)
    }

    async fn play(&mut self) -> Result<(), PlayerError> {
        if !self.ready {
            return Err(PlayerError::NotReady);
        }
        self.element.play()
    }

    async fn pause(&mut self) -> Result<(), PlayerError> {
        self.element.pause();
        Ok(())
    }

    async fn seek(&mut self, target: f64) -> Result<(), PlayerError> {
        if !self.ready {
            return Err(PlayerError::NotReady);
        }
        self.element.set_current_time(target.max(0.0));
        Ok(())
    }

    async fn set_volume(&mut self, volume: f64) -> Result<(), PlayerError> {
        self.element.set_volume(volume.clamp(0.0, 1.0));
        Ok(())
    }

    async fn set_muted(&mut self, muted: bool) -> Result<(), PlayerError> {
        self.element.set_muted(muted);
        Ok(())
    }

    async fn next_event(&mut self) -> Option<SourceEvent> {
        loop {
            let event = self.events.recv().await?;
            if let Some(event) = self.translate(event) {
                return Some(event);
            }
        }
    }

    async fn teardown(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        debug!("Releasing direct media element");
        self.element.pause();
        self.element.release();
        self.events.close();
    }
}

impl Drop for DirectSource {
    fn drop(&mut self) {
        if !self.released {
            self.element.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Calls {
        seeks: Vec<f64>,
        released: usize,
    }

    struct FakeElement {
        calls: Arc<Mutex<Calls>>,
    }

    impl MediaElement for FakeElement {
        fn load(&mut self, _url: &Url) -> Result<(), PlayerError> {
            Ok(())
        }
        fn play(&mut self) -> Result<(), PlayerError> {
            Ok(())
        }
        fn pause(&mut self) {}
        fn set_current_time(&mut self, seconds: f64) {
            self.calls.lock().unwrap().seeks.push(seconds);
        }
        fn current_time(&self) -> f64 {
            0.0
        }
        fn duration(&self) -> f64 {
            f64::NAN
        }
        fn set_volume(&mut self, _volume: f64) {}
        fn set_muted(&mut self, _muted: bool) {}
        fn release(&mut self) {
            self.calls.lock().unwrap().released += 1;
        }
    }

    fn source() -> (
        DirectSource,
        mpsc::UnboundedSender<ElementEvent>,
        Arc<Mutex<Calls>>,
    ) {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let (tx, rx) = mpsc::unbounded_channel();
        let element = FakeElement {
            calls: calls.clone(),
        };
        let url = Url::parse("https://cdn.example.com/a.mp4").unwrap();
        (DirectSource::new(Box::new(element), rx, url), tx, calls)
    }

    #[tokio::test]
    async fn test_initial_seek_applied_on_metadata() {
        let (mut source, tx, calls) = source();
        source.load(42.0).await.unwrap();
        assert_eq!(source.seek(10.0).await, Err(PlayerError::NotReady));

        tx.send(ElementEvent::LoadedMetadata { duration: 600.0 })
            .unwrap();
        assert_eq!(
            source.next_event().await,
            Some(SourceEvent::Ready { duration: 600.0 })
        );
        assert_eq!(calls.lock().unwrap().seeks, vec![42.0]);
        assert_eq!(source.duration(), 600.0);
    }

    #[tokio::test]
    async fn test_events_are_translated() {
        let (mut source, tx, _calls) = source();
        source.load(0.0).await.unwrap();
        tx.send(ElementEvent::LoadedMetadata { duration: 60.0 })
            .unwrap();
        tx.send(ElementEvent::LoadedMetadata { duration: 60.0 })
            .unwrap();
        tx.send(ElementEvent::TimeUpdate { current_time: 1.25 })
            .unwrap();
        tx.send(ElementEvent::Ended).unwrap();

        assert!(matches!(
            source.next_event().await,
            Some(SourceEvent::Ready { .. })
        ));
        // duplicate metadata is swallowed
        assert_eq!(
            source.next_event().await,
            Some(SourceEvent::Tick { time: 1.25 })
        );
        assert_eq!(source.next_event().await, Some(SourceEvent::Ended));
    }

    #[tokio::test]
    async fn test_error_before_ready_is_load_failure() {
        let (mut source, tx, _calls) = source();
        source.load(0.0).await.unwrap();
        tx.send(ElementEvent::Error {
            message: "404".into(),
        })
        .unwrap();
        assert_eq!(
            source.next_event().await,
            Some(SourceEvent::Error(PlayerError::MediaLoad("404".into())))
        );
    }

    #[tokio::test]
    async fn test_teardown_releases_once() {
        let (mut source, _tx, calls) = source();
        source.teardown().await;
        source.teardown().await;
        drop(source);
        assert_eq!(calls.lock().unwrap().released, 1);
    }
}
