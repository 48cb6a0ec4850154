use super::types::{EventPayload, EventType, SessionEvent};
use crate::gate::Verdict;
use crate::models::{Checkpoint, VideoId};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tracing::trace;

/// Receives the events of a chosen set of types.
pub struct EventSubscriber {
    receiver: broadcast::Receiver<SessionEvent>,
    types: Vec<EventType>,
}

impl EventSubscriber {
    /// Next matching event. Lagging subscribers skip what they missed.
    pub async fn recv(&mut self) -> Result<SessionEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.types.contains(&event.event_type) => return Ok(event),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    trace!("Subscriber lagged, skipped {} event(s)", skipped);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Broadcasts session events to any number of observers
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
    counts: Arc<RwLock<HashMap<EventType, u64>>>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);

        Self {
            sender,
            counts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn publish(&self, event: SessionEvent) {
        trace!("Publishing event: {}", event.event_type.as_str());

        *self
            .counts
            .write()
            .await
            .entry(event.event_type)
            .or_insert(0) += 1;

        // no subscribers is normal
        let _ = self.sender.send(event);
    }

    pub fn subscribe_to_types(&self, types: Vec<EventType>) -> EventSubscriber {
        EventSubscriber {
            receiver: self.sender.subscribe(),
            types,
        }
    }

    /// Count of published events of one type
    pub async fn count(&self, event_type: EventType) -> u64 {
        self.counts
            .read()
            .await
            .get(&event_type)
            .copied()
            .unwrap_or(0)
    }

    pub async fn emit(&self, event_type: EventType, video_id: &VideoId, payload: EventPayload) {
        self.publish(SessionEvent::new(event_type, video_id.clone(), payload))
            .await;
    }

    pub async fn emit_quiz_presented(&self, video_id: &VideoId, checkpoint: &Checkpoint) {
        self.emit(
            EventType::QuizPresented,
            video_id,
            EventPayload::Quiz {
                checkpoint_id: checkpoint.id.clone(),
                trigger_time: checkpoint.trigger_time,
                verdict: None,
            },
        )
        .await;
    }

    pub async fn emit_quiz_resolved(
        &self,
        video_id: &VideoId,
        checkpoint: &Checkpoint,
        verdict: Verdict,
    ) {
        self.emit(
            EventType::QuizResolved,
            video_id,
            EventPayload::Quiz {
                checkpoint_id: checkpoint.id.clone(),
                trigger_time: checkpoint.trigger_time,
                verdict: Some(verdict),
            },
        )
        .await;
    }

    pub async fn emit_playback(
        &self,
        event_type: EventType,
        video_id: &VideoId,
        position: f64,
        duration: f64,
    ) {
        self.emit(
            event_type,
            video_id,
            EventPayload::Playback { position, duration },
        )
        .await;
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
