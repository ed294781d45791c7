//! Topic-based event bus implementation.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;

use super::types::{ClockEvent, LocationEvent, SessionEvent, SubmissionEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum Topic {
    /// Lifecycle transitions
    Session,
    /// Fixes and acquisition errors
    Location,
    /// Elapsed-time ticks
    Clock,
    /// Claim submission progress
    Submission,
}

/// Event wrapper that carries the typed event for its topic
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "topic", content = "event", rename_all = "camelCase")]
pub enum Event {
    Session(SessionEvent),
    Location(LocationEvent),
    Clock(ClockEvent),
    Submission(SubmissionEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Session(_) => Topic::Session,
            Event::Location(_) => Topic::Location,
            Event::Clock(_) => Topic::Clock,
            Event::Submission(_) => Topic::Submission,
        }
    }
}

struct Channels {
    session: broadcast::Sender<Event>,
    location: broadcast::Sender<Event>,
    clock: broadcast::Sender<Event>,
    submission: broadcast::Sender<Event>,
}

/// Topic-based event bus
///
/// Publishing is best-effort: events sent while nobody listens are dropped,
/// and slow subscribers observe `RecvError::Lagged`.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<Channels>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(128)
    }

    /// Creates a bus with `capacity` buffered events per topic.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            channels: Arc::new(Channels {
                session: broadcast::channel(capacity).0,
                location: broadcast::channel(capacity).0,
                clock: broadcast::channel(capacity).0,
                submission: broadcast::channel(capacity).0,
            }),
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Session => &self.channels.session,
            Topic::Location => &self.channels.location,
            Topic::Clock => &self.channels.clock,
            Topic::Submission => &self.channels.submission,
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.sender(topic).send(event).is_err() {
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.sender(topic).subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn routes_events_by_topic() {
        let bus = EventBus::new();
        let mut clock = bus.subscribe(Topic::Clock);
        let mut session = bus.subscribe(Topic::Session);

        bus.publish(Event::Session(SessionEvent::Discarded));
        bus.publish(Event::Clock(ClockEvent {
            elapsed_seconds: 1,
            avg_pace_seconds_per_km: None,
        }));

        assert_eq!(
            session.recv().await.unwrap(),
            Event::Session(SessionEvent::Discarded)
        );
        assert_eq!(clock.recv().await.unwrap().topic(), Topic::Clock);
        assert!(session.try_recv().is_err());
    }

    #[test]
    fn serializes_with_topic_tag() {
        let json = serde_json::to_value(Event::Clock(ClockEvent {
            elapsed_seconds: 61,
            avg_pace_seconds_per_km: Some(300.0),
        }))
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "topic": "clock",
                "event": {"elapsedSeconds": 61, "avgPaceSecondsPerKm": 300.0}
            })
        );

        let json = serde_json::to_value(Event::Session(SessionEvent::Discarded)).unwrap();
        assert_eq!(json["event"]["type"], "discarded");
    }

    #[test]
    fn publish_without_subscribers_is_harmless() {
        let bus = EventBus::with_capacity(0);
        bus.publish(Event::Submission(SubmissionEvent::Started));
        bus.publish(Event::Location(LocationEvent::Error {
            error: crate::sampler::AcquisitionError::Timeout,
        }));
    }
}
