//! Topic-based event bus for session events.
//!
//! The session worker publishes every observable change to a topic, and
//! consumers (a recording screen, the CLI, tests) subscribe only to the
//! topics they render.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{ClockEvent, LocationEvent, SessionEvent, SubmissionEvent};
