//! Async shell around the run-tracking core.
//!
//! This crate drives a [`run_core::RunSession`] from a location sampler and a
//! wall-clock tick, and submits finished runs through `client-claim-core`.
//! Consumers embed [`Runtime`] and talk to the session through
//! [`SessionHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides the topic-based event bus
//! - [`sampler`] defines the location source abstraction and its implementations
//! - `workers` keeps background tasks internal to the crate
pub mod api;
pub mod events;
pub mod runtime;
pub mod sampler;

mod workers;

pub use api::{Result, RuntimeError, SessionHandle, SessionSnapshot};
pub use events::{ClockEvent, Event, EventBus, LocationEvent, SessionEvent, SubmissionEvent, Topic};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
pub use sampler::{
    AcquisitionError, ChannelSampler, FixSender, GeoSampler, ReplaySampler, SampleEvent,
    SampleStream, TrackError, UnsupportedSampler, WatchOptions,
};
