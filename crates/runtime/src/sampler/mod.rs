//! Location sampling.
//!
//! A [`GeoSampler`] wraps the platform's continuous location watch. Each
//! `start` hands out a fresh single-consumer [`SampleStream`]; the session
//! worker drains it and drops it on `stop`, so nothing pushed after that point
//! can reach the session.
//!
//! Implementations:
//! - [`ChannelSampler`]: bridge for a platform layer that pushes fixes
//! - [`ReplaySampler`]: replays a recorded track in (scaled) real time
//! - [`UnsupportedSampler`]: hosts without any location capability

mod channel;
mod replay;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use run_core::GeoPosition;

pub use channel::{ChannelSampler, FixSender};
pub use replay::{ReplaySampler, TrackError};

/// Location acquisition failures. None of them end a session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum AcquisitionError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("position unavailable: {0}")]
    PositionUnavailable(String),

    #[error("timed out waiting for a position fix")]
    Timeout,

    #[error("location services are not supported on this platform")]
    Unsupported,
}

/// One item of a location watch.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleEvent {
    Fix(GeoPosition),
    Error(AcquisitionError),
}

/// Receiving half of an active watch.
pub type SampleStream = mpsc::UnboundedReceiver<SampleEvent>;

/// Watch options passed to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    pub high_accuracy: bool,
    /// Oldest cached fix the platform may return. Zero forces a fresh fix.
    pub maximum_age: Duration,
    /// How long to wait for a fix before reporting [`AcquisitionError::Timeout`].
    pub timeout: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            maximum_age: Duration::ZERO,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Continuous location source.
pub trait GeoSampler: Send {
    /// Begins observation.
    ///
    /// # Errors
    ///
    /// Returns [`AcquisitionError::Unsupported`] immediately when the platform
    /// has no location capability.
    fn start(&mut self, options: &WatchOptions) -> Result<SampleStream, AcquisitionError>;

    /// Releases the watch. Safe to call when not started.
    fn stop(&mut self);
}

impl<S: GeoSampler + ?Sized> GeoSampler for Box<S> {
    fn start(&mut self, options: &WatchOptions) -> Result<SampleStream, AcquisitionError> {
        (**self).start(options)
    }

    fn stop(&mut self) {
        (**self).stop()
    }
}

/// Sampler for hosts without location services.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedSampler;

impl GeoSampler for UnsupportedSampler {
    fn start(&mut self, _options: &WatchOptions) -> Result<SampleStream, AcquisitionError> {
        Err(AcquisitionError::Unsupported)
    }

    fn stop(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_watch_options() {
        let options = WatchOptions::default();
        assert!(options.high_accuracy);
        assert_eq!(options.maximum_age, Duration::ZERO);
        assert_eq!(options.timeout, Duration::from_secs(10));
    }

    #[test]
    fn unsupported_sampler_fails_fast() {
        let mut sampler = UnsupportedSampler;
        assert_eq!(
            sampler.start(&WatchOptions::default()).unwrap_err(),
            AcquisitionError::Unsupported
        );
        sampler.stop();
        sampler.stop();
    }
}
