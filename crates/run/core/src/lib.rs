//! Deterministic run-tracking logic shared across clients.
//!
//! `run-core` defines the canonical recording rules (geodesic distance, path
//! accumulation, the session state machine, pace and device fingerprinting)
//! as pure APIs. No clocks, threads or I/O live here: the runtime crate drives
//! [`RunSession`] with samples and ticks, and claim crates consume the
//! resulting [`RunSummary`].
pub mod fingerprint;
pub mod geo;
pub mod pace;
pub mod path;
pub mod session;
pub mod simplify;

pub use fingerprint::{
    DeviceAttributes, DeviceFingerprint, DeviceHash, EnvironmentProbe, FINGERPRINT_VERSION,
    MISSING_ATTRIBUTE, StaticProbe,
};
pub use geo::{EARTH_RADIUS_M, GeoPosition, PositionError, haversine_m, path_distance};
pub use pace::{
    MIN_PACE_DISTANCE_M, PACE_PLACEHOLDER, average_pace, format_distance_km, format_duration,
    format_pace,
};
pub use path::PathAccumulator;
pub use session::{RunSession, RunState, RunSummary, SessionOp, TransitionError};
pub use simplify::{Simplified, simplify, simplify_to_budget};
