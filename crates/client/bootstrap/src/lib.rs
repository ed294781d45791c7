//! Shared bootstrap utilities for client front-ends.
//!
//! Provides configuration loading, host fingerprinting and runtime setup that
//! can be reused by the CLI or any other embedding.
pub mod builder;
pub mod config;
pub mod probe;

pub use builder::RuntimeBuilder;
pub use config::ClientConfig;
pub use probe::HostProbe;
