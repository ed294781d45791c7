//! Subcommand implementations.

mod fingerprint;
mod replay;
mod sync;

pub use fingerprint::Fingerprint;
pub use replay::Replay;
pub use sync::SyncProgress;
