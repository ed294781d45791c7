//! Public runtime API surface.
//!
//! Types exposed to consumers of the runtime crate: the session handle, its
//! read-only snapshot and the unified error type.

pub mod errors;
pub mod handle;

pub use errors::{Result, RuntimeError};
pub use handle::{SessionHandle, SessionSnapshot};
