//! Worker tasks that back the runtime orchestration.
//!
//! The session worker owns the run state and serializes every mutation, while
//! the claim pipeline runs submissions off the worker so a slow backend never
//! stalls sampling.

mod pipeline;
mod session;

pub use pipeline::ClaimPipeline;
pub use session::{Command, SessionWorker};
