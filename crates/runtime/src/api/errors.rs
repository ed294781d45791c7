//! Unified error types surfaced by the runtime API.
//!
//! Wraps session transition, signing and submission failures together with
//! worker coordination errors. None of them leave the session unrecoverable.
use thiserror::Error;
use tokio::sync::oneshot;

use client_claim_core::{SigningError, SubmissionError};
use run_core::TransitionError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("claim signing failed: {0}")]
    Signing(#[from] SigningError),

    #[error("claim submission failed: {0}")]
    Submission(#[from] SubmissionError),

    #[error("runtime was built without a claim submitter")]
    SubmitterNotConfigured,

    #[error("runtime requires a location sampler before building")]
    MissingSampler,

    #[error("session worker command channel closed")]
    CommandChannelClosed,

    #[error("session worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("session worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),
}

impl RuntimeError {
    /// Whether the finished run can be submitted again after this error.
    pub fn is_resubmittable(&self) -> bool {
        matches!(self, RuntimeError::Signing(_) | RuntimeError::Submission(_))
    }
}
