//! Collaborator traits and error types.
//!
//! Two collaborators sit at the edge of the claim pipeline:
//! - [`WalletSigner`]: the embedded wallet / auth provider that owns keys
//! - [`RunApi`]: the backend transport (HTTP in production)

use async_trait::async_trait;

use crate::claim::Claim;
use crate::typed_data::TypedDataPayload;
use crate::types::{Address, ProgressSnapshot, Signature, SubmitRunResponse, SyncRequest};

// ============================================================================
// Error Types
// ============================================================================

/// Wallet signing failures. The run stays resubmittable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SigningError {
    #[error("no wallet connected")]
    WalletUnavailable,

    #[error("connected wallet {actual} does not match claim address {expected}")]
    AddressMismatch { expected: Address, actual: Address },

    #[error("signature request rejected by user")]
    UserRejected,

    #[error("wallet error: {0}")]
    Wallet(String),
}

/// Transport or backend failures. A rejected verdict is not an error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("network error: {0}")]
    Network(String),

    #[error("not authorized: {0}")]
    Unauthorized(String),

    #[error("backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("invalid response: {0}")]
    Decode(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl SubmissionError {
    /// Whether a caller-driven retry with backoff is reasonable.
    pub fn is_transient(&self) -> bool {
        match self {
            SubmissionError::Network(_) => true,
            SubmissionError::Backend { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

// ============================================================================
// Collaborators
// ============================================================================

/// External wallet that holds the runner's keys.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Currently connected account, if any.
    async fn current_address(&self) -> Option<Address>;

    /// Signs EIP-712 typed data (`eth_signTypedData_v4` semantics).
    async fn sign_typed_data(&self, payload: &TypedDataPayload) -> Result<Signature, SigningError>;
}

/// Backend run API.
///
/// Implementations perform exactly one request per call and never retry.
#[async_trait]
pub trait RunApi: Send + Sync {
    /// `POST /run/submit` with the claim fields and device hash.
    async fn submit_run(&self, claim: &Claim) -> Result<SubmitRunResponse, SubmissionError>;

    /// `POST /run/sync`.
    async fn sync_progress(&self, request: &SyncRequest)
    -> Result<ProgressSnapshot, SubmissionError>;
}
