//! Run claim assembly, wallet signing and backend submission.
//!
//! # Pipeline
//!
//! ```text
//! RunSummary ──► ClaimBuilder ──► Claim ──► SubmissionClient ──► SubmissionResult
//!                    │                            │
//!                    ▼                            ▼
//!              WalletSigner                    RunApi
//!          (EIP-712 signature)          (HTTP in client-claim-http)
//! ```
//!
//! The crate owns no keys and performs no I/O of its own. Both collaborators
//! are traits so the runtime can be exercised against the in-memory doubles
//! in [`mock`] (enabled by the `mock` feature).

pub mod claim;
pub mod submission;
pub mod traits;
pub mod typed_data;
pub mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use claim::{Claim, ClaimBuilder, ClaimConfig, ClaimSummary, path_hash};
pub use submission::{SubmissionClient, SyncedProgress, map_response};
pub use traits::{RunApi, SigningError, SubmissionError, WalletSigner};
pub use typed_data::{
    ProgressUpdateMessage, RunClaimMessage, TypedDataDomain, TypedDataPayload, TypedStruct,
    keccak256, signing_digest,
};
pub use types::{
    Address, ParseHexError, ProgressSnapshot, ReasonCode, Signature, SubmissionResult,
    SubmitRunResponse, SyncRequest, VerificationStatus, WireStatus,
};

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockRunApi, MockWallet};
