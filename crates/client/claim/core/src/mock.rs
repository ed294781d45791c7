//! In-memory wallet and backend doubles.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::claim::Claim;
use crate::traits::{RunApi, SigningError, SubmissionError, WalletSigner};
use crate::typed_data::TypedDataPayload;
use crate::types::{
    Address, ProgressSnapshot, Signature, SubmitRunResponse, SyncRequest, WireStatus,
};

/// Wallet double that "signs" by echoing the digest.
#[derive(Clone, Default)]
pub struct MockWallet {
    address: Option<Address>,
    reject: bool,
    payloads: Arc<Mutex<Vec<TypedDataPayload>>>,
}

impl MockWallet {
    pub fn connected(address: Address) -> Self {
        Self {
            address: Some(address),
            ..Self::default()
        }
    }

    pub fn disconnected() -> Self {
        Self::default()
    }

    /// Makes every signature request fail with [`SigningError::UserRejected`].
    pub fn rejecting(mut self) -> Self {
        self.reject = true;
        self
    }

    /// Deterministic signature this wallet returns for `digest`.
    pub fn signature_for(digest: &[u8; 32]) -> Signature {
        let mut bytes = digest.to_vec();
        bytes.extend_from_slice(digest);
        bytes.push(27);
        Signature(bytes)
    }

    pub fn last_payload(&self) -> Option<TypedDataPayload> {
        self.payloads.lock().unwrap().last().cloned()
    }

    pub fn sign_requests(&self) -> usize {
        self.payloads.lock().unwrap().len()
    }
}

#[async_trait]
impl WalletSigner for MockWallet {
    async fn current_address(&self) -> Option<Address> {
        self.address
    }

    async fn sign_typed_data(&self, payload: &TypedDataPayload) -> Result<Signature, SigningError> {
        self.payloads.lock().unwrap().push(payload.clone());
        if self.reject {
            return Err(SigningError::UserRejected);
        }
        Ok(Self::signature_for(&payload.digest))
    }
}

/// Backend double recording every submitted claim.
///
/// Answers `VERIFIED` unless told otherwise.
#[derive(Clone)]
pub struct MockRunApi {
    submitted: Arc<Mutex<Vec<Claim>>>,
    submit_response: Arc<Mutex<Result<SubmitRunResponse, SubmissionError>>>,
    sync_response: Arc<Mutex<Result<ProgressSnapshot, SubmissionError>>>,
    latency: Option<Duration>,
}

impl MockRunApi {
    pub fn new() -> Self {
        Self {
            submitted: Arc::new(Mutex::new(Vec::new())),
            submit_response: Arc::new(Mutex::new(Ok(SubmitRunResponse {
                success: true,
                run_id: Some("mock-run".to_string()),
                status: Some(WireStatus::Verified),
                xp_earned: Some(10),
                reason_code: None,
                message: None,
            }))),
            sync_response: Arc::new(Mutex::new(Err(SubmissionError::Backend {
                status: 404,
                message: "no progress recorded".to_string(),
            }))),
            latency: None,
        }
    }

    /// Delays every response, for exercising in-flight submissions.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn respond_with(&self, response: Result<SubmitRunResponse, SubmissionError>) {
        *self.submit_response.lock().unwrap() = response;
    }

    pub fn sync_with(&self, response: Result<ProgressSnapshot, SubmissionError>) {
        *self.sync_response.lock().unwrap() = response;
    }

    pub fn submitted(&self) -> Vec<Claim> {
        self.submitted.lock().unwrap().clone()
    }
}

impl Default for MockRunApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RunApi for MockRunApi {
    async fn submit_run(&self, claim: &Claim) -> Result<SubmitRunResponse, SubmissionError> {
        self.submitted.lock().unwrap().push(claim.clone());
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.submit_response.lock().unwrap().clone()
    }

    async fn sync_progress(
        &self,
        _request: &SyncRequest,
    ) -> Result<ProgressSnapshot, SubmissionError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.sync_response.lock().unwrap().clone()
    }
}
