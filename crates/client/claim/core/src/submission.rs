//! Claim submission and verdict interpretation.

use std::sync::Arc;

use crate::claim::Claim;
use crate::traits::{RunApi, SubmissionError};
use crate::typed_data::{ProgressUpdateMessage, TypedDataDomain, signing_digest};
use crate::types::{
    Address, ProgressSnapshot, ReasonCode, SubmissionResult, SubmitRunResponse, SyncRequest,
    VerificationStatus, WireStatus,
};

/// Relay-signed progress together with the digest it was signed over.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncedProgress {
    pub snapshot: ProgressSnapshot,
    /// `ProgressUpdate` digest, present when a signing domain is known.
    pub digest: Option<[u8; 32]>,
}

/// Sends claims to the backend and interprets its verdicts.
///
/// One request per call. Retrying a failed submission is the caller's call.
#[derive(Clone)]
pub struct SubmissionClient {
    api: Arc<dyn RunApi>,
}

impl SubmissionClient {
    pub fn new(api: Arc<dyn RunApi>) -> Self {
        Self { api }
    }

    /// Submits a claim, consuming it.
    ///
    /// A rejected run is `Ok` with [`VerificationStatus::Rejected`].
    pub async fn submit(&self, claim: Claim) -> Result<SubmissionResult, SubmissionError> {
        tracing::info!(
            "Submitting claim: {:.0} m in {} s, {} points (nonce {})",
            claim.summary().distance_meters,
            claim.summary().duration_seconds,
            claim.summary().path.len(),
            claim.nonce()
        );

        let response = self.api.submit_run(&claim).await.inspect_err(|e| {
            tracing::warn!("Claim submission failed: {}", e);
        })?;

        let result = map_response(response)?;
        match result.status {
            VerificationStatus::Verified => tracing::info!(
                "Run verified (run id {:?}, xp {:?})",
                result.run_id,
                result.xp_earned
            ),
            VerificationStatus::Pending => {
                tracing::info!("Run accepted for review (run id {:?})", result.run_id)
            }
            VerificationStatus::Rejected => {
                tracing::info!("Run rejected: {:?}", result.reason_code)
            }
        }
        Ok(result)
    }

    /// Fetches the relay-signed progress snapshot for `user`.
    pub async fn sync_progress(
        &self,
        user: Address,
        domain: Option<&TypedDataDomain>,
    ) -> Result<SyncedProgress, SubmissionError> {
        let snapshot = self.api.sync_progress(&SyncRequest { user }).await?;
        tracing::debug!(
            "Synced progress for {}: level {}, xp {}",
            user,
            snapshot.level,
            snapshot.xp
        );

        let digest = domain.map(|domain| {
            let message = ProgressUpdateMessage {
                user,
                level: snapshot.level,
                xp: snapshot.xp,
                total_distance: snapshot.total_distance,
                nonce: snapshot.nonce,
            };
            signing_digest(domain, &message)
        });

        Ok(SyncedProgress { snapshot, digest })
    }
}

/// Interprets a raw `/run/submit` body.
///
/// `status` wins when present. Without it, `success` alone decides: `true`
/// is a verification, `false` is a backend error carrying the server message.
pub fn map_response(response: SubmitRunResponse) -> Result<SubmissionResult, SubmissionError> {
    let status = match response.status {
        Some(WireStatus::Verified) => VerificationStatus::Verified,
        Some(WireStatus::Submitted) => VerificationStatus::Pending,
        Some(WireStatus::Rejected) => VerificationStatus::Rejected,
        Some(WireStatus::Unrecognized) => {
            return Err(SubmissionError::Decode(
                "unrecognized verification status".to_string(),
            ));
        }
        None if response.success => VerificationStatus::Verified,
        None => {
            return Err(SubmissionError::Backend {
                status: 200,
                message: response
                    .message
                    .unwrap_or_else(|| "submission failed".to_string()),
            });
        }
    };

    Ok(SubmissionResult {
        accepted: status == VerificationStatus::Verified,
        status,
        run_id: response.run_id,
        xp_earned: response.xp_earned,
        reason_code: response.reason_code.as_deref().map(ReasonCode::parse),
        message: response.message,
    })
}
