use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use client_claim_core::{
    Address, ClaimBuilder, SubmissionClient, SubmissionError, SubmissionResult, SyncedProgress,
};
use run_core::{DeviceFingerprint, EnvironmentProbe, RunSummary};

use crate::api::Result;

/// Fingerprint → claim → signature → backend, for one finished run.
pub struct ClaimPipeline {
    builder: ClaimBuilder,
    client: SubmissionClient,
    probe: Arc<dyn EnvironmentProbe>,
}

impl ClaimPipeline {
    pub fn new(
        builder: ClaimBuilder,
        client: SubmissionClient,
        probe: Arc<dyn EnvironmentProbe>,
    ) -> Self {
        Self {
            builder,
            client,
            probe,
        }
    }

    pub async fn submit(&self, run: RunSummary, wallet: Address) -> Result<SubmissionResult> {
        let fingerprint = DeviceFingerprint::compute(self.probe.as_ref());
        if fingerprint.hash.is_sentinel() {
            tracing::debug!("No client environment available; using sentinel device hash");
        }

        let nonce = rand::random::<u64>();
        let claim = self
            .builder
            .build(run, wallet, &fingerprint, nonce, now_ms())
            .await?;

        Ok(self.client.submit(claim).await?)
    }

    pub async fn sync_progress(
        &self,
        wallet: Address,
    ) -> std::result::Result<SyncedProgress, SubmissionError> {
        self.client
            .sync_progress(wallet, self.builder.config().signing_domain.as_ref())
            .await
    }
}

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
