//! Builds the recording runtime from a [`ClientConfig`].
use std::sync::Arc;

use anyhow::{Context, Result};
use client_claim_core::{ClaimBuilder, RunApi, WalletSigner};
use client_claim_http::HttpRunApi;
use run_core::EnvironmentProbe;
use runtime::{GeoSampler, Runtime};

use crate::config::ClientConfig;
use crate::probe::HostProbe;

/// Assembles sampler, backend, signer and probe into a [`Runtime`].
pub struct RuntimeBuilder {
    config: ClientConfig,
    sampler: Option<Box<dyn GeoSampler>>,
    api: Option<Arc<dyn RunApi>>,
    signer: Option<Arc<dyn WalletSigner>>,
    probe: Arc<dyn EnvironmentProbe>,
    submissions: bool,
}

impl RuntimeBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            sampler: None,
            api: None,
            signer: None,
            probe: Arc::new(HostProbe::new()),
            submissions: true,
        }
    }

    /// Location source for the session (required).
    pub fn sampler(mut self, sampler: impl GeoSampler + 'static) -> Self {
        self.sampler = Some(Box::new(sampler));
        self
    }

    /// Replace the HTTP backend (e.g. with an in-memory double).
    pub fn api(mut self, api: Arc<dyn RunApi>) -> Self {
        self.api = Some(api);
        self
    }

    /// Wallet used when a signing domain is configured.
    pub fn signer(mut self, signer: Arc<dyn WalletSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn environment_probe(mut self, probe: Arc<dyn EnvironmentProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Record-only runtime; `submit` reports that no submitter is configured.
    pub fn without_submissions(mut self) -> Self {
        self.submissions = false;
        self
    }

    pub async fn build(self) -> Result<Runtime> {
        let sampler = self.sampler.context("a location sampler is required")?;

        let mut builder = Runtime::builder()
            .config(self.config.runtime.clone())
            .environment_probe(self.probe);

        if self.submissions {
            let api = match self.api {
                Some(api) => api,
                None => {
                    tracing::debug!("Using backend at {}", self.config.api.base_url);
                    let http = HttpRunApi::new(self.config.api.clone())
                        .context("failed to create backend client")?;
                    Arc::new(http)
                }
            };

            if self.config.claims.signing_domain.is_some() && self.signer.is_none() {
                tracing::warn!("Signing domain configured without a wallet; submissions will fail");
            }
            let mut claims = ClaimBuilder::new(self.config.claims.clone());
            if let Some(signer) = self.signer {
                claims = claims.with_signer(signer);
            }
            builder = builder.claims(claims, api);
        }

        let runtime = builder
            .sampler(sampler)
            .build()
            .await
            .context("failed to start runtime")?;

        tracing::info!("Runtime built");
        Ok(runtime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_claim_core::{Address, MockRunApi, VerificationStatus};
    use run_core::{GeoPosition, RunState, StaticProbe};
    use runtime::{ChannelSampler, RuntimeError};

    #[tokio::test]
    async fn builds_a_runtime_that_submits_through_the_given_api() {
        let (sampler, fixes) = ChannelSampler::new();
        let api = Arc::new(MockRunApi::new());
        let runtime = RuntimeBuilder::new(ClientConfig::default())
            .sampler(sampler)
            .api(api.clone())
            .environment_probe(Arc::new(StaticProbe(None)))
            .build()
            .await
            .unwrap();
        let handle = runtime.handle();

        assert_eq!(handle.start().await.unwrap(), RunState::Tracking);
        fixes.send_fix(GeoPosition::new(0.0, 0.0, 0).unwrap());
        fixes.send_fix(GeoPosition::new(0.0, 0.001, 60_000).unwrap());
        tokio::task::yield_now().await;
        handle.stop().await.unwrap();

        let result = handle.submit(Address([3; 20])).await.unwrap();
        assert_eq!(result.status, VerificationStatus::Verified);
        assert_eq!(api.submitted().len(), 1);

        drop(handle);
        runtime.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn record_only_runtime_rejects_submission() {
        let (sampler, _fixes) = ChannelSampler::new();
        let runtime = RuntimeBuilder::new(ClientConfig::default())
            .sampler(sampler)
            .without_submissions()
            .build()
            .await
            .unwrap();

        let err = runtime.handle().submit(Address::ZERO).await.unwrap_err();
        assert!(matches!(err, RuntimeError::SubmitterNotConfigured));
    }

    #[tokio::test]
    async fn sampler_is_required() {
        let err = RuntimeBuilder::new(ClientConfig::default())
            .without_submissions()
            .build()
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("sampler"));
    }
}
