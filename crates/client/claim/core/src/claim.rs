//! Claim assembly.
//!
//! A [`Claim`] is built once from a finished run and is immutable afterwards.
//! [`ClaimBuilder`] decides whether the path needs down-sampling and, when a
//! signing domain is configured, asks the wallet for an EIP-712 signature
//! over the claim fields. It never touches key material.

use std::sync::Arc;

use serde::{Serialize, Serializer};

use run_core::{DeviceFingerprint, DeviceHash, GeoPosition, RunSummary, simplify_to_budget};

use crate::traits::{SigningError, WalletSigner};
use crate::typed_data::{RunClaimMessage, TypedDataDomain, TypedDataPayload, keccak256};
use crate::types::{Address, Signature};

/// Run totals as sent to the backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimSummary {
    pub distance_meters: f64,
    pub duration_seconds: u64,
    pub avg_pace_seconds_per_km: Option<f64>,
    pub started_at_ms: u64,
    pub path: Vec<GeoPosition>,
    /// `true` when `path` was down-sampled.
    pub path_simplified: bool,
    /// Point count before down-sampling.
    pub path_point_count: usize,
}

/// Immutable activity claim for a single completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    #[serde(flatten)]
    summary: ClaimSummary,
    device_hash: DeviceHash,
    wallet_address: Address,
    /// Decimal string, matching the signed `uint256` exactly.
    #[serde(serialize_with = "serialize_decimal")]
    nonce: u64,
    issued_at_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    signature: Option<Signature>,
}

impl Claim {
    pub fn summary(&self) -> &ClaimSummary {
        &self.summary
    }

    pub fn device_hash(&self) -> DeviceHash {
        self.device_hash
    }

    pub fn wallet_address(&self) -> Address {
        self.wallet_address
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn issued_at_ms(&self) -> u64 {
        self.issued_at_ms
    }

    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    /// Fields covered by the wallet signature.
    pub fn typed_message(&self) -> RunClaimMessage {
        RunClaimMessage {
            user: self.wallet_address,
            distance_meters: self.summary.distance_meters.round() as u64,
            duration_seconds: self.summary.duration_seconds,
            path_hash: path_hash(&self.summary.path),
            device_hash: *self.device_hash.as_bytes(),
            nonce: self.nonce,
        }
    }
}

/// JSON numbers lose precision above 2^53 in most JSON parsers.
fn serialize_decimal<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Keccak-256 over the transmitted path.
///
/// Each point contributes latitude and longitude as big-endian i64
/// micro-degrees ×10 (1e-7°) followed by the capture time as big-endian u64.
pub fn path_hash(path: &[GeoPosition]) -> [u8; 32] {
    let mut buf = Vec::with_capacity(path.len() * 24);
    for p in path {
        buf.extend_from_slice(&((p.latitude() * 1e7).round() as i64).to_be_bytes());
        buf.extend_from_slice(&((p.longitude() * 1e7).round() as i64).to_be_bytes());
        buf.extend_from_slice(&p.captured_at_ms().to_be_bytes());
    }
    keccak256(&buf)
}

/// Claim assembly settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimConfig {
    /// Paths longer than this are down-sampled.
    pub max_path_points: usize,
    /// Initial Douglas-Peucker tolerance (meters).
    pub simplify_tolerance_m: f64,
    /// When set, claims carry a wallet signature bound to this domain.
    pub signing_domain: Option<TypedDataDomain>,
}

impl Default for ClaimConfig {
    fn default() -> Self {
        Self {
            max_path_points: 1000,
            simplify_tolerance_m: 5.0,
            signing_domain: None,
        }
    }
}

/// Builds [`Claim`]s from finished runs.
#[derive(Clone)]
pub struct ClaimBuilder {
    config: ClaimConfig,
    signer: Option<Arc<dyn WalletSigner>>,
}

impl ClaimBuilder {
    pub fn new(config: ClaimConfig) -> Self {
        Self {
            config,
            signer: None,
        }
    }

    pub fn with_signer(mut self, signer: Arc<dyn WalletSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn config(&self) -> &ClaimConfig {
        &self.config
    }

    /// Assembles and, if configured, signs a claim.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError`] when signing is required and the wallet is
    /// missing, connected to another account, or refuses to sign.
    pub async fn build(
        &self,
        run: RunSummary,
        wallet_address: Address,
        fingerprint: &DeviceFingerprint,
        nonce: u64,
        issued_at_ms: u64,
    ) -> Result<Claim, SigningError> {
        let point_count = run.path.len();
        let reduced = simplify_to_budget(
            &run.path,
            self.config.max_path_points,
            self.config.simplify_tolerance_m,
        );
        if let Some(tolerance) = reduced.tolerance_m {
            tracing::debug!(
                "Path down-sampled from {} to {} points (tolerance {:.1} m)",
                point_count,
                reduced.points.len(),
                tolerance
            );
        }

        let mut claim = Claim {
            summary: ClaimSummary {
                distance_meters: run.total_distance_m,
                duration_seconds: run.elapsed_seconds,
                avg_pace_seconds_per_km: run.avg_pace_seconds_per_km,
                started_at_ms: run.started_at_ms,
                path_simplified: reduced.is_simplified(),
                path: reduced.points,
                path_point_count: point_count,
            },
            device_hash: fingerprint.hash,
            wallet_address,
            nonce,
            issued_at_ms,
            signature: None,
        };

        if let Some(domain) = &self.config.signing_domain {
            claim.signature = Some(self.sign(domain, &claim).await?);
        }

        Ok(claim)
    }

    async fn sign(&self, domain: &TypedDataDomain, claim: &Claim) -> Result<Signature, SigningError> {
        let signer = self.signer.as_ref().ok_or(SigningError::WalletUnavailable)?;

        let connected = signer
            .current_address()
            .await
            .ok_or(SigningError::WalletUnavailable)?;
        if connected != claim.wallet_address {
            return Err(SigningError::AddressMismatch {
                expected: claim.wallet_address,
                actual: connected,
            });
        }

        let payload = TypedDataPayload::new(domain, &claim.typed_message());
        tracing::debug!(
            "Requesting typed-data signature for claim nonce {} (digest 0x{})",
            claim.nonce,
            hex::encode(payload.digest)
        );
        signer.sign_typed_data(&payload).await
    }
}
