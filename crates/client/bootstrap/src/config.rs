//! Client configuration structures and loaders.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use client_claim_core::{Address, ClaimConfig, TypedDataDomain};
use client_claim_http::ApiConfig;
use runtime::RuntimeConfig;

const DEFAULT_DOMAIN_NAME: &str = "Stride";
const DEFAULT_DOMAIN_VERSION: &str = "1";

/// Configuration required to bootstrap a recording runtime.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub runtime: RuntimeConfig,
    pub claims: ClaimConfig,
    /// Directory for the log file; stderr only when unset.
    pub log_dir: Option<PathBuf>,
}

impl ClientConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `STRIDE_API_URL` - Backend base URL (default: `http://localhost:8080/api`)
    /// - `STRIDE_API_TOKEN` - Bearer token (default: none)
    /// - `STRIDE_API_TIMEOUT_SECS` - Request timeout (default: 15)
    /// - `GPS_TIMEOUT_SECS` - Fix watchdog timeout (default: 10)
    /// - `GPS_HIGH_ACCURACY` - Request high-accuracy fixes (default: true)
    /// - `PATH_MAX_POINTS` - Claim path point budget (default: 1000)
    /// - `PATH_TOLERANCE_M` - Initial simplification tolerance (default: 5.0)
    /// - `MIN_PACE_DISTANCE_M` - Distance before pace is reported (default: 10.0)
    /// - `SESSION_COMMAND_BUFFER` - Command queue size (default: 32)
    /// - `SESSION_EVENT_BUFFER` - Per-topic event capacity (default: 128)
    /// - `SIGNING_DOMAIN_NAME`, `SIGNING_DOMAIN_VERSION`, `SIGNING_CHAIN_ID`,
    ///   `SIGNING_CONTRACT` - Typed-data signing domain; signing stays off
    ///   unless both chain id and contract are set
    /// - `STRIDE_LOG_DIR` - Log file directory (default: none)
    pub fn from_env() -> Self {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary variable source.
    pub fn from_source(source: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        // Backend
        if let Some(url) = source("STRIDE_API_URL") {
            config.api.base_url = url;
        }
        config.api.token = source("STRIDE_API_TOKEN").filter(|token| !token.is_empty());
        if let Some(secs) = read_var::<u64>(&source, "STRIDE_API_TIMEOUT_SECS") {
            config.api.timeout = Duration::from_secs(secs.max(1));
        }

        // Location watch
        if let Some(secs) = read_var::<u64>(&source, "GPS_TIMEOUT_SECS") {
            config.runtime.watch_options.timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(high_accuracy) = read_var::<bool>(&source, "GPS_HIGH_ACCURACY") {
            config.runtime.watch_options.high_accuracy = high_accuracy;
        }

        // Session
        if let Some(meters) = read_var::<f64>(&source, "MIN_PACE_DISTANCE_M") {
            config.runtime.min_pace_distance_m = meters.max(0.0);
        }
        if let Some(capacity) = read_var::<usize>(&source, "SESSION_COMMAND_BUFFER") {
            config.runtime.command_buffer_size = capacity.max(1);
        }
        if let Some(capacity) = read_var::<usize>(&source, "SESSION_EVENT_BUFFER") {
            config.runtime.event_buffer_size = capacity.max(1);
        }

        // Claims
        if let Some(points) = read_var::<usize>(&source, "PATH_MAX_POINTS") {
            config.claims.max_path_points = points.max(2);
        }
        if let Some(tolerance) = read_var::<f64>(&source, "PATH_TOLERANCE_M")
            && tolerance > 0.0
        {
            config.claims.simplify_tolerance_m = tolerance;
        }
        config.claims.signing_domain = signing_domain(&source);

        config.log_dir = source("STRIDE_LOG_DIR").map(PathBuf::from);

        config
    }
}

fn signing_domain(source: &impl Fn(&str) -> Option<String>) -> Option<TypedDataDomain> {
    let chain_id = read_var::<u64>(source, "SIGNING_CHAIN_ID");
    let contract = read_var::<Address>(source, "SIGNING_CONTRACT");
    let (Some(chain_id), Some(verifying_contract)) = (chain_id, contract) else {
        if source("SIGNING_CHAIN_ID").is_some() || source("SIGNING_CONTRACT").is_some() {
            tracing::warn!("Incomplete or invalid signing domain; claims will be unsigned");
        }
        return None;
    };

    Some(TypedDataDomain {
        name: source("SIGNING_DOMAIN_NAME").unwrap_or_else(|| DEFAULT_DOMAIN_NAME.to_string()),
        version: source("SIGNING_DOMAIN_VERSION")
            .unwrap_or_else(|| DEFAULT_DOMAIN_VERSION.to_string()),
        chain_id,
        verifying_contract,
    })
}

fn read_var<T>(source: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    source(key)?.trim().parse().ok()
}
