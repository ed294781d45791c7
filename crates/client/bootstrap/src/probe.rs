//! Device attributes for a native host.
use std::env;
use std::thread;

use run_core::{DeviceAttributes, EnvironmentProbe};

/// Probe reading locale, timezone, platform and CPU count from the process.
///
/// Screen and touch attributes are left unset; a native host has no
/// viewport to report.
#[derive(Clone, Debug)]
pub struct HostProbe {
    user_agent: String,
}

impl HostProbe {
    pub fn new() -> Self {
        Self {
            user_agent: format!("stride/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for HostProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvironmentProbe for HostProbe {
    fn attributes(&self) -> Option<DeviceAttributes> {
        Some(DeviceAttributes {
            user_agent: Some(self.user_agent.clone()),
            language: non_empty_var("LANG").or_else(|| non_empty_var("LC_ALL")),
            platform: Some(format!("{}-{}", env::consts::OS, env::consts::ARCH)),
            screen_resolution: None,
            timezone: non_empty_var("TZ"),
            touch_support: None,
            vendor: None,
            hardware_concurrency: thread::available_parallelism()
                .ok()
                .and_then(|n| u32::try_from(n.get()).ok()),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use run_core::DeviceFingerprint;

    #[test]
    fn host_always_reports_an_environment() {
        let probe = HostProbe::new();
        let attributes = probe.attributes().unwrap();
        assert!(attributes.user_agent.unwrap().starts_with("stride/"));
        assert!(attributes.platform.unwrap().contains(env::consts::OS));

        let fingerprint = DeviceFingerprint::compute(&probe);
        assert!(!fingerprint.hash.is_sentinel());
    }
}
