//! Device fingerprinting for multi-account and device-farm detection.
//!
//! A fingerprint is the SHA-256 of a fixed, versioned attribute layout:
//!
//! ```text
//! user_agent|language|platform|screen_resolution|timezone|touch_support|vendor|hardware_concurrency
//! ```
//!
//! Missing attributes are written as [`MISSING_ATTRIBUTE`] so the hash is
//! always computable. Environments without any client surface (server-side
//! rendering, headless jobs) get [`DeviceHash::SENTINEL`].

use std::fmt;

use sha2::{Digest, Sha256};

/// Layout version of [`DeviceAttributes::canonical_string`].
pub const FINGERPRINT_VERSION: u8 = 1;

/// Placeholder written for attributes the environment does not expose.
pub const MISSING_ATTRIBUTE: &str = "unknown";

const DELIMITER: &str = "|";

/// Device and environment attributes collected for fingerprinting.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeviceAttributes {
    pub user_agent: Option<String>,
    pub language: Option<String>,
    pub platform: Option<String>,
    /// `WIDTHxHEIGHT`
    pub screen_resolution: Option<String>,
    pub timezone: Option<String>,
    pub touch_support: Option<bool>,
    pub vendor: Option<String>,
    pub hardware_concurrency: Option<u32>,
}

impl DeviceAttributes {
    /// Joins the attributes in fixed field order.
    ///
    /// Delimiters inside values are backslash-escaped so distinct attribute
    /// sets never share a canonical string.
    pub fn canonical_string(&self) -> String {
        let text = |value: &Option<String>| {
            value
                .as_deref()
                .map_or_else(|| MISSING_ATTRIBUTE.into(), escape)
        };
        let fields = [
            text(&self.user_agent),
            text(&self.language),
            text(&self.platform),
            text(&self.screen_resolution),
            text(&self.timezone),
            self.touch_support
                .map_or_else(|| MISSING_ATTRIBUTE.into(), |t| t.to_string()),
            text(&self.vendor),
            self.hardware_concurrency
                .map_or_else(|| MISSING_ATTRIBUTE.into(), |n| n.to_string()),
        ];
        fields.join(DELIMITER)
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace(DELIMITER, "\\|")
}

/// Source of [`DeviceAttributes`].
///
/// Returns `None` when there is no client environment to inspect.
pub trait EnvironmentProbe: Send + Sync {
    fn attributes(&self) -> Option<DeviceAttributes>;
}

/// Probe with fixed attributes, for embedding platforms that collect them
/// up front and for tests.
#[derive(Clone, Debug, Default)]
pub struct StaticProbe(pub Option<DeviceAttributes>);

impl EnvironmentProbe for StaticProbe {
    fn attributes(&self) -> Option<DeviceAttributes> {
        self.0.clone()
    }
}

/// 256-bit device fingerprint.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceHash(pub [u8; 32]);

impl DeviceHash {
    /// Fingerprint reported when no client environment is available.
    pub const SENTINEL: DeviceHash = DeviceHash([0u8; 32]);

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_sentinel(&self) -> bool {
        *self == Self::SENTINEL
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for DeviceHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceHash({})", self.to_hex())
    }
}

impl fmt::Display for DeviceHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for DeviceHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl std::str::FromStr for DeviceHash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s.trim_start_matches("0x"), &mut bytes)?;
        Ok(DeviceHash(bytes))
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for DeviceHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// A computed fingerprint together with the attributes it was derived from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceFingerprint {
    pub version: u8,
    pub attributes: Option<DeviceAttributes>,
    pub hash: DeviceHash,
}

impl DeviceFingerprint {
    /// Collects attributes from `probe` and hashes them.
    pub fn compute(probe: &dyn EnvironmentProbe) -> Self {
        match probe.attributes() {
            Some(attributes) => Self::from_attributes(attributes),
            None => Self {
                version: FINGERPRINT_VERSION,
                attributes: None,
                hash: DeviceHash::SENTINEL,
            },
        }
    }

    pub fn from_attributes(attributes: DeviceAttributes) -> Self {
        let digest = Sha256::digest(attributes.canonical_string().as_bytes());
        Self {
            version: FINGERPRINT_VERSION,
            attributes: Some(attributes),
            hash: DeviceHash(digest.into()),
        }
    }
}
