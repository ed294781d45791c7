//! Common types for claim signing and submission.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::typed_data::keccak256;

/// Errors raised when parsing hex-encoded wire values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseHexError {
    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

fn decode_hex(text: &str) -> Result<Vec<u8>, ParseHexError> {
    let stripped = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    hex::decode(stripped).map_err(|e| ParseHexError::InvalidHex(e.to_string()))
}

/// 20-byte EVM account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Mixed-case EIP-55 checksum encoding.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = keccak256(lower.as_bytes());
        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl FromStr for Address {
    type Err = ParseHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = decode_hex(s)?;
        let array: [u8; 20] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| ParseHexError::InvalidLength {
                expected: 20,
                actual: bytes.len(),
            })?;
        Ok(Address(array))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Opaque signature bytes returned by a wallet or relay (usually 65-byte r‖s‖v).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Signature(pub Vec<u8>);

impl Signature {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }
}

impl FromStr for Signature {
    type Err = ParseHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_hex(s).map(Signature)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.to_hex())
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Backend verdict for a submitted claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum VerificationStatus {
    /// Accepted and credited.
    Verified,
    /// Rejected by anti-cheat or validation. A verdict, not an error.
    Rejected,
    /// Received, verdict not yet available.
    Pending,
}

/// Reason attached by the backend to a rejected or flagged run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReasonCode {
    DistanceImplausible,
    SpeedImplausible,
    DeviceFlagged,
    DuplicateSubmission,
    InvalidSignature,
    PathTooShort,
    Unknown(String),
}

impl ReasonCode {
    pub fn parse(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "DISTANCE_IMPLAUSIBLE" => ReasonCode::DistanceImplausible,
            "SPEED_IMPLAUSIBLE" => ReasonCode::SpeedImplausible,
            "DEVICE_FLAGGED" => ReasonCode::DeviceFlagged,
            "DUPLICATE_SUBMISSION" => ReasonCode::DuplicateSubmission,
            "INVALID_SIGNATURE" => ReasonCode::InvalidSignature,
            "PATH_TOO_SHORT" => ReasonCode::PathTooShort,
            _ => ReasonCode::Unknown(code.to_string()),
        }
    }

    /// Text suitable for showing to the runner.
    pub fn user_message(&self) -> &'static str {
        match self {
            ReasonCode::DistanceImplausible => {
                "The recorded distance looks implausible for this run."
            }
            ReasonCode::SpeedImplausible => "Your pace was faster than humanly possible.",
            ReasonCode::DeviceFlagged => "This device has been flagged. Contact support.",
            ReasonCode::DuplicateSubmission => "This run was already submitted.",
            ReasonCode::InvalidSignature => "The claim signature could not be verified.",
            ReasonCode::PathTooShort => "The run is too short to be credited.",
            ReasonCode::Unknown(_) => "The run could not be verified.",
        }
    }
}

/// Interpreted outcome of a claim submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionResult {
    pub accepted: bool,
    pub status: VerificationStatus,
    pub run_id: Option<String>,
    pub xp_earned: Option<u64>,
    pub reason_code: Option<ReasonCode>,
    pub message: Option<String>,
}

impl SubmissionResult {
    /// Message for display: server text first, then the reason code's text.
    pub fn display_message(&self) -> Option<String> {
        self.message
            .clone()
            .or_else(|| self.reason_code.as_ref().map(|r| r.user_message().to_string()))
    }
}

/// Wire status values used by `POST /run/submit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WireStatus {
    Verified,
    Submitted,
    Rejected,
    #[serde(other)]
    Unrecognized,
}

/// Raw `POST /run/submit` response body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRunResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub status: Option<WireStatus>,
    #[serde(default)]
    pub xp_earned: Option<u64>,
    #[serde(default)]
    pub reason_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `POST /run/sync` request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub user: Address,
}

/// Relay-signed progress snapshot returned by `POST /run/sync`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub level: u64,
    pub xp: u64,
    pub total_distance: u64,
    pub nonce: u64,
    pub signature: Signature,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_parses_with_and_without_prefix() {
        let a: Address = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".parse().unwrap();
        let b: Address = "5AAEB6053F3E94C9B9A09F33669435E7EF1BEAED".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed");
    }

    #[test]
    fn address_rejects_wrong_length() {
        assert_eq!(
            "0x1234".parse::<Address>(),
            Err(ParseHexError::InvalidLength {
                expected: 20,
                actual: 2
            })
        );
        assert!(matches!(
            "0xzz".parse::<Address>(),
            Err(ParseHexError::InvalidHex(_))
        ));
    }

    #[test]
    fn eip55_checksum() {
        let a: Address = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".parse().unwrap();
        assert_eq!(a.to_checksum(), "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
        let b: Address = "0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359".parse().unwrap();
        assert_eq!(b.to_checksum(), "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359");
    }

    #[test]
    fn reason_codes() {
        assert_eq!(
            ReasonCode::parse("distance_implausible"),
            ReasonCode::DistanceImplausible
        );
        assert_eq!(ReasonCode::parse("DEVICE_FLAGGED"), ReasonCode::DeviceFlagged);
        assert_eq!(
            ReasonCode::parse("GEOFENCE"),
            ReasonCode::Unknown("GEOFENCE".into())
        );
    }

    #[test]
    fn display_message_prefers_server_text() {
        let mut result = SubmissionResult {
            accepted: false,
            status: VerificationStatus::Rejected,
            run_id: None,
            xp_earned: None,
            reason_code: Some(ReasonCode::DeviceFlagged),
            message: None,
        };
        assert_eq!(
            result.display_message().as_deref(),
            Some("This device has been flagged. Contact support.")
        );
        result.message = Some("too fast".into());
        assert_eq!(result.display_message().as_deref(), Some("too fast"));
    }

    #[test]
    fn submit_response_tolerates_missing_and_unknown_fields() {
        let body = r#"{"success":true,"runId":"r-1","status":"ARCHIVED","extra":1}"#;
        let resp: SubmitRunResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.status, Some(WireStatus::Unrecognized));
        assert_eq!(resp.run_id.as_deref(), Some("r-1"));
        assert_eq!(resp.xp_earned, None);
    }
}
