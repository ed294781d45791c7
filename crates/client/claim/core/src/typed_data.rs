//! EIP-712 typed structured data.
//!
//! Only flat structs are supported (no nested struct members or arrays),
//! which covers every message this client signs or verifies:
//!
//! - [`RunClaimMessage`]: signed by the runner's wallet when submitting a claim
//! - [`ProgressUpdateMessage`]: signed by the backend relay in `/run/sync`
//!
//! ```text
//! typeHash   = keccak256("Name(type1 name1,type2 name2,...)")
//! hashStruct = keccak256(typeHash ‖ enc(value1) ‖ enc(value2) ‖ ...)
//! digest     = keccak256(0x19 ‖ 0x01 ‖ domainSeparator ‖ hashStruct)
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use sha3::{Digest, Keccak256};

use crate::types::Address;

/// Keccak-256 (the pre-standard SHA-3 variant used by Ethereum).
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// One member of a typed struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypedField {
    pub name: &'static str,
    pub kind: &'static str,
}

const fn field(name: &'static str, kind: &'static str) -> TypedField {
    TypedField { name, kind }
}

/// ABI value of a typed struct member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Address(Address),
    Uint(u64),
    Bytes32([u8; 32]),
    String(String),
}

impl Token {
    /// 32-byte EIP-712 encoding of this value.
    pub fn encode(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        match self {
            Token::Address(address) => word[12..].copy_from_slice(address.as_bytes()),
            Token::Uint(value) => word[24..].copy_from_slice(&value.to_be_bytes()),
            Token::Bytes32(bytes) => word = *bytes,
            Token::String(text) => word = keccak256(text.as_bytes()),
        }
        word
    }

    /// JSON form expected by `eth_signTypedData_v4`.
    pub fn to_json(&self) -> Value {
        match self {
            Token::Address(address) => Value::String(address.to_checksum()),
            Token::Uint(value) => Value::String(value.to_string()),
            Token::Bytes32(bytes) => Value::String(format!("0x{}", hex::encode(bytes))),
            Token::String(text) => Value::String(text.clone()),
        }
    }
}

/// A flat EIP-712 struct.
pub trait TypedStruct {
    const PRIMARY_TYPE: &'static str;
    const FIELDS: &'static [TypedField];

    /// Member values in [`Self::FIELDS`] order.
    fn tokens(&self) -> Vec<Token>;

    fn type_string() -> String {
        let members: Vec<String> = Self::FIELDS
            .iter()
            .map(|f| format!("{} {}", f.kind, f.name))
            .collect();
        format!("{}({})", Self::PRIMARY_TYPE, members.join(","))
    }

    fn type_hash() -> [u8; 32] {
        keccak256(Self::type_string().as_bytes())
    }

    fn hash_struct(&self) -> [u8; 32] {
        let tokens = self.tokens();
        let mut buf = Vec::with_capacity(32 * (tokens.len() + 1));
        buf.extend_from_slice(&Self::type_hash());
        for token in &tokens {
            buf.extend_from_slice(&token.encode());
        }
        keccak256(&buf)
    }

    fn message_json(&self) -> Value {
        let mut map = Map::new();
        for (f, token) in Self::FIELDS.iter().zip(self.tokens()) {
            map.insert(f.name.to_string(), token.to_json());
        }
        Value::Object(map)
    }

    fn fields_json() -> Value {
        Value::Array(
            Self::FIELDS
                .iter()
                .map(|f| json!({ "name": f.name, "type": f.kind }))
                .collect(),
        )
    }
}

/// Signing domain binding messages to a contract on a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedDataDomain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl TypedStruct for TypedDataDomain {
    const PRIMARY_TYPE: &'static str = "EIP712Domain";
    const FIELDS: &'static [TypedField] = &[
        field("name", "string"),
        field("version", "string"),
        field("chainId", "uint256"),
        field("verifyingContract", "address"),
    ];

    fn tokens(&self) -> Vec<Token> {
        vec![
            Token::String(self.name.clone()),
            Token::String(self.version.clone()),
            Token::Uint(self.chain_id),
            Token::Address(self.verifying_contract),
        ]
    }
}

impl TypedDataDomain {
    pub fn separator(&self) -> [u8; 32] {
        self.hash_struct()
    }
}

/// Final digest a wallet signs for `message` under `domain`.
pub fn signing_digest<T: TypedStruct>(domain: &TypedDataDomain, message: &T) -> [u8; 32] {
    let mut buf = [0u8; 66];
    buf[0] = 0x19;
    buf[1] = 0x01;
    buf[2..34].copy_from_slice(&domain.separator());
    buf[34..].copy_from_slice(&message.hash_struct());
    keccak256(&buf)
}

/// Everything an external wallet needs for `signTypedData(domain, types, message)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedDataPayload {
    pub domain: TypedDataDomain,
    pub primary_type: &'static str,
    /// `{ "EIP712Domain": [...], "<PrimaryType>": [...] }`
    pub types: Value,
    pub message: Value,
    /// Precomputed digest, for signers that sign raw hashes.
    pub digest: [u8; 32],
}

impl TypedDataPayload {
    pub fn new<T: TypedStruct>(domain: &TypedDataDomain, message: &T) -> Self {
        let mut types = Map::new();
        types.insert(
            TypedDataDomain::PRIMARY_TYPE.to_string(),
            TypedDataDomain::fields_json(),
        );
        types.insert(T::PRIMARY_TYPE.to_string(), T::fields_json());

        Self {
            domain: domain.clone(),
            primary_type: T::PRIMARY_TYPE,
            types: Value::Object(types),
            message: message.message_json(),
            digest: signing_digest(domain, message),
        }
    }

    /// Full `eth_signTypedData_v4` request object.
    pub fn to_json(&self) -> Value {
        json!({
            "domain": self.domain.message_json(),
            "types": self.types,
            "primaryType": self.primary_type,
            "message": self.message,
        })
    }
}

/// Claim fields the runner's wallet signs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunClaimMessage {
    pub user: Address,
    pub distance_meters: u64,
    pub duration_seconds: u64,
    pub path_hash: [u8; 32],
    pub device_hash: [u8; 32],
    pub nonce: u64,
}

impl TypedStruct for RunClaimMessage {
    const PRIMARY_TYPE: &'static str = "RunClaim";
    const FIELDS: &'static [TypedField] = &[
        field("user", "address"),
        field("distanceMeters", "uint256"),
        field("durationSeconds", "uint256"),
        field("pathHash", "bytes32"),
        field("deviceHash", "bytes32"),
        field("nonce", "uint256"),
    ];

    fn tokens(&self) -> Vec<Token> {
        vec![
            Token::Address(self.user),
            Token::Uint(self.distance_meters),
            Token::Uint(self.duration_seconds),
            Token::Bytes32(self.path_hash),
            Token::Bytes32(self.device_hash),
            Token::Uint(self.nonce),
        ]
    }
}

/// Progress snapshot fields the backend relay signs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdateMessage {
    pub user: Address,
    pub level: u64,
    pub xp: u64,
    pub total_distance: u64,
    pub nonce: u64,
}

impl TypedStruct for ProgressUpdateMessage {
    const PRIMARY_TYPE: &'static str = "ProgressUpdate";
    const FIELDS: &'static [TypedField] = &[
        field("user", "address"),
        field("level", "uint256"),
        field("xp", "uint256"),
        field("totalDistance", "uint256"),
        field("nonce", "uint256"),
    ];

    fn tokens(&self) -> Vec<Token> {
        vec![
            Token::Address(self.user),
            Token::Uint(self.level),
            Token::Uint(self.xp),
            Token::Uint(self.total_distance),
            Token::Uint(self.nonce),
        ]
    }
}
