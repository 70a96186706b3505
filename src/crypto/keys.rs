// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Key Pair Generation and Parsing
//!
//! Key material is secp256k1, exchanged as 0x-prefixed hex strings:
//! - public keys: 33-byte compressed SEC1 (65-byte uncompressed accepted on input)
//! - private keys: 32-byte big-endian scalar
//!
//! Addresses are derived the Ethereum way: the last 20 bytes of the
//! Keccak-256 hash of the uncompressed public key (without the 0x04 prefix).

use super::CryptoError;
use k256::{elliptic_curve::sec1::ToEncodedPoint, PublicKey, SecretKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tiny_keccak::{Hasher, Keccak};

/// Public/private key pair as hex strings
///
/// The private key is only ever used locally as a decrypt parameter;
/// `Debug` redacts it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPair {
    pub public_key: String,
    pub private_key: String,
}

impl KeyPair {
    /// Generate fresh key material from the OS random number generator
    pub fn generate() -> Self {
        let secret = SecretKey::random(&mut OsRng);
        let public = secret.public_key();

        Self {
            public_key: encode_public_key(&public),
            private_key: format!("0x{}", hex::encode(secret.to_bytes())),
        }
    }

    /// Ethereum-style address belonging to this key pair
    pub fn address(&self) -> Result<String, CryptoError> {
        address_from_public_key(&self.public_key)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Strip an optional 0x prefix and decode hex
pub(crate) fn decode_hex(value: &str, key_type: &str) -> Result<Vec<u8>, CryptoError> {
    let trimmed = value.trim();
    let hex_str = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if hex_str.is_empty() {
        return Err(CryptoError::InvalidKey {
            key_type: key_type.to_string(),
            reason: "key is empty".to_string(),
        });
    }

    hex::decode(hex_str).map_err(|e| CryptoError::InvalidKey {
        key_type: key_type.to_string(),
        reason: format!("hex decode error: {}", e),
    })
}

/// Parse a hex public key (33 bytes compressed or 65 bytes uncompressed)
pub fn parse_public_key(value: &str) -> Result<PublicKey, CryptoError> {
    let bytes = decode_hex(value, "public_key")?;

    if bytes.len() != 33 && bytes.len() != 65 {
        return Err(CryptoError::InvalidKey {
            key_type: "public_key".to_string(),
            reason: format!("expected 33 or 65 bytes, got {}", bytes.len()),
        });
    }

    PublicKey::from_sec1_bytes(&bytes).map_err(|e| CryptoError::InvalidKey {
        key_type: "public_key".to_string(),
        reason: format!("not a secp256k1 point: {}", e),
    })
}

/// Parse a hex private key (32 bytes)
pub fn parse_private_key(value: &str) -> Result<SecretKey, CryptoError> {
    let bytes = decode_hex(value, "private_key")?;

    if bytes.len() != 32 {
        return Err(CryptoError::InvalidKey {
            key_type: "private_key".to_string(),
            reason: format!("expected 32 bytes, got {}", bytes.len()),
        });
    }

    SecretKey::from_slice(&bytes).map_err(|e| CryptoError::InvalidKey {
        key_type: "private_key".to_string(),
        reason: format!("not a valid secp256k1 scalar: {}", e),
    })
}

/// Compressed 0x-prefixed hex encoding of a public key
pub fn encode_public_key(public_key: &PublicKey) -> String {
    format!(
        "0x{}",
        hex::encode(public_key.to_encoded_point(true).as_bytes())
    )
}

/// Derive the 0x-prefixed lowercase address of a public key
pub fn address_of(public_key: &PublicKey) -> String {
    let encoded_point = public_key.to_encoded_point(false);
    let uncompressed = encoded_point.as_bytes();

    let mut hasher = Keccak::v256();
    let mut hash = [0u8; 32];
    hasher.update(&uncompressed[1..]);
    hasher.finalize(&mut hash);

    format!("0x{}", hex::encode(&hash[12..]))
}

/// Derive an address from a hex public key
pub fn address_from_public_key(public_key: &str) -> Result<String, CryptoError> {
    Ok(address_of(&parse_public_key(public_key)?))
}

/// Derive an address from a hex private key
pub fn address_from_private_key(private_key: &str) -> Result<String, CryptoError> {
    Ok(address_of(&parse_private_key(private_key)?.public_key()))
}
