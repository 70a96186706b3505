// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! EIP-191 Signatures and Address Recovery
//!
//! Wallets sign with `personal_sign`, which hashes
//! `"\x19Ethereum Signed Message:\n" + len(message) + message` with
//! Keccak-256 and produces a 65-byte `r || s || v` signature. Verification
//! recovers the signer's public key from the signature and compares the
//! derived address, so no external call is needed.

use super::keys::{address_of, decode_hex};
use super::CryptoError;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use k256::PublicKey;
use tiny_keccak::{Hasher, Keccak};

/// Create EIP-191 message hash
/// prefix = "\x19Ethereum Signed Message:\n" + len(message)
pub fn eip191_hash(message: &[u8]) -> [u8; 32] {
    let prefix = format!("\x19Ethereum Signed Message:\n{}", message.len());

    let mut hasher = Keccak::v256();
    hasher.update(prefix.as_bytes());
    hasher.update(message);

    let mut hash = [0u8; 32];
    hasher.finalize(&mut hash);
    hash
}

/// Sign `message` with EIP-191 personal_sign semantics
///
/// Returns a 0x-prefixed 65-byte signature with `v` = 27 or 28.
pub fn personal_sign(signing_key: &SigningKey, message: &str) -> Result<String, CryptoError> {
    let message_hash = eip191_hash(message.as_bytes());

    let (signature, recovery_id) = signing_key
        .sign_prehash_recoverable(&message_hash)
        .map_err(|e| CryptoError::SigningFailed {
            reason: e.to_string(),
        })?;

    let mut sig_bytes = [0u8; 65];
    sig_bytes[..64].copy_from_slice(&signature.to_bytes());
    sig_bytes[64] = recovery_id.to_byte() + 27;

    Ok(format!("0x{}", hex::encode(sig_bytes)))
}

/// Recover the signer's address from a personal_sign signature
///
/// # Arguments
///
/// * `message` - The message that was signed (before EIP-191 hashing)
/// * `signature` - 0x-prefixed hex of 65 bytes `r || s || v`, with `v` in {0, 1, 27, 28}
///
/// # Returns
///
/// The lowercase 0x-prefixed address (42 characters)
pub fn recover_address(message: &str, signature: &str) -> Result<String, CryptoError> {
    let invalid = |reason: String| CryptoError::InvalidSignature {
        operation: "recover_address".to_string(),
        reason,
    };

    let sig_bytes = decode_hex(signature, "signature").map_err(|e| invalid(e.to_string()))?;

    if sig_bytes.len() != 65 {
        return Err(invalid(format!(
            "expected 65 bytes, got {}",
            sig_bytes.len()
        )));
    }

    let mut v = sig_bytes[64];
    // Handle Ethereum-style recovery IDs (27/28) by normalizing to 0/1
    if v >= 27 {
        v -= 27;
    }
    if v > 1 {
        return Err(invalid(format!("invalid v value: {}", sig_bytes[64])));
    }

    let recovery_id = RecoveryId::try_from(v).map_err(|e| invalid(e.to_string()))?;
    let signature = Signature::from_slice(&sig_bytes[..64]).map_err(|e| invalid(e.to_string()))?;

    let message_hash = eip191_hash(message.as_bytes());
    let verifying_key = VerifyingKey::recover_from_prehash(&message_hash, &signature, recovery_id)
        .map_err(|e| invalid(format!("recovery failed: {}", e)))?;

    Ok(address_of(&PublicKey::from(&verifying_key)))
}

/// Check that `signature` over `message` was produced by `address`
///
/// Pure function: malformed input is a failed verification, not an error.
/// Address comparison ignores hex case (EIP-55 checksums are accepted).
pub fn verify_signature(message: &str, signature: &str, address: &str) -> bool {
    match recover_address(message, signature) {
        Ok(recovered) => recovered.eq_ignore_ascii_case(address.trim()),
        Err(e) => {
            tracing::debug!("signature verification rejected: {}", e);
            false
        }
    }
}
