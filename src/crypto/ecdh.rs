// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ECDH Key Exchange Implementation
//!
//! Implements Elliptic Curve Diffie-Hellman key exchange using secp256k1
//! (the same curve used by Ethereum wallets). The sender combines a fresh
//! ephemeral secret with the recipient's static public key; the recipient
//! combines its static secret with the sender's ephemeral public key.
//! Both sides land on the same 32-byte message key.

use super::CryptoError;
use hkdf::Hkdf;
use k256::{PublicKey, SecretKey};
use sha2::Sha256;

/// HKDF info string binding derived keys to this envelope version
pub const MESSAGE_KEY_INFO: &[u8] = b"cryptotongue/message/v1";

/// Derive a shared encryption key using ECDH
///
/// Performs ECDH between `peer_public` and `own_secret`, then derives a
/// 32-byte key using HKDF-SHA256 with [`MESSAGE_KEY_INFO`].
///
/// # Example
///
/// ```ignore
/// let key = derive_shared_key(&recipient_pub, &ephemeral_secret)?;
/// // Use key for XChaCha20-Poly1305
/// ```
pub fn derive_shared_key(
    peer_public: &PublicKey,
    own_secret: &SecretKey,
) -> Result<[u8; 32], CryptoError> {
    let shared_secret =
        k256::ecdh::diffie_hellman(own_secret.to_nonzero_scalar(), peer_public.as_affine());

    let hkdf = Hkdf::<Sha256>::new(None, shared_secret.raw_secret_bytes());
    let mut derived_key = [0u8; 32];
    hkdf.expand(MESSAGE_KEY_INFO, &mut derived_key)
        .map_err(|e| CryptoError::KeyDerivationFailed {
            operation: "hkdf_expand".to_string(),
            reason: e.to_string(),
        })?;

    Ok(derived_key)
}
