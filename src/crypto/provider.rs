// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! KeyMaterial Provider
//!
//! The capability boundary for key generation, message encryption and
//! signatures. [`Secp256k1KeyMaterial`] is the production implementation:
//! ECIES-style envelopes (see [`super::envelope`]) and EIP-191 signatures,
//! with signing delegated to the attached wallet provider.
//!
//! Error contract: every failure of `encrypt` is
//! `CryptoError::EncryptionFailed` and every failure of `decrypt` is
//! `CryptoError::DecryptionFailed`, so callers can classify without
//! inspecting reasons.

use super::envelope::{open, seal};
use super::keys::{parse_private_key, parse_public_key, KeyPair};
use super::signature::verify_signature;
use super::CryptoError;
use crate::provider::WalletProvider;
use crate::wallet::Identity;
use async_trait::async_trait;
use std::sync::Arc;

/// Key generation, encryption and signature capabilities
#[async_trait]
pub trait KeyMaterialProvider: Send + Sync {
    /// Fresh key pair; never fails and persists nothing
    fn generate_key_pair(&self) -> KeyPair;

    /// Encrypt `plaintext` for the holder of `recipient_public_key`
    async fn encrypt(&self, plaintext: &str, recipient_public_key: &str)
        -> Result<String, CryptoError>;

    /// Decrypt a ciphertext produced by `encrypt`
    async fn decrypt(&self, ciphertext: &str, private_key: &str) -> Result<String, CryptoError>;

    /// Sign `message` as `identity` through the external wallet
    async fn sign(&self, message: &str, identity: &Identity) -> Result<String, CryptoError>;

    /// Check a signature against an address without any external call
    fn verify(&self, message: &str, signature: &str, address: &str) -> bool;
}

/// secp256k1 / XChaCha20-Poly1305 key material
#[derive(Clone, Default)]
pub struct Secp256k1KeyMaterial {
    signer: Option<Arc<dyn WalletProvider>>,
}

impl Secp256k1KeyMaterial {
    /// Key material without a signer; `sign` will fail
    pub fn new() -> Self {
        Self { signer: None }
    }

    /// Key material that signs through `wallet`
    pub fn with_signer(wallet: Arc<dyn WalletProvider>) -> Self {
        Self {
            signer: Some(wallet),
        }
    }
}

#[async_trait]
impl KeyMaterialProvider for Secp256k1KeyMaterial {
    fn generate_key_pair(&self) -> KeyPair {
        KeyPair::generate()
    }

    async fn encrypt(
        &self,
        plaintext: &str,
        recipient_public_key: &str,
    ) -> Result<String, CryptoError> {
        if recipient_public_key.trim().is_empty() {
            return Err(CryptoError::EncryptionFailed {
                operation: "encrypt".to_string(),
                reason: "recipient public key is empty".to_string(),
            });
        }

        let recipient =
            parse_public_key(recipient_public_key).map_err(|e| CryptoError::EncryptionFailed {
                operation: "encrypt".to_string(),
                reason: format!("recipient public key unusable: {}", e),
            })?;

        seal(plaintext, &recipient).map_err(|e| match e {
            CryptoError::EncryptionFailed { .. } => e,
            other => CryptoError::EncryptionFailed {
                operation: "encrypt".to_string(),
                reason: other.to_string(),
            },
        })
    }

    async fn decrypt(&self, ciphertext: &str, private_key: &str) -> Result<String, CryptoError> {
        let secret = parse_private_key(private_key).map_err(|e| CryptoError::DecryptionFailed {
            operation: "decrypt".to_string(),
            reason: format!("private key unusable: {}", e),
        })?;

        open(ciphertext, &secret).map_err(|e| match e {
            CryptoError::DecryptionFailed { .. } => e,
            other => CryptoError::DecryptionFailed {
                operation: "decrypt".to_string(),
                reason: other.to_string(),
            },
        })
    }

    async fn sign(&self, message: &str, identity: &Identity) -> Result<String, CryptoError> {
        let signer = self.signer.as_ref().ok_or_else(|| CryptoError::SigningFailed {
            reason: "no wallet provider attached".to_string(),
        })?;

        signer
            .personal_sign(message, &identity.address)
            .await
            .map_err(|e| CryptoError::SigningFailed {
                reason: e.to_string(),
            })
    }

    fn verify(&self, message: &str, signature: &str, address: &str) -> bool {
        verify_signature(message, signature, address)
    }
}
