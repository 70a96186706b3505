// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Crypto Error Types
//!
//! Error type shared by every KeyMaterial operation, with enough context to
//! tell the caller which step failed.
//!
//! ## Error Variants
//!
//! - **EncryptionFailed**: recipient key unusable or AEAD sealing failed
//! - **DecryptionFailed**: envelope malformed, wrong private key, or tag mismatch
//! - **InvalidSignature**: ECDSA signature parsing or recovery failed
//! - **InvalidKey**: key has the wrong size, is not hex, or is not a curve point
//! - **InvalidNonce**: nonce size validation failed (XChaCha20 requires 24 bytes)
//! - **KeyDerivationFailed**: ECDH or HKDF key derivation failed
//! - **SigningFailed**: the wallet provider could not produce a signature
//! - **Other**: library errors or unexpected failures
//!
//! ## Usage Example
//!
//! ```rust
//! use cryptotongue::crypto::CryptoError;
//!
//! fn open_envelope(envelope: &str) -> Result<String, CryptoError> {
//!     Err(CryptoError::DecryptionFailed {
//!         operation: "envelope".to_string(),
//!         reason: format!("unsupported envelope of {} chars", envelope.len()),
//!     })
//! }
//! ```

use std::fmt;

/// Error type for all KeyMaterial operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Encryption could not be performed
    ///
    /// This error occurs when:
    /// - The recipient public key is empty or malformed
    /// - AEAD sealing failed
    EncryptionFailed {
        /// Which operation was being performed
        operation: String,
        /// Specific failure reason
        reason: String,
    },

    /// Decryption failed
    ///
    /// This error occurs when:
    /// - The envelope does not follow the versioned wire format
    /// - Authentication tag verification fails (wrong key or tampered data)
    /// - The recovered plaintext is not UTF-8
    DecryptionFailed {
        /// Which operation was being performed
        operation: String,
        /// Specific failure reason
        reason: String,
    },

    /// ECDSA signature verification or recovery failed
    InvalidSignature {
        /// Which operation was being performed
        operation: String,
        /// Specific failure reason
        reason: String,
    },

    /// Invalid cryptographic key
    InvalidKey {
        /// Type of key that failed (e.g., "recipient_public_key", "private_key")
        key_type: String,
        /// Specific failure reason
        reason: String,
    },

    /// Invalid nonce size
    ///
    /// XChaCha20-Poly1305 requires exactly 24-byte nonces.
    InvalidNonce {
        /// Expected nonce size (always 24 for XChaCha20)
        expected_size: usize,
        /// Actual nonce size provided
        actual_size: usize,
    },

    /// Key derivation failed (ECDH or HKDF)
    KeyDerivationFailed {
        /// Which key derivation operation failed
        operation: String,
        /// Specific failure reason
        reason: String,
    },

    /// The wallet provider did not return a signature
    SigningFailed {
        /// Specific failure reason
        reason: String,
    },

    /// Generic error for library errors or unexpected failures
    Other(String),
}

impl CryptoError {
    /// True for errors raised while producing ciphertext.
    pub fn is_encryption_error(&self) -> bool {
        matches!(self, CryptoError::EncryptionFailed { .. })
    }

    /// True for errors raised while opening ciphertext.
    pub fn is_decryption_error(&self) -> bool {
        matches!(self, CryptoError::DecryptionFailed { .. })
    }
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoError::EncryptionFailed { operation, reason } => {
                write!(f, "Encryption failed during {}: {}", operation, reason)
            }
            CryptoError::DecryptionFailed { operation, reason } => {
                write!(f, "Decryption failed during {}: {}", operation, reason)
            }
            CryptoError::InvalidSignature { operation, reason } => {
                write!(f, "Invalid signature during {}: {}", operation, reason)
            }
            CryptoError::InvalidKey { key_type, reason } => {
                write!(f, "Invalid key ({}): {}", key_type, reason)
            }
            CryptoError::InvalidNonce {
                expected_size,
                actual_size,
            } => {
                write!(
                    f,
                    "Invalid nonce size: expected {} bytes, got {} bytes",
                    expected_size, actual_size
                )
            }
            CryptoError::KeyDerivationFailed { operation, reason } => {
                write!(f, "Key derivation failed during {}: {}", operation, reason)
            }
            CryptoError::SigningFailed { reason } => {
                write!(f, "Signing failed: {}", reason)
            }
            CryptoError::Other(msg) => {
                write!(f, "Crypto error: {}", msg)
            }
        }
    }
}

impl std::error::Error for CryptoError {}

impl From<anyhow::Error> for CryptoError {
    fn from(err: anyhow::Error) -> Self {
        CryptoError::Other(err.to_string())
    }
}

impl From<hex::FromHexError> for CryptoError {
    fn from(err: hex::FromHexError) -> Self {
        CryptoError::InvalidKey {
            key_type: "hex_field".to_string(),
            reason: format!("hex decode error: {}", err),
        }
    }
}

impl From<k256::elliptic_curve::Error> for CryptoError {
    fn from(err: k256::elliptic_curve::Error) -> Self {
        CryptoError::InvalidKey {
            key_type: "unknown".to_string(),
            reason: format!("k256 error: {}", err),
        }
    }
}

impl From<chacha20poly1305::aead::Error> for CryptoError {
    fn from(err: chacha20poly1305::aead::Error) -> Self {
        CryptoError::DecryptionFailed {
            operation: "AEAD".to_string(),
            reason: format!("chacha20poly1305 error: {}", err),
        }
    }
}
