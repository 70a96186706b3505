// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! End-to-End Message Encryption
//!
//! Cryptographic primitives behind the KeyMaterial Provider:
//!
//! - **Keys**: secp256k1 key pairs exchanged as hex strings
//! - **ECDH**: Ephemeral-static key exchange + HKDF-SHA256
//! - **Encryption**: XChaCha20-Poly1305 AEAD for message bodies
//! - **Envelope**: Versioned, length-prefixed ciphertext wire format
//! - **Signature**: EIP-191 signing and ECDSA address recovery
//!
//! ## Security Considerations
//!
//! - Private keys are decrypt parameters only; they never leave the process
//! - Every envelope uses a fresh ephemeral key and a random 24-byte nonce
//! - Decryption fails whenever the private key does not match the
//!   public key used at encryption time
//!
//! ## Message Flow
//!
//! 1. Sender generates an ephemeral keypair and performs ECDH with the
//!    recipient's public key
//! 2. Sender derives the message key using HKDF-SHA256
//! 3. Sender encrypts the body and packs ephemeral key, nonce and ciphertext
//!    into an envelope
//! 4. Recipient performs ECDH with its private key and the ephemeral key,
//!    derives the same message key and opens the envelope

pub mod ecdh;
pub mod encryption;
pub mod envelope;
pub mod error;
pub mod keys;
pub mod private_key;
pub mod provider;
pub mod signature;

pub use ecdh::derive_shared_key;
pub use encryption::{decrypt_with_aead, encrypt_with_aead};
pub use envelope::{Envelope, ENVELOPE_VERSION};
pub use error::CryptoError;
pub use keys::{address_from_private_key, address_from_public_key, KeyPair};
pub use private_key::extract_wallet_private_key;
pub use provider::{KeyMaterialProvider, Secp256k1KeyMaterial};
pub use signature::{eip191_hash, recover_address, verify_signature};
