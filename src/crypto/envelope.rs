// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Encrypted Message Envelope
//!
//! Wire format of an encrypted message body, hex encoded with a `0x` prefix:
//!
//! ```text
//! [version u8][eph_len u8][eph_pub eph_len][nonce 24][ct_len u32 BE][ct ct_len]
//! ```
//!
//! - `version`: always [`ENVELOPE_VERSION`]
//! - `eph_pub`: sender's ephemeral secp256k1 public key (33 bytes compressed)
//! - `nonce`: random XChaCha20 nonce
//! - `ct`: XChaCha20-Poly1305 ciphertext including the 16-byte tag
//!
//! The version byte and ephemeral key are authenticated as AAD, so a
//! tampered header fails the same way a wrong key does.

use super::ecdh::derive_shared_key;
use super::encryption::{decrypt_with_aead, encrypt_with_aead, random_nonce, NONCE_SIZE, TAG_SIZE};
use super::CryptoError;
use k256::{elliptic_curve::sec1::ToEncodedPoint, PublicKey, SecretKey};
use rand::rngs::OsRng;

/// Current envelope format version
pub const ENVELOPE_VERSION: u8 = 1;

/// Parsed envelope fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub version: u8,
    pub eph_pub: Vec<u8>,
    pub nonce: [u8; NONCE_SIZE],
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    fn aad(&self) -> Vec<u8> {
        let mut aad = Vec::with_capacity(1 + self.eph_pub.len());
        aad.push(self.version);
        aad.extend_from_slice(&self.eph_pub);
        aad
    }

    /// Serialize to the `0x`-prefixed hex wire form
    ///
    /// Fails when a field is too long for its length prefix.
    pub fn encode(&self) -> Result<String, CryptoError> {
        let too_long = |field: &str, len: usize| CryptoError::EncryptionFailed {
            operation: "envelope".to_string(),
            reason: format!("{} of {} bytes does not fit its length prefix", field, len),
        };
        let eph_len = u8::try_from(self.eph_pub.len())
            .map_err(|_| too_long("ephemeral key", self.eph_pub.len()))?;
        let ct_len = u32::try_from(self.ciphertext.len())
            .map_err(|_| too_long("ciphertext", self.ciphertext.len()))?;

        let mut bytes =
            Vec::with_capacity(2 + self.eph_pub.len() + NONCE_SIZE + 4 + self.ciphertext.len());
        bytes.push(self.version);
        bytes.push(eph_len);
        bytes.extend_from_slice(&self.eph_pub);
        bytes.extend_from_slice(&self.nonce);
        bytes.extend_from_slice(&ct_len.to_be_bytes());
        bytes.extend_from_slice(&self.ciphertext);

        Ok(format!("0x{}", hex::encode(bytes)))
    }

    /// Parse the wire form, rejecting anything that is not a complete v1 envelope
    pub fn decode(encoded: &str) -> Result<Self, CryptoError> {
        let malformed = |reason: String| CryptoError::DecryptionFailed {
            operation: "envelope".to_string(),
            reason,
        };

        let hex_str = encoded
            .strip_prefix("0x")
            .ok_or_else(|| malformed("missing 0x prefix".to_string()))?;
        let bytes = hex::decode(hex_str).map_err(|e| malformed(format!("not hex: {}", e)))?;

        let (&version, rest) = bytes
            .split_first()
            .ok_or_else(|| malformed("empty envelope".to_string()))?;
        if version != ENVELOPE_VERSION {
            return Err(malformed(format!("unsupported version {}", version)));
        }

        let (&eph_len, rest) = rest
            .split_first()
            .ok_or_else(|| malformed("truncated before key length".to_string()))?;
        let eph_len = eph_len as usize;
        if eph_len != 33 && eph_len != 65 {
            return Err(malformed(format!("invalid ephemeral key length {}", eph_len)));
        }
        if rest.len() < eph_len + NONCE_SIZE + 4 {
            return Err(malformed("truncated header".to_string()));
        }

        let (eph_pub, rest) = rest.split_at(eph_len);
        let (nonce_bytes, rest) = rest.split_at(NONCE_SIZE);
        let (len_bytes, ciphertext) = rest.split_at(4);

        let mut len_buf = [0u8; 4];
        len_buf.copy_from_slice(len_bytes);
        let ct_len = u32::from_be_bytes(len_buf) as usize;
        if ct_len != ciphertext.len() {
            return Err(malformed(format!(
                "ciphertext length mismatch: header says {}, found {}",
                ct_len,
                ciphertext.len()
            )));
        }
        if ct_len < TAG_SIZE {
            return Err(malformed("ciphertext shorter than tag".to_string()));
        }

        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(nonce_bytes);

        Ok(Self {
            version,
            eph_pub: eph_pub.to_vec(),
            nonce,
            ciphertext: ciphertext.to_vec(),
        })
    }
}

/// Encrypt `plaintext` so only the holder of `recipient`'s secret can open it
pub fn seal(plaintext: &str, recipient: &PublicKey) -> Result<String, CryptoError> {
    let ephemeral = SecretKey::random(&mut OsRng);
    let eph_pub = ephemeral.public_key().to_encoded_point(true).as_bytes().to_vec();

    let key = derive_shared_key(recipient, &ephemeral)?;

    let mut envelope = Envelope {
        version: ENVELOPE_VERSION,
        eph_pub,
        nonce: random_nonce(),
        ciphertext: Vec::new(),
    };
    envelope.ciphertext =
        encrypt_with_aead(plaintext.as_bytes(), &envelope.nonce, &envelope.aad(), &key)?;

    envelope.encode()
}

/// Open an envelope produced by [`seal`] with the recipient's secret
pub fn open(encoded: &str, recipient: &SecretKey) -> Result<String, CryptoError> {
    let envelope = Envelope::decode(encoded)?;

    let eph_pub =
        PublicKey::from_sec1_bytes(&envelope.eph_pub).map_err(|e| CryptoError::DecryptionFailed {
            operation: "envelope".to_string(),
            reason: format!("invalid ephemeral key: {}", e),
        })?;

    let key = derive_shared_key(&eph_pub, recipient)?;
    let plaintext = decrypt_with_aead(&envelope.ciphertext, &envelope.nonce, &envelope.aad(), &key)?;

    String::from_utf8(plaintext).map_err(|e| CryptoError::DecryptionFailed {
        operation: "envelope".to_string(),
        reason: format!("plaintext is not UTF-8: {}", e),
    })
}
