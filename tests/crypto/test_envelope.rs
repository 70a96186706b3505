// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Envelope Tampering Tests
//!
//! Every region of a sealed envelope is covered by the AEAD tag or by the
//! length checks, so any single-byte change must fail to decrypt.

use cryptotongue::crypto::{CryptoError, Envelope, KeyMaterialProvider, Secp256k1KeyMaterial};

async fn sealed() -> (Secp256k1KeyMaterial, String, String) {
    let km = Secp256k1KeyMaterial::new();
    let pair = km.generate_key_pair();
    let ciphertext = km.encrypt("attack at dawn", &pair.public_key).await.unwrap();
    (km, ciphertext, pair.private_key)
}

/// Flip the lowest bit of the byte at `index` of the decoded envelope
fn flip_byte(encoded: &str, index: usize) -> String {
    let mut bytes = hex::decode(&encoded[2..]).unwrap();
    bytes[index] ^= 0x01;
    format!("0x{}", hex::encode(bytes))
}

#[tokio::test]
async fn test_every_region_is_authenticated() {
    let (km, ciphertext, private_key) = sealed().await;
    let total = hex::decode(&ciphertext[2..]).unwrap().len();

    // ephemeral key, nonce, ciphertext body, tag
    let eph_byte = 2 + 10;
    let nonce_byte = 2 + 33 + 5;
    let body_byte = 2 + 33 + 24 + 4 + 1;
    let tag_byte = total - 1;

    for index in [eph_byte, nonce_byte, body_byte, tag_byte] {
        let tampered = flip_byte(&ciphertext, index);
        let err = km.decrypt(&tampered, &private_key).await.unwrap_err();
        assert!(
            matches!(err, CryptoError::DecryptionFailed { .. }),
            "byte {} gave {:?}",
            index,
            err
        );
    }

    // Untouched envelope still opens
    assert_eq!(
        km.decrypt(&ciphertext, &private_key).await.unwrap(),
        "attack at dawn"
    );
}

#[tokio::test]
async fn test_length_field_must_match() {
    let (km, ciphertext, private_key) = sealed().await;
    let length_byte = 2 + 33 + 24 + 3;

    let tampered = flip_byte(&ciphertext, length_byte);
    assert!(Envelope::decode(&tampered).is_err());
    assert!(km
        .decrypt(&tampered, &private_key)
        .await
        .unwrap_err()
        .is_decryption_error());
}

#[tokio::test]
async fn test_truncated_envelopes_rejected() {
    let (km, ciphertext, private_key) = sealed().await;

    for keep in [4, 10, 70, ciphertext.len() - 2] {
        let truncated = &ciphertext[..keep];
        let err = km.decrypt(truncated, &private_key).await.unwrap_err();
        assert!(err.is_decryption_error(), "prefix {} gave {:?}", keep, err);
    }
}

#[tokio::test]
async fn test_envelope_reencodes_identically() {
    let (_, ciphertext, _) = sealed().await;
    let envelope = Envelope::decode(&ciphertext).unwrap();

    assert_eq!(envelope.version, 1);
    assert_eq!(envelope.encode().unwrap(), ciphertext);
}
