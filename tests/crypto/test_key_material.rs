// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! KeyMaterial Provider Tests
//!
//! Round trips, key mismatch and error classification of the secp256k1
//! key material.

use cryptotongue::crypto::{
    address_from_private_key, address_from_public_key, CryptoError, KeyMaterialProvider,
    Secp256k1KeyMaterial,
};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::SecretKey;
use rand::rngs::OsRng;
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_round_trip_various_plaintexts() {
    let km = Secp256k1KeyMaterial::new();
    let pair = km.generate_key_pair();

    for plaintext in [
        "hello",
        "",
        "سلام دنیا",
        "emoji 🔐 and\nnewlines",
        &"long ".repeat(2000),
    ] {
        let ciphertext = km.encrypt(plaintext, &pair.public_key).await.unwrap();
        assert_ne!(ciphertext, plaintext);
        let decrypted = km.decrypt(&ciphertext, &pair.private_key).await.unwrap();
        assert_eq!(decrypted, plaintext);
    }
}

#[tokio::test]
async fn test_ciphertexts_differ_per_call() {
    let km = Secp256k1KeyMaterial::new();
    let pair = km.generate_key_pair();

    let a = km.encrypt("same", &pair.public_key).await.unwrap();
    let b = km.encrypt("same", &pair.public_key).await.unwrap();
    assert_ne!(a, b);
    assert!(a.starts_with("0x01"));
    assert!(b.starts_with("0x01"));
}

#[tokio::test]
async fn test_wrong_private_key_fails() {
    let km = Secp256k1KeyMaterial::new();
    let alice = km.generate_key_pair();
    let mallory = km.generate_key_pair();

    let ciphertext = km.encrypt("for alice only", &alice.public_key).await.unwrap();
    let err = km.decrypt(&ciphertext, &mallory.private_key).await.unwrap_err();

    assert!(err.is_decryption_error());
    assert!(!err.to_string().contains("for alice only"));
}

#[test]
fn test_key_pairs_are_independent() {
    let km = Secp256k1KeyMaterial::new();
    let first = km.generate_key_pair();
    let second = km.generate_key_pair();

    let ciphertext = assert_ok!(tokio_test::block_on(km.encrypt("ping", &first.public_key)));
    assert_err!(tokio_test::block_on(km.decrypt(&ciphertext, &second.private_key)));
    assert_eq!(
        assert_ok!(tokio_test::block_on(km.decrypt(&ciphertext, &first.private_key))),
        "ping"
    );
}

#[tokio::test]
async fn test_uncompressed_public_key_accepted() {
    let km = Secp256k1KeyMaterial::new();
    let secret = SecretKey::random(&mut OsRng);
    let uncompressed = format!(
        "0x{}",
        hex::encode(secret.public_key().to_encoded_point(false).as_bytes())
    );
    let private_key = format!("0x{}", hex::encode(secret.to_bytes()));

    let ciphertext = km.encrypt("hi", &uncompressed).await.unwrap();
    assert_eq!(km.decrypt(&ciphertext, &private_key).await.unwrap(), "hi");
}

#[tokio::test]
async fn test_placeholder_format_is_not_a_ciphertext() {
    let km = Secp256k1KeyMaterial::new();
    let pair = km.generate_key_pair();

    let err = km
        .decrypt("encrypted:hello:with:0xBB22", &pair.private_key)
        .await
        .unwrap_err();
    assert!(matches!(err, CryptoError::DecryptionFailed { .. }));
}

#[tokio::test]
async fn test_encrypt_rejects_unusable_keys() {
    let km = Secp256k1KeyMaterial::new();

    for key in [
        "",
        "   ",
        "0x",
        "not hex",
        "0x02",
        // Ethereum address, not a public key
        "0x9876543210987654321098765432109876543210",
        // Right length, not on the curve
        &format!("0x02{}", "ff".repeat(32)),
    ] {
        let err = km.encrypt("x", key).await.unwrap_err();
        assert!(err.is_encryption_error(), "key {:?} gave {:?}", key, err);
    }
}

#[test]
fn test_generated_pairs_are_distinct_and_consistent() {
    let km = Secp256k1KeyMaterial::new();
    let a = km.generate_key_pair();
    let b = km.generate_key_pair();

    assert_ne!(a.private_key, b.private_key);
    assert_eq!(a.public_key.len(), 2 + 66);
    assert_eq!(a.private_key.len(), 2 + 64);
    assert_eq!(
        address_from_public_key(&a.public_key).unwrap(),
        address_from_private_key(&a.private_key).unwrap()
    );
}

#[test]
fn test_key_pair_debug_hides_private_key() {
    let pair = Secp256k1KeyMaterial::new().generate_key_pair();
    let debug = format!("{:?}", pair);
    assert!(!debug.contains(&pair.private_key[2..]));
}
