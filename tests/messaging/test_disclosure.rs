// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Disclosure State Machine Tests
//!
//! Sealed -> Revealing -> Revealed, failure back to Sealed, cached
//! results and single-flight decrypts per message.

use super::support::{connected_session, pipeline, CountingKeyMaterial};
use cryptotongue::crypto::{KeyMaterialProvider, KeyPair, Secp256k1KeyMaterial};
use cryptotongue::messaging::{
    Contact, Disclosure, InMemoryContacts, InboundMessage, MessageError, MessagePipeline,
    PipelineConfig, SendRequest,
};
use cryptotongue::wallet::SessionNotice;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

const BOB: &str = "0xBB00000000000000000000000000000000000B22";

/// Pipeline plus a key pair the local user can decrypt with
async fn setup(km: Arc<CountingKeyMaterial>) -> (MessagePipeline, KeyPair) {
    let (_wallet, session) = connected_session().await;
    let own_keys = Secp256k1KeyMaterial::new().generate_key_pair();
    (
        pipeline(session, km, Arc::new(InMemoryContacts::new())),
        own_keys,
    )
}

async fn sealed_for(keys: &KeyPair, plaintext: &str) -> String {
    Secp256k1KeyMaterial::new()
        .encrypt(plaintext, &keys.public_key)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_reveal_own_sent_message() {
    let (_wallet, session) = connected_session().await;
    let bob_keys = Secp256k1KeyMaterial::new().generate_key_pair();
    let contacts = Arc::new(InMemoryContacts::new());
    contacts.add(Contact::new(BOB, "Bob").with_public_key(bob_keys.public_key.clone()));
    let km = Arc::new(CountingKeyMaterial::default());
    let pipeline = pipeline(session, km.clone(), contacts);

    let sent = pipeline
        .send(SendRequest::new(BOB, "hello", true))
        .await
        .unwrap();
    let text = pipeline.reveal(&sent.id, &bob_keys.private_key).await.unwrap();

    assert_eq!(text, "hello");
    let revealed = pipeline.message(&sent.id).await.unwrap();
    assert_eq!(revealed.disclosure, Some(Disclosure::Revealed));
    assert_eq!(revealed.decrypted_content.as_deref(), Some("hello"));
    // Ciphertext is kept as-is
    assert_eq!(revealed.content, sent.content);
}

#[tokio::test]
async fn test_foreign_ciphertext_stays_sealed_and_retryable() {
    let km = Arc::new(CountingKeyMaterial::default());
    let (pipeline, own_keys) = setup(km.clone()).await;

    let inbound = pipeline
        .receive(InboundMessage::new(BOB, "encrypted:hello:with:0xBB", true))
        .await;

    let err = pipeline
        .reveal(&inbound.id, &own_keys.private_key)
        .await
        .unwrap_err();
    assert!(matches!(err, MessageError::Decryption(_)));
    assert_eq!(
        pipeline.disclosure(&inbound.id).await.unwrap(),
        Some(Disclosure::Sealed)
    );

    // Each retry reaches the key material again
    assert!(pipeline.reveal(&inbound.id, &own_keys.private_key).await.is_err());
    assert_eq!(km.decrypts(), 2);
    assert!(pipeline.message(&inbound.id).await.unwrap().decrypted_content.is_none());
}

#[tokio::test]
async fn test_wrong_key_then_right_key() {
    let km = Arc::new(CountingKeyMaterial::default());
    let (pipeline, own_keys) = setup(km.clone()).await;
    let stranger = Secp256k1KeyMaterial::new().generate_key_pair();

    let inbound = pipeline
        .receive(InboundMessage::new(BOB, sealed_for(&own_keys, "psst").await, true))
        .await;

    assert!(matches!(
        pipeline.reveal(&inbound.id, &stranger.private_key).await,
        Err(MessageError::Decryption(_))
    ));
    assert_eq!(
        pipeline.disclosure(&inbound.id).await.unwrap(),
        Some(Disclosure::Sealed)
    );

    assert_eq!(
        pipeline.reveal(&inbound.id, &own_keys.private_key).await.unwrap(),
        "psst"
    );
}

#[tokio::test]
async fn test_revealed_is_cached_and_never_resealed() {
    let km = Arc::new(CountingKeyMaterial::default());
    let (pipeline, own_keys) = setup(km.clone()).await;
    let stranger = Secp256k1KeyMaterial::new().generate_key_pair();

    let inbound = pipeline
        .receive(InboundMessage::new(BOB, sealed_for(&own_keys, "cached").await, true))
        .await;

    let first = pipeline.reveal(&inbound.id, &own_keys.private_key).await.unwrap();
    let second = pipeline.reveal(&inbound.id, &own_keys.private_key).await.unwrap();
    // Even a wrong key returns the cached text once revealed
    let third = pipeline.reveal(&inbound.id, &stranger.private_key).await.unwrap();

    assert_eq!(first, "cached");
    assert_eq!(second, "cached");
    assert_eq!(third, "cached");
    assert_eq!(km.decrypts(), 1);
    assert_eq!(
        pipeline.disclosure(&inbound.id).await.unwrap(),
        Some(Disclosure::Revealed)
    );
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_reveals_share_one_decrypt() {
    let km = Arc::new(CountingKeyMaterial::with_decrypt_delay(Duration::from_millis(100)));
    let (pipeline, own_keys) = setup(km.clone()).await;

    let inbound = pipeline
        .receive(InboundMessage::new(BOB, sealed_for(&own_keys, "once").await, true))
        .await;

    let (a, b, c) = tokio::join!(
        pipeline.reveal(&inbound.id, &own_keys.private_key),
        pipeline.reveal(&inbound.id, &own_keys.private_key),
        pipeline.reveal(&inbound.id, &own_keys.private_key),
    );

    assert_eq!(a.unwrap(), "once");
    assert_eq!(b.unwrap(), "once");
    assert_eq!(c.unwrap(), "once");
    assert_eq!(km.decrypts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_failures_share_outcome() {
    let km = Arc::new(CountingKeyMaterial::with_decrypt_delay(Duration::from_millis(100)));
    let (pipeline, own_keys) = setup(km.clone()).await;

    let inbound = pipeline
        .receive(InboundMessage::new(BOB, "0x0102", true))
        .await;

    let (a, b) = tokio::join!(
        pipeline.reveal(&inbound.id, &own_keys.private_key),
        pipeline.reveal(&inbound.id, &own_keys.private_key),
    );

    assert_eq!(a.unwrap_err(), b.unwrap_err());
    assert_eq!(km.decrypts(), 1);
    assert_eq!(
        pipeline.disclosure(&inbound.id).await.unwrap(),
        Some(Disclosure::Sealed)
    );
}

#[tokio::test(start_paused = true)]
async fn test_revealing_state_is_observable() {
    let km = Arc::new(CountingKeyMaterial::with_decrypt_delay(Duration::from_millis(100)));
    let (pipeline, own_keys) = setup(km.clone()).await;

    let inbound = pipeline
        .receive(InboundMessage::new(BOB, sealed_for(&own_keys, "slow").await, true))
        .await;

    let pending = {
        let pipeline = pipeline.clone();
        let id = inbound.id.clone();
        let key = own_keys.private_key.clone();
        tokio::spawn(async move { pipeline.reveal(&id, &key).await })
    };

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(
        pipeline.disclosure(&inbound.id).await.unwrap(),
        Some(Disclosure::Revealing)
    );
    // Still only a bounded prefix while in flight
    assert!(pipeline.preview(&inbound.id).await.unwrap().ends_with("..."));

    assert_eq!(pending.await.unwrap().unwrap(), "slow");
    assert_eq!(
        pipeline.disclosure(&inbound.id).await.unwrap(),
        Some(Disclosure::Revealed)
    );
}

#[tokio::test(start_paused = true)]
async fn test_reveals_on_different_messages_are_independent() {
    let km = Arc::new(CountingKeyMaterial::with_decrypt_delay(Duration::from_millis(50)));
    let (pipeline, own_keys) = setup(km.clone()).await;

    let first = pipeline
        .receive(InboundMessage::new(BOB, sealed_for(&own_keys, "first").await, true))
        .await;
    let second = pipeline
        .receive(InboundMessage::new(BOB, "0xdeadbeef", true))
        .await;

    let (a, b) = tokio::join!(
        pipeline.reveal(&first.id, &own_keys.private_key),
        pipeline.reveal(&second.id, &own_keys.private_key),
    );

    assert_eq!(a.unwrap(), "first");
    assert!(b.is_err());
    assert_eq!(km.decrypts(), 2);
    assert_eq!(
        pipeline.disclosure(&first.id).await.unwrap(),
        Some(Disclosure::Revealed)
    );
    assert_eq!(
        pipeline.disclosure(&second.id).await.unwrap(),
        Some(Disclosure::Sealed)
    );
}

#[tokio::test]
async fn test_preview_bounds_sealed_ciphertext() {
    let km = Arc::new(CountingKeyMaterial::default());
    let (pipeline, own_keys) = setup(km).await;

    let ciphertext = sealed_for(&own_keys, "a fairly long secret message body").await;
    let inbound = pipeline
        .receive(InboundMessage::new(BOB, ciphertext.clone(), true))
        .await;

    let preview = pipeline.preview(&inbound.id).await.unwrap();
    assert_eq!(preview, format!("{}...", &ciphertext[..30]));
    assert!(preview.len() < ciphertext.len());

    pipeline
        .reveal(&inbound.id, &own_keys.private_key)
        .await
        .unwrap();
    assert_eq!(
        pipeline.preview(&inbound.id).await.unwrap(),
        "a fairly long secret message body"
    );
}

#[tokio::test]
async fn test_preview_length_is_configurable() {
    let (_wallet, session) = connected_session().await;
    let pipeline = MessagePipeline::new(
        session,
        Arc::new(CountingKeyMaterial::default()),
        Arc::new(InMemoryContacts::new()),
        PipelineConfig {
            preview_chars: 8,
            ..PipelineConfig::default()
        },
    );

    let inbound = pipeline
        .receive(InboundMessage::new(BOB, "0x0123456789abcdef", true))
        .await;
    assert_eq!(pipeline.preview(&inbound.id).await.unwrap(), "0x012345...");
}

#[tokio::test]
async fn test_unknown_message_id() {
    let km = Arc::new(CountingKeyMaterial::default());
    let (pipeline, own_keys) = setup(km.clone()).await;

    assert!(matches!(
        pipeline.reveal("missing", &own_keys.private_key).await,
        Err(MessageError::UnknownMessage(_))
    ));
    assert!(pipeline.preview("missing").await.is_err());
    assert_eq!(km.decrypts(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_reveal_settles_and_allows_retry() {
    let km = Arc::new(CountingKeyMaterial::with_decrypt_delay(Duration::from_millis(100)));
    let (pipeline, own_keys) = setup(km.clone()).await;
    let stranger = Secp256k1KeyMaterial::new().generate_key_pair();

    let inbound = pipeline
        .receive(InboundMessage::new(BOB, sealed_for(&own_keys, "late").await, true))
        .await;

    // Caller gives up long before the decrypt finishes
    let abandoned = timeout(
        Duration::from_millis(10),
        pipeline.reveal(&inbound.id, &stranger.private_key),
    )
    .await;
    assert!(abandoned.is_err());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(
        pipeline.disclosure(&inbound.id).await.unwrap(),
        Some(Disclosure::Sealed)
    );

    // A fresh reveal decrypts with its own key
    assert_eq!(
        pipeline.reveal(&inbound.id, &own_keys.private_key).await.unwrap(),
        "late"
    );
    assert_eq!(km.decrypts(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_reveal_still_caches_plaintext() {
    let km = Arc::new(CountingKeyMaterial::with_decrypt_delay(Duration::from_millis(100)));
    let (pipeline, own_keys) = setup(km.clone()).await;

    let inbound = pipeline
        .receive(InboundMessage::new(BOB, sealed_for(&own_keys, "kept").await, true))
        .await;

    let abandoned = timeout(
        Duration::from_millis(10),
        pipeline.reveal(&inbound.id, &own_keys.private_key),
    )
    .await;
    assert!(abandoned.is_err());

    tokio::time::sleep(Duration::from_millis(200)).await;
    let message = pipeline.message(&inbound.id).await.unwrap();
    assert_eq!(message.disclosure, Some(Disclosure::Revealed));
    assert_eq!(message.decrypted_content.as_deref(), Some("kept"));

    assert_eq!(
        pipeline.reveal(&inbound.id, &own_keys.private_key).await.unwrap(),
        "kept"
    );
    assert_eq!(km.decrypts(), 1);
}

#[tokio::test]
async fn test_failures_published_as_notices() {
    let (_wallet, session) = connected_session().await;
    let mut notices = session.subscribe_notices();
    let own_keys = Secp256k1KeyMaterial::new().generate_key_pair();
    let pipeline = pipeline(
        session,
        Arc::new(CountingKeyMaterial::default()),
        Arc::new(InMemoryContacts::new()),
    );

    assert!(pipeline.send(SendRequest::new(BOB, "  ", true)).await.is_err());
    let inbound = pipeline
        .receive(InboundMessage::new(BOB, "encrypted:hello:with:0xBB", true))
        .await;
    assert!(pipeline.reveal(&inbound.id, &own_keys.private_key).await.is_err());
    assert!(pipeline.reveal("missing", &own_keys.private_key).await.is_err());

    let mut kinds = Vec::new();
    while let Ok(notice) = notices.try_recv() {
        match notice {
            SessionNotice::Error { kind, .. } => kinds.push(kind),
            other => panic!("unexpected notice {:?}", other),
        }
    }
    assert_eq!(kinds, vec!["empty_message", "decryption_error", "unknown_message"]);
}
