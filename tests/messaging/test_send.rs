// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Outbound Send Tests
//!
//! Session requirement, validation, recipient key resolution and ordering
//! of the message list.

use super::support::{connected_session, pipeline, CountingKeyMaterial, MockContacts};
use cryptotongue::crypto::{KeyMaterialProvider, Secp256k1KeyMaterial};
use cryptotongue::messaging::{
    Contact, Disclosure, InMemoryContacts, InboundMessage, MessageError, MessagePipeline,
    PipelineConfig, SendRequest,
};
use cryptotongue::provider::ProviderEvent;
use std::sync::Arc;

const BOB: &str = "0xBB00000000000000000000000000000000000B22";

#[tokio::test]
async fn test_encrypted_send_to_known_contact() {
    let (wallet, session) = connected_session().await;
    let bob_keys = Secp256k1KeyMaterial::new().generate_key_pair();
    let contacts = Arc::new(InMemoryContacts::new());
    contacts.add(Contact::new(BOB, "Bob").with_public_key(bob_keys.public_key.clone()));

    let km = Arc::new(CountingKeyMaterial::default());
    let pipeline = pipeline(session, km.clone(), contacts);

    let message = pipeline
        .send(SendRequest::new(BOB, "hello", true))
        .await
        .unwrap();

    assert!(message.is_encrypted);
    assert!(message.is_sent);
    assert_ne!(message.content, "hello");
    assert!(!message.content.contains("hello"));
    assert_eq!(message.decrypted_content, None);
    assert_eq!(message.disclosure, Some(Disclosure::Sealed));
    assert_eq!(message.sender_address, wallet.active_address().await);
    assert_eq!(message.peer_address, BOB);
    assert_eq!(km.encrypt_keys(), vec![bob_keys.public_key]);

    // Only Bob's key opens it
    let opened = Secp256k1KeyMaterial::new()
        .decrypt(&message.content, &bob_keys.private_key)
        .await
        .unwrap();
    assert_eq!(opened, "hello");
}

#[tokio::test]
async fn test_send_requires_connected_session() {
    let (_wallet, session) = connected_session().await;
    session.disconnect().await;

    let km = Arc::new(CountingKeyMaterial::default());
    let pipeline = pipeline(session, km.clone(), Arc::new(InMemoryContacts::new()));

    let err = pipeline
        .send(SendRequest::new(BOB, "hello", true))
        .await
        .unwrap_err();
    assert_eq!(err, MessageError::NotConnected);
    assert!(pipeline.messages().await.is_empty());
    assert!(km.encrypt_keys().is_empty());
}

#[tokio::test]
async fn test_blank_plaintext_rejected_before_crypto() {
    let (_wallet, session) = connected_session().await;
    let km = Arc::new(CountingKeyMaterial::default());
    let mut contacts = MockContacts::new();
    contacts.expect_lookup().never();

    let pipeline = pipeline(session, km.clone(), Arc::new(contacts));

    for blank in ["", "   ", "\t\n"] {
        let err = pipeline
            .send(SendRequest::new(BOB, blank, true))
            .await
            .unwrap_err();
        assert_eq!(err, MessageError::EmptyMessage);
    }
    assert!(km.encrypt_keys().is_empty());
    assert!(pipeline.messages().await.is_empty());
}

#[tokio::test]
async fn test_recipient_key_comes_from_directory() {
    let (_wallet, session) = connected_session().await;
    let bob_keys = Secp256k1KeyMaterial::new().generate_key_pair();
    let bob_public = bob_keys.public_key.clone();

    let mut contacts = MockContacts::new();
    contacts
        .expect_lookup()
        .withf(|address| address == BOB)
        .times(1)
        .returning(move |address| {
            Some(Contact::new(address, "Bob").with_public_key(bob_public.clone()))
        });

    let km = Arc::new(CountingKeyMaterial::default());
    let pipeline = pipeline(session, km.clone(), Arc::new(contacts));

    pipeline
        .send(SendRequest::new(BOB, "hi bob", true))
        .await
        .unwrap();
    assert_eq!(km.encrypt_keys(), vec![bob_keys.public_key]);
}

#[tokio::test]
async fn test_unknown_key_falls_back_to_address() {
    let (_wallet, session) = connected_session().await;
    let mut contacts = MockContacts::new();
    contacts.expect_lookup().returning(|_| None);

    let km = Arc::new(CountingKeyMaterial::default());
    let pipeline = pipeline(session, km.clone(), Arc::new(contacts));

    let err = pipeline
        .send(SendRequest::new(BOB, "hi", true))
        .await
        .unwrap_err();

    // The raw address reached the key material, which rejects it
    assert_eq!(km.encrypt_keys(), vec![BOB.to_string()]);
    assert!(matches!(err, MessageError::Encryption(_)));
    assert!(pipeline.messages().await.is_empty());
}

#[tokio::test]
async fn test_fallback_disabled_fails_without_encrypting() {
    let (_wallet, session) = connected_session().await;
    let mut contacts = MockContacts::new();
    contacts
        .expect_lookup()
        .returning(|address| Some(Contact::new(address, "Keyless")));

    let km = Arc::new(CountingKeyMaterial::default());
    let pipeline = MessagePipeline::new(
        session,
        km.clone(),
        Arc::new(contacts),
        PipelineConfig {
            address_key_fallback: false,
            ..PipelineConfig::default()
        },
    );

    let err = pipeline
        .send(SendRequest::new(BOB, "hi", true))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "encryption_error");
    assert!(km.encrypt_keys().is_empty());
}

#[tokio::test]
async fn test_plaintext_send_skips_directory() {
    let (_wallet, session) = connected_session().await;
    let mut contacts = MockContacts::new();
    contacts.expect_lookup().never();

    let km = Arc::new(CountingKeyMaterial::default());
    let pipeline = pipeline(session, km, Arc::new(contacts));

    let message = pipeline
        .send(SendRequest::new(BOB, "  padded  ", false))
        .await
        .unwrap();
    assert!(!message.is_encrypted);
    assert_eq!(message.content, "  padded  ");
    assert_eq!(message.disclosure, None);
}

#[tokio::test]
async fn test_message_list_is_append_only_in_pipeline_order() {
    let (_wallet, session) = connected_session().await;
    let km = Arc::new(CountingKeyMaterial::default());
    let pipeline = pipeline(session, km, Arc::new(InMemoryContacts::new()));

    pipeline
        .send(SendRequest::new(BOB, "one", false))
        .await
        .unwrap();
    pipeline
        .receive(InboundMessage {
            timestamp: Some(chrono::Utc::now() - chrono::Duration::hours(1)),
            ..InboundMessage::new(BOB, "two", false)
        })
        .await;
    pipeline
        .send(SendRequest::new(BOB, "three", false))
        .await
        .unwrap();

    let contents: Vec<String> = pipeline
        .messages()
        .await
        .into_iter()
        .map(|m| m.content)
        .collect();
    // Older timestamp does not reorder the list
    assert_eq!(contents, vec!["one", "two", "three"]);
}

#[tokio::test]
async fn test_sender_follows_account_change() {
    let (_wallet, session) = connected_session().await;
    let km = Arc::new(CountingKeyMaterial::default());
    let pipeline = pipeline(session.clone(), km, Arc::new(InMemoryContacts::new()));

    let switched = "0x0000000000000000000000000000000000000C33".to_string();
    session
        .handle_event(ProviderEvent::AccountsChanged(vec![switched.clone()]))
        .await;

    let message = pipeline
        .send(SendRequest::new(BOB, "from new account", false))
        .await
        .unwrap();
    assert_eq!(message.sender_address, switched);
}
