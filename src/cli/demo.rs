// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use super::CliContext;
use crate::crypto::{KeyMaterialProvider, Secp256k1KeyMaterial};
use crate::messaging::{
    Contact, InMemoryContacts, InboundMessage, MessagePipeline, SendRequest,
};
use crate::persistence::PersistenceBridge;
use crate::provider::LocalWallet;
use crate::wallet::WalletSessionManager;
use anyhow::Result;
use clap::Args;
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Message to send
    #[arg(long, default_value = "hello")]
    pub message: String,
}

/// Walk through connect, encrypted send and reveal against in-memory state
pub async fn run(ctx: &CliContext, args: DemoArgs) -> Result<()> {
    let wallet = LocalWallet::random(ctx.config.wallet.chain_id.clone());
    let manager = WalletSessionManager::new(
        Some(Arc::new(wallet.clone())),
        PersistenceBridge::in_memory(),
        ctx.config.session.clone(),
    );
    let mut notices = manager.subscribe_notices();
    let events = manager.attach_provider_events().await?;

    println!("1️⃣  Connecting wallet");
    let session = manager.connect().await?;
    if let Some(identity) = session.identity() {
        println!("    connected as {}", identity.short_address());
    }

    let key_material = Secp256k1KeyMaterial::with_signer(Arc::new(wallet.clone()));
    let bob = key_material.generate_key_pair();
    let bob_address = bob.address()?;
    let contacts = Arc::new(InMemoryContacts::new());
    contacts.add(Contact::new(bob_address.clone(), "Bob").with_public_key(bob.public_key.clone()));

    let pipeline = MessagePipeline::new(
        manager.clone(),
        Arc::new(key_material),
        contacts,
        ctx.config.messaging.clone(),
    );

    println!("2️⃣  Sending encrypted message to Bob");
    let sent = pipeline
        .send(SendRequest::new(bob_address.clone(), args.message.clone(), true))
        .await?;
    println!("    sealed preview: {}", pipeline.preview(&sent.id).await?);

    println!("3️⃣  Revealing with Bob's key");
    let text = pipeline.reveal(&sent.id, &bob.private_key).await?;
    println!("    revealed: {}", text);

    println!("4️⃣  Receiving a message that was not produced by encrypt");
    let bogus = pipeline
        .receive(InboundMessage::new(bob_address.clone(), "encrypted:hi:with:0xBB", true))
        .await;
    match pipeline.reveal(&bogus.id, &bob.private_key).await {
        Ok(_) => println!("    unexpectedly revealed"),
        Err(e) => println!(
            "    {} (state: {:?})",
            e,
            pipeline.disclosure(&bogus.id).await?
        ),
    }

    println!("5️⃣  Switching network and revoking access");
    wallet.switch_chain("0x89").await;
    wallet.revoke_all().await;

    // Let the event loop drain the two provider events
    tokio::time::sleep(Duration::from_millis(50)).await;
    println!("    session is now {}", manager.snapshot().await.status());

    while let Ok(notice) = notices.try_recv() {
        println!("    🔔 {}", notice);
    }

    events.abort();
    Ok(())
}
