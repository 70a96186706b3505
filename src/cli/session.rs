// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use super::CliContext;
use crate::wallet::{SessionStatus, WalletSession};
use anyhow::{anyhow, Result};
use clap::Args;
use tracing::info;

#[derive(Args, Debug)]
pub struct WalletArgs {
    /// Wallet private key (falls back to WALLET_PRIVATE_KEY)
    #[arg(long)]
    pub private_key: Option<String>,
}

#[derive(Args, Debug)]
pub struct LanguageArgs {
    /// Language code to store (e.g. "en", "fa"); omit to print the current one
    pub code: Option<String>,
}

pub async fn connect(ctx: &CliContext, args: WalletArgs) -> Result<()> {
    let wallet = ctx.require_wallet(args.private_key.as_deref())?;
    let manager = ctx.session_manager(Some(wallet));

    let restored = manager.restore().await;
    if restored.is_connected() {
        println!("🔄 Session restored without a new handshake");
        print_session(&restored);
        return Ok(());
    }

    let session = manager.connect().await?;
    print_session(&session);
    Ok(())
}

pub async fn disconnect(ctx: &CliContext, args: WalletArgs) -> Result<()> {
    let wallet = ctx.wallet(args.private_key.as_deref())?;
    let manager = ctx.session_manager(wallet);

    if manager.restore().await.is_connected() {
        manager.disconnect().await;
    } else {
        // Nothing to restore into; forget the flags anyway
        manager.persistence().clear_session().await;
    }

    info!("Session flags cleared");
    println!("👋 Wallet disconnected");
    Ok(())
}

pub async fn status(ctx: &CliContext, args: WalletArgs) -> Result<()> {
    let wallet = ctx.wallet(args.private_key.as_deref())?;
    let has_wallet = wallet.is_some();
    let manager = ctx.session_manager(wallet);

    let session = manager.restore().await;
    if session.is_connected() {
        print_session(&session);
        return Ok(());
    }

    let persisted = manager.persistence().load_session().await;
    match persisted.restorable_address() {
        Some(address) if !has_wallet => {
            println!("Status:  {}", SessionStatus::Disconnected);
            println!(
                "Last session: {} (provide a wallet key to restore it)",
                address
            );
        }
        _ => print_session(&session),
    }
    Ok(())
}

pub async fn language(ctx: &CliContext, args: LanguageArgs) -> Result<()> {
    let persistence = ctx.persistence();

    match args.code {
        Some(code) => {
            let code = code.trim().to_lowercase();
            if code.is_empty() {
                return Err(anyhow!("Language code must not be empty"));
            }
            persistence.set_preferred_language(&code).await;
            println!("Preferred language set to {}", code);
        }
        None => match persistence.preferred_language().await {
            Some(code) => println!("{}", code),
            None => println!("No preferred language set"),
        },
    }
    Ok(())
}

fn print_session(session: &WalletSession) {
    println!("Status:  {}", session.status());
    if let Some(identity) = session.identity() {
        println!("Address: {}", identity.address);
        match identity.chain_number() {
            Some(chain) => println!("Chain:   {}", chain),
            None => println!("Chain:   unknown"),
        }
    }
    if let Some(error) = session.error() {
        println!("Error:   {}", error);
    }
}
