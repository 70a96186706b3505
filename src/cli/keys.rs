// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use super::CliContext;
use crate::crypto::{KeyMaterialProvider, Secp256k1KeyMaterial};
use crate::provider::WalletProvider;
use crate::wallet::Identity;
use anyhow::{anyhow, Result};
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Print the key pair as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct EncryptArgs {
    /// Recipient public key (0x-prefixed SEC1 hex)
    #[arg(long)]
    pub to: String,

    /// Message to encrypt
    pub message: String,
}

#[derive(Args, Debug)]
pub struct DecryptArgs {
    /// Private key matching the public key the message was encrypted to
    #[arg(long)]
    pub key: String,

    /// Ciphertext envelope
    pub ciphertext: String,
}

#[derive(Args, Debug)]
pub struct SignArgs {
    /// Message to sign
    pub message: String,

    /// Wallet private key (falls back to WALLET_PRIVATE_KEY)
    #[arg(long)]
    pub private_key: Option<String>,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Signed message
    pub message: String,

    /// 65-byte hex signature
    pub signature: String,

    /// Expected signer address
    pub address: String,
}

pub fn keygen(args: KeygenArgs) -> Result<()> {
    let pair = Secp256k1KeyMaterial::new().generate_key_pair();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&pair)?);
    } else {
        println!("🔑 New messaging key pair");
        println!("  Address:     {}", pair.address()?);
        println!("  Public key:  {}", pair.public_key);
        println!("  Private key: {}", pair.private_key);
        println!("\n⚠️  Keep the private key secret; share only the public key.");
    }
    Ok(())
}

pub async fn encrypt(args: EncryptArgs) -> Result<()> {
    let ciphertext = Secp256k1KeyMaterial::new()
        .encrypt(&args.message, &args.to)
        .await?;
    println!("{}", ciphertext);
    Ok(())
}

pub async fn decrypt(args: DecryptArgs) -> Result<()> {
    let plaintext = Secp256k1KeyMaterial::new()
        .decrypt(&args.ciphertext, &args.key)
        .await?;
    println!("{}", plaintext);
    Ok(())
}

pub async fn sign(ctx: &CliContext, args: SignArgs) -> Result<()> {
    let wallet = ctx.require_wallet(args.private_key.as_deref())?;
    let address = wallet.active_address().await;

    // Signing needs an authorized wallet, as an extension would
    wallet.request_accounts().await?;

    let key_material = Secp256k1KeyMaterial::with_signer(Arc::new(wallet));
    let identity = Identity::new(address.clone(), None);
    let signature = key_material.sign(&args.message, &identity).await?;

    println!("Signer:    {}", address);
    println!("Signature: {}", signature);
    Ok(())
}

pub fn verify(args: VerifyArgs) -> Result<()> {
    if Secp256k1KeyMaterial::new().verify(&args.message, &args.signature, &args.address) {
        println!("✅ Valid signature from {}", args.address);
        Ok(())
    } else {
        Err(anyhow!("Signature does not match {}", args.address))
    }
}
