// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod demo;
pub mod keys;
pub mod session;

use crate::config::ChatConfig;
use crate::crypto::extract_wallet_private_key;
use crate::persistence::{FileStore, PersistenceBridge};
use crate::provider::LocalWallet;
use crate::wallet::WalletSessionManager;
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// CryptoTongue wallet messaging CLI
#[derive(Parser, Debug)]
#[command(name = "tongue-cli")]
#[command(version = crate::version::VERSION_NUMBER)]
#[command(about = "Wallet-backed end-to-end encrypted messaging", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = "CHAT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a messaging key pair
    Keygen(keys::KeygenArgs),

    /// Encrypt a message to a public key
    Encrypt(keys::EncryptArgs),

    /// Decrypt a message with a private key
    Decrypt(keys::DecryptArgs),

    /// Sign a message with the wallet key
    Sign(keys::SignArgs),

    /// Verify a signature against an address
    Verify(keys::VerifyArgs),

    /// Connect the wallet and remember the session
    Connect(session::WalletArgs),

    /// Disconnect and forget the remembered session
    Disconnect(session::WalletArgs),

    /// Show the remembered session
    Status(session::WalletArgs),

    /// Show or set the preferred language
    Language(session::LanguageArgs),

    /// Run a local connect, send and reveal walkthrough
    Demo(demo::DemoArgs),
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    debug!("{}", crate::version::get_version_string());
    let config = ChatConfig::load(cli.config.as_deref())?;
    let ctx = CliContext::new(config);

    match cli.command {
        Commands::Keygen(args) => keys::keygen(args),
        Commands::Encrypt(args) => keys::encrypt(args).await,
        Commands::Decrypt(args) => keys::decrypt(args).await,
        Commands::Sign(args) => keys::sign(&ctx, args).await,
        Commands::Verify(args) => keys::verify(args),
        Commands::Connect(args) => session::connect(&ctx, args).await,
        Commands::Disconnect(args) => session::disconnect(&ctx, args).await,
        Commands::Status(args) => session::status(&ctx, args).await,
        Commands::Language(args) => session::language(&ctx, args).await,
        Commands::Demo(args) => demo::run(&ctx, args).await,
    }
}

/// Shared wiring for command handlers
pub struct CliContext {
    pub config: ChatConfig,
}

impl CliContext {
    pub fn new(config: ChatConfig) -> Self {
        Self { config }
    }

    /// Persistence bridge over the configured state file
    pub fn persistence(&self) -> PersistenceBridge {
        debug!("Session state file: {:?}", self.config.storage.state_path);
        PersistenceBridge::new(Arc::new(FileStore::new(
            self.config.storage.state_path.clone(),
        )))
    }

    /// In-process wallet from `--private-key` or `WALLET_PRIVATE_KEY`
    pub fn wallet(&self, private_key: Option<&str>) -> Result<Option<LocalWallet>> {
        let key = match private_key {
            Some(key) => Some(key.to_string()),
            None => extract_wallet_private_key().ok(),
        };

        match key {
            Some(key) => LocalWallet::from_private_key(&key, self.config.wallet.chain_id.clone())
                .map(Some)
                .map_err(|e| anyhow!("Invalid wallet key: {}", e)),
            None => Ok(None),
        }
    }

    /// Wallet that must be present
    pub fn require_wallet(&self, private_key: Option<&str>) -> Result<LocalWallet> {
        self.wallet(private_key)?.ok_or_else(|| {
            anyhow!("Wallet key required. Use --private-key or set WALLET_PRIVATE_KEY env var")
        })
    }

    pub fn session_manager(&self, wallet: Option<LocalWallet>) -> WalletSessionManager {
        let provider = wallet.map(|w| Arc::new(w) as Arc<dyn crate::provider::WalletProvider>);
        WalletSessionManager::new(
            provider,
            self.persistence(),
            self.config.session.clone(),
        )
    }
}
