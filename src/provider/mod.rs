// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! External Wallet Provider Boundary
//!
//! The wallet is an external collaborator (a browser extension in the
//! reference deployment). The session manager and the signing half of the
//! key material layer only ever talk to it through [`WalletProvider`]:
//!
//! - `request_accounts` - the connect handshake (may prompt the user)
//! - `current_chain_id` - network identity, hex string such as `"0x1"`
//! - `personal_sign` - EIP-191 signing with the wallet's account key
//! - `subscribe` - push-style `accountsChanged` / `chainChanged` events,
//!   delivered as [`ProviderEvent`]s on a channel owned by the consumer
//!
//! A missing provider is represented by `None` at the call site and is a
//! normal condition, not a crash.

pub mod local;

pub use local::LocalWallet;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Events pushed by the wallet provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// Account list changed; empty means the user revoked access
    AccountsChanged(Vec<String>),
    /// Active network changed
    ChainChanged(String),
}

/// Errors reported by a wallet provider (EIP-1193 codes)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// User declined the request (4001)
    #[error("User rejected the request")]
    UserRejected,

    /// Account or method not authorized (4100)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Provider is not connected to any chain (4900/4901)
    #[error("Provider disconnected: {0}")]
    Disconnected(String),

    /// Any other JSON-RPC error
    #[error("Provider RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
}

impl ProviderError {
    /// Map an EIP-1193 / JSON-RPC error code onto a variant
    pub fn from_code(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            4001 => ProviderError::UserRejected,
            4100 => ProviderError::Unauthorized(message),
            4900 | 4901 => ProviderError::Disconnected(message),
            _ => ProviderError::Rpc { code, message },
        }
    }

    /// EIP-1193 / JSON-RPC error code of this error
    pub fn code(&self) -> i64 {
        match self {
            ProviderError::UserRejected => 4001,
            ProviderError::Unauthorized(_) => 4100,
            ProviderError::Disconnected(_) => 4900,
            ProviderError::Rpc { code, .. } => *code,
        }
    }
}

/// Wallet provider interface
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Whether the provider can currently be reached
    async fn is_reachable(&self) -> bool {
        true
    }

    /// Ask the wallet to authorize this client; returns the account list
    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError>;

    /// Current network identifier (hex string, e.g. `"0x1"`)
    async fn current_chain_id(&self) -> Result<String, ProviderError>;

    /// EIP-191 sign `message` with `address`'s key
    async fn personal_sign(&self, message: &str, address: &str) -> Result<String, ProviderError>;

    /// Register a channel that receives every subsequent provider event
    async fn subscribe(&self, events: mpsc::Sender<ProviderEvent>) -> Result<(), ProviderError>;
}
