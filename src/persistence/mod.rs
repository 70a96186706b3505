// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Session Persistence Bridge
//!
//! Durable key-value storage used only to restore the wallet session across
//! restarts. It is never the source of truth: reads happen once at startup,
//! writes happen after every session transition, and a failed write is
//! logged and forgotten.
//!
//! Keys:
//! - `wallet-connected`: `"true"` or absent
//! - `wallet-address`: last connected address
//! - `preferred-language`: UI language code

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

pub const WALLET_CONNECTED_KEY: &str = "wallet-connected";
pub const WALLET_ADDRESS_KEY: &str = "wallet-address";
pub const PREFERRED_LANGUAGE_KEY: &str = "preferred-language";

/// Trait for key-value storage backends
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value; deleting a missing key is not an error
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Session flags as read back at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSession {
    pub connected: bool,
    pub address: Option<String>,
}

impl PersistedSession {
    /// Address to restore, if the stored flags describe a connected session
    pub fn restorable_address(&self) -> Option<&str> {
        match (&self.connected, &self.address) {
            (true, Some(address)) if !address.trim().is_empty() => Some(address.as_str()),
            _ => None,
        }
    }
}

/// Typed, best-effort view over a [`KeyValueStore`]
#[derive(Clone)]
pub struct PersistenceBridge {
    store: Arc<dyn KeyValueStore>,
}

impl PersistenceBridge {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Bridge over a fresh in-memory store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Read persisted session flags; unreadable storage reads as "nothing stored"
    pub async fn load_session(&self) -> PersistedSession {
        let connected = self
            .read(WALLET_CONNECTED_KEY)
            .await
            .map(|v| v == "true")
            .unwrap_or(false);
        let address = self.read(WALLET_ADDRESS_KEY).await;

        PersistedSession { connected, address }
    }

    /// Record a connected session
    pub async fn save_connected(&self, address: &str) {
        self.write(WALLET_CONNECTED_KEY, "true").await;
        self.write(WALLET_ADDRESS_KEY, address).await;
    }

    /// Record a new address for the current session
    pub async fn save_address(&self, address: &str) {
        self.write(WALLET_ADDRESS_KEY, address).await;
    }

    /// Forget the session flags
    pub async fn clear_session(&self) {
        self.delete(WALLET_CONNECTED_KEY).await;
        self.delete(WALLET_ADDRESS_KEY).await;
    }

    pub async fn preferred_language(&self) -> Option<String> {
        self.read(PREFERRED_LANGUAGE_KEY).await
    }

    pub async fn set_preferred_language(&self, code: &str) {
        self.write(PREFERRED_LANGUAGE_KEY, code).await;
    }

    async fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to read '{}' from session store: {}", key, e);
                None
            }
        }
    }

    async fn write(&self, key: &str, value: &str) {
        match self.store.set(key, value).await {
            Ok(()) => debug!("Persisted '{}'", key),
            Err(e) => warn!("Failed to persist '{}': {}", key, e),
        }
    }

    async fn delete(&self, key: &str) {
        if let Err(e) = self.store.remove(key).await {
            warn!("Failed to remove '{}' from session store: {}", key, e);
        }
    }
}
