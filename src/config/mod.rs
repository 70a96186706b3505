// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Client configuration
//!
//! Loaded from an optional TOML file, then overridden by environment
//! variables:
//!
//! ```toml
//! [session]
//! handshake_timeout_secs = 60
//!
//! [messaging]
//! preview_chars = 30
//! address_key_fallback = true
//!
//! [storage]
//! state_path = ".cryptotongue/session.json"
//!
//! [wallet]
//! chain_id = "0x1"
//! ```

use crate::messaging::PipelineConfig;
use crate::wallet::SessionConfig;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const STATE_PATH_VAR: &str = "CHAT_STATE_PATH";
pub const HANDSHAKE_TIMEOUT_VAR: &str = "WALLET_HANDSHAKE_TIMEOUT_SECS";
pub const PREVIEW_CHARS_VAR: &str = "MESSAGE_PREVIEW_CHARS";
pub const ADDRESS_KEY_FALLBACK_VAR: &str = "ADDRESS_KEY_FALLBACK";
pub const CHAIN_ID_VAR: &str = "WALLET_CHAIN_ID";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file backing the session persistence bridge
    pub state_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from(".cryptotongue/session.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Network reported by the in-process wallet
    pub chain_id: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            chain_id: "0x1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub session: SessionConfig,
    pub messaging: PipelineConfig,
    pub storage: StorageConfig,
    pub wallet: WalletConfig,
}

impl ChatConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {:?}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ChatConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// File (when given) then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var(STATE_PATH_VAR) {
            if !val.trim().is_empty() {
                self.storage.state_path = PathBuf::from(val);
            }
        }

        if let Some(secs) = parse_var(HANDSHAKE_TIMEOUT_VAR) {
            self.session.handshake_timeout_secs = secs;
        }

        if let Some(chars) = parse_var(PREVIEW_CHARS_VAR) {
            self.messaging.preview_chars = chars;
        }

        if let Some(fallback) = parse_var(ADDRESS_KEY_FALLBACK_VAR) {
            self.messaging.address_key_fallback = fallback;
        }

        if let Ok(val) = std::env::var(CHAIN_ID_VAR) {
            if !val.trim().is_empty() {
                self.wallet.chain_id = val.trim().to_string();
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.session.handshake_timeout_secs == 0 {
            return Err(anyhow!("session.handshake_timeout_secs must be at least 1"));
        }
        if self.messaging.preview_chars == 0 {
            return Err(anyhow!("messaging.preview_chars must be at least 1"));
        }
        if self.wallet.chain_id.trim().is_empty() {
            return Err(anyhow!("wallet.chain_id must not be empty"));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    let val = std::env::var(name).ok()?;
    match val.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("Ignoring {}: cannot parse {:?}", name, val);
            None
        }
    }
}
