// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use serde::{Deserialize, Serialize};
use std::fmt;

/// The local user's wallet identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Account address as reported by the wallet (opaque, chain-specific)
    pub address: String,
    /// Network identifier, e.g. `"0x1"`
    pub chain_id: Option<String>,
}

impl Identity {
    pub fn new(address: impl Into<String>, chain_id: Option<String>) -> Self {
        Self {
            address: address.into(),
            chain_id,
        }
    }

    /// `0x1234...abcd` form for display
    pub fn short_address(&self) -> String {
        shorten_address(&self.address)
    }

    /// Chain id as a number, when it is a valid hex or decimal string
    pub fn chain_number(&self) -> Option<u64> {
        let chain = self.chain_id.as_deref()?;
        match chain.strip_prefix("0x") {
            Some(hex) => u64::from_str_radix(hex, 16).ok(),
            None => chain.parse().ok(),
        }
    }
}

/// First 6 and last 4 characters of an address
pub fn shorten_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionStatus::Disconnected => "disconnected",
            SessionStatus::Connecting => "connecting",
            SessionStatus::Connected => "connected",
        };
        f.write_str(label)
    }
}

/// Snapshot of the wallet session
///
/// `identity` is present exactly when `status` is `Connected`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSession {
    status: SessionStatus,
    identity: Option<Identity>,
    error: Option<String>,
}

impl WalletSession {
    pub fn disconnected() -> Self {
        Self {
            status: SessionStatus::Disconnected,
            identity: None,
            error: None,
        }
    }

    pub fn connected(identity: Identity) -> Self {
        Self {
            status: SessionStatus::Connected,
            identity: Some(identity),
            error: None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Last error raised by a session operation, cleared on the next attempt
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.status == SessionStatus::Connected
    }

    pub(crate) fn begin_connecting(&mut self) {
        self.status = SessionStatus::Connecting;
        self.identity = None;
        self.error = None;
    }

    pub(crate) fn fail(&mut self, error: impl Into<String>) {
        self.status = SessionStatus::Disconnected;
        self.identity = None;
        self.error = Some(error.into());
    }

    pub(crate) fn record_error(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
    }

    pub(crate) fn identity_mut(&mut self) -> Option<&mut Identity> {
        self.identity.as_mut()
    }
}

impl Default for WalletSession {
    fn default() -> Self {
        Self::disconnected()
    }
}

/// Transient notifications for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotice {
    Connected { address: String },
    Disconnected,
    AccountChanged { address: String },
    NetworkChanged { chain_id: String },
    Error { kind: String, message: String },
}

impl fmt::Display for SessionNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionNotice::Connected { address } => {
                write!(f, "Wallet connected: {}", shorten_address(address))
            }
            SessionNotice::Disconnected => write!(f, "Wallet disconnected"),
            SessionNotice::AccountChanged { address } => {
                write!(f, "Account changed: {}", shorten_address(address))
            }
            SessionNotice::NetworkChanged { chain_id } => {
                let identity = Identity::new("", Some(chain_id.clone()));
                match identity.chain_number() {
                    Some(n) => write!(f, "Network changed: chain {}", n),
                    None => write!(f, "Network changed: {}", chain_id),
                }
            }
            SessionNotice::Error { message, .. } => write!(f, "Wallet error: {}", message),
        }
    }
}
