// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! In-process wallet provider
//!
//! `LocalWallet` holds secp256k1 account keys in memory and behaves like a
//! browser-extension wallet: it authorizes on `request_accounts`, signs with
//! EIP-191, and pushes `accountsChanged` / `chainChanged` events to its
//! subscribers when the active account or network is switched. The CLI uses
//! it with a key from `WALLET_PRIVATE_KEY`; tests use its switches to
//! script provider behaviour.

use super::{ProviderError, ProviderEvent, WalletProvider};
use crate::crypto::keys::{address_of, parse_private_key};
use crate::crypto::signature::personal_sign;
use crate::crypto::CryptoError;
use async_trait::async_trait;
use k256::ecdsa::SigningKey;
use k256::PublicKey;
use rand::rngs::OsRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};

struct Account {
    address: String,
    signing_key: SigningKey,
}

impl Account {
    fn new(signing_key: SigningKey) -> Self {
        let address = address_of(&PublicKey::from(signing_key.verifying_key()));
        Self {
            address,
            signing_key,
        }
    }
}

struct LocalWalletState {
    accounts: Vec<Account>,
    active: usize,
    chain_id: String,
    authorized: bool,
    reachable: bool,
    reject_requests: bool,
    response_delay: Option<Duration>,
    request_count: usize,
    subscribers: Vec<mpsc::Sender<ProviderEvent>>,
}

impl LocalWalletState {
    /// Account list with the active account first, as extension wallets report it
    fn ordered_addresses(&self) -> Vec<String> {
        let mut addresses = Vec::with_capacity(self.accounts.len());
        addresses.push(self.accounts[self.active].address.clone());
        addresses.extend(
            self.accounts
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != self.active)
                .map(|(_, a)| a.address.clone()),
        );
        addresses
    }
}

/// In-memory wallet implementing [`WalletProvider`]
#[derive(Clone)]
pub struct LocalWallet {
    state: Arc<RwLock<LocalWalletState>>,
}

impl LocalWallet {
    /// Wallet with one account using the given signing key
    pub fn new(signing_key: SigningKey, chain_id: impl Into<String>) -> Self {
        Self {
            state: Arc::new(RwLock::new(LocalWalletState {
                accounts: vec![Account::new(signing_key)],
                active: 0,
                chain_id: chain_id.into(),
                authorized: false,
                reachable: true,
                reject_requests: false,
                response_delay: None,
                request_count: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Wallet with one freshly generated account
    pub fn random(chain_id: impl Into<String>) -> Self {
        Self::new(SigningKey::random(&mut OsRng), chain_id)
    }

    /// Wallet with one account imported from a 0x-prefixed hex private key
    pub fn from_private_key(
        private_key: &str,
        chain_id: impl Into<String>,
    ) -> Result<Self, CryptoError> {
        let secret = parse_private_key(private_key)?;
        Ok(Self::new(SigningKey::from(secret), chain_id))
    }

    /// Address of the active account
    pub async fn active_address(&self) -> String {
        let state = self.state.read().await;
        state.accounts[state.active].address.clone()
    }

    /// All account addresses, active first
    pub async fn addresses(&self) -> Vec<String> {
        self.state.read().await.ordered_addresses()
    }

    /// Number of `request_accounts` handshakes that reached the wallet
    pub async fn request_count(&self) -> usize {
        self.state.read().await.request_count
    }

    /// Add another account; returns its address
    pub async fn add_account(&self, signing_key: SigningKey) -> String {
        let account = Account::new(signing_key);
        let address = account.address.clone();
        self.state.write().await.accounts.push(account);
        address
    }

    /// Make the account at `index` active and notify subscribers
    ///
    /// Returns false if no account exists at `index`.
    pub async fn switch_account(&self, index: usize) -> bool {
        let event = {
            let mut state = self.state.write().await;
            if index >= state.accounts.len() {
                return false;
            }
            state.active = index;
            if !state.authorized {
                return true;
            }
            ProviderEvent::AccountsChanged(state.ordered_addresses())
        };
        self.emit(event).await;
        true
    }

    /// Switch network and notify subscribers
    pub async fn switch_chain(&self, chain_id: impl Into<String>) {
        let chain_id = chain_id.into();
        self.state.write().await.chain_id = chain_id.clone();
        self.emit(ProviderEvent::ChainChanged(chain_id)).await;
    }

    /// Revoke this client's authorization (emits an empty account list)
    pub async fn revoke_all(&self) {
        self.state.write().await.authorized = false;
        self.emit(ProviderEvent::AccountsChanged(Vec::new())).await;
    }

    /// Make subsequent handshakes and signing requests fail with 4001
    pub async fn set_reject_requests(&self, reject: bool) {
        self.state.write().await.reject_requests = reject;
    }

    /// Simulate the extension being unreachable
    pub async fn set_reachable(&self, reachable: bool) {
        self.state.write().await.reachable = reachable;
    }

    /// Delay every handshake response (simulates the user approval prompt)
    pub async fn set_response_delay(&self, delay: Option<Duration>) {
        self.state.write().await.response_delay = delay;
    }

    /// Deliver an arbitrary event to subscribers
    pub async fn emit(&self, event: ProviderEvent) {
        let subscribers = self.state.read().await.subscribers.clone();
        let mut closed = 0;

        for tx in &subscribers {
            if tx.send(event.clone()).await.is_err() {
                closed += 1;
            }
        }

        if closed > 0 {
            let mut state = self.state.write().await;
            state.subscribers.retain(|tx| !tx.is_closed());
            debug!("dropped {} closed provider event subscribers", closed);
        }
    }
}

#[async_trait]
impl WalletProvider for LocalWallet {
    async fn is_reachable(&self) -> bool {
        self.state.read().await.reachable
    }

    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError> {
        let delay = self.state.read().await.response_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.write().await;
        state.request_count += 1;

        if !state.reachable {
            return Err(ProviderError::Disconnected(
                "wallet is not reachable".to_string(),
            ));
        }
        if state.reject_requests {
            return Err(ProviderError::UserRejected);
        }

        state.authorized = true;
        info!("Local wallet authorized {} account(s)", state.accounts.len());
        Ok(state.ordered_addresses())
    }

    async fn current_chain_id(&self) -> Result<String, ProviderError> {
        let state = self.state.read().await;
        if !state.reachable {
            return Err(ProviderError::Disconnected(
                "wallet is not reachable".to_string(),
            ));
        }
        Ok(state.chain_id.clone())
    }

    async fn personal_sign(&self, message: &str, address: &str) -> Result<String, ProviderError> {
        let state = self.state.read().await;
        if state.reject_requests {
            return Err(ProviderError::UserRejected);
        }
        if !state.authorized {
            return Err(ProviderError::Unauthorized(
                "client has not been authorized".to_string(),
            ));
        }

        let account = state
            .accounts
            .iter()
            .find(|a| a.address.eq_ignore_ascii_case(address))
            .ok_or_else(|| ProviderError::Unauthorized(format!("unknown account {}", address)))?;

        personal_sign(&account.signing_key, message).map_err(|e| ProviderError::Rpc {
            code: -32603,
            message: e.to_string(),
        })
    }

    async fn subscribe(&self, events: mpsc::Sender<ProviderEvent>) -> Result<(), ProviderError> {
        self.state.write().await.subscribers.push(events);
        Ok(())
    }
}
