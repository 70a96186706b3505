// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use super::error::SessionError;
use super::session::{shorten_address, Identity, SessionNotice, SessionStatus, WalletSession};
use crate::persistence::PersistenceBridge;
use crate::provider::{ProviderEvent, WalletProvider};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

const NOTICE_CHANNEL_CAPACITY: usize = 100;
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Account and chain events received while a handshake is in flight
#[derive(Debug, Default)]
struct PendingChanges {
    address: Option<String>,
    chain_id: Option<String>,
}

impl PendingChanges {
    fn apply(self, identity: &mut Identity) {
        if let Some(address) = self.address {
            identity.address = address;
        }
        if let Some(chain_id) = self.chain_id {
            identity.chain_id = Some(chain_id);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Upper bound on the wallet's answer to a connect request
    pub handshake_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            handshake_timeout_secs: 60,
        }
    }
}

impl SessionConfig {
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }
}

/// Handle to the client's single wallet session
///
/// Cloning yields another handle to the same session.
#[derive(Clone)]
pub struct WalletSessionManager {
    state: Arc<RwLock<WalletSession>>,
    provider: Option<Arc<dyn WalletProvider>>,
    persistence: PersistenceBridge,
    notices: broadcast::Sender<SessionNotice>,
    // Bumped whenever a transition invalidates an in-flight handshake
    epoch: Arc<AtomicU64>,
    // Serializes state transitions together with their persistence writes
    transitions: Arc<Mutex<()>>,
    // Only touched while holding the `state` write lock
    pending: Arc<Mutex<PendingChanges>>,
    config: SessionConfig,
}

impl WalletSessionManager {
    /// New manager in `Disconnected`; `provider` is `None` when no wallet is installed
    pub fn new(
        provider: Option<Arc<dyn WalletProvider>>,
        persistence: PersistenceBridge,
        config: SessionConfig,
    ) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CHANNEL_CAPACITY);

        Self {
            state: Arc::new(RwLock::new(WalletSession::disconnected())),
            provider,
            persistence,
            notices,
            epoch: Arc::new(AtomicU64::new(0)),
            transitions: Arc::new(Mutex::new(())),
            pending: Arc::new(Mutex::new(PendingChanges::default())),
            config,
        }
    }

    pub fn provider(&self) -> Option<Arc<dyn WalletProvider>> {
        self.provider.clone()
    }

    pub fn persistence(&self) -> &PersistenceBridge {
        &self.persistence
    }

    pub async fn snapshot(&self) -> WalletSession {
        self.state.read().await.clone()
    }

    /// Identity of the connected user, `None` unless `Connected`
    pub async fn identity(&self) -> Option<Identity> {
        self.state.read().await.identity().cloned()
    }

    pub async fn is_connected(&self) -> bool {
        self.state.read().await.is_connected()
    }

    pub fn subscribe_notices(&self) -> broadcast::Receiver<SessionNotice> {
        self.notices.subscribe()
    }

    /// Re-enter a previously authorized session without a handshake
    ///
    /// Requires the persisted flags to describe a connected session and the
    /// provider to be reachable right now. Otherwise the session stays
    /// `Disconnected` and the persisted flags are left untouched.
    pub async fn restore(&self) -> WalletSession {
        let persisted = self.persistence.load_session().await;
        let address = match persisted.restorable_address() {
            Some(address) => address.to_string(),
            None => {
                debug!("No persisted wallet session to restore");
                return self.snapshot().await;
            }
        };

        let provider = match &self.provider {
            Some(provider) => provider.clone(),
            None => {
                info!("Persisted wallet session found but no wallet provider is installed");
                return self.snapshot().await;
            }
        };

        if !provider.is_reachable().await {
            info!("Persisted wallet session found but the wallet is not reachable");
            return self.snapshot().await;
        }

        let chain_id = match provider.current_chain_id().await {
            Ok(chain_id) => Some(chain_id),
            Err(e) => {
                warn!("Could not read chain id while restoring session: {}", e);
                None
            }
        };

        let _transition = self.transitions.lock().await;
        let mut state = self.state.write().await;
        if state.status() != SessionStatus::Disconnected {
            debug!("Skipping restore: session is already {}", state.status());
            return state.clone();
        }

        self.epoch.fetch_add(1, Ordering::SeqCst);
        let identity = Identity::new(address, chain_id);
        info!("🔄 Restored wallet session for {}", identity.short_address());
        *state = WalletSession::connected(identity.clone());
        let snapshot = state.clone();
        drop(state);

        self.publish(SessionNotice::Connected {
            address: identity.address,
        });
        snapshot
    }

    /// Run the wallet handshake
    ///
    /// A call while a handshake is already in flight, or while connected,
    /// returns the current snapshot without contacting the wallet.
    pub async fn connect(&self) -> Result<WalletSession, SessionError> {
        let (provider, epoch) = {
            let mut state = self.state.write().await;
            match state.status() {
                SessionStatus::Connecting => {
                    debug!("connect() ignored: handshake already in flight");
                    return Ok(state.clone());
                }
                SessionStatus::Connected => {
                    debug!("connect() ignored: already connected");
                    return Ok(state.clone());
                }
                SessionStatus::Disconnected => {}
            }

            let provider = match &self.provider {
                Some(provider) => provider.clone(),
                None => {
                    let err = SessionError::ProviderUnavailable;
                    state.fail(err.to_string());
                    drop(state);
                    warn!("Cannot connect: {}", err);
                    self.publish_error(&err);
                    return Err(err);
                }
            };

            state.begin_connecting();
            *self.pending.lock().await = PendingChanges::default();
            (provider, self.epoch.fetch_add(1, Ordering::SeqCst) + 1)
        };

        info!("Connecting to wallet...");
        let outcome = match timeout(
            self.config.handshake_timeout(),
            Self::handshake(provider.as_ref()),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(SessionError::Timeout(self.config.handshake_timeout_secs)),
        };

        self.finish_connect(epoch, outcome).await
    }

    async fn handshake(provider: &dyn WalletProvider) -> Result<Identity, SessionError> {
        if !provider.is_reachable().await {
            return Err(SessionError::ProviderUnavailable);
        }

        let accounts = provider.request_accounts().await?;
        let address = accounts
            .into_iter()
            .next()
            .filter(|a| !a.trim().is_empty())
            .ok_or_else(|| {
                SessionError::UserRejected("wallet authorized no accounts".to_string())
            })?;

        let chain_id = match provider.current_chain_id().await {
            Ok(chain_id) => Some(chain_id),
            Err(e) => {
                warn!("Connected without chain id: {}", e);
                None
            }
        };

        Ok(Identity::new(address, chain_id))
    }

    async fn finish_connect(
        &self,
        epoch: u64,
        outcome: Result<Identity, SessionError>,
    ) -> Result<WalletSession, SessionError> {
        let _transition = self.transitions.lock().await;
        let mut state = self.state.write().await;

        if self.epoch.load(Ordering::SeqCst) != epoch
            || state.status() != SessionStatus::Connecting
        {
            warn!("Discarding wallet handshake result: session changed while connecting");
            return Err(SessionError::Cancelled);
        }

        let pending = std::mem::take(&mut *self.pending.lock().await);

        match outcome {
            Ok(mut identity) => {
                if pending.address.is_some() || pending.chain_id.is_some() {
                    debug!("Applying provider events received during the handshake");
                    pending.apply(&mut identity);
                }
                *state = WalletSession::connected(identity.clone());
                let snapshot = state.clone();
                drop(state);

                self.persistence.save_connected(&identity.address).await;
                info!(
                    chain_id = ?identity.chain_id,
                    "✅ Wallet connected: {}",
                    identity.short_address()
                );
                self.publish(SessionNotice::Connected {
                    address: identity.address,
                });
                Ok(snapshot)
            }
            Err(err) => {
                state.fail(err.to_string());
                drop(state);

                warn!("Wallet connection failed: {}", err);
                self.publish_error(&err);
                Err(err)
            }
        }
    }

    /// End the session and forget the persisted flags
    ///
    /// Cancels an in-flight handshake. A no-op when already disconnected.
    pub async fn disconnect(&self) {
        let _transition = self.transitions.lock().await;
        if !self.reset_session().await {
            debug!("disconnect() ignored: already disconnected");
            return;
        }

        self.persistence.clear_session().await;
        info!("Wallet disconnected");
        self.publish(SessionNotice::Disconnected);
    }

    /// Apply one provider event
    pub async fn handle_event(&self, event: ProviderEvent) {
        let _transition = self.transitions.lock().await;
        match event {
            ProviderEvent::AccountsChanged(accounts) => match accounts.into_iter().next() {
                Some(address) => self.change_account(address).await,
                None => self.revoke().await,
            },
            ProviderEvent::ChainChanged(chain_id) => self.change_chain(chain_id).await,
        }
    }

    /// Subscribe to the provider and drain its events in the background
    pub async fn attach_provider_events(&self) -> Result<JoinHandle<()>, SessionError> {
        let provider = self
            .provider
            .clone()
            .ok_or(SessionError::ProviderUnavailable)?;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        provider.subscribe(tx).await?;
        Ok(self.spawn_event_loop(rx))
    }

    /// Drain `events` in arrival order until the sender side closes
    pub fn spawn_event_loop(&self, mut events: mpsc::Receiver<ProviderEvent>) -> JoinHandle<()> {
        let manager = self.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                debug!("Provider event: {:?}", event);
                manager.handle_event(event).await;
            }
            debug!("Provider event stream closed");
        })
    }

    /// EIP-191 signature by the connected account
    pub async fn sign_message(&self, message: &str) -> Result<String, SessionError> {
        let identity = self.identity().await.ok_or(SessionError::NotConnected)?;
        let provider = self
            .provider
            .as_ref()
            .ok_or(SessionError::ProviderUnavailable)?;

        match provider.personal_sign(message, &identity.address).await {
            Ok(signature) => Ok(signature),
            Err(e) => {
                let err = SessionError::from(e);
                self.state.write().await.record_error(err.to_string());
                self.publish_error(&err);
                Err(err)
            }
        }
    }

    async fn revoke(&self) {
        let changed = self.reset_session().await;

        // Revocation always invalidates what a restart would trust
        self.persistence.clear_session().await;

        if changed {
            info!("Wallet revoked account access, session closed");
            self.publish(SessionNotice::Disconnected);
        } else {
            debug!("accountsChanged([]) while already disconnected");
        }
    }

    async fn change_account(&self, address: String) {
        let mut state = self.state.write().await;
        let status = state.status();
        if status == SessionStatus::Connecting {
            debug!("Holding accountsChanged until the handshake completes");
            self.pending.lock().await.address = Some(address);
            return;
        }
        let identity = match state.identity_mut() {
            Some(identity) => identity,
            None => {
                debug!("Ignoring accountsChanged while {}", status);
                return;
            }
        };

        if identity.address == address {
            debug!("accountsChanged reports the current account");
            return;
        }

        identity.address = address.clone();
        drop(state);

        self.persistence.save_address(&address).await;
        info!("Wallet account changed to {}", shorten_address(&address));
        self.publish(SessionNotice::AccountChanged { address });
    }

    async fn change_chain(&self, chain_id: String) {
        let mut state = self.state.write().await;
        let status = state.status();
        if status == SessionStatus::Connecting {
            debug!("Holding chainChanged until the handshake completes");
            self.pending.lock().await.chain_id = Some(chain_id);
            return;
        }
        let identity = match state.identity_mut() {
            Some(identity) => identity,
            None => {
                debug!("Ignoring chainChanged while {}", status);
                return;
            }
        };

        if identity.chain_id.as_deref() == Some(chain_id.as_str()) {
            return;
        }

        identity.chain_id = Some(chain_id.clone());
        drop(state);

        info!("Wallet network changed to {}", chain_id);
        self.publish(SessionNotice::NetworkChanged { chain_id });
    }

    /// Move to `Disconnected`; false if already there
    async fn reset_session(&self) -> bool {
        let mut state = self.state.write().await;
        if state.status() == SessionStatus::Disconnected {
            return false;
        }

        self.epoch.fetch_add(1, Ordering::SeqCst);
        *state = WalletSession::disconnected();
        true
    }

    fn publish(&self, notice: SessionNotice) {
        // No receivers is fine
        let _ = self.notices.send(notice);
    }

    fn publish_error(&self, err: &SessionError) {
        self.report_error(err.kind(), err.to_string());
    }

    /// Publish a failure from a session consumer as an error notice
    pub fn report_error(&self, kind: &str, message: impl Into<String>) {
        self.publish(SessionNotice::Error {
            kind: kind.to_string(),
            message: message.into(),
        });
    }
}
