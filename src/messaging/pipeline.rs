// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use super::contacts::ContactDirectory;
use super::error::MessageError;
use super::message::{Disclosure, Message, DEFAULT_PREVIEW_CHARS};
use crate::crypto::KeyMaterialProvider;
use crate::wallet::WalletSessionManager;
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

type RevealFuture = Shared<BoxFuture<'static, Result<String, MessageError>>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Ciphertext characters exposed while a message is sealed
    pub preview_chars: usize,
    /// Use the raw recipient address as key material when no public key is known
    pub address_key_fallback: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            preview_chars: DEFAULT_PREVIEW_CHARS,
            address_key_fallback: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    pub recipient_address: String,
    pub plaintext: String,
    pub want_encryption: bool,
}

impl SendRequest {
    pub fn new(
        recipient_address: impl Into<String>,
        plaintext: impl Into<String>,
        want_encryption: bool,
    ) -> Self {
        Self {
            recipient_address: recipient_address.into(),
            plaintext: plaintext.into(),
            want_encryption,
        }
    }
}

/// A message handed to the pipeline by whatever delivers inbound traffic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub sender_address: String,
    pub content: String,
    pub is_encrypted: bool,
    /// Defaults to the time of receipt
    pub timestamp: Option<DateTime<Utc>>,
}

impl InboundMessage {
    pub fn new(
        sender_address: impl Into<String>,
        content: impl Into<String>,
        is_encrypted: bool,
    ) -> Self {
        Self {
            sender_address: sender_address.into(),
            content: content.into(),
            is_encrypted,
            timestamp: None,
        }
    }
}

/// Composes, stores and reveals the messages of the current session
///
/// The message list is append-only and ordered by arrival in the pipeline.
/// Plaintext never leaves memory.
#[derive(Clone)]
pub struct MessagePipeline {
    session: WalletSessionManager,
    key_material: Arc<dyn KeyMaterialProvider>,
    contacts: Arc<dyn ContactDirectory>,
    messages: Arc<RwLock<Vec<Message>>>,
    // One decrypt per message id; lock before `messages`
    in_flight: Arc<Mutex<HashMap<String, RevealFuture>>>,
    config: PipelineConfig,
}

impl MessagePipeline {
    pub fn new(
        session: WalletSessionManager,
        key_material: Arc<dyn KeyMaterialProvider>,
        contacts: Arc<dyn ContactDirectory>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            session,
            key_material,
            contacts,
            messages: Arc::new(RwLock::new(Vec::new())),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Compose an outbound message as the connected user
    ///
    /// Failures are returned and also published as session error notices.
    pub async fn send(&self, request: SendRequest) -> Result<Message, MessageError> {
        let result = self.compose(request).await;
        if let Err(e) = &result {
            self.session.report_error(e.kind(), e.to_string());
        }
        result
    }

    async fn compose(&self, request: SendRequest) -> Result<Message, MessageError> {
        let identity = self
            .session
            .identity()
            .await
            .ok_or(MessageError::NotConnected)?;

        if request.plaintext.trim().is_empty() {
            return Err(MessageError::EmptyMessage);
        }

        let content = if request.want_encryption {
            let key = self.recipient_key(&request.recipient_address)?;
            self.key_material
                .encrypt(&request.plaintext, &key)
                .await
                .map_err(|e| {
                    warn!("Encrypting message failed: {}", e);
                    MessageError::Encryption(e.to_string())
                })?
        } else {
            request.plaintext
        };

        let message = Message::outbound(
            identity.address,
            request.recipient_address,
            content,
            request.want_encryption,
        );
        debug!(
            id = %message.id,
            encrypted = message.is_encrypted,
            "Message sent"
        );

        self.messages.write().await.push(message.clone());
        Ok(message)
    }

    /// Append a delivered message
    pub async fn receive(&self, inbound: InboundMessage) -> Message {
        let timestamp = inbound.timestamp.unwrap_or_else(Utc::now);
        let message = Message::inbound(
            inbound.sender_address,
            inbound.content,
            inbound.is_encrypted,
            timestamp,
        );
        debug!(
            id = %message.id,
            encrypted = message.is_encrypted,
            "Message received"
        );

        self.messages.write().await.push(message.clone());
        message
    }

    /// Decrypt an encrypted message on demand and cache the result
    ///
    /// Revealed messages return the cached text without decrypting again.
    /// Concurrent calls for the same message share one decrypt, so callers
    /// joining an in-flight reveal get its outcome regardless of the key
    /// they passed. On failure the message returns to `Sealed` and a later
    /// call retries.
    ///
    /// The decrypt runs on its own task: dropping every caller does not
    /// leave the message stuck in `Revealing`.
    pub async fn reveal(&self, id: &str, private_key: &str) -> Result<String, MessageError> {
        let reveal = {
            let mut in_flight = self.in_flight.lock().await;

            if let Some(pending) = in_flight.get(id) {
                debug!(id, "Joining in-flight reveal");
                pending.clone()
            } else {
                let mut messages = self.messages.write().await;
                let message = match messages.iter_mut().find(|m| m.id == id) {
                    Some(message) => message,
                    None => {
                        let err = MessageError::UnknownMessage(id.to_string());
                        self.session.report_error(err.kind(), err.to_string());
                        return Err(err);
                    }
                };

                if !message.is_encrypted {
                    return Ok(message.content.clone());
                }
                if let Some(text) = &message.decrypted_content {
                    return Ok(text.clone());
                }

                message.begin_reveal();
                let ciphertext = message.content.clone();
                drop(messages);

                let task = tokio::spawn(self.clone().run_reveal(
                    id.to_string(),
                    ciphertext,
                    private_key.to_string(),
                ));
                let reveal = async move {
                    task.await.unwrap_or_else(|e| {
                        Err(MessageError::Decryption(format!("reveal task failed: {}", e)))
                    })
                }
                .boxed()
                .shared();
                in_flight.insert(id.to_string(), reveal.clone());
                reveal
            }
        };

        reveal.await
    }

    async fn run_reveal(
        self,
        id: String,
        ciphertext: String,
        private_key: String,
    ) -> Result<String, MessageError> {
        let outcome = self
            .key_material
            .decrypt(&ciphertext, &private_key)
            .await
            .map_err(|e| MessageError::Decryption(e.to_string()));

        let mut in_flight = self.in_flight.lock().await;
        {
            let mut messages = self.messages.write().await;
            if let Some(message) = messages.iter_mut().find(|m| m.id == id) {
                match &outcome {
                    Ok(plaintext) => message.complete_reveal(plaintext.clone()),
                    Err(_) => message.reseal(),
                }
            }
        }
        in_flight.remove(&id);

        match &outcome {
            Ok(_) => info!(id = %id, "🔓 Message revealed"),
            Err(e) => {
                warn!(id = %id, "Reveal failed, message stays sealed: {}", e);
                self.session.report_error(e.kind(), e.to_string());
            }
        }
        outcome
    }

    pub async fn disclosure(&self, id: &str) -> Result<Option<Disclosure>, MessageError> {
        Ok(self.message(id).await?.disclosure)
    }

    pub async fn message(&self, id: &str) -> Result<Message, MessageError> {
        self.messages
            .read()
            .await
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| MessageError::UnknownMessage(id.to_string()))
    }

    /// All messages in pipeline order
    pub async fn messages(&self) -> Vec<Message> {
        self.messages.read().await.clone()
    }

    /// Messages exchanged with `peer`, in pipeline order
    pub async fn conversation(&self, peer: &str) -> Vec<Message> {
        self.messages
            .read()
            .await
            .iter()
            .filter(|m| m.peer_address.eq_ignore_ascii_case(peer))
            .cloned()
            .collect()
    }

    /// Presentation-safe text of a message
    pub async fn preview(&self, id: &str) -> Result<String, MessageError> {
        Ok(self.message(id).await?.preview(self.config.preview_chars))
    }

    fn recipient_key(&self, recipient: &str) -> Result<String, MessageError> {
        if let Some(key) = self.contacts.lookup(recipient).and_then(|c| c.public_key) {
            return Ok(key);
        }

        if self.config.address_key_fallback {
            debug!("No public key on file for recipient, using address as key material");
            Ok(recipient.to_string())
        } else {
            Err(MessageError::Encryption(format!(
                "no public key known for {}",
                recipient
            )))
        }
    }
}
