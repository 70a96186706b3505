// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default number of ciphertext characters shown for a sealed message
pub const DEFAULT_PREVIEW_CHARS: usize = 30;

/// Disclosure state of an encrypted message
///
/// ```text
/// Sealed ──reveal──▶ Revealing ──decrypt ok──▶ Revealed
///    ▲                   │
///    └───decrypt failed──┘
/// ```
///
/// `Revealed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disclosure {
    Sealed,
    Revealing,
    Revealed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    /// Plaintext, or the ciphertext envelope when `is_encrypted`
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_encrypted: bool,
    /// True for messages composed by the local user
    pub is_sent: bool,
    pub sender_address: String,
    /// The other party of the conversation
    pub peer_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decrypted_content: Option<String>,
    /// `None` for plaintext messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disclosure: Option<Disclosure>,
}

impl Message {
    fn new(
        content: String,
        is_encrypted: bool,
        is_sent: bool,
        sender_address: String,
        peer_address: String,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content,
            timestamp,
            is_encrypted,
            is_sent,
            sender_address,
            peer_address,
            decrypted_content: None,
            disclosure: is_encrypted.then_some(Disclosure::Sealed),
        }
    }

    /// Message composed locally and addressed to `recipient`
    pub fn outbound(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        content: impl Into<String>,
        is_encrypted: bool,
    ) -> Self {
        Self::new(
            content.into(),
            is_encrypted,
            true,
            sender.into(),
            recipient.into(),
            Utc::now(),
        )
    }

    /// Message delivered from `sender`
    pub fn inbound(
        sender: impl Into<String>,
        content: impl Into<String>,
        is_encrypted: bool,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let sender = sender.into();
        Self::new(
            content.into(),
            is_encrypted,
            false,
            sender.clone(),
            sender,
            timestamp,
        )
    }

    pub fn is_revealed(&self) -> bool {
        self.disclosure == Some(Disclosure::Revealed)
    }

    /// Text safe to show right now
    ///
    /// Plaintext messages show their content and revealed messages their
    /// decrypted text. Anything still sealed shows at most `max_chars`
    /// characters of ciphertext followed by `...`.
    pub fn preview(&self, max_chars: usize) -> String {
        if !self.is_encrypted {
            return self.content.clone();
        }
        if let Some(text) = &self.decrypted_content {
            return text.clone();
        }

        let prefix: String = self.content.chars().take(max_chars).collect();
        format!("{}...", prefix)
    }

    pub(crate) fn begin_reveal(&mut self) {
        if self.disclosure == Some(Disclosure::Sealed) {
            self.disclosure = Some(Disclosure::Revealing);
        }
    }

    pub(crate) fn complete_reveal(&mut self, plaintext: String) {
        if self.is_revealed() {
            return;
        }
        self.decrypted_content = Some(plaintext);
        self.disclosure = Some(Disclosure::Revealed);
    }

    pub(crate) fn reseal(&mut self) {
        if self.disclosure == Some(Disclosure::Revealing) {
            self.disclosure = Some(Disclosure::Sealed);
        }
    }
}
