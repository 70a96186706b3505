// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use thiserror::Error;

/// Errors raised by the message pipeline
///
/// Every variant is local to one send or one reveal; the message list and
/// the wallet session are unaffected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    #[error("Wallet is not connected")]
    NotConnected,

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption failed: {0}")]
    Decryption(String),

    #[error("Unknown message: {0}")]
    UnknownMessage(String),
}

impl MessageError {
    /// Short machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            MessageError::NotConnected => "not_connected",
            MessageError::EmptyMessage => "empty_message",
            MessageError::Encryption(_) => "encryption_error",
            MessageError::Decryption(_) => "decryption_error",
            MessageError::UnknownMessage(_) => "unknown_message",
        }
    }
}
