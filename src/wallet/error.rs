// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use crate::provider::ProviderError;
use thiserror::Error;

/// Errors raised by wallet session operations
///
/// None of these are fatal: the session is left in a valid state and the
/// error is also published as a [`super::SessionNotice::Error`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No wallet provider is installed or reachable
    #[error("Wallet provider is not available")]
    ProviderUnavailable,

    /// The wallet declined the authorization request
    #[error("Wallet request was rejected: {0}")]
    UserRejected(String),

    /// Operation needs an active session
    #[error("Wallet is not connected")]
    NotConnected,

    /// The wallet did not answer within the handshake timeout
    #[error("Wallet did not respond within {0} seconds")]
    Timeout(u64),

    /// The handshake was superseded by a disconnect before it completed
    #[error("Wallet connection was cancelled")]
    Cancelled,

    /// Any other provider failure
    #[error("Wallet provider error: {0}")]
    Provider(String),
}

impl SessionError {
    /// Short machine-readable kind, used in notices
    pub fn kind(&self) -> &'static str {
        match self {
            SessionError::ProviderUnavailable => "provider_unavailable",
            SessionError::UserRejected(_) => "user_rejected",
            SessionError::NotConnected => "not_connected",
            SessionError::Timeout(_) => "timeout",
            SessionError::Cancelled => "cancelled",
            SessionError::Provider(_) => "provider_error",
        }
    }
}

impl From<ProviderError> for SessionError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::UserRejected => {
                SessionError::UserRejected("user denied the request".to_string())
            }
            ProviderError::Unauthorized(reason) => SessionError::UserRejected(reason),
            ProviderError::Disconnected(_) => SessionError::ProviderUnavailable,
            other => SessionError::Provider(other.to_string()),
        }
    }
}
