// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Wallet Session Manager
//!
//! Owns the single wallet session of this client: connection status, the
//! local user's identity (address + chain), and the last error. All
//! transitions go through [`WalletSessionManager`]; everyone else reads
//! snapshots.
//!
//! ```text
//!                connect()                 provider ok
//! Disconnected ───────────▶ Connecting ───────────────▶ Connected(identity)
//!      ▲                        │  rejected / absent           │
//!      └────────────────────────┘                              │
//!      ▲        disconnect() / accountsChanged([])             │
//!      └───────────────────────────────────────────────────────┘
//! ```
//!
//! Provider events are drained from a single channel in arrival order.

pub mod error;
pub mod manager;
pub mod session;

pub use error::SessionError;
pub use manager::{SessionConfig, WalletSessionManager};
pub use session::{shorten_address, Identity, SessionNotice, SessionStatus, WalletSession};
