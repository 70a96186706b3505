// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod cli;
pub mod config;
pub mod crypto;
pub mod messaging;
pub mod persistence;
pub mod provider;
pub mod version;
pub mod wallet;

pub use config::ChatConfig;
pub use crypto::{CryptoError, KeyMaterialProvider, KeyPair, Secp256k1KeyMaterial};
pub use messaging::{
    Contact, ContactDirectory, Disclosure, InMemoryContacts, InboundMessage, Message,
    MessageError, MessagePipeline, PipelineConfig, SendRequest,
};
pub use persistence::{FileStore, KeyValueStore, MemoryStore, PersistenceBridge};
pub use provider::{LocalWallet, ProviderError, ProviderEvent, WalletProvider};
pub use wallet::{
    Identity, SessionConfig, SessionError, SessionNotice, SessionStatus, WalletSession,
    WalletSessionManager,
};
