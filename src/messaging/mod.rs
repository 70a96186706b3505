// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Message Pipeline
//!
//! Outbound messages are composed as the connected wallet identity and,
//! when requested, encrypted to the recipient's public key from the
//! contact directory. Inbound encrypted messages stay sealed until the
//! user reveals them; each reveal runs at most one decrypt per message.

pub mod contacts;
pub mod error;
pub mod message;
pub mod pipeline;

pub use contacts::{Contact, ContactDirectory, InMemoryContacts};
pub use error::MessageError;
pub use message::{Disclosure, Message, DEFAULT_PREVIEW_CHARS};
pub use pipeline::{InboundMessage, MessagePipeline, PipelineConfig, SendRequest};
