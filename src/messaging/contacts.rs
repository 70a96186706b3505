// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub address: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Contact {
    pub fn new(address: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            display_name: display_name.into(),
            public_key: None,
            notes: None,
        }
    }

    pub fn with_public_key(mut self, public_key: impl Into<String>) -> Self {
        self.public_key = Some(public_key.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Source of recipient key material
pub trait ContactDirectory: Send + Sync {
    fn lookup(&self, address: &str) -> Option<Contact>;
}

/// Contact list held in memory, keyed by lowercased address
#[derive(Debug, Default)]
pub struct InMemoryContacts {
    contacts: RwLock<BTreeMap<String, Contact>>,
}

impl InMemoryContacts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the contact with this address
    pub fn add(&self, contact: Contact) {
        if let Ok(mut contacts) = self.contacts.write() {
            contacts.insert(contact.address.to_lowercase(), contact);
        }
    }

    pub fn remove(&self, address: &str) -> Option<Contact> {
        self.contacts.write().ok()?.remove(&address.to_lowercase())
    }

    pub fn list(&self) -> Vec<Contact> {
        match self.contacts.read() {
            Ok(contacts) => contacts.values().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Contacts whose name or address contains `query` (case-insensitive)
    pub fn search(&self, query: &str) -> Vec<Contact> {
        let query = query.to_lowercase();
        self.list()
            .into_iter()
            .filter(|c| {
                c.display_name.to_lowercase().contains(&query)
                    || c.address.to_lowercase().contains(&query)
            })
            .collect()
    }
}

impl ContactDirectory for InMemoryContacts {
    fn lookup(&self, address: &str) -> Option<Contact> {
        self.contacts
            .read()
            .ok()?
            .get(&address.to_lowercase())
            .cloned()
    }
}
