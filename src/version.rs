// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for CryptoTongue

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-wallet-messaging-2025-10-18";

/// Semantic version number
pub const VERSION_NUMBER: &str = "0.1.0";

pub const VERSION_MAJOR: u32 = 0;
pub const VERSION_MINOR: u32 = 1;
pub const VERSION_PATCH: u32 = 0;

/// Build date
pub const BUILD_DATE: &str = "2025-10-18";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "wallet-session",
    "session-restore",
    "provider-events",
    "end-to-end-encryption",
    "ecdh-key-exchange",
    "xchacha20-poly1305",
    "versioned-envelope",
    "eip191-signatures",
    "on-demand-reveal",
];

/// Ciphertext envelope versions this build can open
pub const ENVELOPE_VERSIONS: &[u8] = &[crate::crypto::ENVELOPE_VERSION];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("CryptoTongue {} ({})", VERSION_NUMBER, BUILD_DATE)
}

/// Get full version info as JSON
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "date": BUILD_DATE,
        "features": FEATURES,
        "envelopeVersions": ENVELOPE_VERSIONS,
    })
}
