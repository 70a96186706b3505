// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Wallet Private Key Extraction
//!
//! The command-line front end runs against an in-process wallet whose key
//! is read from the `WALLET_PRIVATE_KEY` environment variable.
//!
//! ## Security Considerations
//!
//! - Must be a 32-byte hex string with "0x" prefix
//! - Key is NEVER logged or persisted
//!
//! ## Usage
//!
//! ```no_run
//! use cryptotongue::crypto::extract_wallet_private_key;
//!
//! match extract_wallet_private_key() {
//!     Ok(key) => println!("✅ Wallet key loaded ({} chars)", key.len()),
//!     Err(e) => eprintln!("❌ Failed to load wallet key: {}", e),
//! }
//! ```

use anyhow::{anyhow, Result};
use std::env;
use tracing::info;

/// Environment variable holding the CLI wallet's private key
pub const WALLET_PRIVATE_KEY_VAR: &str = "WALLET_PRIVATE_KEY";

/// Read and validate the wallet private key from `WALLET_PRIVATE_KEY`
///
/// Returns the normalized key (lowercase, `0x`-prefixed).
///
/// # Errors
///
/// - variable not set or empty
/// - missing "0x" prefix
/// - not exactly 64 hex characters
pub fn extract_wallet_private_key() -> Result<String> {
    let key_str = env::var(WALLET_PRIVATE_KEY_VAR)
        .map_err(|_| anyhow!("{} environment variable not set", WALLET_PRIVATE_KEY_VAR))?;

    let key_str = key_str.trim();

    if key_str.is_empty() {
        return Err(anyhow!("{} is empty", WALLET_PRIVATE_KEY_VAR));
    }

    let hex_str = key_str.strip_prefix("0x").ok_or_else(|| {
        anyhow!(
            "{} must start with '0x' prefix (Ethereum format)",
            WALLET_PRIVATE_KEY_VAR
        )
    })?;

    if hex_str.len() != 64 {
        return Err(anyhow!(
            "{} must be exactly 64 hex characters (32 bytes), got {} characters",
            WALLET_PRIVATE_KEY_VAR,
            hex_str.len()
        ));
    }

    hex::decode(hex_str).map_err(|e| {
        anyhow!(
            "{} contains invalid hex characters: {}",
            WALLET_PRIVATE_KEY_VAR,
            e
        )
    })?;

    // Log success WITHOUT logging the actual key
    info!("✅ Wallet private key loaded successfully (32 bytes)");

    Ok(format!("0x{}", hex_str.to_ascii_lowercase()))
}
