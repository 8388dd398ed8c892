//! Configuration for the tracker
//!
//! The network settings are carried for the chain client that sits outside
//! the ledger. No ledger operation reads them.

use serde::{Deserialize, Serialize};

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Tracker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// RPC endpoint of the chain client
    pub rpc_endpoint: String,

    /// WebSocket endpoint of the chain client
    pub ws_endpoint: String,

    /// On-chain program identifier (base58)
    pub program_id: Option<String>,

    /// Log filter directive for `tracing-subscriber`
    pub log_filter: String,

    /// Ledger policy
    pub ledger: LedgerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_endpoint: "https://api.devnet.solana.com".to_string(),
            ws_endpoint: "wss://api.devnet.solana.com".to_string(),
            program_id: None,
            log_filter: "info".to_string(),
            ledger: LedgerConfig::default(),
        }
    }
}

/// Ledger policy knobs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Reject zero-amount deposits/withdrawals instead of treating them as no-ops
    pub reject_zero_amount: bool,
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields from `TRACKER_*` environment variables
    pub fn apply_env(&mut self) -> crate::Result<()> {
        if let Ok(endpoint) = std::env::var("TRACKER_RPC_ENDPOINT") {
            self.rpc_endpoint = endpoint;
        }

        if let Ok(endpoint) = std::env::var("TRACKER_WS_ENDPOINT") {
            self.ws_endpoint = endpoint;
        }

        if let Ok(program_id) = std::env::var("TRACKER_PROGRAM_ID") {
            self.program_id = Some(program_id);
        }

        if let Ok(filter) = std::env::var("TRACKER_LOG") {
            self.log_filter = filter;
        }

        if let Ok(flag) = std::env::var("TRACKER_REJECT_ZERO_AMOUNT") {
            self.ledger.reject_zero_amount = flag.parse().map_err(|_| {
                crate::Error::Config(format!("TRACKER_REJECT_ZERO_AMOUNT: not a bool: {}", flag))
            })?;
        }

        Ok(())
    }

    /// Check endpoint schemes and the program ID shape
    pub fn validate(&self) -> crate::Result<()> {
        if !has_scheme(&self.rpc_endpoint, &["http://", "https://"]) {
            return Err(crate::Error::Config(format!(
                "RPC endpoint must be http(s): {}",
                self.rpc_endpoint
            )));
        }

        if !has_scheme(&self.ws_endpoint, &["ws://", "wss://"]) {
            return Err(crate::Error::Config(format!(
                "WebSocket endpoint must be ws(s): {}",
                self.ws_endpoint
            )));
        }

        if let Some(program_id) = &self.program_id {
            validate_program_id(program_id)?;
        }

        Ok(())
    }
}

fn has_scheme(url: &str, schemes: &[&str]) -> bool {
    schemes
        .iter()
        .any(|scheme| url.len() > scheme.len() && url.starts_with(scheme))
}

// A 32-byte public key is 32 to 44 base58 characters.
fn validate_program_id(program_id: &str) -> crate::Result<()> {
    if !(32..=44).contains(&program_id.len()) {
        return Err(crate::Error::Config(format!(
            "invalid program ID length {}: {}",
            program_id.len(),
            program_id
        )));
    }

    if let Some(bad) = program_id.chars().find(|c| !BASE58_ALPHABET.contains(*c)) {
        return Err(crate::Error::Config(format!(
            "invalid program ID character {:?}: {}",
            bad, program_id
        )));
    }

    Ok(())
}
