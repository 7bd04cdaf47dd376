use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::env;
use std::path::Path;

use crate::types::conversions::HEX_ADDRESS_PREFIX;
use crate::types::raw::MULTI_WALLET_TYPE;

#[derive(Debug, Deserialize, Clone)]
pub struct Selectors {
    /// Raw order status of swaps still waiting for the user's deposit.
    /// Such swaps are hidden from the sent list until their transaction is sent.
    #[serde(default = "default_pending_order_status")]
    pub pending_order_status: String,
    /// Address prefix of the case-insensitive (hex) address family.
    #[serde(default = "default_hex_address_prefix")]
    pub hex_address_prefix: String,
}

fn default_pending_order_status() -> String {
    "awaiting deposit".to_string()
}
fn default_hex_address_prefix() -> String {
    HEX_ADDRESS_PREFIX.to_string()
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            pending_order_status: default_pending_order_status(),
            hex_address_prefix: default_hex_address_prefix(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Wallets {
    /// Type tag marker of multi-asset wallets, which never match a receive address.
    #[serde(default = "default_multi_wallet_type")]
    pub multi_wallet_type: String,
}

fn default_multi_wallet_type() -> String {
    MULTI_WALLET_TYPE.to_string()
}

impl Default for Wallets {
    fn default() -> Self {
        Self {
            multi_wallet_type: default_multi_wallet_type(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    #[serde(default = "default_log_level")]
    pub level: String, // "trace", "debug", "info", "warn"
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub selectors: Selectors,
    #[serde(default)]
    pub wallets: Wallets,
    #[serde(default)]
    pub log: LogSettings,
}

impl Settings {
    /// Loads `Config.toml` from the working directory when present, then applies
    /// `SWAP_STATE_*` environment overrides.
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("Config.toml").required(false))
            .build()?;

        let mut settings: Self = s.try_deserialize()?;
        apply_env_overrides(&mut settings, |key| env::var(key).ok());
        Ok(settings)
    }

    /// Loads settings from an explicit file; missing sections take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()?;
        s.try_deserialize()
    }
}

/// Applies overrides read through `lookup`; blank values are ignored.
fn apply_env_overrides<F>(settings: &mut Settings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_blank = |key: &str| {
        lookup(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    if let Some(status) = non_blank("SWAP_STATE_PENDING_ORDER_STATUS") {
        settings.selectors.pending_order_status = status;
    }
    if let Some(prefix) = non_blank("SWAP_STATE_HEX_ADDRESS_PREFIX") {
        settings.selectors.hex_address_prefix = prefix;
    }
    if let Some(marker) = non_blank("SWAP_STATE_MULTI_WALLET_TYPE") {
        settings.wallets.multi_wallet_type = marker;
    }
    if let Some(level) = non_blank("SWAP_STATE_LOG_LEVEL") {
        settings.log.level = level;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.selectors.pending_order_status, "awaiting deposit");
        assert_eq!(settings.selectors.hex_address_prefix, "0x");
        assert_eq!(settings.wallets.multi_wallet_type, "MultiWallet");
        assert_eq!(settings.log.level, "info");
    }

    #[test]
    fn test_from_file_partial_sections() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[selectors]\npending_order_status = \"pending\"\n").unwrap();

        let settings = Settings::from_file(file.path()).unwrap();
        assert_eq!(settings.selectors.pending_order_status, "pending");
        assert_eq!(settings.selectors.hex_address_prefix, "0x");
        assert_eq!(settings.wallets.multi_wallet_type, "MultiWallet");
    }

    #[test]
    fn test_env_overrides_skip_blank_values() {
        let vars: HashMap<&str, &str> = [
            ("SWAP_STATE_MULTI_WALLET_TYPE", " Vault "),
            ("SWAP_STATE_LOG_LEVEL", "   "),
        ]
        .into_iter()
        .collect();
        let mut settings = Settings::default();

        apply_env_overrides(&mut settings, |key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(settings.wallets.multi_wallet_type, "Vault");
        assert_eq!(settings.log.level, "info");
    }
}
