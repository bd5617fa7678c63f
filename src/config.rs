//! Configuration
//!
//! Read from environment variables, optionally seeded from a `.env` file.

use alloy::primitives::Address;
use eyre::{eyre, Result, WrapErr};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::address::normalize_address;
use crate::chains::{Layer, NetworkPair, ETHEREUM_MAINNET_CHAIN_ID, LINEA_MAINNET_CHAIN_ID};
use crate::rpc_fallback::{candidate_endpoints, parse_rpc_urls};
use crate::verifier::DEFAULT_BATCH_SIZE;

pub const DEFAULT_L1_BRIDGE_ADDRESS: &str = "0x051F1D88f0aF5763fB888eC4378b4D8B29ea3319";
pub const DEFAULT_L2_BRIDGE_ADDRESS: &str = "0x353012dc4a9A6cF55c941bADC267f82004A8ceB9";
pub const DEFAULT_FULL_LIST_PATH: &str = "json/linea-mainnet-token-fulllist.json";
pub const DEFAULT_SHORT_LIST_PATH: &str = "json/linea-mainnet-token-shortlist.json";
pub const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com/api/v3/coins/1/contract/";
pub const DEFAULT_COINMARKETCAP_URL: &str = "https://pro-api.coinmarketcap.com";

#[derive(Clone)]
pub struct Config {
    /// L1 RPC URLs, in priority order
    pub l1_rpc_urls: Vec<String>,
    /// L2 RPC URLs, in priority order
    pub l2_rpc_urls: Vec<String>,
    pub l1_bridge_address: String,
    pub l2_bridge_address: String,
    pub full_list_path: PathBuf,
    pub short_list_path: PathBuf,
    pub coingecko_url: String,
    pub coinmarketcap_url: String,
    pub coinmarketcap_api_key: String,
    pub l1_chain_id: u64,
    pub l2_chain_id: u64,
    pub batch_size: usize,
    pub rpc_timeout_secs: u64,
    /// Append public endpoints after the configured ones
    pub use_public_rpc_fallback: bool,
}

/// Custom Debug that redacts the CoinMarketCap API key.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("l1_rpc_urls", &self.l1_rpc_urls)
            .field("l2_rpc_urls", &self.l2_rpc_urls)
            .field("l1_bridge_address", &self.l1_bridge_address)
            .field("l2_bridge_address", &self.l2_bridge_address)
            .field("full_list_path", &self.full_list_path)
            .field("short_list_path", &self.short_list_path)
            .field("coingecko_url", &self.coingecko_url)
            .field("coinmarketcap_url", &self.coinmarketcap_url)
            .field("coinmarketcap_api_key", &"<redacted>")
            .field("l1_chain_id", &self.l1_chain_id)
            .field("l2_chain_id", &self.l2_chain_id)
            .field("batch_size", &self.batch_size)
            .field("rpc_timeout_secs", &self.rpc_timeout_secs)
            .field("use_public_rpc_fallback", &self.use_public_rpc_fallback)
            .finish()
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T> {
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| eyre!("{} must be a valid {}", key, std::any::type_name::<T>())),
        _ => Ok(default),
    }
}

fn parse_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> Result<bool> {
    match lookup(key).map(|v| v.trim().to_lowercase()) {
        None => Ok(default),
        Some(v) if v.is_empty() => Ok(default),
        Some(v) if v == "true" || v == "1" || v == "yes" => Ok(true),
        Some(v) if v == "false" || v == "0" || v == "no" => Ok(false),
        Some(v) => Err(eyre!("{} must be true or false, got '{}'", key, v)),
    }
}

impl Config {
    /// Load `.env` if present, then read the environment
    pub fn load() -> Result<Self> {
        Self::load_from_file(".env")
    }

    pub fn load_from_file(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            dotenvy::from_filename(path)
                .wrap_err_with(|| format!("Failed to load .env file from {}", path))?;
            tracing::debug!("Loaded .env from {}", path);
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; missing keys take their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let text = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            l1_rpc_urls: parse_rpc_urls(&text("PROVIDER_URL", "")),
            l2_rpc_urls: parse_rpc_urls(&text("LINEA_PROVIDER_URL", "")),
            l1_bridge_address: text("CONTRACT_ADDRESS", DEFAULT_L1_BRIDGE_ADDRESS),
            l2_bridge_address: text("L2_CONTRACT_ADDRESS", DEFAULT_L2_BRIDGE_ADDRESS),
            full_list_path: PathBuf::from(text("TOKEN_FULL_LIST_PATH", DEFAULT_FULL_LIST_PATH)),
            short_list_path: PathBuf::from(text("TOKEN_SHORT_LIST_PATH", DEFAULT_SHORT_LIST_PATH)),
            coingecko_url: text("COINGECKO_URL", DEFAULT_COINGECKO_URL),
            coinmarketcap_url: text("COINMARKETCAP_URL", DEFAULT_COINMARKETCAP_URL),
            coinmarketcap_api_key: text("COINMARKETCAP_API_KEY", ""),
            l1_chain_id: parse_var(&lookup, "ETHEREUM_MAINNET_CHAIN_ID", ETHEREUM_MAINNET_CHAIN_ID)?,
            l2_chain_id: parse_var(&lookup, "LINEA_MAINNET_CHAIN_ID", LINEA_MAINNET_CHAIN_ID)?,
            batch_size: parse_var(&lookup, "VERIFY_BATCH_SIZE", DEFAULT_BATCH_SIZE)?,
            rpc_timeout_secs: parse_var(&lookup, "RPC_TIMEOUT_SECS", 10)?,
            use_public_rpc_fallback: parse_bool(&lookup, "USE_PUBLIC_RPC_FALLBACK", true)?,
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.bridge_address(Layer::L1)?;
        self.bridge_address(Layer::L2)?;

        if self.l1_chain_id == self.l2_chain_id {
            return Err(eyre!(
                "ETHEREUM_MAINNET_CHAIN_ID and LINEA_MAINNET_CHAIN_ID must differ (both {})",
                self.l1_chain_id
            ));
        }

        if self.batch_size == 0 {
            return Err(eyre!("VERIFY_BATCH_SIZE must be at least 1"));
        }

        if self.rpc_timeout_secs == 0 {
            return Err(eyre!("RPC_TIMEOUT_SECS must be at least 1"));
        }

        for layer in [Layer::L1, Layer::L2] {
            if self.endpoints(layer).is_empty() {
                return Err(eyre!(
                    "No RPC endpoint for {}: set {} or enable USE_PUBLIC_RPC_FALLBACK",
                    layer.as_str(),
                    match layer {
                        Layer::L1 => "PROVIDER_URL",
                        Layer::L2 => "LINEA_PROVIDER_URL",
                    }
                ));
            }
        }

        Ok(())
    }

    pub fn networks(&self) -> NetworkPair {
        NetworkPair::new(self.l1_chain_id, self.l2_chain_id)
    }

    pub fn chain_id(&self, layer: Layer) -> u64 {
        match layer {
            Layer::L1 => self.l1_chain_id,
            Layer::L2 => self.l2_chain_id,
        }
    }

    pub fn bridge_address(&self, layer: Layer) -> Result<Address> {
        let (key, raw) = match layer {
            Layer::L1 => ("CONTRACT_ADDRESS", &self.l1_bridge_address),
            Layer::L2 => ("L2_CONTRACT_ADDRESS", &self.l2_bridge_address),
        };
        if raw.is_empty() {
            return Err(eyre!("{} cannot be empty", key));
        }
        normalize_address(raw).map_err(|e| eyre!("{}: {}", key, e))
    }

    /// Configured URLs followed by public endpoints when enabled
    pub fn endpoints(&self, layer: Layer) -> Vec<String> {
        let configured = match layer {
            Layer::L1 => &self.l1_rpc_urls,
            Layer::L2 => &self.l2_rpc_urls,
        };
        candidate_endpoints(layer, configured, self.use_public_rpc_fallback)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.l1_chain_id, 1);
        assert_eq!(config.l2_chain_id, 59144);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.rpc_timeout(), Duration::from_secs(10));
        assert!(config.use_public_rpc_fallback);
        assert_eq!(
            config.full_list_path,
            PathBuf::from("json/linea-mainnet-token-fulllist.json")
        );
        assert_eq!(
            config.bridge_address(Layer::L1).unwrap().to_checksum(None),
            DEFAULT_L1_BRIDGE_ADDRESS
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rpc_urls_split_on_commas() {
        let config = config_from(&[
            ("PROVIDER_URL", "https://a.example, https://b.example"),
            ("USE_PUBLIC_RPC_FALLBACK", "false"),
        ])
        .unwrap();
        assert_eq!(
            config.endpoints(Layer::L1),
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }

    #[test]
    fn test_missing_endpoints_rejected_without_fallback() {
        let config = config_from(&[
            ("PROVIDER_URL", "https://a.example"),
            ("USE_PUBLIC_RPC_FALLBACK", "false"),
        ])
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("LINEA_PROVIDER_URL"));
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        assert!(config_from(&[("VERIFY_BATCH_SIZE", "ten")]).is_err());
        assert!(config_from(&[("USE_PUBLIC_RPC_FALLBACK", "maybe")]).is_err());
    }

    #[test]
    fn test_validation_rules() {
        let mut config = config_from(&[]).unwrap();

        config.batch_size = 0;
        assert!(config.validate().is_err());
        config.batch_size = 10;

        config.rpc_timeout_secs = 0;
        assert!(config.validate().is_err());
        config.rpc_timeout_secs = 10;

        config.l2_chain_id = config.l1_chain_id;
        assert!(config.validate().is_err());
        config.l2_chain_id = 59144;

        config.l1_bridge_address = "not-an-address".to_string();
        assert!(config.validate().is_err());

        config.l1_bridge_address = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = config_from(&[("COINMARKETCAP_API_KEY", "super-secret-key")]).unwrap();
        let debug_str = format!("{:?}", config);
        assert!(!debug_str.contains("super-secret-key"));
        assert!(debug_str.contains("<redacted>"));
    }
}
