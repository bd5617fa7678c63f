//! RPC endpoint lists and fallback connection
//!
//! Configured endpoints are tried first, then (optionally) public ones. The
//! first endpoint that answers `eth_chainId` with the expected id is used.

use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::transports::http::{Client, Http};
use eyre::{eyre, Result, WrapErr};
use std::time::Duration;
use tracing::{info, warn};

use crate::chains::Layer;

/// Public Ethereum mainnet endpoints, in preference order
pub const L1_PUBLIC_ENDPOINTS: &[&str] = &[
    "https://eth.llamarpc.com",
    "https://rpc.ankr.com/eth",
    "https://ethereum.publicnode.com",
    "https://1rpc.io/eth",
];

/// Public Linea mainnet endpoints, in preference order
pub const L2_PUBLIC_ENDPOINTS: &[&str] = &[
    "https://rpc.linea.build",
    "https://linea.drpc.org",
    "https://1rpc.io/linea",
];

/// Parse a comma-separated RPC URL string into individual trimmed URLs.
pub fn parse_rpc_urls(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Configured endpoints followed by the public ones for `layer`, deduplicated
pub fn candidate_endpoints(layer: Layer, configured: &[String], use_public: bool) -> Vec<String> {
    let mut urls: Vec<String> = configured.to_vec();
    if use_public {
        let public = match layer {
            Layer::L1 => L1_PUBLIC_ENDPOINTS,
            Layer::L2 => L2_PUBLIC_ENDPOINTS,
        };
        for url in public {
            if !urls.iter().any(|u| u == url) {
                urls.push(url.to_string());
            }
        }
    }
    urls
}

/// Hide the last path segment of a URL, where providers put API keys.
///
/// `https://mainnet.infura.io/v3/abc123` becomes `https://mainnet.infura.io/v3/***`.
pub fn mask_url(url: &str) -> String {
    let scheme_end = url.find("://").map(|i| i + 3).unwrap_or(0);
    match url[scheme_end..].rfind('/') {
        Some(idx) => format!("{}/***", &url[..scheme_end + idx]),
        None => url.to_string(),
    }
}

/// Create an alloy HTTP provider for a URL.
pub fn create_provider(url: &str) -> Result<RootProvider<Http<Client>>> {
    let parsed = url
        .parse()
        .wrap_err_with(|| format!("Invalid RPC URL: {}", mask_url(url)))?;
    Ok(ProviderBuilder::new().on_http(parsed))
}

/// Return a provider for the first endpoint that serves `expected_chain_id`.
pub async fn connect_with_fallback(
    layer: Layer,
    endpoints: &[String],
    expected_chain_id: u64,
    timeout: Duration,
) -> Result<RootProvider<Http<Client>>> {
    if endpoints.is_empty() {
        return Err(eyre!("At least one {} RPC URL is required", layer.as_str()));
    }

    for url in endpoints {
        let masked = mask_url(url);
        let provider = match create_provider(url) {
            Ok(p) => p,
            Err(e) => {
                warn!(layer = layer.as_str(), url = %masked, error = %e, "Skipping RPC endpoint");
                continue;
            }
        };

        match tokio::time::timeout(timeout, provider.get_chain_id()).await {
            Ok(Ok(chain_id)) if chain_id == expected_chain_id => {
                info!(layer = layer.as_str(), url = %masked, "Connected to RPC endpoint");
                return Ok(provider);
            }
            Ok(Ok(chain_id)) => {
                warn!(
                    layer = layer.as_str(),
                    url = %masked,
                    expected = expected_chain_id,
                    actual = chain_id,
                    "RPC endpoint serves a different chain"
                );
            }
            Ok(Err(e)) => {
                warn!(layer = layer.as_str(), url = %masked, error = %e, "Failed to connect to RPC endpoint");
            }
            Err(_) => {
                warn!(layer = layer.as_str(), url = %masked, "RPC endpoint timed out");
            }
        }
    }

    Err(eyre!(
        "Unable to connect to any {} provider for chain {}",
        layer.as_str(),
        expected_chain_id
    ))
}
