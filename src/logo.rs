//! Logo URI lookup
//!
//! Price trackers index tokens by their L1 address, so an L2 token is looked
//! up through its root. Only list building calls this; verification never
//! touches logos.

use alloy::primitives::Address;
use async_trait::async_trait;
use eyre::{eyre, Result, WrapErr};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::warn;
use url::Url;

use crate::address::normalize_address;
use crate::types::Token;

pub const LOGO_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

const CMC_API_KEY_HEADER: &str = "X-CMC_PRO_API_KEY";

#[async_trait]
pub trait LogoResolver: Send + Sync {
    fn name(&self) -> &'static str;

    /// Logo for `token`, `None` when the tracker has nothing usable.
    /// Errors only on rate limiting.
    async fn fetch_logo_uri(&self, token: &Token) -> Result<Option<String>>;
}

/// Address a tracker knows the token by: its own address on L1, its root
/// otherwise.
pub fn lookup_address(token: &Token, l1_chain_id: u64) -> Option<Address> {
    let raw = if token.chain_id == l1_chain_id {
        Some(token.address.as_str())
    } else {
        token.root_address()
    };

    let Some(raw) = raw else {
        warn!(token = %token.name, "No token address to look up logo with");
        return None;
    };

    match normalize_address(raw) {
        Ok(address) => Some(address),
        Err(e) => {
            warn!(token = %token.name, error = %e, "Cannot look up logo");
            None
        }
    }
}

fn http_client() -> Result<Client> {
    Client::builder()
        .timeout(LOGO_REQUEST_TIMEOUT)
        .build()
        .wrap_err("Failed to create HTTP client")
}

/// Shared response handling: 429 is an error, other failures are logged
async fn read_json(
    service: &str,
    address: &Address,
    response: reqwest::Result<reqwest::Response>,
) -> Result<Option<Value>> {
    let response = match response {
        Ok(r) => r,
        Err(e) => {
            warn!(service = service, address = %address, error = %e, "Error fetching logoURI");
            return Ok(None);
        }
    };

    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        warn!(service = service, "Rate limit reached");
        return Err(eyre!("{} rate limit reached", service));
    }
    if !status.is_success() {
        warn!(service = service, address = %address, status = %status, "Error fetching logoURI");
        return Ok(None);
    }

    match response.json::<Value>().await {
        Ok(body) => Ok(Some(body)),
        Err(e) => {
            warn!(service = service, address = %address, error = %e, "Invalid logoURI response");
            Ok(None)
        }
    }
}

// ============================================================================
// CoinGecko
// ============================================================================

pub struct CoinGeckoLogoResolver {
    client: Client,
    base_url: Url,
    l1_chain_id: u64,
}

impl CoinGeckoLogoResolver {
    pub fn new(base_url: &str, l1_chain_id: u64) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: Url::parse(base_url)
                .wrap_err_with(|| format!("Invalid COINGECKO_URL: {}", base_url))?,
            l1_chain_id,
        })
    }

    /// `<base><lowercase address>`
    pub fn request_url(&self, address: &Address) -> Result<Url> {
        let lower = address.to_checksum(None).to_lowercase();
        self.base_url
            .join(&lower)
            .wrap_err("Failed to build CoinGecko URL")
    }
}

/// `image.large` from a CoinGecko contract response
pub fn coingecko_logo(body: &Value) -> Option<String> {
    body.get("image")
        .and_then(|image| image.get("large"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[async_trait]
impl LogoResolver for CoinGeckoLogoResolver {
    fn name(&self) -> &'static str {
        "CoinGecko"
    }

    async fn fetch_logo_uri(&self, token: &Token) -> Result<Option<String>> {
        let Some(address) = lookup_address(token, self.l1_chain_id) else {
            return Ok(None);
        };
        let url = self.request_url(&address)?;

        let response = self.client.get(url).send().await;
        let body = read_json(self.name(), &address, response).await?;
        Ok(body.as_ref().and_then(coingecko_logo))
    }
}

// ============================================================================
// CoinMarketCap
// ============================================================================

pub struct CoinMarketCapLogoResolver {
    client: Client,
    base_url: Url,
    api_key: String,
    l1_chain_id: u64,
}

impl CoinMarketCapLogoResolver {
    pub fn new(base_url: &str, api_key: &str, l1_chain_id: u64) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: Url::parse(base_url)
                .wrap_err_with(|| format!("Invalid COINMARKETCAP_URL: {}", base_url))?,
            api_key: api_key.to_string(),
            l1_chain_id,
        })
    }

    /// `<base>/v2/cryptocurrency/info?address=<address>`
    pub fn request_url(&self, address: &Address) -> Result<Url> {
        let mut url = self
            .base_url
            .join("/v2/cryptocurrency/info")
            .wrap_err("Failed to build CoinMarketCap URL")?;
        url.query_pairs_mut()
            .append_pair("address", &address.to_checksum(None));
        Ok(url)
    }
}

/// First `logo` under `data`, whose entries are keyed by CoinMarketCap id
pub fn coinmarketcap_logo(body: &Value) -> Option<String> {
    fn find(value: &Value) -> Option<String> {
        match value {
            Value::Object(map) => {
                if let Some(logo) = map.get("logo").and_then(Value::as_str) {
                    return Some(logo.to_string());
                }
                map.values().find_map(find)
            }
            Value::Array(items) => items.iter().find_map(find),
            _ => None,
        }
    }

    body.get("data").and_then(find)
}

#[async_trait]
impl LogoResolver for CoinMarketCapLogoResolver {
    fn name(&self) -> &'static str {
        "CoinMarketCap"
    }

    async fn fetch_logo_uri(&self, token: &Token) -> Result<Option<String>> {
        let Some(address) = lookup_address(token, self.l1_chain_id) else {
            return Ok(None);
        };
        let url = self.request_url(&address)?;

        let response = self
            .client
            .get(url)
            .header(CMC_API_KEY_HEADER, &self.api_key)
            .send()
            .await;
        let body = read_json(self.name(), &address, response).await?;
        Ok(body.as_ref().and_then(coinmarketcap_logo))
    }
}
