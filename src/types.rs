//! Token list data model
//!
//! Field order in these structs is the on-disk key order, so `serde_json`
//! writes entries exactly as the published list expects:
//! `chainId, chainURI, tokenId, tokenType, address, name, symbol, decimals,
//! createdAt, updatedAt, logoURI?, extension?`.

use chrono::{NaiveDate, Utc};
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Token Type Tags
// ============================================================================

/// Bridging relationship tag. A token may carry more than one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenType {
    #[serde(rename = "canonical-bridge")]
    CanonicalBridge,
    #[serde(rename = "bridge-reserved")]
    BridgeReserved,
    #[serde(rename = "external-bridge")]
    ExternalBridge,
    #[serde(rename = "native")]
    Native,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::CanonicalBridge => "canonical-bridge",
            TokenType::BridgeReserved => "bridge-reserved",
            TokenType::ExternalBridge => "external-bridge",
            TokenType::Native => "native",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Render a tag list the way it appears in the file, for log and error output
pub fn format_token_types(types: &[TokenType]) -> String {
    let tags: Vec<&str> = types.iter().map(TokenType::as_str).collect();
    format!("[{}]", tags.join(", "))
}

// ============================================================================
// Token
// ============================================================================

/// Reference to the token's counterpart on the other chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenExtension {
    #[serde(rename = "rootChainId")]
    pub root_chain_id: u64,
    #[serde(rename = "rootChainURI")]
    pub root_chain_uri: String,
    #[serde(rename = "rootAddress")]
    pub root_address: String,
}

/// One entry of the token list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    #[serde(rename = "chainId")]
    pub chain_id: u64,
    #[serde(rename = "chainURI")]
    pub chain_uri: String,
    #[serde(rename = "tokenId")]
    pub token_id: String,
    #[serde(rename = "tokenType")]
    pub token_type: Vec<TokenType>,
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(rename = "createdAt")]
    pub created_at: NaiveDate,
    #[serde(rename = "updatedAt")]
    pub updated_at: NaiveDate,
    #[serde(rename = "logoURI", default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<TokenExtension>,
}

impl Token {
    /// Root address, treating a blank value the same as a missing extension
    pub fn root_address(&self) -> Option<&str> {
        self.extension
            .as_ref()
            .map(|ext| ext.root_address.as_str())
            .filter(|addr| !addr.trim().is_empty())
    }

    pub fn root_chain_id(&self) -> Option<u64> {
        self.extension.as_ref().map(|ext| ext.root_chain_id)
    }

    pub fn has_type(&self, token_type: TokenType) -> bool {
        self.token_type.contains(&token_type)
    }
}

// ============================================================================
// Token List
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineaTokenList {
    #[serde(rename = "type")]
    pub list_type: String,
    #[serde(rename = "tokenListId")]
    pub token_list_id: String,
    pub name: String,
    #[serde(rename = "createdAt")]
    pub created_at: NaiveDate,
    #[serde(rename = "updatedAt")]
    pub updated_at: NaiveDate,
    pub versions: Vec<Version>,
    pub tokens: Vec<Token>,
}

// ============================================================================
// JSON helpers
// ============================================================================

pub fn parse_token(json: &str) -> Result<Token> {
    serde_json::from_str(json).wrap_err("Failed to parse token entry")
}

/// Two-space indented JSON, same layout as the published list
pub fn format_token(token: &Token) -> Result<String> {
    serde_json::to_string_pretty(token).wrap_err("Failed to serialize token entry")
}

pub fn parse_token_list(json: &str) -> Result<LineaTokenList> {
    serde_json::from_str(json).wrap_err("Failed to parse token list")
}

pub fn format_token_list(list: &LineaTokenList) -> Result<String> {
    serde_json::to_string_pretty(list).wrap_err("Failed to serialize token list")
}

/// Today's date (UTC), the value stamped into `createdAt`/`updatedAt`
pub fn current_date() -> NaiveDate {
    Utc::now().date_naive()
}
