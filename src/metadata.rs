//! ERC20 metadata fetching
//!
//! Reads `name`, `symbol` and `decimals` and turns them into a skeleton
//! [`Token`]. Legacy tokens that return `bytes32` names fail to decode with the
//! standard ABI, so a failed read is retried once with the alternate ABI.

use alloy::primitives::Address;
use eyre::{eyre, Result};
use tracing::{debug, warn};

use crate::evm_client::{AbiVariant, ChainClient, RawText};
use crate::types::{current_date, Token, TokenExtension};

/// Decoded ERC20 metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// ABI variant that produced the values
    pub abi: AbiVariant,
}

/// Decode a fixed-width `bytes32` string, dropping trailing NUL padding.
pub fn parse_bytes32_string(raw: &[u8; 32]) -> Result<String> {
    let end = raw.iter().rposition(|&b| b != 0).map(|i| i + 1).unwrap_or(0);
    let text = std::str::from_utf8(&raw[..end])
        .map_err(|e| eyre!("bytes32 value is not valid UTF-8: {}", e))?;
    Ok(text.to_string())
}

fn decode_text(raw: RawText) -> Result<String> {
    match raw {
        RawText::Utf8(s) => Ok(s),
        RawText::Fixed(bytes) => parse_bytes32_string(&bytes),
    }
}

/// Read metadata with one specific ABI variant
pub async fn fetch_metadata(
    client: &dyn ChainClient,
    token: Address,
    abi: AbiVariant,
) -> Result<TokenMetadata> {
    let raw = client.erc20_metadata(token, abi).await?;
    Ok(TokenMetadata {
        name: decode_text(raw.name)?,
        symbol: decode_text(raw.symbol)?,
        decimals: raw.decimals,
        abi,
    })
}

/// Read metadata, retrying once with the alternate ABI on failure.
///
/// The returned error carries both failures.
pub async fn fetch_metadata_with_fallback(
    client: &dyn ChainClient,
    token: Address,
) -> Result<TokenMetadata> {
    let first = AbiVariant::Standard;
    match fetch_metadata(client, token, first).await {
        Ok(meta) => Ok(meta),
        Err(first_err) => {
            warn!(
                address = %token,
                chain_id = client.chain_id(),
                abi = first.as_str(),
                error = %first_err,
                "Error fetching token info, retrying with alternate ABI"
            );
            let second = first.alternate();
            match fetch_metadata(client, token, second).await {
                Ok(meta) => {
                    debug!(address = %token, abi = second.as_str(), "Token info fetched with alternate ABI");
                    Ok(meta)
                }
                Err(second_err) => Err(eyre!(
                    "{} ABI: {}; {} ABI: {}",
                    first.as_str(),
                    first_err,
                    second.as_str(),
                    second_err
                )),
            }
        }
    }
}

/// Skeleton token for freshly fetched metadata.
///
/// Chain fields are left blank and `extension.rootAddress` holds the queried
/// address; the caller wires in chain, address and root afterwards.
pub fn skeleton_token(metadata: &TokenMetadata, queried: Address) -> Token {
    let today = current_date();
    Token {
        chain_id: 0,
        chain_uri: String::new(),
        token_id: String::new(),
        token_type: Vec::new(),
        address: String::new(),
        name: metadata.name.clone(),
        symbol: metadata.symbol.clone(),
        decimals: metadata.decimals,
        created_at: today,
        updated_at: today,
        logo_uri: None,
        extension: Some(TokenExtension {
            root_chain_id: 0,
            root_chain_uri: String::new(),
            root_address: queried.to_checksum(None),
        }),
    }
}

/// Fetch metadata (with ABI fallback) and return the skeleton token
pub async fn fetch_token_info(client: &dyn ChainClient, token: Address) -> Result<Token> {
    let metadata = fetch_metadata_with_fallback(client, token).await?;
    Ok(skeleton_token(&metadata, token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evm_client::RawMetadata;
    use crate::testing::MockChainClient;
    use alloy::primitives::address;

    const MKR: Address = address!("9f8F72aA9304c8B593d555F12eF6589cC3A579A2");

    fn bytes32(text: &str) -> [u8; 32] {
        let mut out = [0u8; 32];
        out[..text.len()].copy_from_slice(text.as_bytes());
        out
    }

    #[test]
    fn test_parse_bytes32_strips_padding() {
        assert_eq!(parse_bytes32_string(&bytes32("Maker")).unwrap(), "Maker");
        assert_eq!(parse_bytes32_string(&[0u8; 32]).unwrap(), "");
    }

    #[test]
    fn test_parse_bytes32_keeps_full_width() {
        let full = [b'A'; 32];
        assert_eq!(parse_bytes32_string(&full).unwrap(), "A".repeat(32));
    }

    #[test]
    fn test_parse_bytes32_rejects_invalid_utf8() {
        let mut raw = [0u8; 32];
        raw[0] = 0xff;
        assert!(parse_bytes32_string(&raw).is_err());
    }

    #[tokio::test]
    async fn test_standard_abi_used_first() {
        let client = MockChainClient::new(59144).with_metadata(
            MKR,
            AbiVariant::Standard,
            RawMetadata {
                name: RawText::Utf8("Maker".to_string()),
                symbol: RawText::Utf8("MKR".to_string()),
                decimals: 18,
            },
        );

        let meta = fetch_metadata_with_fallback(&client, MKR).await.unwrap();
        assert_eq!(meta.name, "Maker");
        assert_eq!(meta.abi, AbiVariant::Standard);
        assert_eq!(client.metadata_calls(), 1);
    }

    #[tokio::test]
    async fn test_falls_back_to_bytes32() {
        let client = MockChainClient::new(1).with_metadata(
            MKR,
            AbiVariant::Bytes32,
            RawMetadata {
                name: RawText::Fixed(bytes32("Maker")),
                symbol: RawText::Fixed(bytes32("MKR")),
                decimals: 18,
            },
        );

        let meta = fetch_metadata_with_fallback(&client, MKR).await.unwrap();
        assert_eq!(meta.symbol, "MKR");
        assert_eq!(meta.abi, AbiVariant::Bytes32);
        assert_eq!(client.metadata_calls(), 2);
    }

    #[tokio::test]
    async fn test_both_variants_failing_surfaces_error() {
        let client = MockChainClient::new(1);
        let err = fetch_metadata_with_fallback(&client, MKR).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("standard ABI"));
        assert!(msg.contains("byte32 ABI"));
    }

    #[tokio::test]
    async fn test_skeleton_token_shape() {
        let client = MockChainClient::new(1).with_metadata(
            MKR,
            AbiVariant::Standard,
            RawMetadata {
                name: RawText::Utf8("Maker".to_string()),
                symbol: RawText::Utf8("MKR".to_string()),
                decimals: 18,
            },
        );

        let token = fetch_token_info(&client, MKR).await.unwrap();
        assert_eq!(token.chain_id, 0);
        assert!(token.chain_uri.is_empty());
        assert!(token.token_type.is_empty());
        assert_eq!(token.root_address(), Some(MKR.to_checksum(None).as_str()));
        assert_eq!(token.decimals, 18);
    }
}
