//! Batch verification
//!
//! Every recorded token is re-derived from chain state and checked against
//! what the list says. Tokens are processed in fixed-size batches: members of
//! a batch run concurrently, batches run one after another, and the first
//! fatal error aborts the whole run with nothing returned.

use alloy::primitives::Address;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::address::{normalize_address, same_address};
use crate::chains::Layer;
use crate::classifier::{RootRef, TokenClassifier};
use crate::error::VerifyError;
use crate::evm_client::ChainClient;
use crate::mapping::BridgeMappingResolver;
use crate::metadata::{fetch_metadata_with_fallback, skeleton_token, TokenMetadata};
use crate::types::{format_token_types, Token};

pub const DEFAULT_BATCH_SIZE: usize = 10;

// ============================================================================
// Field consistency
// ============================================================================

fn hard_mismatch(field: &'static str, token: &Token, recorded: String, verified: String) -> VerifyError {
    VerifyError::FieldMismatch {
        field,
        token: token.name.clone(),
        recorded,
        verified,
    }
}

fn display_opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "none".to_string())
}

/// Root chain id, only meaningful when a root address is present
fn effective_root_chain_id(token: &Token) -> Option<u64> {
    token.root_address().and(token.root_chain_id())
}

/// Compare a recorded token with its verified counterpart.
///
/// Identity fields (`address`, `rootAddress`, `symbol`, `decimals`,
/// `chainId`, `rootChainId`) must agree or the run aborts. `tokenId` and
/// `tokenType` are taken from the verified token with a warning. A verified
/// native token also drops the recorded extension.
pub fn check_token_fields(recorded: &Token, verified: &Token) -> Result<Token, VerifyError> {
    if !same_address(&recorded.address, &verified.address) {
        return Err(hard_mismatch(
            "address",
            recorded,
            recorded.address.clone(),
            verified.address.clone(),
        ));
    }

    let root_matches = match (recorded.root_address(), verified.root_address()) {
        (Some(a), Some(b)) => same_address(a, b),
        (None, None) => true,
        _ => false,
    };
    if !root_matches {
        return Err(hard_mismatch(
            "rootAddress",
            recorded,
            display_opt(recorded.root_address()),
            display_opt(verified.root_address()),
        ));
    }

    if recorded.symbol != verified.symbol {
        return Err(hard_mismatch(
            "symbol",
            recorded,
            recorded.symbol.clone(),
            verified.symbol.clone(),
        ));
    }

    if recorded.decimals != verified.decimals {
        return Err(hard_mismatch(
            "decimals",
            recorded,
            recorded.decimals.to_string(),
            verified.decimals.to_string(),
        ));
    }

    if recorded.chain_id != verified.chain_id {
        return Err(hard_mismatch(
            "chainId",
            recorded,
            recorded.chain_id.to_string(),
            verified.chain_id.to_string(),
        ));
    }

    let (recorded_root_chain, verified_root_chain) =
        (effective_root_chain_id(recorded), effective_root_chain_id(verified));
    if recorded_root_chain != verified_root_chain {
        return Err(hard_mismatch(
            "rootChainId",
            recorded,
            display_opt(recorded_root_chain),
            display_opt(verified_root_chain),
        ));
    }

    let mut accepted = recorded.clone();

    if recorded.token_id != verified.token_id {
        warn!(
            token = %recorded.name,
            recorded = %recorded.token_id,
            verified = %verified.token_id,
            "tokenId mismatch, overwriting"
        );
        accepted.token_id = verified.token_id.clone();
    }

    if recorded.token_type != verified.token_type {
        warn!(
            token = %recorded.name,
            recorded = %format_token_types(&recorded.token_type),
            verified = %format_token_types(&verified.token_type),
            "tokenType mismatch, overwriting"
        );
        accepted.token_type = verified.token_type.clone();
    }

    if verified.extension.is_none() {
        accepted.extension = None;
    }

    Ok(accepted)
}

// ============================================================================
// Batch Verifier
// ============================================================================

pub struct BatchVerifier {
    l1: Arc<dyn ChainClient>,
    l2: Arc<dyn ChainClient>,
    classifier: TokenClassifier,
    batch_size: usize,
}

impl BatchVerifier {
    pub fn new(
        l1: Arc<dyn ChainClient>,
        l2: Arc<dyn ChainClient>,
        classifier: TokenClassifier,
        batch_size: usize,
    ) -> Self {
        Self {
            l1,
            l2,
            classifier,
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn client(&self, layer: Layer) -> &dyn ChainClient {
        match layer {
            Layer::L1 => self.l1.as_ref(),
            Layer::L2 => self.l2.as_ref(),
        }
    }

    async fn fetch_metadata(
        &self,
        layer: Layer,
        token: &Token,
        address: Address,
    ) -> Result<TokenMetadata, VerifyError> {
        fetch_metadata_with_fallback(self.client(layer), address)
            .await
            .map_err(|e| VerifyError::TokenNotFound {
                token: token.name.clone(),
                address: address.to_checksum(None),
                reason: e.to_string(),
            })
    }

    /// Verify one recorded token, returning the entry to keep in the list.
    ///
    /// Native tokens are read on their own chain. Bridged tokens are read at
    /// their L1 root, so `symbol` and `decimals` are checked against the root.
    pub async fn verify_token(&self, recorded: &Token) -> Result<Token, VerifyError> {
        let networks = self.classifier.networks();
        let layer = networks.require_layer(recorded.chain_id, &recorded.name)?;
        let address = normalize_address(&recorded.address)?;

        let Some(root_value) = recorded.root_address() else {
            let metadata = self.fetch_metadata(layer, recorded, address).await?;
            let classification = self.classifier.classify_native(recorded.chain_id, address);
            let verified = self
                .classifier
                .apply(classification, skeleton_token(&metadata, address))?;

            debug!(token = %recorded.name, "Verified native token");
            return check_token_fields(recorded, &verified);
        };

        let root_address = normalize_address(root_value)?;
        let root_chain_id = recorded.root_chain_id().unwrap_or_default();
        let root_layer = networks.require_layer(root_chain_id, &recorded.name)?;

        match (layer, root_layer) {
            (Layer::L2, Layer::L1) => {}
            (Layer::L1, Layer::L2) => {
                info!(
                    token = %recorded.name,
                    chain_id = recorded.chain_id,
                    root_chain_id = root_chain_id,
                    "Token bridged from L2 to L1, passing through unverified"
                );
                return Ok(recorded.clone());
            }
            _ => {
                warn!(
                    token = %recorded.name,
                    chain_id = recorded.chain_id,
                    root_chain_id = root_chain_id,
                    "Token and root share a chain, passing through unverified"
                );
                return Ok(recorded.clone());
            }
        }

        let resolver = BridgeMappingResolver::new(self.l1.as_ref(), self.l2.as_ref());
        let (mapping, metadata) = tokio::try_join!(
            resolver.resolve(
                &recorded.name,
                root_chain_id,
                root_address,
                recorded.chain_id,
                address
            ),
            self.fetch_metadata(root_layer, recorded, root_address),
        )?;

        let root = RootRef {
            chain_id: root_chain_id,
            address: root_address,
        };
        let classification = self.classifier.classify_bridged(
            recorded.chain_id,
            address,
            root,
            &mapping,
            &recorded.token_type,
        );
        let verified = self
            .classifier
            .apply(classification, skeleton_token(&metadata, root_address))?;

        debug!(
            token = %recorded.name,
            token_type = %format_token_types(&verified.token_type),
            "Verified bridged token"
        );

        check_token_fields(recorded, &verified)
    }

    /// Verify a whole list. Output order matches input order.
    pub async fn verify_list(&self, tokens: &[Token]) -> Result<Vec<Token>, VerifyError> {
        let total_batches = tokens.len().div_ceil(self.batch_size);
        let mut verified = Vec::with_capacity(tokens.len());

        for (index, batch) in tokens.chunks(self.batch_size).enumerate() {
            debug!(
                batch = index + 1,
                total_batches = total_batches,
                size = batch.len(),
                "Verifying batch"
            );

            let results = try_join_all(batch.iter().map(|token| self.verify_token(token))).await?;
            verified.extend(results);
        }

        info!(tokens = verified.len(), batches = total_batches, "Token list verified");
        Ok(verified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::RESERVED_STATUS;
    use crate::chains::NetworkPair;
    use crate::testing::MockChainClient;
    use crate::types::{TokenExtension, TokenType};
    use alloy::primitives::address;
    use chrono::NaiveDate;
    use std::time::Duration;

    const ROOT: Address = address!("0987654321098765432109876543210987654321");
    const TOKEN: Address = address!("1234567890123456789012345678901234567890");

    fn verifier(l1: MockChainClient, l2: MockChainClient, batch_size: usize) -> BatchVerifier {
        BatchVerifier::new(
            Arc::new(l1),
            Arc::new(l2),
            TokenClassifier::new(RESERVED_STATUS, NetworkPair::default()),
            batch_size,
        )
    }

    fn bridged(name: &str, address: Address, root: Address) -> Token {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        Token {
            chain_id: 59144,
            chain_uri: "https://lineascan.build/block/0".to_string(),
            token_id: format!("https://lineascan.build/address/{}", address.to_checksum(None)),
            token_type: vec![TokenType::CanonicalBridge],
            address: address.to_checksum(None),
            name: name.to_string(),
            symbol: "TA".to_string(),
            decimals: 18,
            created_at: date,
            updated_at: date,
            logo_uri: None,
            extension: Some(TokenExtension {
                root_chain_id: 1,
                root_chain_uri: "https://etherscan.io/block/0".to_string(),
                root_address: root.to_checksum(None),
            }),
        }
    }

    fn native(name: &str, address: Address) -> Token {
        let mut token = bridged(name, address, Address::ZERO);
        token.token_type = vec![TokenType::Native];
        token.extension = None;
        token
    }

    fn numbered_address(i: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[0] = 0xaa;
        bytes[19] = i;
        Address::from(bytes)
    }

    #[tokio::test]
    async fn test_token_a_is_canonical() {
        let l1 = MockChainClient::new(1).with_erc20(ROOT, "Token A", "TA", 18);
        let l2 = MockChainClient::new(59144).with_mapping(1, ROOT, TOKEN);

        let recorded = bridged("Token A", TOKEN, ROOT);
        let result = verifier(l1, l2, 10).verify_token(&recorded).await.unwrap();

        assert_eq!(result.token_type, vec![TokenType::CanonicalBridge]);
        assert_eq!(result.chain_uri, "https://lineascan.build/block/0");
        assert_eq!(
            result.token_id,
            format!("https://lineascan.build/address/{}", TOKEN.to_checksum(None))
        );
        assert_eq!(result, recorded);
    }

    #[tokio::test]
    async fn test_reserved_mapping_with_legacy_external_tag() {
        let l1 = MockChainClient::new(1)
            .with_mapping(1, ROOT, RESERVED_STATUS)
            .with_erc20(ROOT, "Token A", "TA", 18);
        let l2 = MockChainClient::new(59144);

        let mut recorded = bridged("Token A", TOKEN, ROOT);
        recorded.token_type = vec![TokenType::ExternalBridge];

        let result = verifier(l1, l2, 10).verify_token(&recorded).await.unwrap();
        assert_eq!(
            result.token_type,
            vec![TokenType::BridgeReserved, TokenType::ExternalBridge]
        );
    }

    #[tokio::test]
    async fn test_soft_fields_are_overwritten() {
        let l1 = MockChainClient::new(1).with_erc20(ROOT, "Token A", "TA", 18);
        let l2 = MockChainClient::new(59144).with_mapping(1, ROOT, TOKEN);

        let mut recorded = bridged("Token A", TOKEN, ROOT);
        recorded.token_type = vec![TokenType::ExternalBridge];
        recorded.token_id = "https://lineascan.build/address/0xstale".to_string();
        recorded.logo_uri = Some("https://example.org/a.png".to_string());

        let result = verifier(l1, l2, 10).verify_token(&recorded).await.unwrap();

        assert_eq!(result.token_type, vec![TokenType::CanonicalBridge]);
        assert_eq!(
            result.token_id,
            format!("https://lineascan.build/address/{}", TOKEN.to_checksum(None))
        );
        assert_eq!(result.logo_uri, recorded.logo_uri);
    }

    #[tokio::test]
    async fn test_hard_mismatch_names_field() {
        let l1 = MockChainClient::new(1).with_erc20(ROOT, "Token A", "TA", 6);
        let l2 = MockChainClient::new(59144)
            .with_mapping(1, ROOT, TOKEN)
            .with_erc20(TOKEN, "Token A", "TA", 18);

        let recorded = bridged("Token A", TOKEN, ROOT);
        let err = verifier(l1, l2, 10).verify_token(&recorded).await.unwrap_err();

        assert_eq!(err.field(), Some("decimals"));
        let msg = err.to_string();
        assert!(msg.contains("Token A"));
        assert!(msg.contains("recorded 18"));
        assert!(msg.contains("verified 6"));
    }

    #[tokio::test]
    async fn test_canonical_mapping_elsewhere_is_address_mismatch() {
        let other = numbered_address(1);
        let l1 = MockChainClient::new(1).with_erc20(ROOT, "Token A", "TA", 18);
        let l2 = MockChainClient::new(59144).with_mapping(1, ROOT, other);

        let recorded = bridged("Token A", TOKEN, ROOT);
        let err = verifier(l1, l2, 10).verify_token(&recorded).await.unwrap_err();
        assert_eq!(err.field(), Some("address"));
    }

    #[tokio::test]
    async fn test_bridged_metadata_is_read_at_root() {
        let l1 = MockChainClient::new(1).with_erc20(ROOT, "Token A", "TA", 18);
        let l2 = MockChainClient::new(59144)
            .with_mapping(1, ROOT, TOKEN)
            .with_erc20(TOKEN, "Token A (bridged)", "TA.e", 18);
        let l1 = Arc::new(l1);
        let l2 = Arc::new(l2);

        let verifier = BatchVerifier::new(
            l1.clone(),
            l2.clone(),
            TokenClassifier::new(RESERVED_STATUS, NetworkPair::default()),
            10,
        );
        let recorded = bridged("Token A", TOKEN, ROOT);
        let result = verifier.verify_token(&recorded).await.unwrap();

        assert_eq!(result, recorded);
        assert_eq!(l1.metadata_calls(), 1);
        assert_eq!(l2.metadata_calls(), 0);
    }

    #[tokio::test]
    async fn test_root_missing_on_l1_is_not_found() {
        let l1 = MockChainClient::new(1);
        let l2 = MockChainClient::new(59144)
            .with_mapping(1, ROOT, TOKEN)
            .with_erc20(TOKEN, "Token A", "TA", 18);

        let recorded = bridged("Token A", TOKEN, ROOT);
        let err = verifier(l1, l2, 10).verify_token(&recorded).await.unwrap_err();
        assert!(
            matches!(err, VerifyError::TokenNotFound { ref address, .. } if *address == ROOT.to_checksum(None))
        );
    }

    #[tokio::test]
    async fn test_native_token_drops_extension() {
        let l1 = MockChainClient::new(1);
        let l2 = MockChainClient::new(59144).with_erc20(TOKEN, "Native Token", "TA", 18);

        let mut recorded = native("Native Token", TOKEN);
        recorded.extension = Some(TokenExtension {
            root_chain_id: 1,
            root_chain_uri: "https://etherscan.io/block/0".to_string(),
            root_address: String::new(),
        });

        let verifier = verifier(l1, l2, 10);
        let result = verifier.verify_token(&recorded).await.unwrap();

        assert_eq!(result.token_type, vec![TokenType::Native]);
        assert!(result.extension.is_none());
    }

    #[tokio::test]
    async fn test_missing_metadata_is_not_found() {
        let l1 = MockChainClient::new(1);
        let l2 = MockChainClient::new(59144);

        let recorded = native("Ghost", TOKEN);
        let err = verifier(l1, l2, 10).verify_token(&recorded).await.unwrap_err();
        assert!(matches!(err, VerifyError::TokenNotFound { ref token, .. } if token == "Ghost"));
    }

    #[tokio::test]
    async fn test_unsupported_chain_is_fatal() {
        let l1 = MockChainClient::new(1);
        let l2 = MockChainClient::new(59144);

        let mut recorded = bridged("Polygon Token", TOKEN, ROOT);
        recorded.chain_id = 137;

        let err = verifier(l1, l2, 10).verify_token(&recorded).await.unwrap_err();
        assert!(matches!(err, VerifyError::UnsupportedChain { chain_id: 137, .. }));
    }

    #[tokio::test]
    async fn test_reverse_direction_passes_through() {
        let l1 = MockChainClient::new(1);
        let l2 = MockChainClient::new(59144);

        let mut recorded = bridged("Linea Origin", TOKEN, ROOT);
        recorded.chain_id = 1;
        recorded.token_type = vec![TokenType::ExternalBridge];
        if let Some(ext) = recorded.extension.as_mut() {
            ext.root_chain_id = 59144;
        }

        let result = verifier(l1, l2, 10).verify_token(&recorded).await.unwrap();
        assert_eq!(result, recorded);
    }

    #[tokio::test]
    async fn test_same_chain_root_passes_through() {
        let l1 = MockChainClient::new(1);
        let l2 = MockChainClient::new(59144);

        let mut recorded = bridged("Odd Entry", TOKEN, ROOT);
        if let Some(ext) = recorded.extension.as_mut() {
            ext.root_chain_id = 59144;
        }

        let result = verifier(l1, l2, 10).verify_token(&recorded).await.unwrap();
        assert_eq!(result, recorded);
    }

    #[tokio::test]
    async fn test_failure_in_batch_aborts_run() {
        let mut l2 = MockChainClient::new(59144);
        let mut tokens = Vec::new();
        for i in 1..=10u8 {
            let address = numbered_address(i);
            tokens.push(native(&format!("Token {}", i), address));
            if i != 4 {
                l2 = l2.with_erc20(address, &format!("Token {}", i), "TA", 18);
            }
        }

        let err = verifier(MockChainClient::new(1), l2, 10)
            .verify_list(&tokens)
            .await
            .unwrap_err();

        assert!(matches!(err, VerifyError::TokenNotFound { ref token, .. } if token == "Token 4"));
    }

    #[tokio::test]
    async fn test_batches_bound_concurrency() {
        let mut l2 = MockChainClient::new(59144).with_delay(Duration::from_millis(20));
        let mut tokens = Vec::new();
        for i in 1..=7u8 {
            let address = numbered_address(i);
            tokens.push(native(&format!("Token {}", i), address));
            l2 = l2.with_erc20(address, &format!("Token {}", i), "TA", 18);
        }
        let l2 = Arc::new(l2);

        let verifier = BatchVerifier::new(
            Arc::new(MockChainClient::new(1)),
            l2.clone(),
            TokenClassifier::new(RESERVED_STATUS, NetworkPair::default()),
            3,
        );
        let verified = verifier.verify_list(&tokens).await.unwrap();

        assert_eq!(verified.len(), 7);
        assert_eq!(l2.metadata_calls(), 7);
        assert_eq!(l2.max_in_flight(), 3);
        let names: Vec<&str> = verified.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names[0], "Token 1");
        assert_eq!(names[6], "Token 7");
    }

    #[test]
    fn test_root_chain_mismatch_is_hard() {
        let recorded = bridged("Token A", TOKEN, ROOT);
        let mut verified = recorded.clone();
        if let Some(ext) = verified.extension.as_mut() {
            ext.root_chain_id = 59144;
        }
        let err = check_token_fields(&recorded, &verified).unwrap_err();
        assert_eq!(err.field(), Some("rootChainId"));
    }

    #[test]
    fn test_address_case_is_not_a_mismatch() {
        let mut recorded = bridged("Token A", TOKEN, ROOT);
        recorded.address = recorded.address.to_lowercase();
        let verified = bridged("Token A", TOKEN, ROOT);
        assert!(check_token_fields(&recorded, &verified).is_ok());
    }
}
