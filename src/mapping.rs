//! Bridge mapping resolution
//!
//! Three `nativeToBridgedToken` lookups decide a bridged token's class:
//!
//! 1. L1 forward:  `L1.nativeToBridgedToken(rootChainId, root)`
//! 2. L2 forward:  `L2.nativeToBridgedToken(rootChainId, root)`
//! 3. L1 reverse:  `L1.nativeToBridgedToken(token.chainId, token.address)`
//!
//! They are independent and dispatched together.

use alloy::primitives::Address;
use tracing::debug;

use crate::error::VerifyError;
use crate::evm_client::ChainClient;

/// Results of the three lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingResult {
    /// L1 status of the root slot
    pub l1_root_status: Address,
    /// L2 bridged counterpart of the root
    pub l2_bridged_token: Address,
    /// L1 mapping of the token itself, expected to point back at the root
    pub l1_reverse: Address,
}

impl MappingResult {
    pub fn all(&self) -> [Address; 3] {
        [self.l1_root_status, self.l2_bridged_token, self.l1_reverse]
    }
}

/// Issues the lookups against both chains' bridge contracts
pub struct BridgeMappingResolver<'a> {
    l1: &'a dyn ChainClient,
    l2: &'a dyn ChainClient,
}

impl<'a> BridgeMappingResolver<'a> {
    pub fn new(l1: &'a dyn ChainClient, l2: &'a dyn ChainClient) -> Self {
        Self { l1, l2 }
    }

    /// Resolve all three mappings for `root` (origin `root_chain_id`) and the
    /// token at `token_address` on `token_chain_id`. Any failed call fails the
    /// whole resolution.
    pub async fn resolve(
        &self,
        token_name: &str,
        root_chain_id: u64,
        root: Address,
        token_chain_id: u64,
        token_address: Address,
    ) -> Result<MappingResult, VerifyError> {
        let (l1_root_status, l2_bridged_token, l1_reverse) = tokio::try_join!(
            self.l1.native_to_bridged_token(root_chain_id, root),
            self.l2.native_to_bridged_token(root_chain_id, root),
            self.l1.native_to_bridged_token(token_chain_id, token_address),
        )
        .map_err(|e| VerifyError::Mapping {
            token: token_name.to_string(),
            reason: e.to_string(),
        })?;

        let result = MappingResult {
            l1_root_status,
            l2_bridged_token,
            l1_reverse,
        };

        debug!(
            token = token_name,
            l1_root_status = %result.l1_root_status,
            l2_bridged_token = %result.l2_bridged_token,
            l1_reverse = %result.l1_reverse,
            "Bridge mappings resolved"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockChainClient;
    use alloy::primitives::address;

    const ROOT: Address = address!("4d224452801ACEd8B2F0aebE155379bb5D594381");
    const BRIDGED: Address = address!("6bAA318CF7C51C76e17ae1EbE9Bbff96AE017aCB");

    #[tokio::test]
    async fn test_resolves_three_lookups() {
        let l1 = MockChainClient::new(1).with_mapping(59144, BRIDGED, ROOT);
        let l2 = MockChainClient::new(59144).with_mapping(1, ROOT, BRIDGED);

        let resolver = BridgeMappingResolver::new(&l1, &l2);
        let result = resolver
            .resolve("ApeCoin", 1, ROOT, 59144, BRIDGED)
            .await
            .unwrap();

        assert_eq!(result.l1_root_status, Address::ZERO);
        assert_eq!(result.l2_bridged_token, BRIDGED);
        assert_eq!(result.l1_reverse, ROOT);
        assert_eq!(l1.mapping_calls(), 2);
        assert_eq!(l2.mapping_calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_lookup_is_fatal() {
        let l1 = MockChainClient::new(1);
        let l2 = MockChainClient::new(59144).failing_mappings();

        let resolver = BridgeMappingResolver::new(&l1, &l2);
        let err = resolver
            .resolve("ApeCoin", 1, ROOT, 59144, BRIDGED)
            .await
            .unwrap_err();

        assert!(matches!(err, VerifyError::Mapping { ref token, .. } if token == "ApeCoin"));
    }
}
