//! Token classification
//!
//! Decision order for a bridged token, first match wins:
//!
//! 1. any of the three mappings equals the reserved-status marker -> `bridge-reserved`
//! 2. L2 forward mapping is non-zero, or L1 reverse mapping equals the root -> `canonical-bridge`
//! 3. otherwise -> `external-bridge`
//!
//! A previously recorded `external-bridge` tag survives next to a
//! non-canonical result. Tokens without a root are `native` and lose their
//! extension.

use alloy::primitives::Address;

use crate::chains::NetworkPair;
use crate::error::VerifyError;
use crate::mapping::MappingResult;
use crate::types::{Token, TokenExtension, TokenType};

/// Root asset of a bridged token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootRef {
    pub chain_id: u64,
    pub address: Address,
}

/// Where a verified token sits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Native {
        chain_id: u64,
        address: Address,
    },
    Bridged {
        chain_id: u64,
        address: Address,
        root: RootRef,
    },
}

impl Placement {
    pub fn chain_id(&self) -> u64 {
        match self {
            Placement::Native { chain_id, .. } | Placement::Bridged { chain_id, .. } => *chain_id,
        }
    }

    pub fn address(&self) -> Address {
        match self {
            Placement::Native { address, .. } | Placement::Bridged { address, .. } => *address,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub placement: Placement,
    pub token_types: Vec<TokenType>,
}

pub struct TokenClassifier {
    reserved_status: Address,
    networks: NetworkPair,
}

impl TokenClassifier {
    pub fn new(reserved_status: Address, networks: NetworkPair) -> Self {
        Self {
            reserved_status,
            networks,
        }
    }

    pub fn networks(&self) -> &NetworkPair {
        &self.networks
    }

    /// Primary tag from the three mapping results
    pub fn primary_type(&self, mapping: &MappingResult, root: Address) -> TokenType {
        if mapping.all().contains(&self.reserved_status) {
            TokenType::BridgeReserved
        } else if mapping.l2_bridged_token != Address::ZERO || mapping.l1_reverse == root {
            TokenType::CanonicalBridge
        } else {
            TokenType::ExternalBridge
        }
    }

    /// Full tag set: primary tag plus a carried-over `external-bridge` tag
    pub fn token_types(
        &self,
        mapping: &MappingResult,
        root: Address,
        previous: &[TokenType],
    ) -> Vec<TokenType> {
        let primary = self.primary_type(mapping, root);
        let mut types = vec![primary];

        if previous.contains(&TokenType::ExternalBridge)
            && primary != TokenType::CanonicalBridge
            && primary != TokenType::ExternalBridge
        {
            types.push(TokenType::ExternalBridge);
        }

        types
    }

    /// Classify a bridged token living on `chain_id` at `recorded_address`.
    ///
    /// A canonical token's address is the L2 forward mapping when one exists,
    /// so a recorded address pointing elsewhere surfaces as an address mismatch.
    pub fn classify_bridged(
        &self,
        chain_id: u64,
        recorded_address: Address,
        root: RootRef,
        mapping: &MappingResult,
        previous: &[TokenType],
    ) -> Classification {
        let token_types = self.token_types(mapping, root.address, previous);

        let address = if token_types[0] == TokenType::CanonicalBridge
            && mapping.l2_bridged_token != Address::ZERO
        {
            mapping.l2_bridged_token
        } else {
            recorded_address
        };

        Classification {
            placement: Placement::Bridged {
                chain_id,
                address,
                root,
            },
            token_types,
        }
    }

    pub fn classify_native(&self, chain_id: u64, address: Address) -> Classification {
        Classification {
            placement: Placement::Native { chain_id, address },
            token_types: vec![TokenType::Native],
        }
    }

    /// Rewrite `token`'s address, chain and explorer fields from the
    /// classification. Everything else (name, symbol, dates, logo) is kept.
    pub fn apply(
        &self,
        classification: Classification,
        mut token: Token,
    ) -> Result<Token, VerifyError> {
        let placement = classification.placement;
        let address = placement.address();
        let fields = self
            .networks
            .explorer_fields(placement.chain_id(), &address, &token.name)?;

        token.chain_id = placement.chain_id();
        token.chain_uri = fields.chain_uri;
        token.token_id = fields.token_id;
        token.address = address.to_checksum(None);
        token.token_type = classification.token_types;

        token.extension = match placement {
            Placement::Native { .. } => None,
            Placement::Bridged { root, .. } => Some(TokenExtension {
                root_chain_id: fields.root_chain_id,
                root_chain_uri: fields.root_chain_uri,
                root_address: root.address.to_checksum(None),
            }),
        };

        Ok(token)
    }
}
