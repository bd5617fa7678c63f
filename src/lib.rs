//! Linea Token List: Bridged Token Verification
//!
//! Reconciles the curated Linea token list against the L1 (Ethereum) and L2
//! (Linea) token bridge contracts:
//!
//! - **Metadata** - ERC20 `name`/`symbol`/`decimals`, with `bytes32` fallback
//! - **Mapping** - the three `nativeToBridgedToken` lookups per bridged token
//! - **Classifier** - canonical / reserved / external / native tagging
//! - **Verifier** - batched verification with hard and soft field checks
//! - **Reconciler** - diff, version bump, sort and persist on change
//! - **Merge** - shortlist upsert into the full list
//!
//! ## Feature Flags
//!
//! - `testing` - expose the in-memory chain client, store and logo resolver

pub mod address;
pub mod chains;
pub mod classifier;
pub mod config;
pub mod contracts;
pub mod error;
pub mod evm_client;
pub mod logo;
pub mod mapping;
pub mod merge;
pub mod metadata;
pub mod reconciler;
pub mod rpc_fallback;
pub mod service;
pub mod store;
pub mod types;
pub mod verifier;

// Testing utilities (feature-gated)
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use address::{checksum, normalize_address, RESERVED_STATUS};
pub use chains::{Layer, NetworkPair, ETHEREUM_MAINNET_CHAIN_ID, LINEA_MAINNET_CHAIN_ID};
pub use classifier::{Classification, Placement, RootRef, TokenClassifier};
pub use error::VerifyError;
pub use evm_client::{AbiVariant, ChainClient, EvmChainClient};
pub use mapping::{BridgeMappingResolver, MappingResult};
pub use reconciler::{ReconcileOutcome, Reconciler};
pub use store::{JsonFileStore, TokenListStore};
pub use types::{LineaTokenList, Token, TokenExtension, TokenType, Version};
pub use verifier::BatchVerifier;
