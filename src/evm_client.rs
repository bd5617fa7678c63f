//! Read-only EVM client for bridge and ERC20 queries
//!
//! [`ChainClient`] is the seam between the verification engine and the
//! network: the engine only ever needs the bridge mapping lookup and ERC20
//! metadata. [`EvmChainClient`] implements it over an alloy HTTP provider,
//! bounding every call with a timeout so a hung endpoint turns into an
//! ordinary call failure.

use alloy::{
    primitives::{Address, U256},
    providers::RootProvider,
    transports::http::{Client, Http},
};
use async_trait::async_trait;
use eyre::{eyre, Result};
use std::future::Future;
use std::time::Duration;
use tracing::info;

use crate::chains::Layer;
use crate::contracts::{TokenBridge, ERC20Bytes32, ERC20};
use crate::rpc_fallback::connect_with_fallback;

/// Default per-call RPC timeout
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(10);

/// Which metadata ABI to decode `name`/`symbol` with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbiVariant {
    /// `name() returns (string)`
    Standard,
    /// `name() returns (bytes32)`
    Bytes32,
}

impl AbiVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbiVariant::Standard => "standard",
            AbiVariant::Bytes32 => "byte32",
        }
    }

    pub fn alternate(&self) -> AbiVariant {
        match self {
            AbiVariant::Standard => AbiVariant::Bytes32,
            AbiVariant::Bytes32 => AbiVariant::Standard,
        }
    }
}

/// Undecoded `name`/`symbol` value as returned by the contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawText {
    Utf8(String),
    Fixed([u8; 32]),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMetadata {
    pub name: RawText,
    pub symbol: RawText,
    pub decimals: u8,
}

/// Read-only view of one chain
#[async_trait]
pub trait ChainClient: Send + Sync {
    fn chain_id(&self) -> u64;

    /// `TokenBridge.nativeToBridgedToken(rootChainId, nativeToken)` on this chain
    async fn native_to_bridged_token(
        &self,
        root_chain_id: u64,
        native_token: Address,
    ) -> Result<Address>;

    /// `name`, `symbol`, `decimals` read concurrently with the given ABI
    async fn erc20_metadata(&self, token: Address, abi: AbiVariant) -> Result<RawMetadata>;
}

/// Alloy-backed [`ChainClient`]
pub struct EvmChainClient {
    provider: RootProvider<Http<Client>>,
    chain_id: u64,
    bridge_address: Address,
    timeout: Duration,
}

impl EvmChainClient {
    pub fn new(
        provider: RootProvider<Http<Client>>,
        chain_id: u64,
        bridge_address: Address,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            chain_id,
            bridge_address,
            timeout,
        }
    }

    /// Connect to the first responsive endpoint serving `chain_id`
    pub async fn connect(
        layer: Layer,
        endpoints: &[String],
        chain_id: u64,
        bridge_address: Address,
        timeout: Duration,
    ) -> Result<Self> {
        let provider = connect_with_fallback(layer, endpoints, chain_id, timeout).await?;

        info!(
            layer = layer.as_str(),
            chain_id = chain_id,
            bridge = %bridge_address,
            "EVM client initialized"
        );

        Ok(Self::new(provider, chain_id, bridge_address, timeout))
    }

    pub fn bridge_address(&self) -> Address {
        self.bridge_address
    }

    async fn with_timeout<T, F>(&self, what: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| eyre!("{} timed out after {:?}", what, self.timeout))?
    }
}

#[async_trait]
impl ChainClient for EvmChainClient {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn native_to_bridged_token(
        &self,
        root_chain_id: u64,
        native_token: Address,
    ) -> Result<Address> {
        let bridge = TokenBridge::new(self.bridge_address, &self.provider);

        let result = self
            .with_timeout("nativeToBridgedToken", async {
                bridge
                    .nativeToBridgedToken(U256::from(root_chain_id), native_token)
                    .call()
                    .await
                    .map_err(|e| eyre!("Failed to call nativeToBridgedToken: {}", e))
            })
            .await?;

        Ok(result._0)
    }

    async fn erc20_metadata(&self, token: Address, abi: AbiVariant) -> Result<RawMetadata> {
        match abi {
            AbiVariant::Standard => {
                let contract = ERC20::new(token, &self.provider);
                self.with_timeout("ERC20 metadata", async {
                    let (name, symbol, decimals) = tokio::try_join!(
                        async {
                            contract
                                .name()
                                .call()
                                .await
                                .map(|r| r._0)
                                .map_err(|e| eyre!("Failed to get name: {}", e))
                        },
                        async {
                            contract
                                .symbol()
                                .call()
                                .await
                                .map(|r| r._0)
                                .map_err(|e| eyre!("Failed to get symbol: {}", e))
                        },
                        async {
                            contract
                                .decimals()
                                .call()
                                .await
                                .map(|r| r._0)
                                .map_err(|e| eyre!("Failed to get decimals: {}", e))
                        }
                    )?;

                    Ok(RawMetadata {
                        name: RawText::Utf8(name),
                        symbol: RawText::Utf8(symbol),
                        decimals,
                    })
                })
                .await
            }
            AbiVariant::Bytes32 => {
                let contract = ERC20Bytes32::new(token, &self.provider);
                self.with_timeout("ERC20 bytes32 metadata", async {
                    let (name, symbol, decimals) = tokio::try_join!(
                        async {
                            contract
                                .name()
                                .call()
                                .await
                                .map(|r| r._0.0)
                                .map_err(|e| eyre!("Failed to get bytes32 name: {}", e))
                        },
                        async {
                            contract
                                .symbol()
                                .call()
                                .await
                                .map(|r| r._0.0)
                                .map_err(|e| eyre!("Failed to get bytes32 symbol: {}", e))
                        },
                        async {
                            contract
                                .decimals()
                                .call()
                                .await
                                .map(|r| r._0)
                                .map_err(|e| eyre!("Failed to get decimals: {}", e))
                        }
                    )?;

                    Ok(RawMetadata {
                        name: RawText::Fixed(name),
                        symbol: RawText::Fixed(symbol),
                        decimals,
                    })
                })
                .await
            }
        }
    }
}
