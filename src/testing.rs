//! Test doubles for the chain and storage seams
//!
//! [`MockChainClient`] answers from scripted tables: unmapped lookups return
//! the zero address (what the bridge returns for unknown tokens) and unknown
//! metadata reverts. Call counters and an in-flight high-water mark let tests
//! assert on concurrency.

use alloy::primitives::Address;
use async_trait::async_trait;
use eyre::{eyre, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::address::normalize_address;
use crate::chains::ETHEREUM_MAINNET_CHAIN_ID;
use crate::evm_client::{AbiVariant, ChainClient, RawMetadata, RawText};
use crate::logo::{lookup_address, LogoResolver};
use crate::store::TokenListStore;
use crate::types::{LineaTokenList, Token};

// ============================================================================
// Chain client
// ============================================================================

pub struct MockChainClient {
    chain_id: u64,
    mappings: HashMap<(u64, Address), Address>,
    metadata: HashMap<(Address, AbiVariant), RawMetadata>,
    fail_mappings: bool,
    delay: Option<Duration>,
    mapping_calls: AtomicUsize,
    metadata_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockChainClient {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            mappings: HashMap::new(),
            metadata: HashMap::new(),
            fail_mappings: false,
            delay: None,
            mapping_calls: AtomicUsize::new(0),
            metadata_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// `nativeToBridgedToken(chain_id, native)` returns `bridged`
    pub fn with_mapping(mut self, chain_id: u64, native: Address, bridged: Address) -> Self {
        self.mappings.insert((chain_id, native), bridged);
        self
    }

    pub fn with_metadata(mut self, token: Address, abi: AbiVariant, meta: RawMetadata) -> Self {
        self.metadata.insert((token, abi), meta);
        self
    }

    /// Shorthand for a standard-ABI token
    pub fn with_erc20(self, token: Address, name: &str, symbol: &str, decimals: u8) -> Self {
        self.with_metadata(
            token,
            AbiVariant::Standard,
            RawMetadata {
                name: RawText::Utf8(name.to_string()),
                symbol: RawText::Utf8(symbol.to_string()),
                decimals,
            },
        )
    }

    /// Every mapping lookup fails as if the RPC were down
    pub fn failing_mappings(mut self) -> Self {
        self.fail_mappings = true;
        self
    }

    /// Hold each call for `delay`, so concurrent calls overlap
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn mapping_calls(&self) -> usize {
        self.mapping_calls.load(Ordering::SeqCst)
    }

    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn native_to_bridged_token(
        &self,
        root_chain_id: u64,
        native_token: Address,
    ) -> Result<Address> {
        self.mapping_calls.fetch_add(1, Ordering::SeqCst);
        self.enter().await;
        self.leave();

        if self.fail_mappings {
            return Err(eyre!("connection refused"));
        }

        Ok(self
            .mappings
            .get(&(root_chain_id, native_token))
            .copied()
            .unwrap_or(Address::ZERO))
    }

    async fn erc20_metadata(&self, token: Address, abi: AbiVariant) -> Result<RawMetadata> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        self.enter().await;
        self.leave();

        self.metadata
            .get(&(token, abi))
            .cloned()
            .ok_or_else(|| eyre!("execution reverted"))
    }
}

// ============================================================================
// Store
// ============================================================================

/// In-memory [`TokenListStore`] counting reads and writes
pub struct MemoryStore {
    list: Mutex<LineaTokenList>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new(list: LineaTokenList) -> Self {
        Self {
            list: Mutex::new(list),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> LineaTokenList {
        self.list.lock().map(|l| l.clone()).unwrap_or_else(|e| e.into_inner().clone())
    }

    /// Simulate an external writer touching the stored list
    pub fn replace(&self, list: LineaTokenList) {
        match self.list.lock() {
            Ok(mut guard) => *guard = list,
            Err(e) => *e.into_inner() = list,
        }
    }
}

#[async_trait]
impl TokenListStore for MemoryStore {
    async fn read(&self) -> Result<LineaTokenList> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.snapshot())
    }

    async fn write(&self, list: &LineaTokenList) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.replace(list.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

// ============================================================================
// Logo resolver
// ============================================================================

/// Logo lookups answered from a table keyed by L1 address
#[derive(Default)]
pub struct MockLogoResolver {
    logos: HashMap<Address, String>,
    rate_limited: bool,
}

impl MockLogoResolver {
    pub fn with_logo(mut self, l1_address: &str, logo: &str) -> Self {
        if let Ok(address) = normalize_address(l1_address) {
            self.logos.insert(address, logo.to_string());
        }
        self
    }

    pub fn rate_limited(mut self) -> Self {
        self.rate_limited = true;
        self
    }
}

#[async_trait]
impl LogoResolver for MockLogoResolver {
    fn name(&self) -> &'static str {
        "Mock"
    }

    async fn fetch_logo_uri(&self, token: &Token) -> Result<Option<String>> {
        if self.rate_limited {
            return Err(eyre!("{} rate limit reached", self.name()));
        }
        Ok(lookup_address(token, ETHEREUM_MAINNET_CHAIN_ID).and_then(|address| self.logos.get(&address).cloned()))
    }
}
