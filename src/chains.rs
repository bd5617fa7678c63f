//! The two-network profile (L1 Ethereum, L2 Linea)
//!
//! Explorer URIs written into the list are a pure function of the chain id and
//! the token address. Only the two configured chains are valid; anything else
//! is [`VerifyError::UnsupportedChain`].

use alloy::primitives::Address;

use crate::error::VerifyError;

pub const ETHEREUM_MAINNET_CHAIN_ID: u64 = 1;
pub const LINEA_MAINNET_CHAIN_ID: u64 = 59144;

const ETHERSCAN_URL: &str = "https://etherscan.io";
const LINEASCAN_URL: &str = "https://lineascan.build";

/// Which side of the bridge a chain sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    L1,
    L2,
}

impl Layer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::L1 => "L1",
            Layer::L2 => "L2",
        }
    }

    pub fn other(&self) -> Layer {
        match self {
            Layer::L1 => Layer::L2,
            Layer::L2 => Layer::L1,
        }
    }
}

/// One configured network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    pub chain_id: u64,
    /// Block explorer base, no trailing slash
    pub explorer_url: String,
}

impl Network {
    /// `<explorer>/block/0`, the list's `chainURI`
    pub fn chain_uri(&self) -> String {
        format!("{}/block/0", self.explorer_url)
    }

    /// `<explorer>/address/<checksum address>`, the list's `tokenId`
    pub fn token_uri(&self, address: &Address) -> String {
        format!("{}/address/{}", self.explorer_url, address.to_checksum(None))
    }
}

/// Explorer-derived fields for a token on a given chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorerFields {
    pub chain_uri: String,
    pub token_id: String,
    /// The opposite chain, i.e. where a root asset of this token would live
    pub root_chain_id: u64,
    pub root_chain_uri: String,
}

/// The L1/L2 pair the token list spans
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkPair {
    pub l1: Network,
    pub l2: Network,
}

impl Default for NetworkPair {
    fn default() -> Self {
        Self::new(ETHEREUM_MAINNET_CHAIN_ID, LINEA_MAINNET_CHAIN_ID)
    }
}

impl NetworkPair {
    pub fn new(l1_chain_id: u64, l2_chain_id: u64) -> Self {
        Self {
            l1: Network {
                chain_id: l1_chain_id,
                explorer_url: ETHERSCAN_URL.to_string(),
            },
            l2: Network {
                chain_id: l2_chain_id,
                explorer_url: LINEASCAN_URL.to_string(),
            },
        }
    }

    pub fn layer_of(&self, chain_id: u64) -> Option<Layer> {
        if chain_id == self.l1.chain_id {
            Some(Layer::L1)
        } else if chain_id == self.l2.chain_id {
            Some(Layer::L2)
        } else {
            None
        }
    }

    /// Resolve a chain id to its layer, failing for chains outside the pair
    pub fn require_layer(&self, chain_id: u64, token: &str) -> Result<Layer, VerifyError> {
        self.layer_of(chain_id)
            .ok_or_else(|| VerifyError::UnsupportedChain {
                chain_id,
                token: token.to_string(),
            })
    }

    pub fn network(&self, layer: Layer) -> &Network {
        match layer {
            Layer::L1 => &self.l1,
            Layer::L2 => &self.l2,
        }
    }

    /// Canonical explorer fields for `address` deployed on `chain_id`.
    ///
    /// A Linea token gets Lineascan URIs and an Ethereum root; an Ethereum
    /// token gets the mirror.
    pub fn explorer_fields(
        &self,
        chain_id: u64,
        address: &Address,
        token: &str,
    ) -> Result<ExplorerFields, VerifyError> {
        let layer = self.require_layer(chain_id, token)?;
        let home = self.network(layer);
        let root = self.network(layer.other());

        Ok(ExplorerFields {
            chain_uri: home.chain_uri(),
            token_id: home.token_uri(address),
            root_chain_id: root.chain_id,
            root_chain_uri: root.chain_uri(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    const TOKEN: Address = address!("1234567890123456789012345678901234567890");

    #[test]
    fn test_linea_fields() {
        let pair = NetworkPair::default();
        let fields = pair
            .explorer_fields(LINEA_MAINNET_CHAIN_ID, &TOKEN, "Test Token")
            .unwrap();

        assert_eq!(fields.chain_uri, "https://lineascan.build/block/0");
        assert_eq!(
            fields.token_id,
            format!("https://lineascan.build/address/{}", TOKEN.to_checksum(None))
        );
        assert_eq!(fields.root_chain_id, ETHEREUM_MAINNET_CHAIN_ID);
        assert_eq!(fields.root_chain_uri, "https://etherscan.io/block/0");
    }

    #[test]
    fn test_ethereum_fields_mirror() {
        let pair = NetworkPair::default();
        let fields = pair
            .explorer_fields(ETHEREUM_MAINNET_CHAIN_ID, &TOKEN, "Test Token")
            .unwrap();

        assert_eq!(fields.chain_uri, "https://etherscan.io/block/0");
        assert!(fields.token_id.starts_with("https://etherscan.io/address/0x"));
        assert_eq!(fields.root_chain_id, LINEA_MAINNET_CHAIN_ID);
        assert_eq!(fields.root_chain_uri, "https://lineascan.build/block/0");
    }

    #[test]
    fn test_unknown_chain_is_rejected() {
        let pair = NetworkPair::default();
        let err = pair.explorer_fields(999_999, &TOKEN, "Ghost").unwrap_err();
        assert_eq!(
            err,
            VerifyError::UnsupportedChain {
                chain_id: 999_999,
                token: "Ghost".to_string()
            }
        );
    }

    #[test]
    fn test_layer_lookup() {
        let pair = NetworkPair::new(11155111, 59141);
        assert_eq!(pair.layer_of(11155111), Some(Layer::L1));
        assert_eq!(pair.layer_of(59141), Some(Layer::L2));
        assert_eq!(pair.layer_of(1), None);
        assert_eq!(Layer::L1.other(), Layer::L2);
    }
}
