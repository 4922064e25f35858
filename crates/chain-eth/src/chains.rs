use std::collections::HashMap;

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};

use crate::error::EthError;

/// The native currency of an EVM network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl NativeCurrency {
    fn new(name: &str, symbol: &str, decimals: u8) -> Self {
        Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            decimals,
        }
    }
}

/// Definition of an EVM-compatible blockchain network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDescriptor {
    pub id: u64,
    pub name: String,
    pub native_currency: NativeCurrency,
    /// Ordered RPC endpoints; the first one is the default transport.
    pub rpc_urls: Vec<String>,
    /// USDC (or equivalent) contract on this chain, if any.
    #[serde(default)]
    pub stablecoin: Option<Address>,
    #[serde(default)]
    pub explorer_url: Option<String>,
    #[serde(default)]
    pub is_testnet: bool,
}

impl ChainDescriptor {
    /// The default RPC endpoint.
    pub fn rpc_url(&self) -> Option<&str> {
        self.rpc_urls.first().map(String::as_str)
    }

    fn builtin(
        id: u64,
        name: &str,
        currency: NativeCurrency,
        rpc_url: &str,
        explorer_url: &str,
        stablecoin: Option<Address>,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            native_currency: currency,
            rpc_urls: vec![rpc_url.to_string()],
            stablecoin,
            explorer_url: Some(explorer_url.to_string()),
            is_testnet: false,
        }
    }
}

/// Ethereum Mainnet (chain ID 1).
pub fn ethereum() -> ChainDescriptor {
    ChainDescriptor::builtin(
        1,
        "Ethereum",
        NativeCurrency::new("Ether", "ETH", 18),
        "https://eth.llamarpc.com",
        "https://etherscan.io",
        Some(address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48")),
    )
}

/// Base (chain ID 8453).
pub fn base() -> ChainDescriptor {
    ChainDescriptor::builtin(
        8453,
        "Base",
        NativeCurrency::new("Ether", "ETH", 18),
        "https://mainnet.base.org",
        "https://basescan.org",
        Some(address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913")),
    )
}

/// Polygon PoS (chain ID 137).
pub fn polygon() -> ChainDescriptor {
    ChainDescriptor::builtin(
        137,
        "Polygon",
        NativeCurrency::new("POL", "POL", 18),
        "https://polygon-rpc.com",
        "https://polygonscan.com",
        Some(address!("2791Bca1f2de4661ED88A30C99A7a9449Aa84174")),
    )
}

/// BNB Smart Chain (chain ID 56).
pub fn bsc() -> ChainDescriptor {
    ChainDescriptor::builtin(
        56,
        "BNB Smart Chain",
        NativeCurrency::new("BNB", "BNB", 18),
        "https://bsc-dataseed.binance.org",
        "https://bscscan.com",
        Some(address!("8ac76a51cc950d9822d68b83fe1ad97b32cd580d")),
    )
}

/// Arbitrum One (chain ID 42161).
pub fn arbitrum() -> ChainDescriptor {
    ChainDescriptor::builtin(
        42161,
        "Arbitrum One",
        NativeCurrency::new("Ether", "ETH", 18),
        "https://arb1.arbitrum.io/rpc",
        "https://arbiscan.io",
        Some(address!("FF970A61A04b1cA14834A43f5dE4533eBDDB5CC8")),
    )
}

/// Optimism (chain ID 10).
pub fn optimism() -> ChainDescriptor {
    ChainDescriptor::builtin(
        10,
        "OP Mainnet",
        NativeCurrency::new("Ether", "ETH", 18),
        "https://mainnet.optimism.io",
        "https://optimistic.etherscan.io",
        Some(address!("7F5c764cBc14f9669B88837ca1490cCa17c31607")),
    )
}

/// Sepolia Testnet (chain ID 11155111). No stablecoin is tracked here.
pub fn sepolia() -> ChainDescriptor {
    ChainDescriptor {
        is_testnet: true,
        ..ChainDescriptor::builtin(
            11155111,
            "Sepolia",
            NativeCurrency::new("Sepolia Ether", "ETH", 18),
            "https://rpc.sepolia.org",
            "https://sepolia.etherscan.io",
            None,
        )
    }
}

/// All built-in chain definitions, in display order.
pub fn builtin_chains() -> Vec<ChainDescriptor> {
    vec![
        ethereum(),
        base(),
        polygon(),
        bsc(),
        arbitrum(),
        optimism(),
        sepolia(),
    ]
}

/// Immutable set of supported chains keyed by chain id.
///
/// Enumeration keeps the order the chains were supplied in; lookups go
/// through a hash index.
#[derive(Debug, Clone)]
pub struct ChainRegistry {
    chains: Vec<ChainDescriptor>,
    index: HashMap<u64, usize>,
}

impl ChainRegistry {
    /// Builds a registry, rejecting duplicate ids and chains without RPC URLs.
    pub fn new(chains: Vec<ChainDescriptor>) -> Result<Self, EthError> {
        let mut index = HashMap::with_capacity(chains.len());

        for (pos, chain) in chains.iter().enumerate() {
            if chain.rpc_urls.is_empty() {
                return Err(EthError::InvalidChain(format!(
                    "{} ({}) has no rpc urls",
                    chain.name, chain.id
                )));
            }
            if index.insert(chain.id, pos).is_some() {
                return Err(EthError::DuplicateChain(chain.id));
            }
        }

        Ok(Self { chains, index })
    }

    /// The registry of built-in chains.
    pub fn builtin() -> Self {
        let chains = builtin_chains();
        let index = chains.iter().enumerate().map(|(pos, c)| (c.id, pos)).collect();
        Self { chains, index }
    }

    /// Returns the descriptor for `chain_id`.
    ///
    /// A miss means the feature is unavailable on that chain, not that
    /// anything is broken.
    pub fn resolve(&self, chain_id: u64) -> Result<&ChainDescriptor, EthError> {
        self.index
            .get(&chain_id)
            .map(|&pos| &self.chains[pos])
            .ok_or(EthError::ChainNotFound(chain_id))
    }

    /// Whether `chain_id` is configured.
    pub fn contains(&self, chain_id: u64) -> bool {
        self.index.contains_key(&chain_id)
    }

    /// All chains in configured order.
    pub fn chains(&self) -> &[ChainDescriptor] {
        &self.chains
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
