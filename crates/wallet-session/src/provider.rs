//! Interfaces to the external wallet.
//!
//! A [`Connector`] is one strategy for reaching a wallet (an injected
//! in-page provider, a remote pairing session, ...). A successful handshake
//! yields a [`Connection`] whose [`WalletProvider`] accepts the requests the
//! dashboard issues afterwards. Both are injected at construction so tests
//! can substitute doubles.

use std::sync::Arc;

use alloy_primitives::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use chain_eth::chains::{ChainDescriptor, NativeCurrency};

use crate::error::ProviderError;

/// A connection strategy offered to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorInfo {
    pub id: String,
    pub display_name: String,
}

impl ConnectorInfo {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// Notifications pushed by the wallet outside of any request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// An empty list means the wallet revoked access.
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
    /// Accounts and chain reported together.
    Changed {
        accounts: Option<Vec<Address>>,
        chain_id: Option<u64>,
    },
    /// The wallet side terminated the session.
    Disconnect,
}

/// Result of a successful handshake.
pub struct Connection {
    pub provider: Arc<dyn WalletProvider>,
    pub accounts: Vec<Address>,
    pub chain_id: u64,
    /// Change notifications for the lifetime of this connection.
    pub events: Option<mpsc::UnboundedReceiver<ProviderEvent>>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("accounts", &self.accounts)
            .field("chain_id", &self.chain_id)
            .field("events", &self.events.is_some())
            .finish_non_exhaustive()
    }
}

/// A connection strategy the user can pick, such as an injected browser
/// wallet or a relay-based one.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Identity shown in the connector list.
    fn info(&self) -> ConnectorInfo;

    /// Runs the connection handshake with the wallet.
    async fn connect(&self) -> Result<Connection, ProviderError>;
}

/// Request interface of a connected wallet.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// `wallet_switchEthereumChain`.
    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError>;

    /// `wallet_addEthereumChain`.
    async fn add_chain(&self, params: &AddChainParameters) -> Result<(), ProviderError>;

    async fn disconnect(&self) -> Result<(), ProviderError>;
}

/// EIP-3085 `wallet_addEthereumChain` parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChainParameters {
    /// Hex quantity, e.g. `0x2105`.
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub block_explorer_urls: Vec<String>,
}

impl From<&ChainDescriptor> for AddChainParameters {
    fn from(chain: &ChainDescriptor) -> Self {
        Self {
            chain_id: hex_chain_id(chain.id),
            chain_name: chain.name.clone(),
            native_currency: chain.native_currency.clone(),
            rpc_urls: chain.rpc_urls.clone(),
            block_explorer_urls: chain.explorer_url.iter().cloned().collect(),
        }
    }
}

/// Formats a chain id the way wallet RPC methods expect it.
pub fn hex_chain_id(chain_id: u64) -> String {
    format!("0x{chain_id:x}")
}
