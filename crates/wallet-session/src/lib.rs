//! Wallet session and chain-state core for the wallet dashboard.
//!
//! The presentation layer drives four components through a
//! [`WalletContext`]:
//! - [`SessionManager`]: connect/disconnect lifecycle and change feed
//! - [`BalanceTracker`]: native and stablecoin balances of the active account
//! - [`ChainSwitchCoordinator`]: asks the wallet to move chains
//! - [`ChainRegistry`]: the configured chains
//!
//! Wallets and chains are reached through the [`Connector`],
//! [`WalletProvider`] and [`ChainReader`] traits. [`JsonRpcReader`] is the
//! HTTP implementation of the last one.

pub mod balance;
pub mod config;
pub mod error;
pub mod provider;
pub mod rpc;
pub mod session;
pub mod switch;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

pub use balance::{BalanceReader, BalanceTracker, ChainReader, RefreshOutcome};
pub use chain_eth::{ChainDescriptor, ChainRegistry, NativeCurrency};
pub use config::WalletConfig;
pub use error::{
    ConfigError, ConnectError, DisconnectError, ProviderError, ReadError, ReadErrorKind,
    SwitchError,
};
pub use provider::{
    AddChainParameters, Connection, Connector, ConnectorInfo, ProviderEvent, WalletProvider,
};
pub use rpc::JsonRpcReader;
pub use session::{SessionManager, Subscription};
pub use switch::{ChainSwitchCoordinator, SwitchOutcome};
pub use types::{
    BalanceSnapshot, ChainSwitchRequest, NativeBalance, SessionChange, SessionEvent, SessionStatus,
    TokenBalance, WalletSession,
};

// ─── Composition ─────────────────────────────────────────────────────

/// The components wired around one registry and one session.
pub struct WalletContext {
    registry: Arc<ChainRegistry>,
    session: Arc<SessionManager>,
    balances: Arc<BalanceTracker>,
    switcher: Arc<ChainSwitchCoordinator>,
}

impl WalletContext {
    pub fn new(
        config: &WalletConfig,
        connectors: Vec<Arc<dyn Connector>>,
        reader: Arc<dyn ChainReader>,
    ) -> Result<Self, ConfigError> {
        let registry = Arc::new(config.registry()?);
        let session = Arc::new(SessionManager::from_config(connectors, config));
        let balance_reader = Arc::new(BalanceReader::new(registry.clone(), reader));
        let balances = Arc::new(BalanceTracker::new(session.clone(), balance_reader));
        let switcher = Arc::new(ChainSwitchCoordinator::new(session.clone(), registry.clone()));

        tracing::debug!(chains = registry.len(), "wallet context ready");
        Ok(Self {
            registry,
            session,
            balances,
            switcher,
        })
    }

    /// Reads chain state over each chain's JSON-RPC endpoint.
    pub fn with_json_rpc(
        config: &WalletConfig,
        connectors: Vec<Arc<dyn Connector>>,
    ) -> Result<Self, ConfigError> {
        let reader = Arc::new(JsonRpcReader::from_config(config));
        Self::new(config, connectors, reader)
    }

    pub fn registry(&self) -> &Arc<ChainRegistry> {
        &self.registry
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn balances(&self) -> &Arc<BalanceTracker> {
        &self.balances
    }

    pub fn switcher(&self) -> &Arc<ChainSwitchCoordinator> {
        &self.switcher
    }
}
