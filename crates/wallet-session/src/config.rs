use std::time::Duration;

use serde::{Deserialize, Serialize};

use chain_eth::chains::{builtin_chains, ChainDescriptor, ChainRegistry};

use crate::error::ConfigError;

/// Default bound on a connection handshake.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 60_000;

/// Default bound on a single RPC read.
pub const DEFAULT_RPC_TIMEOUT_MS: u64 = 10_000;

/// Static configuration supplied once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WalletConfig {
    /// Supported chains, in display order.
    pub chains: Vec<ChainDescriptor>,
    /// Connector ids to offer; `None` offers every connector supplied.
    pub enabled_connectors: Option<Vec<String>>,
    pub connect_timeout_ms: u64,
    pub rpc_timeout_ms: u64,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            chains: builtin_chains(),
            enabled_connectors: None,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            rpc_timeout_ms: DEFAULT_RPC_TIMEOUT_MS,
        }
    }
}

impl WalletConfig {
    /// Parses a JSON config; omitted fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builds the chain registry, validating the chain list.
    pub fn registry(&self) -> Result<ChainRegistry, ConfigError> {
        Ok(ChainRegistry::new(self.chains.clone())?)
    }

    /// Upper bound on one connection handshake.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Upper bound on one JSON-RPC request.
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }

    /// Every connector is enabled when no list is configured.
    pub fn is_connector_enabled(&self, id: &str) -> bool {
        self.enabled_connectors
            .as_ref()
            .is_none_or(|ids| ids.iter().any(|enabled| enabled == id))
    }
}
