use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// Lifecycle state of the wallet session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Errored,
}

impl SessionStatus {
    /// Whether a new `connect` is accepted from this state.
    pub fn accepts_connect(&self) -> bool {
        matches!(self, SessionStatus::Disconnected | SessionStatus::Errored)
    }
}

/// Snapshot of the single application-wide wallet session.
///
/// `address` and `chain_id` are present iff `status` is `Connected`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSession {
    pub status: SessionStatus,
    pub connector_id: Option<String>,
    pub address: Option<Address>,
    pub chain_id: Option<u64>,
    pub last_error: Option<String>,
}

impl WalletSession {
    pub fn is_connected(&self) -> bool {
        self.status == SessionStatus::Connected
    }

    /// The `(address, chain_id)` pair balance reads are keyed on.
    pub fn active_pair(&self) -> Option<(Address, u64)> {
        match (self.status, self.address, self.chain_id) {
            (SessionStatus::Connected, Some(address), Some(chain_id)) => Some((address, chain_id)),
            _ => None,
        }
    }

    pub(crate) fn connecting(connector_id: &str) -> Self {
        Self {
            status: SessionStatus::Connecting,
            connector_id: Some(connector_id.to_string()),
            ..Self::default()
        }
    }

    pub(crate) fn connected(connector_id: &str, address: Address, chain_id: u64) -> Self {
        Self {
            status: SessionStatus::Connected,
            connector_id: Some(connector_id.to_string()),
            address: Some(address),
            chain_id: Some(chain_id),
            last_error: None,
        }
    }

    pub(crate) fn errored(connector_id: &str, error: String) -> Self {
        Self {
            status: SessionStatus::Errored,
            connector_id: Some(connector_id.to_string()),
            last_error: Some(error),
            ..Self::default()
        }
    }
}

/// One semantic change carried by a [`SessionEvent`], holding the new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionChange {
    Status(SessionStatus),
    Address(Option<Address>),
    Chain(Option<u64>),
}

/// Notification delivered to session subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEvent {
    /// Strictly increasing per session manager.
    pub sequence: u64,
    pub session: WalletSession,
    pub changes: Vec<SessionChange>,
}

impl SessionEvent {
    /// Whether the lifecycle status moved.
    pub fn status_changed(&self) -> bool {
        self.changes.iter().any(|c| matches!(c, SessionChange::Status(_)))
    }

    pub fn address_changed(&self) -> bool {
        self.changes.iter().any(|c| matches!(c, SessionChange::Address(_)))
    }

    pub fn chain_changed(&self) -> bool {
        self.changes.iter().any(|c| matches!(c, SessionChange::Chain(_)))
    }
}

/// Native-currency holdings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeBalance {
    pub raw: U256,
    pub formatted: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Holdings of the chain's designated stablecoin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalance {
    pub token: Address,
    pub raw: U256,
    pub formatted: String,
    pub decimals: u8,
}

/// Balances of one `(address, chain_id)` pair from a single read cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSnapshot {
    pub address: Address,
    pub chain_id: u64,
    pub native: NativeBalance,
    /// Omitted when the chain has no stablecoin configured.
    pub token: Option<TokenBalance>,
    /// Logical issue order of the read that produced this snapshot.
    pub sequence: u64,
}

impl BalanceSnapshot {
    /// The `(address, chain_id)` this snapshot was read for.
    pub fn pair(&self) -> (Address, u64) {
        (self.address, self.chain_id)
    }
}

/// A user's request to move the wallet to another chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSwitchRequest {
    pub chain_id: u64,
}
