use std::time::Duration;

use alloy_transport::{RpcError, TransportError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use chain_eth::error::EthError;

/// An error reported by the wallet provider, carrying its EIP-1193 code.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("provider error {code}: {message}")]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
}

impl ProviderError {
    /// The user rejected the request.
    pub const USER_REJECTED: i64 = 4001;
    /// The requested account or method has not been authorized.
    pub const UNAUTHORIZED: i64 = 4100;
    /// The provider does not support the requested method.
    pub const UNSUPPORTED_METHOD: i64 = 4200;
    /// The provider is disconnected from all chains.
    pub const DISCONNECTED: i64 = 4900;
    /// The provider is not connected to the requested chain.
    pub const CHAIN_DISCONNECTED: i64 = 4901;
    /// The chain was never registered with the wallet.
    pub const UNRECOGNIZED_CHAIN: i64 = 4902;

    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn user_rejected() -> Self {
        Self::new(Self::USER_REJECTED, "User rejected the request.")
    }

    pub fn unrecognized_chain(chain_id: u64) -> Self {
        Self::new(
            Self::UNRECOGNIZED_CHAIN,
            format!("Unrecognized chain ID \"0x{chain_id:x}\"."),
        )
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == Self::USER_REJECTED
    }

    pub fn is_unrecognized_chain(&self) -> bool {
        self.code == Self::UNRECOGNIZED_CHAIN
    }
}

/// Why a `connect` call did not produce a connected session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("unknown connector: {0}")]
    UnknownConnector(String),

    #[error("a connection attempt is already in progress")]
    AlreadyInProgress,

    #[error("already connected")]
    AlreadyConnected,

    #[error("user rejected the connection request")]
    UserRejected,

    #[error("wallet provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("connection timed out after {0:?}")]
    Timeout(Duration),

    #[error("wallet returned no accounts")]
    NoAccounts,

    #[error("connection attempt was superseded by a disconnect")]
    Cancelled,

    #[error("connection attempt was abandoned before it completed")]
    Abandoned,
}

impl From<ProviderError> for ConnectError {
    fn from(e: ProviderError) -> Self {
        if e.is_user_rejection() {
            ConnectError::UserRejected
        } else {
            ConnectError::ProviderUnavailable(e.to_string())
        }
    }
}

/// The local session is always `disconnected` by the time this is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisconnectError {
    #[error("provider disconnect failed: {0}")]
    Provider(#[from] ProviderError),
}

/// Failure category of a balance read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReadErrorKind {
    NetworkError,
    NotFound,
    Unknown,
}

/// A failed balance read. [`ReadError::kind`] gives the category shown to
/// the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    #[error("network error: {0}")]
    Network(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("read failed: {0}")]
    Unknown(String),
}

impl ReadError {
    /// The failure category.
    pub fn kind(&self) -> ReadErrorKind {
        match self {
            ReadError::Network(_) => ReadErrorKind::NetworkError,
            ReadError::NotFound(_) => ReadErrorKind::NotFound,
            ReadError::Unknown(_) => ReadErrorKind::Unknown,
        }
    }
}

impl From<EthError> for ReadError {
    fn from(e: EthError) -> Self {
        match e {
            EthError::ChainNotFound(_) => ReadError::NotFound(e.to_string()),
            other => ReadError::Unknown(other.to_string()),
        }
    }
}

impl From<TransportError> for ReadError {
    fn from(e: TransportError) -> Self {
        match e {
            RpcError::Transport(kind) => ReadError::Network(kind.to_string()),
            RpcError::ErrorResp(payload) => {
                ReadError::Unknown(format!("rpc error {}: {}", payload.code, payload.message))
            }
            other => ReadError::Unknown(other.to_string()),
        }
    }
}

/// Why a chain switch request failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwitchError {
    #[error("no wallet provider available")]
    NoProvider,

    #[error("unsupported chain: {0}")]
    UnsupportedChain(u64),

    #[error("chain registration failed: {0}")]
    Registration(ProviderError),

    #[error(transparent)]
    Provider(ProviderError),
}

impl SwitchError {
    /// The provider's error code, when the failure came from the wallet.
    pub fn provider_code(&self) -> Option<i64> {
        match self {
            SwitchError::Registration(e) | SwitchError::Provider(e) => Some(e.code),
            _ => None,
        }
    }
}

/// A configuration that cannot be loaded or yields an invalid registry.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid chain list: {0}")]
    Chains(#[from] EthError),
}
