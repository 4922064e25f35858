use thiserror::Error;

/// Ethereum chain operation errors.
#[derive(Debug, Error)]
pub enum EthError {
    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("chain not found: {0}")]
    ChainNotFound(u64),

    #[error("duplicate chain id: {0}")]
    DuplicateChain(u64),

    #[error("invalid chain: {0}")]
    InvalidChain(String),
}
