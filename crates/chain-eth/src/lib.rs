//! Ethereum/EVM chain support for the wallet dashboard.
//!
//! This crate provides:
//! - The chain registry (supported networks, native currency, RPC endpoints,
//!   per-chain stablecoin contract)
//! - ERC-20 read encoding and decoding (balanceOf, decimals)
//! - Minimal ABI encoding utilities
//! - Fixed-point unit formatting

pub mod abi;
pub mod chains;
pub mod erc20;
pub mod error;
pub mod units;

pub use chains::{ChainDescriptor, ChainRegistry, NativeCurrency};
pub use error::EthError;
