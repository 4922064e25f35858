use alloy_primitives::{Address, U256};

use crate::abi::{decode_uint256, encode_function_call, AbiParam};
use crate::error::EthError;

/// Function selector for `balanceOf(address)`: `0x70a08231`.
pub const BALANCE_OF_SELECTOR: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];

/// Function selector for `decimals()`: `0x313ce567`.
pub const DECIMALS_SELECTOR: [u8; 4] = [0x31, 0x3c, 0xe5, 0x67];

/// A read-only contract call: target contract, function selector and
/// arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub to: Address,
    pub selector: [u8; 4],
    pub args: Vec<AbiParam>,
}

impl ContractCall {
    /// The complete calldata (selector followed by ABI-encoded arguments).
    pub fn calldata(&self) -> Vec<u8> {
        encode_function_call(self.selector, &self.args)
    }
}

/// Builds an ERC-20 `balanceOf(owner)` call against `token`.
pub fn balance_of(token: Address, owner: Address) -> ContractCall {
    ContractCall {
        to: token,
        selector: BALANCE_OF_SELECTOR,
        args: vec![AbiParam::Address(owner)],
    }
}

/// Builds an ERC-20 `decimals()` call against `token`.
pub fn decimals(token: Address) -> ContractCall {
    ContractCall {
        to: token,
        selector: DECIMALS_SELECTOR,
        args: Vec::new(),
    }
}

/// Decodes the uint256 returned by `balanceOf`.
pub fn decode_balance(data: &[u8]) -> Result<U256, EthError> {
    decode_uint256(data)
}

/// Decodes the uint8 returned by `decimals`.
///
/// The value arrives as a full ABI word; anything above 255 is malformed.
pub fn decode_decimals(data: &[u8]) -> Result<u8, EthError> {
    let value = decode_uint256(data)?;
    u8::try_from(value)
        .map_err(|_| EthError::EncodingError(format!("decimals out of range: {value}")))
}
