//! Static ABI words for EVM view calls.
//!
//! Covers the argument and return shapes of the ERC-20 reads the balance
//! reader issues; dynamic types are not supported.

use alloy_primitives::{Address, U256};

use crate::error::EthError;

/// Size of one ABI word.
pub const WORD_LEN: usize = 32;

/// A single static ABI parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiParam {
    /// A 20-byte address, left-padded to 32 bytes.
    Address(Address),
    /// A 256-bit unsigned integer, big-endian.
    Uint256(U256),
}

/// Calldata for `selector(params...)`: the selector followed by one word
/// per parameter.
pub fn encode_function_call(selector: [u8; 4], params: &[AbiParam]) -> Vec<u8> {
    let mut calldata = selector.to_vec();
    calldata.reserve(params.len() * WORD_LEN);
    calldata.extend(params.iter().flat_map(AbiParam::to_word));
    calldata
}

impl AbiParam {
    fn to_word(&self) -> [u8; WORD_LEN] {
        match self {
            AbiParam::Address(addr) => addr.into_word().0,
            AbiParam::Uint256(value) => value.to_be_bytes::<WORD_LEN>(),
        }
    }
}

/// Returns the first ABI word of `data`.
///
/// Return data longer than one word is accepted; only the head is read.
pub fn decode_word(data: &[u8]) -> Result<[u8; WORD_LEN], EthError> {
    if data.len() < WORD_LEN {
        return Err(EthError::EncodingError(format!(
            "expected at least {WORD_LEN} bytes, got {}",
            data.len()
        )));
    }

    let mut word = [0u8; WORD_LEN];
    word.copy_from_slice(&data[..WORD_LEN]);
    Ok(word)
}

/// Decodes a single uint256 return value.
pub fn decode_uint256(data: &[u8]) -> Result<U256, EthError> {
    decode_word(data).map(U256::from_be_bytes)
}
