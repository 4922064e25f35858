//! Fixed-point rendering of raw on-chain integer amounts.

use alloy_primitives::utils::format_units as alloy_format_units;
use alloy_primitives::U256;

use crate::error::EthError;

/// Renders `amount / 10^decimals` as a decimal string.
///
/// The conversion is exact. Trailing fractional zeros are trimmed and a
/// whole number is rendered without a decimal point, so 1500000 at 6
/// decimals is `"1.5"` and one ether is `"1"`. More than 77 decimals cannot
/// be represented in a `U256` scale and is an encoding error.
pub fn format_units(amount: U256, decimals: u8) -> Result<String, EthError> {
    let rendered = alloy_format_units(amount, decimals)
        .map_err(|e| EthError::EncodingError(format!("cannot scale by {decimals} decimals: {e}")))?;

    Ok(match rendered.split_once('.') {
        Some((integer, fraction)) => match fraction.trim_end_matches('0') {
            "" => integer.to_string(),
            fraction => format!("{integer}.{fraction}"),
        },
        None => rendered,
    })
}
