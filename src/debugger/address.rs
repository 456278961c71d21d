//! Parsing of address arguments typed by the user.

use crate::cpu::MEMORY_SIZE;
use thiserror::Error;

/// Parse a memory address written in decimal or as `0x`-prefixed hex.
///
/// The result is guaranteed to lie in `0..MEMORY_SIZE`.
pub fn parse_address(text: &str) -> Result<u16, AddressError> {
    let value = parse_number(text)?;
    if value >= MEMORY_SIZE as u64 {
        return Err(AddressError::OutOfRange(value));
    }
    Ok(value as u16)
}

/// Parse the exclusive end of an address range, in `0..=MEMORY_SIZE`.
pub fn parse_bound(text: &str) -> Result<u16, AddressError> {
    let value = parse_number(text)?;
    if value > MEMORY_SIZE as u64 {
        return Err(AddressError::BoundOutOfRange(value));
    }
    Ok(value as u16)
}

fn parse_number(text: &str) -> Result<u64, AddressError> {
    let trimmed = text.trim();
    let parsed = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => trimmed.parse::<u64>(),
    };
    parsed.map_err(|_| AddressError::Malformed(text.to_string()))
}

/// An address argument that could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("invalid memory address: {0:?}")]
    Malformed(String),

    #[error("memory address out of range: 0x{0:X} (>= {MEMORY_SIZE})")]
    OutOfRange(u64),

    #[error("memory bound out of range: 0x{0:X} (> {MEMORY_SIZE})")]
    BoundOutOfRange(u64),
}
