//! Account address parsing.
//!
//! Account identifiers on the chain are 20-byte hex strings, accepted with or
//! without a `0x` prefix.

use alloy_primitives::Address;
use std::str::FromStr;

/// Failure to parse a caller-supplied address string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    /// The field was required but empty.
    #[error("{field}: address is empty")]
    Empty {
        /// Name of the offending field.
        field: &'static str,
    },

    /// The string is not a 20-byte hex account address.
    #[error("{field}: malformed address {value:?}: {reason}")]
    Malformed {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected input.
        value: String,
        /// Parser diagnostic.
        reason: String,
    },
}

/// Parse a required account address.
pub fn parse_address(field: &'static str, value: &str) -> Result<Address, AddressError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AddressError::Empty { field });
    }
    Address::from_str(trimmed).map_err(|e| AddressError::Malformed {
        field,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Parse an optional account address. Empty strings count as absent.
pub fn parse_optional_address(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<Address>, AddressError> {
    match value {
        Some(v) if !v.trim().is_empty() => parse_address(field, v).map(Some),
        _ => Ok(None),
    }
}
