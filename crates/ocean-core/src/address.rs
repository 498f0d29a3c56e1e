//! Ethereum address checks.

use crate::error::{CoreError, Result};

/// Returns true for a `0x`-prefixed, 40 hex digit address. Case is not checked.
pub fn is_address(value: &str) -> bool {
    value.len() == 42
        && value.starts_with("0x")
        && value.as_bytes()[2..].iter().all(|b| b.is_ascii_hexdigit())
}

/// Validate an address, returning it unchanged.
pub fn validate_address(value: &str) -> Result<&str> {
    if is_address(value) {
        Ok(value)
    } else {
        Err(CoreError::InvalidAddress(value.to_string()))
    }
}
