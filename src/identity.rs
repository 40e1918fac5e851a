//! Principal identities for VaultNexus
//!
//! The host chain supplies caller identity with every transaction; inside the
//! marketplace a principal is an opaque 32-byte value. Verification of the
//! underlying signer is the host's concern, never ours.

use crate::error::MarketError;
use sha2::{Digest, Sha256};

/// Type alias for a caller identity, a 32-byte value.
/// We use a fixed-size array for internal type safety and performance.
pub type Principal = [u8; 32];

/// Convenience function to create a principal from a string (hashes the string).
/// Useful for testing and debugging.
pub fn principal_from_string(s: &str) -> Principal {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    hasher.finalize().into()
}

/// Convert a principal to a hex string for display.
pub fn principal_to_hex(principal: &Principal) -> String {
    hex::encode(principal)
}

/// Convert a hex string to a principal.
pub fn principal_from_hex(hex_str: &str) -> Result<Principal, MarketError> {
    let bytes = hex::decode(hex_str)
        .map_err(|e| MarketError::InvalidField(format!("Invalid hex principal: {}", e)))?;
    if bytes.len() != 32 {
        return Err(MarketError::InvalidField(format!(
            "Principal must be 32 bytes, got {}",
            bytes.len()
        )));
    }
    bytes
        .try_into()
        .map_err(|_| MarketError::InvalidField("Failed to convert bytes into principal".to_string()))
}
