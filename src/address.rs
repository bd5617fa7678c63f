//! Address normalization
//!
//! Token list entries carry addresses in whatever case the curator typed them.
//! Everything the verifier compares or writes goes through [`normalize_address`]
//! first, which left-pads short hex to 20 bytes and yields an [`Address`] whose
//! `Display` is the EIP-55 checksum form.

use alloy::primitives::{address, Address};

use crate::error::VerifyError;

/// Magic value the token bridges store in `nativeToBridgedToken` to mark a
/// reserved (blocked) slot. It is `0x111` padded to 20 bytes.
pub const RESERVED_STATUS: Address = address!("0000000000000000000000000000000000000111");

/// Parse a hex address, left-padding to 20 bytes.
///
/// Accepts with or without `0x` prefix and in any case. Checksums are not
/// enforced on input since recorded lists mix lowercase and checksummed forms.
pub fn normalize_address(value: &str) -> Result<Address, VerifyError> {
    let trimmed = value.trim();
    let hex_part = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if hex_part.is_empty() || hex_part.len() > 40 {
        return Err(VerifyError::InvalidAddress {
            value: value.to_string(),
            reason: format!("expected 1..=40 hex chars, got {}", hex_part.len()),
        });
    }

    let padded = format!("{:0>40}", hex_part);
    let bytes = hex::decode(&padded).map_err(|e| VerifyError::InvalidAddress {
        value: value.to_string(),
        reason: e.to_string(),
    })?;

    Ok(Address::from_slice(&bytes))
}

/// Checksum form of an address string, e.g. for writing back into the list.
pub fn checksum(value: &str) -> Result<String, VerifyError> {
    Ok(normalize_address(value)?.to_checksum(None))
}

/// Compare two recorded addresses ignoring case and padding.
///
/// Falls back to plain string equality when either side does not parse, so a
/// garbage value never compares equal to a valid one.
pub fn same_address(a: &str, b: &str) -> bool {
    match (normalize_address(a), normalize_address(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_full_address() {
        let addr = normalize_address("0x742d35Cc6634C0532925a3b844Bc454e4438f44e").unwrap();
        assert_eq!(
            addr.to_checksum(None),
            "0x742d35Cc6634C0532925a3b844Bc454e4438f44e"
        );
    }

    #[test]
    fn test_normalize_lowercase_input() {
        let addr = normalize_address("0x742d35cc6634c0532925a3b844bc454e4438f44e").unwrap();
        assert_eq!(
            addr.to_checksum(None),
            "0x742d35Cc6634C0532925a3b844Bc454e4438f44e"
        );
    }

    #[test]
    fn test_short_address_is_padded() {
        let addr = normalize_address("0x111").unwrap();
        assert_eq!(
            addr.to_checksum(None),
            "0x0000000000000000000000000000000000000111"
        );
    }

    #[test]
    fn test_reserved_status_matches_padded_form() {
        assert_eq!(normalize_address("0x111").unwrap(), RESERVED_STATUS);
        assert_ne!(RESERVED_STATUS, Address::ZERO);
    }

    #[test]
    fn test_invalid_hex_rejected() {
        let err = normalize_address("invalid").unwrap_err();
        assert!(err.to_string().contains("invalid"));
    }

    #[test]
    fn test_empty_and_oversized_rejected() {
        assert!(normalize_address("").is_err());
        assert!(normalize_address("0x").is_err());
        assert!(normalize_address(&format!("0x{}", "1".repeat(41))).is_err());
    }

    #[test]
    fn test_same_address_ignores_case() {
        assert!(same_address(
            "0x4d224452801aced8b2f0aebe155379bb5d594381",
            "0x4d224452801ACEd8B2F0aebE155379bb5D594381"
        ));
        assert!(!same_address(
            "0x4d224452801aced8b2f0aebe155379bb5d594381",
            "0x514910771af9ca656af840dff83e8264ecf986ca"
        ));
    }

    #[test]
    fn test_checksum_helper() {
        assert_eq!(
            checksum("0x514910771af9ca656af840dff83e8264ecf986ca").unwrap(),
            "0x514910771AF9Ca656af840dff83E8264EcF986CA"
        );
    }
}
