//! Fatal verification errors
//!
//! Any of these aborts the whole verification run. Messages carry the token
//! name and both sides of a mismatch so a failed run can be diagnosed from the
//! error alone.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// A hard field differs between the recorded and the on-chain token
    #[error("{field} mismatch for token '{token}': recorded {recorded}, verified {verified}")]
    FieldMismatch {
        field: &'static str,
        token: String,
        recorded: String,
        verified: String,
    },

    /// No verified counterpart could be produced for the token
    #[error("Token '{token}' not found at {address}: {reason}")]
    TokenNotFound {
        token: String,
        address: String,
        reason: String,
    },

    /// Token (or its root) lives on a chain outside the configured pair
    #[error("Unsupported chain id {chain_id} for token '{token}'")]
    UnsupportedChain { chain_id: u64, token: String },

    /// A `nativeToBridgedToken` lookup failed (RPC error, revert or timeout)
    #[error("Bridge mapping lookup failed for token '{token}': {reason}")]
    Mapping { token: String, reason: String },

    #[error("Invalid address '{value}': {reason}")]
    InvalidAddress { value: String, reason: String },
}

impl VerifyError {
    /// Field name for mismatch errors, used by tests and log fields
    pub fn field(&self) -> Option<&'static str> {
        match self {
            VerifyError::FieldMismatch { field, .. } => Some(field),
            _ => None,
        }
    }
}
