//! Error types for the key custody system
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CustodyError {
    #[error("Master key too short: {actual} bytes, minimum is {minimum}")]
    MasterKeyTooShort { actual: usize, minimum: usize },

    #[error("Master key has insufficient entropy")]
    MasterKeyLowEntropy,

    #[error("Data key generation failed: {reason}")]
    KeyGenerationFailed { reason: String },

    #[error("Key wrapping failed: {reason}")]
    WrapFailed { reason: String },

    #[error("No encryption key for principal: {username}")]
    NoKey { username: String },

    #[error("Key unwrapping failed")]
    UnwrapFailed,
}

impl CustodyError {
    /// Check if this error is the deterministic missing-key condition for a
    /// principal whose provisioning never completed.
    pub fn is_missing_key(&self) -> bool {
        matches!(self, CustodyError::NoKey { .. })
    }

    /// Check if this error is an AEAD authentication failure during unwrap
    /// (tampered wrapped key or wrong master key).
    pub fn is_unwrap_failure(&self) -> bool {
        matches!(self, CustodyError::UnwrapFailed)
    }
}
