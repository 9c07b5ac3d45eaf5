//! Error types for the content cipher
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CipherError {
    #[error("Invalid key length: expected 16, 24, or 32 bytes, got {actual}")]
    InvalidKeyLength { actual: usize },

    #[error("Invalid nonce length: expected {expected}, got {actual}")]
    InvalidNonceLength { expected: usize, actual: usize },

    #[error("Failed to create cipher: {reason}")]
    CipherInit { reason: String },

    #[error("Encryption failed: {reason}")]
    SealFailed { reason: String },

    #[error("Ciphertext authentication failed")]
    AuthenticationFailed,
}

impl CipherError {
    /// Check if this error is an AEAD authentication failure on open.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, CipherError::AuthenticationFailed)
    }

    /// Check if this error is a validation failure on inputs.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            CipherError::InvalidKeyLength { .. } | CipherError::InvalidNonceLength { .. }
        )
    }
}
