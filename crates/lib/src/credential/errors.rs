//! Error types for the credential system
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Invalid cost parameters: {reason}")]
    InvalidCostParams { reason: String },

    #[error("Password hashing failed: {reason}")]
    HashingFailed { reason: String },

    #[error("Stored password hash is malformed")]
    MalformedHash,

    #[error("Password verification failed: {reason}")]
    VerificationFailed { reason: String },
}
