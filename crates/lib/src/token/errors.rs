//! Error types for the token service
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Signing secret too short: {actual} bytes, minimum is {minimum}")]
    SecretTooShort { actual: usize, minimum: usize },

    #[error("Token signing failed: {reason}")]
    SigningFailed { reason: String },

    #[error("Malformed token")]
    MalformedToken,

    #[error("Unexpected signing algorithm: {alg}")]
    UnexpectedAlgorithm { alg: String },

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Missing or malformed identity claim")]
    MalformedClaims,

    #[error("Missing or malformed Authorization header")]
    MissingAuth,
}

impl TokenError {
    /// Check if this error is an expiry rejection, as opposed to a structural
    /// or signature failure.
    pub fn is_expired(&self) -> bool {
        matches!(self, TokenError::Expired)
    }
}
