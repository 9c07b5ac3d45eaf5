//!
//! Sealnote: an authenticated note-storage service with envelope encryption.
//! This library provides the core components of the service and the axum layer
//! that exposes them over HTTP.
//!
//! ## Core Concepts
//!
//! Sealnote is built around a small set of components:
//!
//! * **Credential Manager (`credential`)**: Salted adaptive-cost password hashing and
//!   password strength assessment.
//! * **Token Service (`token`)**: Issuance and verification of short-lived signed
//!   bearer tokens carrying a principal identity claim.
//! * **Key Custodian (`custody`)**: Per-principal data-encryption keys, wrapped under
//!   a process-wide master key (envelope encryption) and unwrapped on demand.
//! * **Content Cipher (`cipher`)**: Authenticated encryption of note payloads with a
//!   principal's unwrapped data key.
//! * **Rate Limiter (`ratelimit`)**: A concurrency-safe windowed admission gate for
//!   the authentication endpoints.
//! * **Backends (`backend`)**: A pluggable persistence layer for principals and note
//!   ciphertext records.
//! * **Service (`service`)**: The axum router, request handlers, and middleware tying
//!   the components together.

pub mod backend;
pub mod cipher;
pub mod constants;
pub mod credential;
pub mod custody;
pub mod ratelimit;
pub mod service;
pub mod token;

/// Result type used throughout the Sealnote library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Sealnote library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured credential errors from the credential module
    #[error(transparent)]
    Credential(#[from] credential::CredentialError),

    /// Structured token errors from the token module
    #[error(transparent)]
    Token(#[from] token::TokenError),

    /// Structured key custody errors from the custody module
    #[error(transparent)]
    Custody(#[from] custody::CustodyError),

    /// Structured cipher errors from the cipher module
    #[error(transparent)]
    Cipher(#[from] cipher::CipherError),

    /// Structured persistence errors from the backend module
    #[error(transparent)]
    Backend(#[from] backend::errors::BackendError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Credential(_) => "credential",
            Error::Token(_) => "token",
            Error::Custody(_) => "custody",
            Error::Cipher(_) => "cipher",
            Error::Backend(_) => "backend",
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Backend(backend_err) => backend_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error indicates a conflict (already exists).
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::Backend(backend_err) => backend_err.is_conflict(),
            _ => false,
        }
    }

    /// Check if this error is authentication-related (bad token or an AEAD
    /// verification failure).
    pub fn is_authentication_error(&self) -> bool {
        match self {
            Error::Token(_) => true,
            Error::Cipher(cipher_err) => cipher_err.is_authentication_failure(),
            Error::Custody(custody_err) => custody_err.is_unwrap_failure(),
            _ => false,
        }
    }

    /// Check if this error is validation-related (malformed input at a boundary).
    pub fn is_validation_error(&self) -> bool {
        match self {
            Error::Backend(backend_err) => backend_err.is_validation_error(),
            Error::Cipher(cipher_err) => cipher_err.is_validation_error(),
            _ => false,
        }
    }

    /// Check if this error indicates a principal has no usable data key.
    pub fn is_missing_key(&self) -> bool {
        match self {
            Error::Custody(custody_err) => custody_err.is_missing_key(),
            _ => false,
        }
    }
}
