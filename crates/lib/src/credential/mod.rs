//! Credential management for the user system
//!
//! Provides password hashing and verification using Argon2id, plus the
//! password strength policy applied at registration.
//!
//! Cost parameters are construction-time configurable so they can be raised
//! as hardware improves without touching code or stored hashes: PHC-format
//! hash strings embed the parameters they were produced with, so verification
//! of old hashes keeps working after a cost bump.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        rand_core,
    },
};

use crate::Result;

pub mod errors;
pub use errors::CredentialError;

/// Tunable Argon2id cost parameters.
///
/// Defaults exceed the argon2 crate's own defaults on the time dimension so
/// that offline brute force stays expensive at expected hardware growth.
#[derive(Debug, Clone, Copy)]
pub struct CostParams {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of iterations (time cost).
    pub iterations: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl Default for CostParams {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            // One above the crate default of 2.
            iterations: 3,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Hashes and verifies account passwords.
///
/// Stateless over its arguments apart from the configured cost parameters,
/// which are immutable after construction; safe for concurrent use.
pub struct CredentialManager {
    argon2: Argon2<'static>,
}

impl CredentialManager {
    /// Create a manager with the given cost parameters.
    pub fn new(cost: CostParams) -> Result<Self> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| CredentialError::InvalidCostParams {
                reason: e.to_string(),
            })?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Create a manager with the default cost parameters.
    pub fn with_defaults() -> Self {
        Self::new(CostParams::default()).expect("default cost parameters are valid")
    }

    /// Hash a password, producing a salted PHC-format hash string.
    pub fn hash(&self, password: impl AsRef<str>) -> Result<String> {
        let salt = SaltString::generate(&mut rand_core::OsRng);

        let password_hash = self
            .argon2
            .hash_password(password.as_ref().as_bytes(), &salt)
            .map_err(|e| CredentialError::HashingFailed {
                reason: e.to_string(),
            })?
            .to_string();

        Ok(password_hash)
    }

    /// Verify a password against its stored hash.
    ///
    /// A wrong password is a normal negative result (`Ok(false)`), not an
    /// error. A malformed stored hash is an error. The underlying comparison
    /// is the argon2 crate's constant-time verification.
    pub fn verify(&self, password: impl AsRef<str>, password_hash: impl AsRef<str>) -> Result<bool> {
        let parsed_hash = PasswordHash::new(password_hash.as_ref())
            .map_err(|_| CredentialError::MalformedHash)?;

        match self
            .argon2
            .verify_password(password.as_ref().as_bytes(), &parsed_hash)
        {
            Ok(()) => Ok(true),
            Err(PasswordHashError::Password) => Ok(false),
            Err(e) => Err(CredentialError::VerificationFailed {
                reason: e.to_string(),
            }
            .into()),
        }
    }
}

/// Password strength policy: requires an uppercase letter, a lowercase
/// letter, a digit, and a non-alphanumeric, non-space character.
///
/// Minimum length is enforced by the caller, not here.
pub fn is_strong(password: &str) -> bool {
    let mut has_upper = false;
    let mut has_lower = false;
    let mut has_digit = false;
    let mut has_special = false;
    for c in password.chars() {
        if c.is_uppercase() {
            has_upper = true;
        } else if c.is_lowercase() {
            has_lower = true;
        } else if c.is_ascii_digit() {
            has_digit = true;
        } else if !c.is_alphanumeric() && !c.is_whitespace() {
            has_special = true;
        }
    }
    has_upper && has_lower && has_digit && has_special
}
