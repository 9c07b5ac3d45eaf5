//! Per-principal data-encryption key custody (envelope encryption)
//!
//! Each principal gets a random 32-byte data key at registration. Only the
//! wrapped form of that key is ever persisted: the Key Custodian seals it
//! under the process-wide master key with a fresh nonce, and opens it on
//! demand for the duration of a single note operation.
//!
//! # Security
//!
//! The master key is loaded once at startup, validated for minimum length
//! and non-triviality, never logged, and never persisted alongside the
//! wrapped keys it protects. Unwrapped data keys are scoped to the operation
//! that needs them: [`DataKey`] zeroizes its bytes on drop and is never
//! cached across requests.

use std::sync::Arc;

use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{Result, backend::Backend, cipher};

pub mod errors;
pub use errors::CustodyError;

/// Length of an unwrapped per-principal data key (AES-256).
pub const DATA_KEY_LENGTH: usize = 32;

/// Minimum master key material length in bytes.
pub const MIN_MASTER_KEY_LENGTH: usize = 32;

/// The process-wide master key used to wrap and unwrap data keys.
///
/// A low-entropy or absent master key collapses the security of every
/// wrapped key in the store, so construction fails (and the process must
/// refuse to start) rather than warn.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    key: [u8; DATA_KEY_LENGTH],
}

impl MasterKey {
    /// Validate raw secret material and derive the wrapping key from it.
    ///
    /// The material must be at least 32 bytes and must not be a single
    /// repeated byte. The AES-256 wrapping key is the SHA-256 digest of the
    /// material, so secrets longer than 32 bytes are usable as-is.
    pub fn new(material: &[u8]) -> Result<Self> {
        if material.len() < MIN_MASTER_KEY_LENGTH {
            return Err(CustodyError::MasterKeyTooShort {
                actual: material.len(),
                minimum: MIN_MASTER_KEY_LENGTH,
            }
            .into());
        }
        if material.iter().all(|b| *b == material[0]) {
            return Err(CustodyError::MasterKeyLowEntropy.into());
        }

        let digest = Sha256::digest(material);
        Ok(Self { key: digest.into() })
    }

    fn as_bytes(&self) -> &[u8] {
        &self.key
    }
}

/// An unwrapped per-principal data key.
///
/// Scoped to a single encrypt/decrypt operation; the bytes are zeroized when
/// the value is dropped. Do not store this across requests.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DataKey {
    key: [u8; DATA_KEY_LENGTH],
}

impl DataKey {
    /// Borrow the raw key bytes for a cipher operation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }
}

impl std::fmt::Debug for DataKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataKey").finish_non_exhaustive()
    }
}

/// Generates, wraps, and unwraps per-principal data keys.
pub struct KeyCustodian {
    master_key: MasterKey,
    backend: Arc<dyn Backend>,
}

impl KeyCustodian {
    pub fn new(master_key: MasterKey, backend: Arc<dyn Backend>) -> Self {
        Self {
            master_key,
            backend,
        }
    }

    /// Generate a fresh data key for the principal, wrap it under the master
    /// key, and hand the wrapped pair to the backend for storage.
    ///
    /// Callers treat a failure here as soft at registration time: the
    /// principal is left without a usable key and every subsequent note
    /// operation fails with the distinct missing-key condition.
    pub async fn provision(&self, username: &str) -> Result<()> {
        let mut data_key = [0u8; DATA_KEY_LENGTH];
        OsRng
            .try_fill_bytes(&mut data_key)
            .map_err(|e| CustodyError::KeyGenerationFailed {
                reason: e.to_string(),
            })?;

        let sealed = cipher::seal(self.master_key.as_bytes(), &data_key);
        data_key.zeroize();
        let (wrapped, nonce) = sealed.map_err(|e| CustodyError::WrapFailed {
            reason: e.to_string(),
        })?;

        self.backend
            .save_wrapped_key(username, &wrapped, &nonce)
            .await
    }

    /// Retrieve and open the principal's wrapped data key.
    ///
    /// Fails closed: an AEAD authentication failure (tampered wrapped key or
    /// wrong master key) propagates as `UnwrapFailed`, never as a corrupted
    /// key. A principal without a stored wrapped key yields `NoKey`.
    pub async fn unwrap(&self, username: &str) -> Result<DataKey> {
        let record = self.backend.get_principal(username).await?;

        let (Some(wrapped), Some(nonce)) = (record.wrapped_key, record.wrapped_nonce) else {
            return Err(CustodyError::NoKey {
                username: username.to_string(),
            }
            .into());
        };
        if wrapped.is_empty() || nonce.is_empty() {
            return Err(CustodyError::NoKey {
                username: username.to_string(),
            }
            .into());
        }

        let mut plaintext = cipher::open(self.master_key.as_bytes(), &nonce, &wrapped)
            .map_err(|_| CustodyError::UnwrapFailed)?;

        if plaintext.len() != DATA_KEY_LENGTH {
            plaintext.zeroize();
            return Err(CustodyError::UnwrapFailed.into());
        }

        let mut key = [0u8; DATA_KEY_LENGTH];
        key.copy_from_slice(&plaintext);
        plaintext.zeroize();
        Ok(DataKey { key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Backend, InMemory, PrincipalRecord};

    const MASTER: &[u8] = b"test-master-key-material-at-least-32-bytes";

    async fn custodian_with_principal(username: &str) -> KeyCustodian {
        let backend: Arc<dyn Backend> = Arc::new(InMemory::new());
        backend
            .create_principal(PrincipalRecord {
                username: username.to_string(),
                password_hash: "unused".to_string(),
                wrapped_key: None,
                wrapped_nonce: None,
                created_at: 0,
            })
            .await
            .unwrap();
        KeyCustodian::new(MasterKey::new(MASTER).unwrap(), backend)
    }

    #[test]
    fn test_master_key_validation() {
        assert!(MasterKey::new(b"short").is_err());
        assert!(MasterKey::new(&[0u8; 31]).is_err());
        // Length alone is not enough; a repeated byte is rejected.
        assert!(MasterKey::new(&[7u8; 48]).is_err());
        assert!(MasterKey::new(MASTER).is_ok());
    }

    #[tokio::test]
    async fn test_provision_unwrap_round_trip() {
        let custodian = custodian_with_principal("alice1").await;

        custodian.provision("alice1").await.unwrap();
        let key = custodian.unwrap("alice1").await.unwrap();
        assert_eq!(key.as_bytes().len(), DATA_KEY_LENGTH);

        // Unwrapping again recovers the same key.
        let again = custodian.unwrap("alice1").await.unwrap();
        assert_eq!(key.as_bytes(), again.as_bytes());
    }

    #[tokio::test]
    async fn test_unwrap_without_provision_is_missing_key() {
        let custodian = custodian_with_principal("alice1").await;

        let err = custodian.unwrap("alice1").await.unwrap_err();
        assert!(err.is_missing_key());
    }

    #[tokio::test]
    async fn test_wrapping_same_principal_twice_differs() {
        let backend: Arc<dyn Backend> = Arc::new(InMemory::new());
        backend
            .create_principal(PrincipalRecord {
                username: "alice1".to_string(),
                password_hash: "unused".to_string(),
                wrapped_key: None,
                wrapped_nonce: None,
                created_at: 0,
            })
            .await
            .unwrap();
        let custodian =
            KeyCustodian::new(MasterKey::new(MASTER).unwrap(), Arc::clone(&backend));

        custodian.provision("alice1").await.unwrap();
        let first = backend.get_principal("alice1").await.unwrap();
        custodian.provision("alice1").await.unwrap();
        let second = backend.get_principal("alice1").await.unwrap();

        // Fresh key and fresh nonce each time.
        assert_ne!(first.wrapped_key, second.wrapped_key);
        assert_ne!(first.wrapped_nonce, second.wrapped_nonce);
    }

    #[tokio::test]
    async fn test_tampered_wrapped_key_fails_closed() {
        let backend: Arc<dyn Backend> = Arc::new(InMemory::new());
        backend
            .create_principal(PrincipalRecord {
                username: "alice1".to_string(),
                password_hash: "unused".to_string(),
                wrapped_key: None,
                wrapped_nonce: None,
                created_at: 0,
            })
            .await
            .unwrap();
        let custodian =
            KeyCustodian::new(MasterKey::new(MASTER).unwrap(), Arc::clone(&backend));

        custodian.provision("alice1").await.unwrap();
        let record = backend.get_principal("alice1").await.unwrap();
        let mut wrapped = record.wrapped_key.unwrap();
        wrapped[0] ^= 0x01;
        backend
            .save_wrapped_key("alice1", &wrapped, &record.wrapped_nonce.unwrap())
            .await
            .unwrap();

        let err = custodian.unwrap("alice1").await.unwrap_err();
        assert!(err.is_authentication_error());
    }

    #[tokio::test]
    async fn test_wrong_master_key_fails_closed() {
        let backend: Arc<dyn Backend> = Arc::new(InMemory::new());
        backend
            .create_principal(PrincipalRecord {
                username: "alice1".to_string(),
                password_hash: "unused".to_string(),
                wrapped_key: None,
                wrapped_nonce: None,
                created_at: 0,
            })
            .await
            .unwrap();

        let custodian =
            KeyCustodian::new(MasterKey::new(MASTER).unwrap(), Arc::clone(&backend));
        custodian.provision("alice1").await.unwrap();

        let other = KeyCustodian::new(
            MasterKey::new(b"a-different-master-key-that-is-long-enough").unwrap(),
            backend,
        );
        assert!(other.unwrap("alice1").await.is_err());
    }
}
