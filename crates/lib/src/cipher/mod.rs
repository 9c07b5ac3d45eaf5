//! Authenticated encryption of note content
//!
//! Provides AES-GCM sealing and opening of note plaintext using a
//! principal's data key. A fresh random 12-byte nonce is generated per
//! sealing operation; the ciphertext carries the authentication tag, so any
//! tampering with ciphertext, nonce, or key makes `open` fail rather than
//! return corrupted plaintext.

use aes_gcm::{
    Aes128Gcm, Aes256Gcm, AesGcm, KeyInit, Nonce,
    aead::{Aead, AeadCore, OsRng, consts::U12},
};

use crate::Result;

pub mod errors;
pub use errors::CipherError;

/// AES-192-GCM, not exported by the aes-gcm crate directly.
type Aes192Gcm = AesGcm<aes_gcm::aes::Aes192, U12>;

/// Nonce length for AES-GCM (12 bytes standard)
pub const NONCE_LENGTH: usize = 12;

/// Authentication tag length appended to every ciphertext.
pub const TAG_LENGTH: usize = 16;

/// Accepted AES key lengths in bytes.
pub const KEY_LENGTHS: [usize; 3] = [16, 24, 32];

fn validate_key(key: &[u8]) -> Result<()> {
    if !KEY_LENGTHS.contains(&key.len()) {
        return Err(CipherError::InvalidKeyLength { actual: key.len() }.into());
    }
    Ok(())
}

/// Encrypt plaintext under the given key with a fresh random nonce.
///
/// # Returns
/// A tuple of (ciphertext, nonce) where the ciphertext includes the
/// authentication tag and the nonce is 12 bytes.
pub fn seal(key: &[u8], plaintext: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
    validate_key(key)?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let seal_err = |e: aes_gcm::aead::Error| CipherError::SealFailed {
        reason: e.to_string(),
    };
    let ciphertext = match key.len() {
        16 => Aes128Gcm::new_from_slice(key)
            .map_err(|e| CipherError::CipherInit {
                reason: e.to_string(),
            })?
            .encrypt(&nonce, plaintext)
            .map_err(seal_err)?,
        24 => Aes192Gcm::new_from_slice(key)
            .map_err(|e| CipherError::CipherInit {
                reason: e.to_string(),
            })?
            .encrypt(&nonce, plaintext)
            .map_err(seal_err)?,
        _ => Aes256Gcm::new_from_slice(key)
            .map_err(|e| CipherError::CipherInit {
                reason: e.to_string(),
            })?
            .encrypt(&nonce, plaintext)
            .map_err(seal_err)?,
    };

    Ok((ciphertext, nonce.to_vec()))
}

/// Decrypt and authenticate ciphertext.
///
/// Fails closed: any bit-flip in ciphertext or nonce, or a wrong key, yields
/// `CipherError::AuthenticationFailed` rather than corrupted plaintext.
pub fn open(key: &[u8], nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    validate_key(key)?;
    if nonce.len() != NONCE_LENGTH {
        return Err(CipherError::InvalidNonceLength {
            expected: NONCE_LENGTH,
            actual: nonce.len(),
        }
        .into());
    }

    let nonce = Nonce::from_slice(nonce);
    let plaintext = match key.len() {
        16 => Aes128Gcm::new_from_slice(key)
            .map_err(|e| CipherError::CipherInit {
                reason: e.to_string(),
            })?
            .decrypt(nonce, ciphertext),
        24 => Aes192Gcm::new_from_slice(key)
            .map_err(|e| CipherError::CipherInit {
                reason: e.to_string(),
            })?
            .decrypt(nonce, ciphertext),
        _ => Aes256Gcm::new_from_slice(key)
            .map_err(|e| CipherError::CipherInit {
                reason: e.to_string(),
            })?
            .decrypt(nonce, ciphertext),
    };

    plaintext.map_err(|_| CipherError::AuthenticationFailed.into())
}
