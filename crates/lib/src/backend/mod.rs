//! Backend implementations for Sealnote storage
//!
//! This module provides the `Backend` trait and its implementations. The
//! trait defines the persistence contract the core components rely on:
//! principals with their password hash and wrapped data key, and note
//! ciphertext records. Implementations never see plaintext note content or
//! unwrapped keys.
//!
//! All inputs are validated at this boundary: usernames are non-empty and
//! bounded, note ids are UUIDs, and note ciphertext is capped at the 1 MiB
//! plaintext ceiling plus the AEAD tag.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{Result, cipher, constants};

pub mod errors;
mod memory;
mod sqlite;

pub use errors::BackendError;
pub use memory::InMemory;
pub use sqlite::Sqlite;

/// A principal's stored credential and wrapped-key material.
///
/// `wrapped_key`/`wrapped_nonce` are absent when data-key provisioning
/// failed at registration; note operations for such a principal fail with a
/// distinct missing-key condition.
#[derive(Debug, Clone, PartialEq)]
pub struct PrincipalRecord {
    pub username: String,
    pub password_hash: String,
    pub wrapped_key: Option<Vec<u8>>,
    pub wrapped_nonce: Option<Vec<u8>>,
    /// Creation time as Unix seconds.
    pub created_at: i64,
}

/// A stored note: ciphertext plus the nonce it was sealed with.
///
/// The owner field is authoritative for access control; every read, update,
/// and delete checks owner equality before acting.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteRecord {
    /// Opaque unique identifier (UUID format).
    pub id: String,
    pub owner: String,
    pub content: Vec<u8>,
    pub nonce: Vec<u8>,
    /// Creation time as Unix seconds.
    pub created: i64,
    /// Last modification time as Unix seconds.
    pub modified: i64,
}

/// Backend trait abstracting the persistence mechanism for Sealnote records.
///
/// All implementations must be `Send + Sync` to allow sharing across
/// request-handling tasks; any internal synchronization is the
/// implementation's responsibility.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Store a new principal. Fails with a conflict error if the username is
    /// already taken.
    async fn create_principal(&self, record: PrincipalRecord) -> Result<()>;

    /// Retrieve a principal by username.
    async fn get_principal(&self, username: &str) -> Result<PrincipalRecord>;

    /// Store or replace the wrapped data key for an existing principal.
    async fn save_wrapped_key(&self, username: &str, wrapped: &[u8], nonce: &[u8]) -> Result<()>;

    /// Store a new note ciphertext record.
    async fn save_note(&self, record: NoteRecord) -> Result<()>;

    /// Retrieve a note by id.
    async fn get_note(&self, id: &str) -> Result<NoteRecord>;

    /// Retrieve all notes owned by the given principal.
    async fn get_notes_by_owner(&self, owner: &str) -> Result<Vec<NoteRecord>>;

    /// Update a note's content, nonce, and modified timestamp. The record's
    /// owner must match the stored owner; a mismatch reports not-found.
    async fn update_note(&self, record: NoteRecord) -> Result<()>;

    /// Delete a note owned by the given principal. A mismatched owner
    /// reports not-found.
    async fn delete_note(&self, id: &str, owner: &str) -> Result<()>;
}

pub(crate) fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(BackendError::InvalidUsername {
            reason: "username is required".to_string(),
        }
        .into());
    }
    if username.chars().count() > constants::MAX_USERNAME_LEN {
        return Err(BackendError::InvalidUsername {
            reason: "username too long".to_string(),
        }
        .into());
    }
    Ok(())
}

pub(crate) fn validate_note_id(id: &str) -> Result<()> {
    Uuid::parse_str(id).map_err(|_| BackendError::InvalidNoteId { id: id.to_string() })?;
    Ok(())
}

pub(crate) fn validate_note(record: &NoteRecord) -> Result<()> {
    validate_username(&record.owner)?;
    validate_note_id(&record.id)?;
    // The 1 MiB ceiling measures plaintext; stored content is ciphertext,
    // which carries the authentication tag on top.
    let max = constants::MAX_NOTE_CONTENT_SIZE + cipher::TAG_LENGTH;
    if record.content.len() > max {
        return Err(BackendError::ContentTooLarge {
            size: record.content.len(),
            max,
        }
        .into());
    }
    if record.nonce.is_empty() {
        return Err(BackendError::MissingNonce.into());
    }
    Ok(())
}
