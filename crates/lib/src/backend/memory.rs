//! In-memory backend implementation
//!
//! A `HashMap`-based implementation of the `Backend` trait, suitable for
//! tests, development, and ephemeral deployments. Data does not survive
//! process restart.

use std::{
    collections::HashMap,
    sync::RwLock,
};

use async_trait::async_trait;

use super::{Backend, BackendError, NoteRecord, PrincipalRecord};
use crate::Result;

/// A simple in-memory backend using `HashMap`s behind read-write locks.
#[derive(Debug, Default)]
pub struct InMemory {
    principals: RwLock<HashMap<String, PrincipalRecord>>,
    notes: RwLock<HashMap<String, NoteRecord>>,
}

impl InMemory {
    /// Creates a new, empty `InMemory` backend.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Backend for InMemory {
    async fn create_principal(&self, record: PrincipalRecord) -> Result<()> {
        super::validate_username(&record.username)?;
        let mut principals = self.principals.write().unwrap();
        if principals.contains_key(&record.username) {
            return Err(BackendError::PrincipalExists {
                username: record.username,
            }
            .into());
        }
        principals.insert(record.username.clone(), record);
        Ok(())
    }

    async fn get_principal(&self, username: &str) -> Result<PrincipalRecord> {
        super::validate_username(username)?;
        let principals = self.principals.read().unwrap();
        principals
            .get(username)
            .cloned()
            .ok_or_else(|| {
                BackendError::PrincipalNotFound {
                    username: username.to_string(),
                }
                .into()
            })
    }

    async fn save_wrapped_key(&self, username: &str, wrapped: &[u8], nonce: &[u8]) -> Result<()> {
        super::validate_username(username)?;
        let mut principals = self.principals.write().unwrap();
        let record = principals.get_mut(username).ok_or_else(|| {
            BackendError::PrincipalNotFound {
                username: username.to_string(),
            }
        })?;
        record.wrapped_key = Some(wrapped.to_vec());
        record.wrapped_nonce = Some(nonce.to_vec());
        Ok(())
    }

    async fn save_note(&self, record: NoteRecord) -> Result<()> {
        super::validate_note(&record)?;
        let mut notes = self.notes.write().unwrap();
        notes.insert(record.id.clone(), record);
        Ok(())
    }

    async fn get_note(&self, id: &str) -> Result<NoteRecord> {
        super::validate_note_id(id)?;
        let notes = self.notes.read().unwrap();
        notes
            .get(id)
            .cloned()
            .ok_or_else(|| BackendError::NoteNotFound { id: id.to_string() }.into())
    }

    async fn get_notes_by_owner(&self, owner: &str) -> Result<Vec<NoteRecord>> {
        super::validate_username(owner)?;
        let notes = self.notes.read().unwrap();
        let mut owned: Vec<NoteRecord> = notes
            .values()
            .filter(|note| note.owner == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.created.cmp(&b.created).then(a.id.cmp(&b.id)));
        Ok(owned)
    }

    async fn update_note(&self, record: NoteRecord) -> Result<()> {
        super::validate_note(&record)?;
        let mut notes = self.notes.write().unwrap();
        match notes.get_mut(&record.id) {
            Some(existing) if existing.owner == record.owner => {
                existing.content = record.content;
                existing.nonce = record.nonce;
                existing.modified = record.modified;
                Ok(())
            }
            // Owner mismatch is indistinguishable from absence.
            _ => Err(BackendError::NoteNotFound { id: record.id }.into()),
        }
    }

    async fn delete_note(&self, id: &str, owner: &str) -> Result<()> {
        super::validate_note_id(id)?;
        super::validate_username(owner)?;
        let mut notes = self.notes.write().unwrap();
        match notes.get(id) {
            Some(existing) if existing.owner == owner => {
                notes.remove(id);
                Ok(())
            }
            _ => Err(BackendError::NoteNotFound { id: id.to_string() }.into()),
        }
    }
}
