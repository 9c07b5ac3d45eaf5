//! Error types for the persistence layer
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Principal not found: {username}")]
    PrincipalNotFound { username: String },

    #[error("Principal already exists: {username}")]
    PrincipalExists { username: String },

    #[error("Note not found: {id}")]
    NoteNotFound { id: String },

    #[error("Invalid username: {reason}")]
    InvalidUsername { reason: String },

    #[error("Invalid note id format: {id}")]
    InvalidNoteId { id: String },

    #[error("Note content too large: {size} bytes, maximum is {max}")]
    ContentTooLarge { size: usize, max: usize },

    #[error("Note record is missing its nonce")]
    MissingNonce,

    #[error("Database error: {reason}")]
    Sqlx {
        reason: String,
        #[source]
        source: Option<sqlx::Error>,
    },
}

impl BackendError {
    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BackendError::PrincipalNotFound { .. } | BackendError::NoteNotFound { .. }
        )
    }

    /// Check if this error indicates a conflict (already exists).
    pub fn is_conflict(&self) -> bool {
        matches!(self, BackendError::PrincipalExists { .. })
    }

    /// Check if this error is a boundary validation failure.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            BackendError::InvalidUsername { .. }
                | BackendError::InvalidNoteId { .. }
                | BackendError::ContentTooLarge { .. }
                | BackendError::MissingNonce
        )
    }
}
