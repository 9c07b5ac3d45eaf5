//! SQLite backend implementation using sqlx.
//!
//! The schema is created on connect; there are two tables, `users` (one row
//! per principal, holding the password hash and the wrapped data key) and
//! `notes` (ciphertext records keyed by UUID, indexed by owner). Ownership
//! checks on update and delete happen in the SQL predicate itself, so a
//! mismatched owner is indistinguishable from a missing note.

use std::{path::Path, str::FromStr};

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use super::{Backend, BackendError, NoteRecord, PrincipalRecord};
use crate::Result;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    username      TEXT PRIMARY KEY,
    password_hash TEXT NOT NULL,
    wrapped_key   BLOB,
    wrapped_nonce BLOB,
    created_at    INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS notes (
    id       TEXT PRIMARY KEY,
    owner    TEXT NOT NULL REFERENCES users(username),
    content  BLOB NOT NULL,
    nonce    BLOB NOT NULL,
    created  INTEGER NOT NULL,
    modified INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_notes_owner ON notes(owner);
";

/// Extension trait for sqlx Result types to simplify error handling.
///
/// Adds a method to convert sqlx errors to `BackendError::Sqlx` with a
/// context message.
pub(crate) trait SqlxResultExt<T> {
    fn sql_context(self, context: &str) -> Result<T>;
}

impl<T> SqlxResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn sql_context(self, context: &str) -> Result<T> {
        self.map_err(|e| {
            BackendError::Sqlx {
                reason: format!("{context}: {e}"),
                source: Some(e),
            }
            .into()
        })
    }
}

/// SQLite-backed persistence using sqlx.
pub struct Sqlite {
    pool: SqlitePool,
}

impl Sqlite {
    /// Open (creating if necessary) a SQLite database at the given path and
    /// initialize the schema.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);
        Self::connect_with(options).await
    }

    /// Open an in-memory SQLite database. Data is lost when the pool drops.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .sql_context("Failed to parse in-memory options")?
            .foreign_keys(true);
        Self::connect_with(options).await
    }

    async fn connect_with(options: SqliteConnectOptions) -> Result<Self> {
        // A single connection keeps in-memory databases coherent and is
        // plenty for an embedded store.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .sql_context("Failed to connect to SQLite database")?;

        sqlx::raw_sql(SCHEMA)
            .execute(&pool)
            .await
            .sql_context("Failed to initialize schema")?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl Backend for Sqlite {
    async fn create_principal(&self, record: PrincipalRecord) -> Result<()> {
        super::validate_username(&record.username)?;

        let result = sqlx::query(
            "INSERT INTO users (username, password_hash, wrapped_key, wrapped_nonce, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&record.username)
        .bind(&record.password_hash)
        .bind(&record.wrapped_key)
        .bind(&record.wrapped_nonce)
        .bind(record.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(BackendError::PrincipalExists {
                    username: record.username,
                }
                .into())
            }
            Err(e) => Err(e).sql_context("Failed to insert principal"),
        }
    }

    async fn get_principal(&self, username: &str) -> Result<PrincipalRecord> {
        super::validate_username(username)?;

        let row: Option<(String, String, Option<Vec<u8>>, Option<Vec<u8>>, i64)> = sqlx::query_as(
            "SELECT username, password_hash, wrapped_key, wrapped_nonce, created_at
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .sql_context("Failed to get principal")?;

        match row {
            Some((username, password_hash, wrapped_key, wrapped_nonce, created_at)) => {
                Ok(PrincipalRecord {
                    username,
                    password_hash,
                    wrapped_key,
                    wrapped_nonce,
                    created_at,
                })
            }
            None => Err(BackendError::PrincipalNotFound {
                username: username.to_string(),
            }
            .into()),
        }
    }

    async fn save_wrapped_key(&self, username: &str, wrapped: &[u8], nonce: &[u8]) -> Result<()> {
        super::validate_username(username)?;

        let result = sqlx::query(
            "UPDATE users SET wrapped_key = $1, wrapped_nonce = $2 WHERE username = $3",
        )
        .bind(wrapped)
        .bind(nonce)
        .bind(username)
        .execute(&self.pool)
        .await
        .sql_context("Failed to save wrapped key")?;

        if result.rows_affected() == 0 {
            return Err(BackendError::PrincipalNotFound {
                username: username.to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn save_note(&self, record: NoteRecord) -> Result<()> {
        super::validate_note(&record)?;

        sqlx::query(
            "INSERT INTO notes (id, owner, content, nonce, created, modified)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&record.id)
        .bind(&record.owner)
        .bind(&record.content)
        .bind(&record.nonce)
        .bind(record.created)
        .bind(record.modified)
        .execute(&self.pool)
        .await
        .sql_context("Failed to insert note")?;
        Ok(())
    }

    async fn get_note(&self, id: &str) -> Result<NoteRecord> {
        super::validate_note_id(id)?;

        let row: Option<(String, String, Vec<u8>, Vec<u8>, i64, i64)> = sqlx::query_as(
            "SELECT id, owner, content, nonce, created, modified FROM notes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .sql_context("Failed to get note")?;

        match row {
            Some((id, owner, content, nonce, created, modified)) => Ok(NoteRecord {
                id,
                owner,
                content,
                nonce,
                created,
                modified,
            }),
            None => Err(BackendError::NoteNotFound { id: id.to_string() }.into()),
        }
    }

    async fn get_notes_by_owner(&self, owner: &str) -> Result<Vec<NoteRecord>> {
        super::validate_username(owner)?;

        let rows: Vec<(String, String, Vec<u8>, Vec<u8>, i64, i64)> = sqlx::query_as(
            "SELECT id, owner, content, nonce, created, modified
             FROM notes WHERE owner = $1 ORDER BY created, id",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .sql_context("Failed to list notes")?;

        Ok(rows
            .into_iter()
            .map(|(id, owner, content, nonce, created, modified)| NoteRecord {
                id,
                owner,
                content,
                nonce,
                created,
                modified,
            })
            .collect())
    }

    async fn update_note(&self, record: NoteRecord) -> Result<()> {
        super::validate_note(&record)?;

        let result = sqlx::query(
            "UPDATE notes SET content = $1, nonce = $2, modified = $3
             WHERE id = $4 AND owner = $5",
        )
        .bind(&record.content)
        .bind(&record.nonce)
        .bind(record.modified)
        .bind(&record.id)
        .bind(&record.owner)
        .execute(&self.pool)
        .await
        .sql_context("Failed to update note")?;

        if result.rows_affected() == 0 {
            return Err(BackendError::NoteNotFound { id: record.id }.into());
        }
        Ok(())
    }

    async fn delete_note(&self, id: &str, owner: &str) -> Result<()> {
        super::validate_note_id(id)?;
        super::validate_username(owner)?;

        let result = sqlx::query("DELETE FROM notes WHERE id = $1 AND owner = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await
            .sql_context("Failed to delete note")?;

        if result.rows_affected() == 0 {
            return Err(BackendError::NoteNotFound { id: id.to_string() }.into());
        }
        Ok(())
    }
}
