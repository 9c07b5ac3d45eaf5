//! Note CRUD handlers.
//!
//! Every handler authenticates the bearer token first, then unwraps the
//! caller's data key for the duration of the request. Plaintext note content
//! exists only inside these handlers; the backend stores ciphertext and the
//! nonce it was sealed with.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use super::{AppState, client_error, internal_error};
use crate::{
    backend::NoteRecord,
    cipher,
    constants,
    custody::DataKey,
    token,
};

#[derive(Deserialize)]
pub(super) struct NoteBody {
    #[serde(default)]
    content: String,
}

/// Verify the bearer token and return the principal it asserts.
///
/// All failures collapse into one uniform 401; the client cannot tell a
/// missing header from an expired or forged token.
fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<String, Response> {
    let result = token::extract_bearer(headers).and_then(|raw| state.tokens.verify(raw));
    result.map_err(|_| client_error(StatusCode::UNAUTHORIZED, "invalid or missing token"))
}

/// Unwrap the caller's data key, mapping custody failures onto responses.
///
/// A principal without a provisioned key gets a distinct 500, since no note
/// operation can ever succeed for them. A failed unwrap (tampered record or
/// wrong master key) is logged and surfaces as an opaque 500.
async fn unwrap_key(state: &AppState, username: &str) -> Result<DataKey, Response> {
    match state.custodian.unwrap(username).await {
        Ok(key) => Ok(key),
        Err(e) if e.is_missing_key() => {
            error!(username, "principal has no encryption key");
            Err(client_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "no encryption key for user",
            ))
        }
        Err(e) => Err(internal_error("data key unwrap failed", &e)),
    }
}

/// The 1 MiB ceiling measures plaintext; the backend allows the AEAD tag
/// on top, so a full 1 MiB note round-trips.
fn check_content_size(content: &str) -> Result<(), Response> {
    if content.len() > constants::MAX_NOTE_CONTENT_SIZE {
        return Err(client_error(
            StatusCode::BAD_REQUEST,
            "note content exceeds 1 MiB",
        ));
    }
    Ok(())
}

/// POST /notes
pub(super) async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<NoteBody>,
) -> Response {
    let username = match authenticate(&state, &headers) {
        Ok(username) => username,
        Err(response) => return response,
    };
    if let Err(response) = check_content_size(&body.content) {
        return response;
    }

    let key = match unwrap_key(&state, &username).await {
        Ok(key) => key,
        Err(response) => return response,
    };
    let (ciphertext, nonce) = match cipher::seal(key.as_bytes(), body.content.as_bytes()) {
        Ok(sealed) => sealed,
        Err(e) => return internal_error("note encryption failed", &e),
    };

    let now = chrono::Utc::now().timestamp();
    let record = NoteRecord {
        id: Uuid::new_v4().to_string(),
        owner: username,
        content: ciphertext,
        nonce,
        created: now,
        modified: now,
    };
    let id = record.id.clone();
    match state.backend.save_note(record).await {
        Ok(()) => (StatusCode::CREATED, Json(json!({ "id": id }))).into_response(),
        Err(e) if e.is_validation_error() => {
            client_error(StatusCode::BAD_REQUEST, "invalid note")
        }
        Err(e) => internal_error("failed to store note", &e),
    }
}

/// GET /notes
///
/// Decryption fails closed: if any stored record fails AEAD verification the
/// whole request errors rather than returning a partial or corrupted list.
pub(super) async fn list(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let username = match authenticate(&state, &headers) {
        Ok(username) => username,
        Err(response) => return response,
    };
    let key = match unwrap_key(&state, &username).await {
        Ok(key) => key,
        Err(response) => return response,
    };

    let records = match state.backend.get_notes_by_owner(&username).await {
        Ok(records) => records,
        Err(e) => return internal_error("failed to list notes", &e),
    };

    let mut notes = Vec::with_capacity(records.len());
    for record in records {
        let plaintext = match cipher::open(key.as_bytes(), &record.nonce, &record.content) {
            Ok(plaintext) => plaintext,
            Err(e) => return internal_error("note decryption failed", &e),
        };
        let content = match String::from_utf8(plaintext) {
            Ok(content) => content,
            Err(_) => {
                error!(id = record.id, "decrypted note is not valid UTF-8");
                return client_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error",
                );
            }
        };
        notes.push(json!({
            "id": record.id,
            "content": content,
            "created": record.created,
            "modified": record.modified,
        }));
    }

    Json(json!({ "notes": notes })).into_response()
}

/// PUT /notes/{id}
///
/// Re-encrypts the new content with a fresh nonce. A note owned by someone
/// else reports not-found, never forbidden.
pub(super) async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<NoteBody>,
) -> Response {
    let username = match authenticate(&state, &headers) {
        Ok(username) => username,
        Err(response) => return response,
    };
    if let Err(response) = check_content_size(&body.content) {
        return response;
    }

    let existing = match state.backend.get_note(&id).await {
        Ok(record) => record,
        Err(e) if e.is_not_found() || e.is_validation_error() => {
            return client_error(StatusCode::NOT_FOUND, "note not found");
        }
        Err(e) => return internal_error("failed to load note", &e),
    };
    if existing.owner != username {
        return client_error(StatusCode::NOT_FOUND, "note not found");
    }

    let key = match unwrap_key(&state, &username).await {
        Ok(key) => key,
        Err(response) => return response,
    };
    let (ciphertext, nonce) = match cipher::seal(key.as_bytes(), body.content.as_bytes()) {
        Ok(sealed) => sealed,
        Err(e) => return internal_error("note encryption failed", &e),
    };

    let record = NoteRecord {
        id: existing.id.clone(),
        owner: username,
        content: ciphertext,
        nonce,
        created: existing.created,
        modified: chrono::Utc::now().timestamp(),
    };
    match state.backend.update_note(record).await {
        Ok(()) => Json(json!({ "id": existing.id })).into_response(),
        Err(e) if e.is_not_found() => client_error(StatusCode::NOT_FOUND, "note not found"),
        Err(e) => internal_error("failed to update note", &e),
    }
}

/// DELETE /notes/{id}
pub(super) async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let username = match authenticate(&state, &headers) {
        Ok(username) => username,
        Err(response) => return response,
    };

    match state.backend.delete_note(&id, &username).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) if e.is_not_found() || e.is_validation_error() => {
            client_error(StatusCode::NOT_FOUND, "note not found")
        }
        Err(e) => internal_error("failed to delete note", &e),
    }
}
