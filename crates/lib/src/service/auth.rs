//! Registration and login handlers.

use axum::{Json, extract::State, http::StatusCode, response::{IntoResponse, Response}};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::{AppState, client_error, internal_error, unauthorized};
use crate::{backend::PrincipalRecord, constants, credential};

#[derive(Deserialize)]
pub(super) struct Credentials {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// POST /register
///
/// Validates the username and the password strength policy, hashes the
/// password, stores the principal, and provisions their data key.
///
/// Key provisioning is soft-fail: the account is created even if wrapping or
/// storing the data key fails, and every note operation for that principal
/// then fails with the distinct missing-key condition until the key exists.
pub(super) async fn register(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Response {
    let username = credentials.username.trim().to_string();

    if username.chars().count() < constants::MIN_USERNAME_LEN {
        return client_error(
            StatusCode::BAD_REQUEST,
            "username must be at least 4 characters",
        );
    }
    if username.chars().count() > constants::MAX_USERNAME_LEN {
        return client_error(StatusCode::BAD_REQUEST, "username too long");
    }
    if credentials.password.chars().count() < constants::MIN_PASSWORD_LEN {
        return client_error(
            StatusCode::BAD_REQUEST,
            "password must be at least 8 characters",
        );
    }
    if !credential::is_strong(&credentials.password) {
        return client_error(
            StatusCode::BAD_REQUEST,
            "password must contain an uppercase letter, a lowercase letter, a digit, and a special character",
        );
    }

    let password_hash = match state.credentials.hash(&credentials.password) {
        Ok(hash) => hash,
        Err(e) => return internal_error("password hashing failed", &e),
    };

    let record = PrincipalRecord {
        username: username.clone(),
        password_hash,
        wrapped_key: None,
        wrapped_nonce: None,
        created_at: chrono::Utc::now().timestamp(),
    };
    if let Err(e) = state.backend.create_principal(record).await {
        if e.is_conflict() {
            return client_error(StatusCode::CONFLICT, "username already taken");
        }
        if e.is_validation_error() {
            return client_error(StatusCode::BAD_REQUEST, "invalid username");
        }
        return internal_error("failed to store principal", &e);
    }

    // The account exists from here on; a key provisioning failure leaves it
    // without a usable data key rather than rolling back registration.
    if let Err(e) = state.custodian.provision(&username).await {
        warn!(username, error = %e, "data key provisioning failed at registration");
    }

    info!(username, "principal registered");
    (StatusCode::CREATED, Json(json!({ "username": username }))).into_response()
}

/// POST /login
///
/// Verifies the password and issues a bearer token. Every failure path
/// returns the same uniform 401: an unknown username, a wrong password, and
/// a malformed stored hash are indistinguishable to the client.
pub(super) async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Response {
    let record = match state.backend.get_principal(credentials.username.trim()).await {
        Ok(record) => record,
        Err(_) => return unauthorized(),
    };

    match state
        .credentials
        .verify(&credentials.password, &record.password_hash)
    {
        Ok(true) => {}
        Ok(false) => return unauthorized(),
        Err(e) => {
            // A malformed stored hash is a server-side defect; log it but
            // keep the client-facing response uniform.
            warn!(username = record.username, error = %e, "password verification errored");
            return unauthorized();
        }
    }

    match state.tokens.issue(&record.username) {
        Ok(token) => Json(json!({ "token": token })).into_response(),
        Err(e) => internal_error("token issuance failed", &e),
    }
}
