//! HTTP service layer
//!
//! This module provides the axum router and request handlers that expose the
//! core components over HTTP, plus the middleware stack (rate limiting on the
//! authentication endpoints, security headers, and CORS).
//!
//! ## Error mapping
//!
//! Handler failures map onto a small, deliberate set of responses:
//!
//! * Validation failures surface as 400 with a specific message.
//! * Authentication failures are uniform 401s; the response never reveals
//!   whether the username exists or which check failed.
//! * A principal whose data key was never provisioned gets a distinct 500,
//!   since no note operation can ever succeed for them.
//! * Cryptographic failures surface as opaque 500s; the detail is logged
//!   server-side, never returned to the client.

mod auth;
mod middleware;
mod notes;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde_json::json;
use tracing::error;

use crate::{
    backend::Backend, credential::CredentialManager, custody::KeyCustodian,
    ratelimit::RateLimiter, token::TokenService,
};

pub use middleware::{cors, security_headers};

/// Shared state for all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn Backend>,
    pub credentials: Arc<CredentialManager>,
    pub tokens: Arc<TokenService>,
    pub custodian: Arc<KeyCustodian>,
    pub limiter: Arc<RateLimiter>,
    /// Human-readable backend kind, reported by the health endpoint.
    pub backend_kind: &'static str,
}

/// Build the service router.
///
/// Rate limiting applies only to the authentication endpoints; the note
/// endpoints are already gated by token verification.
pub fn router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route_layer(from_fn_with_state(state.clone(), middleware::rate_limit));

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .merge(auth_routes)
        .route("/notes", post(notes::create).get(notes::list))
        .route("/notes/{id}", put(notes::update).delete(notes::remove))
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(axum::middleware::from_fn(middleware::cors))
        .with_state(state)
}

async fn index() -> Response {
    Json(json!({ "service": "sealnote", "status": "ok" })).into_response()
}

async fn health(State(state): State<AppState>) -> Response {
    Json(json!({ "status": "healthy", "backend": state.backend_kind })).into_response()
}

/// A 4xx response with a client-visible message.
fn client_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// The uniform authentication failure: same status and body regardless of
/// which check failed, so responses cannot be used to enumerate accounts.
fn unauthorized() -> Response {
    client_error(StatusCode::UNAUTHORIZED, "invalid credentials")
}

/// An opaque 500. The underlying error is logged with its module of origin;
/// the client sees a generic message only.
fn internal_error(context: &str, err: &crate::Error) -> Response {
    error!(module = err.module(), error = %err, "{context}");
    client_error(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
}
