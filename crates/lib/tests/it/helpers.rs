//! Shared test helpers: server spawning and account setup.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use sealnote::{
    backend::InMemory,
    credential::CredentialManager,
    custody::{KeyCustodian, MasterKey},
    ratelimit::RateLimiter,
    service::{self, AppState},
    token::TokenService,
};

pub const SIGNING_SECRET: &[u8] = b"integration-test-signing-secret-32b!";
pub const MASTER_KEY: &[u8] = b"integration-test-master-key-material!";

/// A high enough auth-endpoint limit that tests not exercising rate
/// limiting never trip it.
const DEFAULT_TEST_LIMIT: u32 = 1000;

/// Build an application state over a fresh in-memory backend.
pub fn test_state(rate_limit: u32) -> AppState {
    let backend: Arc<dyn sealnote::backend::Backend> = Arc::new(InMemory::new());
    AppState {
        backend: Arc::clone(&backend),
        credentials: Arc::new(CredentialManager::with_defaults()),
        tokens: Arc::new(TokenService::new(SIGNING_SECRET).unwrap()),
        custodian: Arc::new(KeyCustodian::new(
            MasterKey::new(MASTER_KEY).unwrap(),
            backend,
        )),
        limiter: Arc::new(RateLimiter::new(rate_limit, Duration::from_secs(60))),
        backend_kind: "memory",
    }
}

/// Spawn the service on an ephemeral port and return its base URL.
pub async fn spawn_server(state: AppState) -> String {
    let app = service::router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().expect("failed to get local address");
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("test server failed");
    });
    format!("http://{addr}")
}

/// Spawn a server with a fresh backend and a permissive rate limit.
pub async fn spawn_default_server() -> String {
    spawn_server(test_state(DEFAULT_TEST_LIMIT)).await
}

pub async fn register(
    client: &reqwest::Client,
    base: &str,
    username: &str,
    password: &str,
) -> reqwest::Response {
    client
        .post(format!("{base}/register"))
        .json(&serde_json::json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("register request failed")
}

/// Register and log in, returning a bearer token.
pub async fn login_token(
    client: &reqwest::Client,
    base: &str,
    username: &str,
    password: &str,
) -> String {
    let response = client
        .post(format!("{base}/login"))
        .json(&serde_json::json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("login request failed");
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    body["token"].as_str().expect("missing token").to_string()
}
