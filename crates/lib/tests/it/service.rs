//! End-to-end tests for the HTTP service.

use sealnote::{
    backend::{Backend, PrincipalRecord},
    token::TokenService,
};
use serde_json::{Value, json};

use crate::helpers::{
    SIGNING_SECRET, login_token, register, spawn_default_server, spawn_server, test_state,
};

const PASSWORD: &str = "Str0ng!Pass";

#[tokio::test]
async fn test_register_login_note_round_trip() {
    let base = spawn_default_server().await;
    let client = reqwest::Client::new();

    let response = register(&client, &base, "alice1", PASSWORD).await;
    assert_eq!(response.status(), 201);

    let token = login_token(&client, &base, "alice1", PASSWORD).await;

    // The issued token asserts the registered principal.
    let tokens = TokenService::new(SIGNING_SECRET).unwrap();
    assert_eq!(tokens.verify(&token).unwrap(), "alice1");

    let response = client
        .post(format!("{base}/notes"))
        .bearer_auth(&token)
        .json(&json!({ "content": "hello, sealed world" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    let id = body["id"].as_str().unwrap().to_string();
    assert!(!id.is_empty());

    let response = client
        .get(format!("{base}/notes"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let notes = body["notes"].as_array().unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0]["id"], id.as_str());
    assert_eq!(notes[0]["content"], "hello, sealed world");
    assert!(notes[0]["created"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_registration_validation() {
    let base = spawn_default_server().await;
    let client = reqwest::Client::new();

    // Too-short username
    assert_eq!(register(&client, &base, "abc", PASSWORD).await.status(), 400);
    // Too-short password
    assert_eq!(register(&client, &base, "alice1", "aB1!").await.status(), 400);
    // Long enough but weak (no special character)
    assert_eq!(
        register(&client, &base, "alice1", "Password1").await.status(),
        400
    );
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let base = spawn_default_server().await;
    let client = reqwest::Client::new();

    assert_eq!(register(&client, &base, "alice1", PASSWORD).await.status(), 201);
    assert_eq!(register(&client, &base, "alice1", PASSWORD).await.status(), 409);
}

#[tokio::test]
async fn test_login_failures_are_uniform() {
    let base = spawn_default_server().await;
    let client = reqwest::Client::new();

    register(&client, &base, "alice1", PASSWORD).await;

    let unknown_user = client
        .post(format!("{base}/login"))
        .json(&json!({ "username": "nobody99", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    let wrong_password = client
        .post(format!("{base}/login"))
        .json(&json!({ "username": "alice1", "password": "Wr0ng!Pass" }))
        .send()
        .await
        .unwrap();

    // Identical status and body: responses must not reveal whether the
    // username exists.
    assert_eq!(unknown_user.status(), 401);
    assert_eq!(wrong_password.status(), 401);
    let body_a: Value = unknown_user.json().await.unwrap();
    let body_b: Value = wrong_password.json().await.unwrap();
    assert_eq!(body_a, body_b);
}

#[tokio::test]
async fn test_notes_require_valid_token() {
    let base = spawn_default_server().await;
    let client = reqwest::Client::new();

    let response = client.get(format!("{base}/notes")).send().await.unwrap();
    assert_eq!(response.status(), 401);

    let response = client
        .get(format!("{base}/notes"))
        .bearer_auth("not.a.token")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_cross_principal_isolation() {
    let base = spawn_default_server().await;
    let client = reqwest::Client::new();

    register(&client, &base, "alice1", PASSWORD).await;
    register(&client, &base, "bob12", PASSWORD).await;
    let alice = login_token(&client, &base, "alice1", PASSWORD).await;
    let bob = login_token(&client, &base, "bob12", PASSWORD).await;

    let response = client
        .post(format!("{base}/notes"))
        .bearer_auth(&alice)
        .json(&json!({ "content": "alice's secret" }))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let id = body["id"].as_str().unwrap().to_string();

    // Bob sees no notes.
    let response = client
        .get(format!("{base}/notes"))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert!(body["notes"].as_array().unwrap().is_empty());

    // Bob cannot update or delete Alice's note; not-found, never forbidden.
    let response = client
        .put(format!("{base}/notes/{id}"))
        .bearer_auth(&bob)
        .json(&json!({ "content": "hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let response = client
        .delete(format!("{base}/notes/{id}"))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    // Alice's note is intact.
    let response = client
        .get(format!("{base}/notes"))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["notes"][0]["content"], "alice's secret");
}

#[tokio::test]
async fn test_update_and_delete_note() {
    let base = spawn_default_server().await;
    let client = reqwest::Client::new();

    register(&client, &base, "alice1", PASSWORD).await;
    let token = login_token(&client, &base, "alice1", PASSWORD).await;

    let response = client
        .post(format!("{base}/notes"))
        .bearer_auth(&token)
        .json(&json!({ "content": "first draft" }))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let id = body["id"].as_str().unwrap().to_string();

    let response = client
        .put(format!("{base}/notes/{id}"))
        .bearer_auth(&token)
        .json(&json!({ "content": "second draft" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = client
        .get(format!("{base}/notes"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["notes"][0]["content"], "second draft");

    let response = client
        .delete(format!("{base}/notes/{id}"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    // Deleting again reports not-found.
    let response = client
        .delete(format!("{base}/notes/{id}"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_note_size_ceiling() {
    let base = spawn_default_server().await;
    let client = reqwest::Client::new();

    register(&client, &base, "alice1", PASSWORD).await;
    let token = login_token(&client, &base, "alice1", PASSWORD).await;

    // A note of exactly 1 MiB is accepted even though its ciphertext
    // carries the authentication tag on top.
    let response = client
        .post(format!("{base}/notes"))
        .bearer_auth(&token)
        .json(&json!({ "content": "x".repeat(1 << 20) }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    // One byte over is rejected at the service boundary.
    let response = client
        .post(format!("{base}/notes"))
        .bearer_auth(&token)
        .json(&json!({ "content": "x".repeat((1 << 20) + 1) }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_unprovisioned_principal_gets_missing_key_error() {
    // A principal whose data key was never provisioned (registration-time
    // wrap or store failure) must get the distinct missing-key response on
    // every note operation, not a generic failure.
    let state = test_state(1000);
    state
        .backend
        .create_principal(PrincipalRecord {
            username: "keyless1".to_string(),
            password_hash: "unused".to_string(),
            wrapped_key: None,
            wrapped_nonce: None,
            created_at: 0,
        })
        .await
        .unwrap();
    let base = spawn_server(state).await;
    let client = reqwest::Client::new();

    let token = TokenService::new(SIGNING_SECRET)
        .unwrap()
        .issue("keyless1")
        .unwrap();

    let response = client
        .post(format!("{base}/notes"))
        .bearer_auth(&token)
        .json(&json!({ "content": "sealed away" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "no encryption key for user");

    let response = client
        .get(format!("{base}/notes"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "no encryption key for user");
}

#[tokio::test]
async fn test_auth_endpoints_rate_limited() {
    let base = spawn_server(test_state(2)).await;
    let client = reqwest::Client::new();

    let login = || {
        client
            .post(format!("{base}/login"))
            .json(&json!({ "username": "alice1", "password": PASSWORD }))
            .send()
    };

    assert_eq!(login().await.unwrap().status(), 401);
    assert_eq!(login().await.unwrap().status(), 401);

    let denied = login().await.unwrap();
    assert_eq!(denied.status(), 429);
    assert!(denied.headers().contains_key("retry-after"));

    // Note endpoints are not rate limited.
    let response = client.get(format!("{base}/notes")).send().await.unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_health_and_headers() {
    let base = spawn_default_server().await;
    let client = reqwest::Client::new();

    let response = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin")
    );
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["backend"], "memory");
}
