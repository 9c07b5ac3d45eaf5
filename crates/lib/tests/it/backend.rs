//! Persistence tests for the SQLite backend.

use sealnote::backend::{Backend, NoteRecord, PrincipalRecord, Sqlite};
use uuid::Uuid;

#[tokio::test]
async fn test_sqlite_survives_reconnect() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sealnote.db");

    let note_id = Uuid::new_v4().to_string();
    {
        let backend = Sqlite::connect(&path).await.unwrap();
        backend
            .create_principal(PrincipalRecord {
                username: "alice1".to_string(),
                password_hash: "phc-hash".to_string(),
                wrapped_key: Some(vec![1u8; 48]),
                wrapped_nonce: Some(vec![2u8; 12]),
                created_at: 10,
            })
            .await
            .unwrap();
        backend
            .save_note(NoteRecord {
                id: note_id.clone(),
                owner: "alice1".to_string(),
                content: vec![9u8; 64],
                nonce: vec![3u8; 12],
                created: 11,
                modified: 11,
            })
            .await
            .unwrap();
    }

    let backend = Sqlite::connect(&path).await.unwrap();
    let principal = backend.get_principal("alice1").await.unwrap();
    assert_eq!(principal.password_hash, "phc-hash");
    assert_eq!(principal.wrapped_key.unwrap(), vec![1u8; 48]);

    let note = backend.get_note(&note_id).await.unwrap();
    assert_eq!(note.owner, "alice1");
    assert_eq!(note.content, vec![9u8; 64]);
}

#[tokio::test]
async fn test_sqlite_foreign_key_enforced() {
    let backend = Sqlite::in_memory().await.unwrap();

    // A note referencing a nonexistent principal is rejected.
    let result = backend
        .save_note(NoteRecord {
            id: Uuid::new_v4().to_string(),
            owner: "ghost1".to_string(),
            content: vec![0u8; 8],
            nonce: vec![0u8; 12],
            created: 1,
            modified: 1,
        })
        .await;
    assert!(result.is_err());
}
