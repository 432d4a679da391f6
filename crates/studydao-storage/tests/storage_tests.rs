// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File-backed store tests: migrations, reopen, backend selection.

use std::sync::Arc;

use chrono::Utc;
use studydao_config::model::{StorageBackend, StorageConfig};
use studydao_core::types::{Fingerprint, NewStudySession};
use studydao_core::Adapter;
use studydao_storage::{open_store, SessionRecorder, SqliteSessionStore};

fn config(path: &str) -> StorageConfig {
    StorageConfig {
        backend: StorageBackend::Sqlite,
        database_path: path.to_string(),
        rest_url: None,
        rest_api_key: None,
        table: "study_sessions".to_string(),
    }
}

#[tokio::test]
async fn rows_survive_reopen() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("nested").join("studydao.db");
    let path = path.to_string_lossy().to_string();

    let id = {
        let store = SqliteSessionStore::open(&path).await.unwrap();
        let session = NewStudySession {
            user_id: "0xabc".into(),
            group_id: "0xdef".into(),
            notes: "practiced solidity".into(),
            duration: 60,
            timestamp: Utc::now(),
        };
        studydao_core::SessionStore::insert(&store, &session).await.unwrap()
    };

    let reopened = SqliteSessionStore::open(&path).await.unwrap();
    let row = reopened.fetch(&id).await.unwrap().expect("row persisted");
    assert_eq!(row.notes, "practiced solidity");
    assert_eq!(row.duration, 60);
}

#[tokio::test]
async fn open_store_selects_sqlite_backend() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("studydao.db");
    let store = open_store(&config(&path.to_string_lossy())).await.unwrap();
    assert_eq!(store.name(), "sqlite");

    let recorder = SessionRecorder::new(Arc::clone(&store));
    let outcome = recorder.persist("0xabc", "0xdef", "reviewed notes", 15).await;
    assert!(matches!(outcome.fingerprint, Fingerprint::Stored(_)));
}

#[tokio::test]
async fn rest_backend_requires_url_and_key() {
    let mut cfg = config("unused.db");
    cfg.backend = StorageBackend::Rest;
    assert!(open_store(&cfg).await.is_err());

    cfg.rest_url = Some("https://example.supabase.co".into());
    cfg.rest_api_key = Some("anon".into());
    let store = open_store(&cfg).await.unwrap();
    assert_eq!(store.name(), "rest");
}
