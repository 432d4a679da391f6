// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session store clients for StudyDAO.
//!
//! Two [`SessionStore`](studydao_core::SessionStore) backends are provided:
//! an embedded SQLite store with refinery migrations, serialized through
//! `tokio-rusqlite`'s single background thread, and a REST store speaking
//! the hosted backend's `/rest/v1/<table>` insert protocol. The
//! [`SessionRecorder`] wraps either one with the fallback-fingerprint policy.

pub mod database;
pub mod migrations;
pub mod models;
pub mod recorder;
pub mod rest;
pub mod sqlite;

use std::sync::Arc;

use studydao_config::model::{StorageBackend, StorageConfig};
use studydao_core::{SessionStore, StudyDaoError};

pub use models::{notes_digest, StoredSession};
pub use recorder::{PersistOutcome, SessionRecorder};
pub use rest::RestSessionStore;
pub use sqlite::SqliteSessionStore;

/// Opens the store selected by `config.backend`.
pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn SessionStore>, StudyDaoError> {
    match config.backend {
        StorageBackend::Sqlite => {
            let store = SqliteSessionStore::open(&config.database_path).await?;
            Ok(Arc::new(store))
        }
        StorageBackend::Rest => {
            let url = config.rest_url.clone().ok_or_else(|| {
                StudyDaoError::Config("storage.rest_url is required for the rest backend".into())
            })?;
            let key = config.rest_api_key.clone().ok_or_else(|| {
                StudyDaoError::Config(
                    "storage.rest_api_key is required for the rest backend".into(),
                )
            })?;
            Ok(Arc::new(RestSessionStore::new(url, key, config.table.clone())?))
        }
    }
}
