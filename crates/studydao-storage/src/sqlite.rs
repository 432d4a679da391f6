// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the SessionStore trait.

use async_trait::async_trait;
use rusqlite::params;
use tracing::debug;

use studydao_core::types::NewStudySession;
use studydao_core::{Adapter, AdapterType, HealthStatus, SessionStore, StudyDaoError};

use crate::database::{map_tr_err, Database};
use crate::models::{notes_digest, StoredSession};

/// SQLite-backed session store.
///
/// Row ids are random UUIDs; each row also carries the SHA-256 digest of its
/// notes so identical submissions can be detected later.
#[derive(Debug)]
pub struct SqliteSessionStore {
    db: Database,
}

impl SqliteSessionStore {
    pub async fn open(path: &str) -> Result<Self, StudyDaoError> {
        Ok(Self {
            db: Database::open(path).await?,
        })
    }

    /// Get a session by id.
    pub async fn fetch(&self, id: &str) -> Result<Option<StoredSession>, StudyDaoError> {
        let id = id.to_string();
        self.db
            .connection()
            .call(move |conn| -> Result<Option<StoredSession>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT id, user_id, group_id, notes, duration, timestamp, notes_digest
                     FROM study_sessions WHERE id = ?1",
                )?;
                let result = stmt.query_row(params![id], row_to_session);
                match result {
                    Ok(session) => Ok(Some(session)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await
            .map_err(map_tr_err)
    }

    /// Sessions submitted by `user_id`, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<StoredSession>, StudyDaoError> {
        let user_id = user_id.to_string();
        self.db
            .connection()
            .call(move |conn| -> Result<Vec<StoredSession>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT id, user_id, group_id, notes, duration, timestamp, notes_digest
                     FROM study_sessions WHERE user_id = ?1
                     ORDER BY timestamp DESC, rowid DESC",
                )?;
                let rows = stmt.query_map(params![user_id], row_to_session)?;
                rows.collect()
            })
            .await
            .map_err(map_tr_err)
    }

    /// Ids of earlier sessions whose notes digest matches `notes`.
    pub async fn find_by_notes(&self, notes: &str) -> Result<Vec<String>, StudyDaoError> {
        let digest = notes_digest(notes);
        self.db
            .connection()
            .call(move |conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT id FROM study_sessions WHERE notes_digest = ?1 ORDER BY rowid",
                )?;
                let rows = stmt.query_map(params![digest], |row| row.get(0))?;
                rows.collect()
            })
            .await
            .map_err(map_tr_err)
    }
}

fn row_to_session(row: &rusqlite::Row<'_>) -> Result<StoredSession, rusqlite::Error> {
    let duration: i64 = row.get(4)?;
    Ok(StoredSession {
        id: row.get(0)?,
        user_id: row.get(1)?,
        group_id: row.get(2)?,
        notes: row.get(3)?,
        duration: u64::try_from(duration).unwrap_or(0),
        timestamp: row.get(5)?,
        notes_digest: Some(row.get(6)?),
    })
}

#[async_trait]
impl Adapter for SqliteSessionStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::SessionStore
    }

    async fn health_check(&self) -> Result<HealthStatus, StudyDaoError> {
        let ok = self
            .db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT 1", [], |row| row.get(0))
            })
            .await;
        Ok(match ok {
            Ok(_) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn insert(&self, session: &NewStudySession) -> Result<String, StudyDaoError> {
        let duration = i64::try_from(session.duration).map_err(|_| {
            StudyDaoError::Validation(format!("duration {} out of range", session.duration))
        })?;
        let id = uuid::Uuid::new_v4().to_string();
        let digest = notes_digest(&session.notes);
        let row_id = id.clone();
        let user_id = session.user_id.clone();
        let group_id = session.group_id.clone();
        let notes = session.notes.clone();
        let timestamp = session.timestamp.to_rfc3339();

        self.db
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "INSERT INTO study_sessions
                         (id, user_id, group_id, notes, notes_digest, duration, timestamp)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![row_id, user_id, group_id, notes, digest, duration, timestamp],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        debug!(id = %id, user = %session.user_id, group = %session.group_id, "session stored");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn session(user: &str, notes: &str, secs: i64) -> NewStudySession {
        NewStudySession {
            user_id: user.into(),
            group_id: "0x00000000000000000000000000000000000000aa".into(),
            notes: notes.into(),
            duration: 45,
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn insert_then_fetch() {
        let store = SqliteSessionStore::open(":memory:").await.unwrap();
        let id = store.insert(&session("alice", "learned solidity", 100)).await.unwrap();

        let row = store.fetch(&id).await.unwrap().expect("row exists");
        assert_eq!(row.user_id, "alice");
        assert_eq!(row.notes, "learned solidity");
        assert_eq!(row.duration, 45);
        assert_eq!(row.notes_digest.as_deref(), Some(notes_digest("learned solidity").as_str()));
    }

    #[tokio::test]
    async fn fetch_missing_returns_none() {
        let store = SqliteSessionStore::open(":memory:").await.unwrap();
        assert!(store.fetch("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn ids_are_unique_and_duplicates_detectable() {
        let store = SqliteSessionStore::open(":memory:").await.unwrap();
        let a = store.insert(&session("alice", "same notes", 1)).await.unwrap();
        let b = store.insert(&session("bob", "same notes", 2)).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.find_by_notes("same notes").await.unwrap(), vec![a, b]);
    }

    #[tokio::test]
    async fn list_for_user_newest_first() {
        let store = SqliteSessionStore::open(":memory:").await.unwrap();
        store.insert(&session("alice", "first", 10)).await.unwrap();
        store.insert(&session("bob", "other", 20)).await.unwrap();
        store.insert(&session("alice", "second", 30)).await.unwrap();

        let rows = store.list_for_user("alice").await.unwrap();
        let notes: Vec<_> = rows.iter().map(|r| r.notes.as_str()).collect();
        assert_eq!(notes, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn health_check_reports_healthy() {
        let store = SqliteSessionStore::open(":memory:").await.unwrap();
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
    }
}
