// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock session store for deterministic testing.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use studydao_core::types::NewStudySession;
use studydao_core::{Adapter, AdapterType, HealthStatus, SessionStore, StudyDaoError};

/// A session store that keeps inserts in memory.
///
/// Ids are `mock-<uuid>`. Call [`MockSessionStore::fail`] to make every
/// following insert return a persistence error.
pub struct MockSessionStore {
    inserted: Mutex<Vec<(String, NewStudySession)>>,
    failing: AtomicBool,
}

impl MockSessionStore {
    pub fn new() -> Self {
        Self {
            inserted: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// A store whose inserts always fail.
    pub fn failing() -> Self {
        let store = Self::new();
        store.fail();
        store
    }

    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    /// Every successful insert, in order.
    pub async fn inserted(&self) -> Vec<(String, NewStudySession)> {
        self.inserted.lock().await.clone()
    }
}

impl Default for MockSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Adapter for MockSessionStore {
    fn name(&self) -> &str {
        "mock-store"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::SessionStore
    }

    async fn health_check(&self) -> Result<HealthStatus, StudyDaoError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl SessionStore for MockSessionStore {
    async fn insert(&self, session: &NewStudySession) -> Result<String, StudyDaoError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StudyDaoError::Persistence {
                source: "mock store offline".into(),
            });
        }
        let id = format!("mock-{}", uuid::Uuid::new_v4());
        self.inserted
            .lock()
            .await
            .push((id.clone(), session.clone()));
        Ok(id)
    }
}
