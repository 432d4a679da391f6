// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Best-effort persistence with a synthesized fallback fingerprint.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use studydao_core::types::{Fingerprint, NewStudySession};
use studydao_core::{Adapter, SessionStore};

/// What [`SessionRecorder::persist`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistOutcome {
    pub fingerprint: Fingerprint,
    /// Why the store was bypassed, when the fingerprint is synthesized.
    pub degraded_reason: Option<String>,
}

/// Wraps a [`SessionStore`] so that persisting never fails.
///
/// When the insert fails, the fingerprint becomes `session_<unix-millis>`
/// and the failure is reported in [`PersistOutcome::degraded_reason`].
#[derive(Clone)]
pub struct SessionRecorder {
    store: Arc<dyn SessionStore>,
    clock: fn() -> DateTime<Utc>,
}

impl std::fmt::Debug for SessionRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRecorder")
            .field("store", &self.store.name())
            .finish()
    }
}

impl SessionRecorder {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            clock: Utc::now,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub async fn persist(
        &self,
        author: &str,
        group: &str,
        notes: &str,
        duration: u64,
    ) -> PersistOutcome {
        let now = (self.clock)();
        let session = NewStudySession {
            user_id: author.to_string(),
            group_id: group.to_string(),
            notes: notes.to_string(),
            duration,
            timestamp: now,
        };

        match self.store.insert(&session).await {
            Ok(id) => {
                info!(store = self.store.name(), fingerprint = %id, "session persisted");
                PersistOutcome {
                    fingerprint: Fingerprint::Stored(id),
                    degraded_reason: None,
                }
            }
            Err(e) => {
                let fallback = format!("session_{}", now.timestamp_millis());
                warn!(
                    store = self.store.name(),
                    error = %e,
                    fingerprint = %fallback,
                    "session store unavailable, using synthesized fingerprint"
                );
                PersistOutcome {
                    fingerprint: Fingerprint::Synthesized(fallback),
                    degraded_reason: Some(e.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use studydao_core::{Adapter, AdapterType, HealthStatus, StudyDaoError};

    struct Failing;

    #[async_trait]
    impl Adapter for Failing {
        fn name(&self) -> &str {
            "failing"
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::SessionStore
        }
        async fn health_check(&self) -> Result<HealthStatus, StudyDaoError> {
            Ok(HealthStatus::Unhealthy("down".into()))
        }
    }

    #[async_trait]
    impl SessionStore for Failing {
        async fn insert(&self, _: &NewStudySession) -> Result<String, StudyDaoError> {
            Err(StudyDaoError::Persistence {
                source: "connection refused".into(),
            })
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_123).unwrap()
    }

    #[tokio::test]
    async fn failure_synthesizes_timestamp_fingerprint() {
        let recorder = SessionRecorder::new(Arc::new(Failing)).with_clock(fixed_now);
        let outcome = recorder.persist("0xabc", "0xdef", "notes", 30).await;
        assert_eq!(
            outcome.fingerprint,
            Fingerprint::Synthesized("session_1700000000123".into())
        );
        assert!(outcome.degraded_reason.unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn success_keeps_store_id() {
        let store = crate::SqliteSessionStore::open(":memory:").await.unwrap();
        let recorder = SessionRecorder::new(Arc::new(store));
        let outcome = recorder.persist("0xabc", "0xdef", "notes", 30).await;
        assert!(matches!(outcome.fingerprint, Fingerprint::Stored(_)));
        assert_eq!(outcome.degraded_reason, None);
    }
}
