// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! REST session store for the hosted backend's table API.
//!
//! Inserts are `POST {base}/rest/v1/{table}` with `Prefer:
//! return=representation`; the generated id is read from the first returned
//! row and may be a number or a string.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::{json, Value};
use tracing::{debug, warn};

use studydao_core::types::NewStudySession;
use studydao_core::{Adapter, AdapterType, HealthStatus, SessionStore, StudyDaoError};

use crate::models::StoredSession;

fn persistence(message: impl Into<String>) -> StudyDaoError {
    StudyDaoError::Persistence {
        source: message.into().into(),
    }
}

/// Session store backed by a hosted REST table.
#[derive(Debug, Clone)]
pub struct RestSessionStore {
    client: reqwest::Client,
    base_url: String,
    table: String,
}

impl RestSessionStore {
    pub fn new(base_url: String, api_key: String, table: String) -> Result<Self, StudyDaoError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(&api_key)
                .map_err(|e| StudyDaoError::Config(format!("invalid API key header value: {e}")))?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|e| StudyDaoError::Config(format!("invalid API key header value: {e}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| StudyDaoError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            table,
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    /// Get a session by primary key.
    pub async fn fetch(&self, id: &str) -> Result<Option<StoredSession>, StudyDaoError> {
        let response = self
            .client
            .get(self.table_url())
            .query(&[("id", format!("eq.{id}")), ("select", "*".to_string())])
            .send()
            .await
            .map_err(|e| StudyDaoError::Persistence { source: Box::new(e) })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(persistence(format!("select returned {status}: {body}")));
        }
        let rows: Vec<Value> = response
            .json()
            .await
            .map_err(|e| StudyDaoError::Persistence { source: Box::new(e) })?;
        rows.into_iter().next().map(row_to_session).transpose()
    }
}

fn id_of(row: &Value) -> Option<String> {
    match row.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn row_to_session(row: Value) -> Result<StoredSession, StudyDaoError> {
    let id = id_of(&row).ok_or_else(|| persistence("row without id"))?;
    let text = |key: &str| {
        row.get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_default()
    };
    Ok(StoredSession {
        id,
        user_id: text("user_id"),
        group_id: text("group_id"),
        notes: text("notes"),
        duration: row.get("duration").and_then(Value::as_u64).unwrap_or(0),
        timestamp: text("timestamp"),
        notes_digest: None,
    })
}

#[async_trait]
impl Adapter for RestSessionStore {
    fn name(&self) -> &str {
        "rest"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::SessionStore
    }

    async fn health_check(&self) -> Result<HealthStatus, StudyDaoError> {
        let result = self
            .client
            .get(self.table_url())
            .query(&[("select", "id"), ("limit", "1")])
            .send()
            .await;
        Ok(match result {
            Ok(r) if r.status().is_success() => HealthStatus::Healthy,
            Ok(r) => HealthStatus::Degraded(format!("table API returned {}", r.status())),
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }
}

#[async_trait]
impl SessionStore for RestSessionStore {
    async fn insert(&self, session: &NewStudySession) -> Result<String, StudyDaoError> {
        let body = json!([{
            "user_id": session.user_id,
            "group_id": session.group_id,
            "notes": session.notes,
            "duration": session.duration,
            "timestamp": session.timestamp.to_rfc3339(),
        }]);

        let response = self
            .client
            .post(self.table_url())
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await
            .map_err(|e| StudyDaoError::Persistence { source: Box::new(e) })?;

        let status = response.status();
        debug!(status = %status, table = %self.table, "insert response received");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "session insert rejected");
            return Err(persistence(format!("insert returned {status}: {body}")));
        }

        let rows: Vec<Value> = response
            .json()
            .await
            .map_err(|e| StudyDaoError::Persistence { source: Box::new(e) })?;
        rows.first()
            .and_then(id_of)
            .ok_or_else(|| persistence("insert returned no row id"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store(server: &MockServer) -> RestSessionStore {
        RestSessionStore::new(server.uri(), "anon-key".into(), "study_sessions".into()).unwrap()
    }

    fn session() -> NewStudySession {
        NewStudySession {
            user_id: "0xabc".into(),
            group_id: "0xdef".into(),
            notes: "reviewed gas optimization".into(),
            duration: 30,
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn insert_returns_numeric_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/study_sessions"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer anon-key"))
            .and(header("prefer", "return=representation"))
            .and(body_partial_json(json!([{"user_id": "0xabc", "duration": 30}])))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([{"id": 42}])))
            .mount(&server)
            .await;

        assert_eq!(store(&server).insert(&session()).await.unwrap(), "42");
    }

    #[tokio::test]
    async fn insert_returns_string_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!([{"id": "9f1c-uuid"}, {"id": 7}])),
            )
            .mount(&server)
            .await;

        assert_eq!(store(&server).insert(&session()).await.unwrap(), "9f1c-uuid");
    }

    #[tokio::test]
    async fn rejected_insert_is_persistence_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .mount(&server)
            .await;

        let err = store(&server).insert(&session()).await.unwrap_err();
        assert!(matches!(err, StudyDaoError::Persistence { .. }));
        assert!(err.to_string().contains("401") || format!("{err:?}").contains("401"));
    }

    #[tokio::test]
    async fn empty_representation_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
            .mount(&server)
            .await;

        assert!(store(&server).insert(&session()).await.is_err());
    }

    #[tokio::test]
    async fn fetch_by_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/study_sessions"))
            .and(query_param("id", "eq.5"))
            .and(query_param("select", "*"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": 5,
                "user_id": "0xabc",
                "group_id": "0xdef",
                "notes": "n",
                "duration": 25,
                "timestamp": "2026-01-01T00:00:00+00:00"
            }])))
            .mount(&server)
            .await;

        let row = store(&server).fetch("5").await.unwrap().unwrap();
        assert_eq!(row.id, "5");
        assert_eq!(row.duration, 25);
        assert_eq!(row.notes_digest, None);
    }

    #[tokio::test]
    async fn health_check_probes_one_row() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/study_sessions"))
            .and(query_param("select", "id"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let health = store(&server).health_check().await.unwrap();
        assert_eq!(health, HealthStatus::Healthy);
    }
}
