// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for OpenAI-compatible chat-completions endpoints.
//!
//! Handles bearer authentication, request framing, and transient error
//! retry. The returned text is the first choice's message content, or the
//! raw response JSON when the response carries no choices.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use studydao_config::model::ScoringConfig;
use studydao_core::StudyDaoError;
use tracing::{debug, warn};

/// Fixed instructions sent as the system message.
pub const SYSTEM_PROMPT: &str = "You are an AI verifier for a Study DAO. Analyze the submitted study notes to determine if they represent a high-quality, genuine study session. Output a JSON object with 'score' (0-100) and a short 'analysis' summary. The notes should be relevant to blockchain, coding, or the stated subject.";

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client with a single retry on transient statuses.
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    client: reqwest::Client,
    model: String,
    base_url: String,
    max_tokens: u32,
    max_retries: u32,
    retry_delay: Duration,
}

impl ChatCompletionsClient {
    pub fn new(
        api_key: &str,
        model: String,
        base_url: String,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<Self, StudyDaoError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
                StudyDaoError::Config(format!("invalid API key header value: {e}"))
            })?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| StudyDaoError::ScoringService {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            model,
            base_url,
            max_tokens,
            max_retries: 1,
            retry_delay: Duration::from_secs(1),
        })
    }

    /// Builds a client from config, or `None` when no credential is set.
    pub fn from_config(config: &ScoringConfig) -> Result<Option<Self>, StudyDaoError> {
        let Some(key) = config.api_key.as_deref().filter(|k| !k.trim().is_empty()) else {
            return Ok(None);
        };
        Self::new(
            key,
            config.model.clone(),
            config.base_url.clone(),
            config.max_tokens,
            Duration::from_secs(config.timeout_secs),
        )
        .map(Some)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Overrides the endpoint URL (for testing with wiremock).
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Asks the model to analyze `notes` and returns its answer text.
    ///
    /// On transient errors (429, 500, 503), retries once after a delay.
    pub async fn analyze(&self, notes: &str) -> Result<String, StudyDaoError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!("Analyze these study notes:\n\n{notes}"),
                },
            ],
            max_tokens: self.max_tokens,
            stream: false,
        };

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying scoring request after transient error");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = self
                .client
                .post(&self.base_url)
                .json(&request)
                .send()
                .await
                .map_err(|e| StudyDaoError::ScoringService {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, model = %self.model, "scoring response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| StudyDaoError::ScoringService {
                    message: format!("failed to read response body: {e}"),
                    source: Some(Box::new(e)),
                })?;
                return extract_text(&body);
            }

            let body = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(StudyDaoError::ScoringService {
                    message: format!("scoring service returned {status}: {body}"),
                    source: None,
                });
                continue;
            }

            return Err(StudyDaoError::ScoringService {
                message: format!("scoring service returned {status}: {body}"),
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| StudyDaoError::ScoringService {
            message: "scoring request failed after retries".into(),
            source: None,
        }))
    }
}

fn extract_text(body: &str) -> Result<String, StudyDaoError> {
    let value: Value = serde_json::from_str(body).map_err(|e| StudyDaoError::ScoringService {
        message: format!("failed to parse scoring response: {e}"),
        source: Some(Box::new(e)),
    })?;
    let content = serde_json::from_value::<ChatResponse>(value.clone())
        .ok()
        .and_then(|r| r.choices.into_iter().next())
        .and_then(|c| c.message)
        .map(|m| m.content.unwrap_or_default());
    Ok(content.unwrap_or_else(|| value.to_string()))
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> ChatCompletionsClient {
        ChatCompletionsClient::new(
            "hf-test-token",
            "deepseek-ai/DeepSeek-V3.1".into(),
            format!("{}/v1/chat/completions", server.uri()),
            150,
            Duration::from_secs(5),
        )
        .unwrap()
        .with_retry_delay(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn sends_prompt_and_reads_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer hf-test-token"))
            .and(body_partial_json(json!({
                "model": "deepseek-ai/DeepSeek-V3.1",
                "max_tokens": 150,
                "stream": false,
                "messages": [
                    {"role": "system", "content": SYSTEM_PROMPT},
                    {"role": "user", "content": "Analyze these study notes:\n\nlearned gas optimization"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"score\": 77}"}}]
            })))
            .mount(&server)
            .await;

        let text = test_client(&server)
            .analyze("learned gas optimization")
            .await
            .unwrap();
        assert_eq!(text, "{\"score\": 77}");
    }

    #[tokio::test]
    async fn no_choices_returns_raw_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"generated": "ok"})))
            .mount(&server)
            .await;

        let text = test_client(&server).analyze("notes").await.unwrap();
        assert_eq!(text, r#"{"generated":"ok"}"#);
    }

    #[tokio::test]
    async fn retries_on_429() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "score: 90"}}]
            })))
            .mount(&server)
            .await;

        assert_eq!(test_client(&server).analyze("n").await.unwrap(), "score: 90");
    }

    #[tokio::test]
    async fn fails_on_400_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad model"))
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client(&server).analyze("n").await.unwrap_err();
        assert!(matches!(err, StudyDaoError::ScoringService { .. }));
    }

    #[tokio::test]
    async fn exhausts_retries_on_503() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        assert!(test_client(&server).analyze("n").await.is_err());
    }

    #[test]
    fn missing_credential_yields_no_client() {
        let mut config = ScoringConfig::default();
        config.api_key = None;
        assert!(ChatCompletionsClient::from_config(&config).unwrap().is_none());
        config.api_key = Some("  ".into());
        assert!(ChatCompletionsClient::from_config(&config).unwrap().is_none());
        config.api_key = Some("token".into());
        assert!(ChatCompletionsClient::from_config(&config).unwrap().is_some());
    }
}
