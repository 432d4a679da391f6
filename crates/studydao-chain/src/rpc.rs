// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP JSON-RPC transport for nodes and wallet endpoints.
//!
//! Provides [`JsonRpcTransport`], which frames JSON-RPC 2.0 requests,
//! surfaces remote error objects unchanged, and retries once on transient
//! HTTP statuses (429, 500, 502, 503).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use studydao_core::{
    Adapter, AdapterType, ChainTransport, HealthStatus, RpcError, StudyDaoError,
};
use tracing::{debug, warn};

/// JSON-RPC 2.0 over HTTP POST.
#[derive(Debug)]
pub struct JsonRpcTransport {
    client: reqwest::Client,
    url: String,
    name: String,
    next_id: AtomicU64,
    max_retries: u32,
    retry_delay: Duration,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl JsonRpcTransport {
    /// Creates a transport for `url` with a per-request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, StudyDaoError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StudyDaoError::Config(format!("failed to build HTTP client: {e}")))?;
        let url = url.into();
        Ok(Self {
            client,
            name: format!("json-rpc({url})"),
            url,
            next_id: AtomicU64::new(1),
            max_retries: 1,
            retry_delay: Duration::from_secs(1),
        })
    }

    /// Overrides the delay between transient-error retries.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Adapter for JsonRpcTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ChainTransport
    }

    async fn health_check(&self) -> Result<HealthStatus, StudyDaoError> {
        match self.request("eth_chainId", json!([])).await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }
}

#[async_trait]
impl ChainTransport for JsonRpcTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(method, attempt, "retrying rpc request after transient error");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = self
                .client
                .post(&self.url)
                .json(&body)
                .send()
                .await
                .map_err(|e| RpcError::Transport(format!("{method}: {e}")))?;

            let status = response.status();
            debug!(method, id, status = %status, attempt, "rpc response received");

            if status.is_success() {
                let text = response
                    .text()
                    .await
                    .map_err(|e| RpcError::Transport(format!("{method}: {e}")))?;
                let parsed: RpcResponse = serde_json::from_str(&text)
                    .map_err(|e| RpcError::Malformed(format!("{method}: {e}")))?;
                if let Some(err) = parsed.error {
                    return Err(RpcError::Remote {
                        code: err.code,
                        message: err.message,
                        data: err.data,
                    });
                }
                return Ok(parsed.result.unwrap_or(Value::Null));
            }

            let body_text = response.text().await.unwrap_or_default();
            if is_transient_status(status) && attempt < self.max_retries {
                warn!(method, status = %status, "transient rpc status, will retry");
                continue;
            }
            return Err(RpcError::Transport(format!(
                "{method}: HTTP {status}: {body_text}"
            )));
        }

        Err(RpcError::Transport(format!("{method}: retries exhausted")))
    }
}

fn is_transient_status(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport(server: &MockServer) -> JsonRpcTransport {
        JsonRpcTransport::new(server.uri(), Duration::from_secs(5))
            .unwrap()
            .with_retry_delay(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn returns_result_member() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(body_partial_json(json!({"jsonrpc": "2.0", "method": "eth_chainId"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": "0xaa36a7"})),
            )
            .mount(&server)
            .await;

        let result = transport(&server).request("eth_chainId", json!([])).await.unwrap();
        assert_eq!(result, json!("0xaa36a7"));
    }

    #[tokio::test]
    async fn null_result_is_returned_as_null() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": null})),
            )
            .mount(&server)
            .await;

        let result = transport(&server)
            .request("eth_getTransactionReceipt", json!(["0x00"]))
            .await
            .unwrap();
        assert!(result.is_null());
    }

    #[tokio::test]
    async fn remote_error_object_is_preserved() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": {"code": 3, "message": "execution reverted: Not a member", "data": "0x08c379a0"}
            })))
            .mount(&server)
            .await;

        let err = transport(&server)
            .request("eth_call", json!([]))
            .await
            .unwrap_err();
        match err {
            RpcError::Remote { code, message, data } => {
                assert_eq!(code, 3);
                assert!(message.contains("Not a member"));
                assert_eq!(data, Some(json!("0x08c379a0")));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn retries_once_on_503() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": "0x1"})),
            )
            .mount(&server)
            .await;

        let result = transport(&server).request("eth_blockNumber", json!([])).await.unwrap();
        assert_eq!(result, json!("0x1"));
    }

    #[tokio::test]
    async fn non_transient_status_fails_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .expect(1)
            .mount(&server)
            .await;

        let err = transport(&server)
            .request("eth_blockNumber", json!([]))
            .await
            .unwrap_err();
        assert!(matches!(err, RpcError::Transport(ref m) if m.contains("401")), "got {err:?}");
    }
}
