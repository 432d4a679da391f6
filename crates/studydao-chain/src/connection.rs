// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Explicit connection context passed to every ledger operation.
//!
//! A [`ChainConnection`] bundles the read transport, an optional [`Signer`]
//! for writes, and the [`ConfirmationPolicy`] used while waiting for
//! receipts. Nothing here is ambient: callers construct a connection (or take
//! one from the wallet snapshot) and hand it to the ledger.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use studydao_config::model::ChainConfig;
use studydao_core::{Address, ChainTransport, RpcError, StudyDaoError, TxHash};
use tracing::{debug, info, warn};

use crate::abi;

/// Wallet error code for a request the user rejected.
pub const USER_REJECTED: i64 = 4001;

/// How long to wait for a receipt and how often to ask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            poll_interval: Duration::from_secs(2),
        }
    }
}

impl ConfirmationPolicy {
    pub fn from_config(config: &ChainConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.confirmation_timeout_secs),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }
}

/// An account able to authorize writes, and the transport that signs for it.
#[derive(Clone)]
pub struct Signer {
    account: Address,
    transport: Arc<dyn ChainTransport>,
}

impl Signer {
    pub fn new(account: Address, transport: Arc<dyn ChainTransport>) -> Self {
        Self { account, transport }
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn transport(&self) -> &Arc<dyn ChainTransport> {
        &self.transport
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("account", &self.account)
            .field("transport", &self.transport.name())
            .finish()
    }
}

/// One event log entry from a transaction receipt.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReceiptLog {
    pub address: Address,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: String,
}

/// The receipt fields the ledger consumes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: TxHash,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub logs: Vec<ReceiptLog>,
}

impl TransactionReceipt {
    /// Post-Byzantium receipts carry `status`; `0x0` means the call reverted.
    pub fn succeeded(&self) -> bool {
        !matches!(self.status.as_deref(), Some("0x0") | Some("0x00"))
    }
}

/// Read transport, optional signer and confirmation policy.
#[derive(Clone)]
pub struct ChainConnection {
    reader: Arc<dyn ChainTransport>,
    signer: Option<Signer>,
    confirmation: ConfirmationPolicy,
}

impl std::fmt::Debug for ChainConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainConnection")
            .field("reader", &self.reader.name())
            .field("signer", &self.signer)
            .field("confirmation", &self.confirmation)
            .finish()
    }
}

impl ChainConnection {
    /// A connection that can read but not write.
    pub fn read_only(reader: Arc<dyn ChainTransport>) -> Self {
        Self {
            reader,
            signer: None,
            confirmation: ConfirmationPolicy::default(),
        }
    }

    pub fn with_signer(mut self, signer: Signer) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn with_confirmation(mut self, confirmation: ConfirmationPolicy) -> Self {
        self.confirmation = confirmation;
        self
    }

    pub fn signer(&self) -> Option<&Signer> {
        self.signer.as_ref()
    }

    pub fn has_signer(&self) -> bool {
        self.signer.is_some()
    }

    pub fn reader(&self) -> &Arc<dyn ChainTransport> {
        &self.reader
    }

    pub fn confirmation(&self) -> ConfirmationPolicy {
        self.confirmation
    }

    /// `eth_chainId` against the read transport.
    pub async fn chain_id(&self) -> Result<u64, StudyDaoError> {
        let value = self
            .reader
            .request("eth_chainId", json!([]))
            .await
            .map_err(|e| read_error("eth_chainId", e))?;
        parse_quantity(&value).ok_or_else(|| {
            StudyDaoError::chain_read(format!("eth_chainId returned {value}"))
        })
    }

    /// Executes a read-only `eth_call` and returns the raw return data.
    pub async fn call(&self, to: Address, data: &[u8]) -> Result<Vec<u8>, StudyDaoError> {
        let params = json!([{ "to": to.to_string(), "data": abi::to_hex(data) }, "latest"]);
        let value = self
            .reader
            .request("eth_call", params)
            .await
            .map_err(|e| read_error("eth_call", e))?;
        let hex = value
            .as_str()
            .ok_or_else(|| StudyDaoError::chain_read(format!("eth_call returned {value}")))?;
        let bytes = abi::from_hex(hex).map_err(|e| StudyDaoError::ChainRead {
            message: format!("eth_call returned invalid hex: {e}"),
            source: Some(Box::new(e)),
        })?;
        // A call to an address without code returns empty data.
        if bytes.is_empty() {
            return Err(StudyDaoError::chain_read(format!(
                "eth_call to {to} returned no data"
            )));
        }
        Ok(bytes)
    }

    /// Sends a transaction from the signer and waits for one confirmation.
    ///
    /// `what` names the operation in logs and errors. A receipt with status
    /// `0x0` is replayed as an `eth_call` to recover the revert reason.
    pub async fn send_and_confirm(
        &self,
        to: Address,
        data: Vec<u8>,
        what: &str,
    ) -> Result<TransactionReceipt, StudyDaoError> {
        let signer = self.signer.as_ref().ok_or_else(|| {
            StudyDaoError::chain_write(format!("{what}: no signer connected"))
        })?;
        let tx = json!({
            "from": signer.account.to_string(),
            "to": to.to_string(),
            "data": abi::to_hex(&data),
        });

        let value = signer
            .transport
            .request("eth_sendTransaction", json!([tx.clone()]))
            .await
            .map_err(|e| write_error(what, e))?;
        let hash: TxHash = value
            .as_str()
            .ok_or_else(|| {
                StudyDaoError::chain_write(format!("{what}: eth_sendTransaction returned {value}"))
            })?
            .parse()
            .map_err(|e: StudyDaoError| StudyDaoError::chain_write(format!("{what}: {e}")))?;
        info!(operation = what, tx = %hash, "transaction submitted");

        let receipt = self.wait_for_receipt(signer, hash, what).await?;
        if !receipt.succeeded() {
            let reason = self.replay_revert(signer, &tx, &receipt).await;
            warn!(operation = what, tx = %hash, reason = ?reason, "transaction reverted");
            return Err(StudyDaoError::ChainWrite {
                message: format!("{what} reverted in transaction {hash}"),
                revert_reason: reason,
                source: None,
            });
        }

        info!(
            operation = what,
            tx = %hash,
            block = receipt.block_number.as_deref().unwrap_or("pending"),
            "transaction confirmed"
        );
        Ok(receipt)
    }

    async fn wait_for_receipt(
        &self,
        signer: &Signer,
        hash: TxHash,
        what: &str,
    ) -> Result<TransactionReceipt, StudyDaoError> {
        let deadline = tokio::time::Instant::now() + self.confirmation.timeout;
        loop {
            let value = signer
                .transport
                .request("eth_getTransactionReceipt", json!([hash.to_string()]))
                .await
                .map_err(|e| write_error(what, e))?;
            if !value.is_null() {
                return serde_json::from_value(value).map_err(|e| StudyDaoError::ChainWrite {
                    message: format!("{what}: malformed receipt for {hash}"),
                    revert_reason: None,
                    source: Some(Box::new(e)),
                });
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(StudyDaoError::Timeout {
                    duration: self.confirmation.timeout,
                });
            }
            debug!(operation = what, tx = %hash, "receipt not yet available");
            tokio::time::sleep(self.confirmation.poll_interval).await;
        }
    }

    async fn replay_revert(
        &self,
        signer: &Signer,
        tx: &Value,
        receipt: &TransactionReceipt,
    ) -> Option<String> {
        let block = receipt
            .block_number
            .clone()
            .unwrap_or_else(|| "latest".to_string());
        match signer.transport.request("eth_call", json!([tx, block])).await {
            Ok(_) => None,
            Err(e) => revert_reason_of(&e),
        }
    }
}

/// Parses a `0x`-prefixed hex quantity.
pub fn parse_quantity(value: &Value) -> Option<u64> {
    let s = value.as_str()?;
    let digits = s.strip_prefix("0x").unwrap_or(s);
    if digits.is_empty() {
        return Some(0);
    }
    u64::from_str_radix(digits, 16).ok()
}

/// Extracts a revert reason from an RPC error, if the node reported one.
pub fn revert_reason_of(err: &RpcError) -> Option<String> {
    let RpcError::Remote { message, data, .. } = err else {
        return None;
    };
    let from_data = data
        .as_ref()
        .and_then(|d| match d {
            Value::String(s) => Some(s.as_str()),
            Value::Object(map) => map.get("data").and_then(Value::as_str),
            _ => None,
        })
        .and_then(|hex| abi::from_hex(hex).ok())
        .and_then(|bytes| abi::decode_revert_reason(&bytes));
    if from_data.is_some() {
        return from_data;
    }
    message
        .strip_prefix("execution reverted: ")
        .map(str::to_string)
}

pub(crate) fn read_error(what: &str, err: RpcError) -> StudyDaoError {
    let message = match revert_reason_of(&err) {
        Some(reason) => format!("{what} reverted: {reason}"),
        None => format!("{what} failed"),
    };
    StudyDaoError::ChainRead {
        message,
        source: Some(Box::new(err)),
    }
}

pub(crate) fn write_error(what: &str, err: RpcError) -> StudyDaoError {
    if err.code() == Some(USER_REJECTED) {
        return StudyDaoError::ChainWrite {
            message: format!("{what} rejected by wallet"),
            revert_reason: None,
            source: Some(Box::new(err)),
        };
    }
    StudyDaoError::ChainWrite {
        message: format!("{what} failed"),
        revert_reason: revert_reason_of(&err),
        source: Some(Box::new(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quantity_handles_prefix_and_empty() {
        assert_eq!(parse_quantity(&json!("0xaa36a7")), Some(11_155_111));
        assert_eq!(parse_quantity(&json!("0x")), Some(0));
        assert_eq!(parse_quantity(&json!(5)), None);
        assert_eq!(parse_quantity(&json!("0xzz")), None);
    }

    #[test]
    fn revert_reason_from_error_data() {
        let data = abi::to_hex(&abi::encode_revert_reason("Not a member"));
        let err = RpcError::Remote {
            code: 3,
            message: "execution reverted".into(),
            data: Some(json!(data)),
        };
        assert_eq!(revert_reason_of(&err).as_deref(), Some("Not a member"));
    }

    #[test]
    fn revert_reason_from_message() {
        let err = RpcError::Remote {
            code: -32000,
            message: "execution reverted: Group inactive".into(),
            data: None,
        };
        assert_eq!(revert_reason_of(&err).as_deref(), Some("Group inactive"));
        assert_eq!(revert_reason_of(&RpcError::Transport("down".into())), None);
    }

    #[test]
    fn user_rejection_maps_to_write_error() {
        let err = write_error(
            "joinGroup",
            RpcError::Remote {
                code: USER_REJECTED,
                message: "User denied transaction signature".into(),
                data: None,
            },
        );
        assert!(err.to_string().contains("rejected by wallet"));
        assert_eq!(err.revert_reason(), None);
    }

    #[test]
    fn receipt_status() {
        let receipt: TransactionReceipt = serde_json::from_value(json!({
            "transactionHash": format!("0x{}", "ab".repeat(32)),
            "blockNumber": "0x10",
            "status": "0x0",
            "logs": []
        }))
        .unwrap();
        assert!(!receipt.succeeded());
    }
}
