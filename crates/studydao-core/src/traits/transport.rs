// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport trait for the ledger collaborator (node RPC or wallet provider).

use async_trait::async_trait;

use crate::error::RpcError;
use crate::traits::adapter::Adapter;

/// A JSON-RPC endpoint speaking the Ethereum method set.
///
/// Read-only handles point at a node; write-capable handles point at a
/// wallet or node that holds the signing key and accepts
/// `eth_sendTransaction`. Ledger semantics (ABI, receipts, reverts) are
/// layered on top by `studydao-chain`.
#[async_trait]
pub trait ChainTransport: Adapter {
    /// Issues one JSON-RPC request and returns its `result` member.
    async fn request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, RpcError>;
}
