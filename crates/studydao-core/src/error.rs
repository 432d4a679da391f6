// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the StudyDAO client.

use thiserror::Error;

/// The primary error type used across all StudyDAO crates.
///
/// Only [`StudyDaoError::ChainWrite`] is allowed to escape the submission
/// workflow; persistence and scoring failures are absorbed into degraded
/// results by their owning components.
#[derive(Debug, Error)]
pub enum StudyDaoError {
    /// Configuration errors (invalid TOML, missing contract addresses, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Caller input rejected before any external call was made.
    #[error("invalid input: {0}")]
    Validation(String),

    /// A ledger read reverted or the node could not be reached.
    #[error("chain read failed: {message}")]
    ChainRead {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A ledger write reverted, was rejected by the wallet, or never confirmed.
    #[error(
        "chain write failed: {message}{}",
        .revert_reason.as_ref().map(|r| format!(" (reverted: {r})")).unwrap_or_default()
    )]
    ChainWrite {
        message: String,
        revert_reason: Option<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The remote scoring service failed or answered with a non-success status.
    #[error("scoring service error: {message}")]
    ScoringService {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The session store rejected or failed an insert.
    #[error("persistence error: {source}")]
    Persistence {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Wallet handshake or chain switching failed.
    #[error("wallet error: {message}")]
    Wallet { message: String, code: Option<i64> },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl StudyDaoError {
    /// Shorthand for a [`StudyDaoError::ChainRead`] without an underlying source.
    pub fn chain_read(message: impl Into<String>) -> Self {
        Self::ChainRead {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a [`StudyDaoError::ChainWrite`] without a revert reason.
    pub fn chain_write(message: impl Into<String>) -> Self {
        Self::ChainWrite {
            message: message.into(),
            revert_reason: None,
            source: None,
        }
    }

    /// Returns the revert reason carried by a chain write error, if any.
    pub fn revert_reason(&self) -> Option<&str> {
        match self {
            Self::ChainWrite { revert_reason, .. } => revert_reason.as_deref(),
            _ => None,
        }
    }
}

/// Errors raised by a JSON-RPC transport before ledger semantics are applied.
#[derive(Debug, Error)]
pub enum RpcError {
    /// The request never produced a JSON-RPC response (DNS, TCP, TLS, HTTP status).
    #[error("transport failure: {0}")]
    Transport(String),

    /// The node or wallet answered with a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Remote {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },

    /// The response could not be interpreted.
    #[error("malformed rpc response: {0}")]
    Malformed(String),
}

impl RpcError {
    /// The JSON-RPC error code, when the remote side produced one.
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Remote { code, .. } => Some(*code),
            _ => None,
        }
    }
}
