// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the StudyDAO client.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Top-level StudyDAO configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StudyDaoConfig {
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,

    /// Chain RPC and wallet settings.
    #[serde(default)]
    pub chain: ChainConfig,

    /// Deployed contract addresses.
    #[serde(default)]
    pub contracts: ContractsConfig,

    /// Remote quality scoring service settings.
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Session store settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Chain connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChainConfig {
    /// JSON-RPC endpoint used for reads.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// JSON-RPC endpoint that accepts `eth_sendTransaction` for the
    /// configured account. Defaults to `rpc_url` when unset.
    #[serde(default)]
    pub wallet_url: Option<String>,

    /// Account used for writes. `None` means read-only operation.
    #[serde(default)]
    pub account: Option<String>,

    /// Chain the client expects to be connected to.
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    /// Human-readable chain name used when asking a wallet to add the chain.
    #[serde(default = "default_chain_name")]
    pub chain_name: String,

    /// Block explorer base URL used when asking a wallet to add the chain.
    #[serde(default = "default_explorer_url")]
    pub explorer_url: String,

    /// How long to wait for a transaction receipt.
    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,

    /// Delay between receipt polls.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// HTTP timeout for a single RPC request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            wallet_url: None,
            account: None,
            chain_id: default_chain_id(),
            chain_name: default_chain_name(),
            explorer_url: default_explorer_url(),
            confirmation_timeout_secs: default_confirmation_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_rpc_url() -> String {
    "https://rpc.sepolia.org".to_string()
}

fn default_chain_id() -> u64 {
    11_155_111
}

fn default_chain_name() -> String {
    "Sepolia Testnet".to_string()
}

fn default_explorer_url() -> String {
    "https://sepolia.etherscan.io".to_string()
}

fn default_confirmation_timeout_secs() -> u64 {
    120
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Deployed contract addresses. Unset addresses disable the operations
/// that need them.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContractsConfig {
    /// Staking token (ERC-20, 18 decimals).
    #[serde(default)]
    pub token_address: Option<String>,

    /// Study group used when a command does not name one.
    #[serde(default)]
    pub study_group_address: Option<String>,

    /// Group registry / factory contract.
    #[serde(default)]
    pub factory_address: Option<String>,
}

/// Remote scoring service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    /// Bearer credential. `None` selects heuristic-only scoring.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier sent with each request.
    #[serde(default = "default_scoring_model")]
    pub model: String,

    /// Chat-completions endpoint.
    #[serde(default = "default_scoring_url")]
    pub base_url: String,

    /// Maximum tokens the model may generate.
    #[serde(default = "default_scoring_max_tokens")]
    pub max_tokens: u32,

    /// HTTP timeout for one scoring request.
    #[serde(default = "default_scoring_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_scoring_model(),
            base_url: default_scoring_url(),
            max_tokens: default_scoring_max_tokens(),
            timeout_secs: default_scoring_timeout_secs(),
        }
    }
}

fn default_scoring_model() -> String {
    "deepseek-ai/DeepSeek-V3.1".to_string()
}

fn default_scoring_url() -> String {
    "https://router.huggingface.co/v1/chat/completions".to_string()
}

fn default_scoring_max_tokens() -> u32 {
    150
}

fn default_scoring_timeout_secs() -> u64 {
    30
}

/// Which session store backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StorageBackend {
    /// Local SQLite database.
    #[default]
    Sqlite,
    /// Hosted PostgREST-compatible backend.
    Rest,
}

/// Session store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Base URL of the REST backend (e.g. `https://xyz.supabase.co`).
    #[serde(default)]
    pub rest_url: Option<String>,

    /// API key sent as `apikey` and bearer token to the REST backend.
    #[serde(default)]
    pub rest_api_key: Option<String>,

    /// Table receiving session inserts.
    #[serde(default = "default_table")]
    pub table: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            database_path: default_database_path(),
            rest_url: None,
            rest_api_key: None,
            table: default_table(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("studydao").join("studydao.db"))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| "studydao.db".to_string())
}

fn default_table() -> String {
    "study_sessions".to_string()
}
