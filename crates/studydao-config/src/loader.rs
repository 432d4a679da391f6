// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./studydao.toml` > `~/.config/studydao/studydao.toml`
//! > `/etc/studydao/studydao.toml`, with `STUDYDAO_` environment overrides.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::StudyDaoConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/studydao/studydao.toml`
/// 3. `~/.config/studydao/studydao.toml`
/// 4. `./studydao.toml`
/// 5. `STUDYDAO_*` environment variables
pub fn load_config() -> Result<StudyDaoConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<StudyDaoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(StudyDaoConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<StudyDaoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(StudyDaoConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the layered Figment before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(StudyDaoConfig::default()))
        .merge(Toml::file("/etc/studydao/studydao.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("studydao/studydao.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("studydao.toml"))
        .merge(env_provider())
}

/// Environment provider mapping `STUDYDAO_<SECTION>_<KEY>` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because keys themselves
/// contain underscores: `STUDYDAO_CHAIN_RPC_URL` is `chain.rpc_url`.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("STUDYDAO_").map(|key| {
        let mapped = map_env_key(key.as_str());
        mapped.into()
    })
}

pub(crate) fn map_env_key(key: &str) -> String {
    const SECTIONS: [&str; 5] = ["log", "chain", "contracts", "scoring", "storage"];
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("CHAIN_RPC_URL"), "chain.rpc_url");
        assert_eq!(map_env_key("SCORING_API_KEY"), "scoring.api_key");
        assert_eq!(map_env_key("CONTRACTS_TOKEN_ADDRESS"), "contracts.token_address");
        assert_eq!(map_env_key("STORAGE_REST_API_KEY"), "storage.rest_api_key");
        assert_eq!(map_env_key("LOG_LEVEL"), "log.level");
        assert_eq!(map_env_key("UNKNOWN"), "unknown");
    }

    #[test]
    fn env_key_case_is_ignored() {
        assert_eq!(map_env_key("Chain_Rpc_Url"), "chain.rpc_url");
        assert_eq!(map_env_key("chain_rpc_url"), "chain.rpc_url");
    }
}
