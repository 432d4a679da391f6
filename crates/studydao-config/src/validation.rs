// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use studydao_core::Address;

use crate::diagnostic::ConfigError;
use crate::model::{StorageBackend, StudyDaoConfig};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration, collecting every error (no fail-fast).
pub fn validate_config(config: &StudyDaoConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.log.level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "log.level must be one of {}, got `{}`",
            LOG_LEVELS.join(", "),
            config.log.level
        )));
    }

    check_url(&mut errors, "chain.rpc_url", &config.chain.rpc_url);
    if let Some(url) = &config.chain.wallet_url {
        check_url(&mut errors, "chain.wallet_url", url);
    }
    if config.chain.chain_id == 0 {
        errors.push(ConfigError::validation("chain.chain_id must be non-zero"));
    }
    if config.chain.poll_interval_ms == 0 {
        errors.push(ConfigError::validation("chain.poll_interval_ms must be non-zero"));
    }
    if config.chain.confirmation_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "chain.confirmation_timeout_secs must be non-zero",
        ));
    }
    check_address(&mut errors, "chain.account", config.chain.account.as_deref());

    check_address(
        &mut errors,
        "contracts.token_address",
        config.contracts.token_address.as_deref(),
    );
    check_address(
        &mut errors,
        "contracts.study_group_address",
        config.contracts.study_group_address.as_deref(),
    );
    check_address(
        &mut errors,
        "contracts.factory_address",
        config.contracts.factory_address.as_deref(),
    );

    check_url(&mut errors, "scoring.base_url", &config.scoring.base_url);
    if config.scoring.model.trim().is_empty() {
        errors.push(ConfigError::validation("scoring.model must not be empty"));
    }
    if config.scoring.max_tokens == 0 {
        errors.push(ConfigError::validation("scoring.max_tokens must be non-zero"));
    }

    match config.storage.backend {
        StorageBackend::Sqlite => {
            if config.storage.database_path.trim().is_empty() {
                errors.push(ConfigError::validation(
                    "storage.database_path must not be empty",
                ));
            }
        }
        StorageBackend::Rest => match &config.storage.rest_url {
            Some(url) => check_url(&mut errors, "storage.rest_url", url),
            None => errors.push(ConfigError::validation(
                "storage.rest_url is required when storage.backend = \"rest\"",
            )),
        },
    }
    if config.storage.table.trim().is_empty() {
        errors.push(ConfigError::validation("storage.table must not be empty"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ConfigError>, key: &str, value: &str) {
    let value = value.trim();
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        errors.push(ConfigError::validation(format!(
            "{key} must be an http(s) URL, got `{value}`"
        )));
    }
}

fn check_address(errors: &mut Vec<ConfigError>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        if let Err(e) = value.parse::<Address>() {
            errors.push(ConfigError::validation(format!("{key}: {e}")));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(config: &StudyDaoConfig) -> Vec<String> {
        validate_config(config)
            .unwrap_err()
            .iter()
            .map(|e| e.to_string())
            .collect()
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&StudyDaoConfig::default()).is_ok());
    }

    #[test]
    fn malformed_contract_address_fails() {
        let mut config = StudyDaoConfig::default();
        config.contracts.token_address = Some("0x1234".into());
        let msgs = messages(&config);
        assert!(msgs.iter().any(|m| m.contains("contracts.token_address")));
    }

    #[test]
    fn rest_backend_requires_url() {
        let mut config = StudyDaoConfig::default();
        config.storage.backend = StorageBackend::Rest;
        let msgs = messages(&config);
        assert!(msgs.iter().any(|m| m.contains("storage.rest_url")));
    }

    #[test]
    fn collects_every_error() {
        let mut config = StudyDaoConfig::default();
        config.chain.chain_id = 0;
        config.chain.rpc_url = "ws://node".into();
        config.log.level = "loud".into();
        assert_eq!(messages(&config).len(), 3);
    }
}
