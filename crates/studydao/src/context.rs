// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring from configuration to ledger, store, scorer and workflow.

use std::sync::Arc;
use std::time::Duration;

use studydao_chain::{
    ChainConnection, ChainParams, ConfirmationPolicy, ContractAddresses, JsonRpcTransport, Ledger,
    WalletConnector, WalletEvent,
};
use studydao_config::model::StudyDaoConfig;
use studydao_core::{Address, ChainTransport, StudyDaoError};
use studydao_scoring::QualityScorer;
use studydao_storage::SessionRecorder;
use studydao_workflow::StudySessionWorkflow;
use tracing::{debug, info};

/// Shared handles built once per invocation.
pub struct AppContext {
    pub config: StudyDaoConfig,
    pub ledger: Ledger,
    reader: Arc<dyn ChainTransport>,
    wallet: Arc<dyn ChainTransport>,
    account: Option<Address>,
}

impl AppContext {
    pub fn from_config(config: StudyDaoConfig) -> Result<Self, StudyDaoError> {
        let timeout = Duration::from_secs(config.chain.request_timeout_secs);
        let reader: Arc<dyn ChainTransport> =
            Arc::new(JsonRpcTransport::new(config.chain.rpc_url.clone(), timeout)?);
        let wallet: Arc<dyn ChainTransport> = match &config.chain.wallet_url {
            Some(url) => Arc::new(JsonRpcTransport::new(url.clone(), timeout)?),
            None => Arc::clone(&reader),
        };
        let account = config
            .chain
            .account
            .as_deref()
            .map(str::parse::<Address>)
            .transpose()?;
        let ledger = Ledger::new(ContractAddresses::from_config(&config.contracts)?);
        Ok(Self {
            config,
            ledger,
            reader,
            wallet,
            account,
        })
    }

    pub fn reader(&self) -> &Arc<dyn ChainTransport> {
        &self.reader
    }

    fn confirmation(&self) -> ConfirmationPolicy {
        ConfirmationPolicy::from_config(&self.config.chain)
    }

    /// The configured account, or `explicit` when given.
    pub fn account_or(&self, explicit: Option<Address>) -> Result<Address, StudyDaoError> {
        explicit.or(self.account).ok_or_else(|| {
            StudyDaoError::Config("no account given and chain.account is not set".into())
        })
    }

    /// A connection without a signer.
    pub fn read_only(&self) -> ChainConnection {
        ChainConnection::read_only(Arc::clone(&self.reader)).with_confirmation(self.confirmation())
    }

    /// Runs the wallet handshake and returns a connection signing as the
    /// configured account.
    pub async fn signed(&self) -> Result<ChainConnection, StudyDaoError> {
        let account = self.account.ok_or_else(|| {
            StudyDaoError::Config("chain.account must be set for transactions".into())
        })?;
        let connector = WalletConnector::new(
            Arc::clone(&self.wallet),
            ChainParams::from_config(&self.config.chain),
        )
        .with_confirmation(self.confirmation());

        let snapshot = connector.connect().await?;
        if snapshot.account != Some(account) {
            debug!(
                wallet_default = ?snapshot.account.map(|a| a.to_string()),
                configured = %account,
                "selecting configured account"
            );
            connector.handle_event(&WalletEvent::AccountsChanged(vec![account]));
        }
        info!(account = %account, chain_id = ?snapshot.chain_id, "signer ready");
        Ok(connector.connection(Arc::clone(&self.reader)))
    }

    /// Assembles the submission workflow with the configured backends.
    pub async fn workflow(&self) -> Result<StudySessionWorkflow, StudyDaoError> {
        let store = studydao_storage::open_store(&self.config.storage).await?;
        let scorer = Arc::new(QualityScorer::from_config(&self.config.scoring)?);
        Ok(StudySessionWorkflow::new(
            SessionRecorder::new(store),
            scorer,
            self.ledger.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(toml: &str) -> StudyDaoConfig {
        studydao_config::load_and_validate_str(toml).expect("valid config")
    }

    #[test]
    fn account_parsed_from_config() {
        let ctx = AppContext::from_config(config(
            r#"
[chain]
account = "0xa1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1"
"#,
        ))
        .unwrap();
        assert_eq!(ctx.account_or(None).unwrap(), Address([0xa1; 20]));
        assert_eq!(
            ctx.account_or(Some(Address([2; 20]))).unwrap(),
            Address([2; 20])
        );
    }

    #[test]
    fn missing_account_is_a_config_error() {
        let ctx = AppContext::from_config(config("")).unwrap();
        assert!(matches!(
            ctx.account_or(None),
            Err(StudyDaoError::Config(_))
        ));
        assert!(!ctx.read_only().has_signer());
    }

    #[tokio::test]
    async fn signing_requires_an_account() {
        let ctx = AppContext::from_config(config("")).unwrap();
        assert!(matches!(ctx.signed().await, Err(StudyDaoError::Config(_))));
    }

    #[tokio::test]
    async fn workflow_opens_in_memory_store() {
        let ctx = AppContext::from_config(config(
            r#"
[storage]
database_path = ":memory:"
"#,
        ))
        .unwrap();
        assert!(ctx.workflow().await.is_ok());
    }
}
