// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end workflow testing.
//!
//! `TestHarness` deploys the token, registry and study groups on a
//! [`MockChain`], wires a [`StudySessionWorkflow`] to mock or temp-SQLite
//! storage, and hands out connections with or without a signer.

use std::sync::Arc;
use std::time::Duration;

use studydao_chain::{ChainConnection, ConfirmationPolicy, ContractAddresses, Ledger, Signer};
use studydao_core::types::{QualityAssessment, WorkflowResult};
use studydao_core::{Address, QualityAssessor, SessionStore, StudyDaoError};
use studydao_scoring::QualityScorer;
use studydao_storage::{SessionRecorder, SqliteSessionStore};
use studydao_workflow::{StudySessionWorkflow, SubmissionRequest};

use crate::mock_assessor::MockAssessor;
use crate::mock_chain::{MockChain, MockGroup};
use crate::mock_store::MockSessionStore;

/// Chain id the harness chain reports.
pub const CHAIN_ID: u64 = 11_155_111;
/// The connected wallet account.
pub const ACCOUNT: Address = Address([0xa1; 20]);
pub const TOKEN: Address = Address([0x70; 20]);
pub const FACTORY: Address = Address([0xfa; 20]);

/// Address of the `index`-th harness group.
pub fn group_address(index: u8) -> Address {
    Address([0x10 + index; 20])
}

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    groups: u8,
    verdicts: Vec<QualityAssessment>,
    heuristic: bool,
    failing_store: bool,
    sqlite: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            groups: 1,
            verdicts: Vec::new(),
            heuristic: false,
            failing_store: false,
            sqlite: false,
        }
    }

    /// Number of registered groups; group 0 is the default study group.
    pub fn with_groups(mut self, groups: u8) -> Self {
        self.groups = groups.max(1);
        self
    }

    /// Verdicts returned by the mock assessor, in order.
    pub fn with_verdicts(mut self, verdicts: Vec<QualityAssessment>) -> Self {
        self.verdicts = verdicts;
        self
    }

    /// Use the real scorer with no credential instead of the mock assessor.
    pub fn with_heuristic_scoring(mut self) -> Self {
        self.heuristic = true;
        self
    }

    /// Make every session-store insert fail.
    pub fn with_failing_store(mut self) -> Self {
        self.failing_store = true;
        self
    }

    /// Persist to a SQLite database in a temp directory.
    pub fn with_sqlite(mut self) -> Self {
        self.sqlite = true;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, StudyDaoError> {
        let chain = Arc::new(MockChain::new(CHAIN_ID));
        chain.set_accounts(vec![ACCOUNT]);
        chain.set_token(TOKEN);
        chain.set_factory(FACTORY);
        for i in 0..self.groups {
            chain.add_group(group_address(i), MockGroup::new(&format!("Group {i}")));
        }

        let mock_store = Arc::new(MockSessionStore::new());
        if self.failing_store {
            mock_store.fail();
        }
        let mut temp_dir = None;
        let store: Arc<dyn SessionStore> = if self.sqlite {
            let dir = tempfile::TempDir::new()
                .map_err(|e| StudyDaoError::Persistence { source: e.into() })?;
            let path = dir.path().join("test.db");
            let sqlite = SqliteSessionStore::open(&path.to_string_lossy()).await?;
            temp_dir = Some(dir);
            Arc::new(sqlite)
        } else {
            mock_store.clone()
        };

        let assessor = Arc::new(MockAssessor::with_verdicts(self.verdicts));
        let scorer: Arc<dyn QualityAssessor> = if self.heuristic {
            Arc::new(QualityScorer::heuristic_only())
        } else {
            assessor.clone()
        };

        let ledger = Ledger::new(ContractAddresses {
            token: Some(TOKEN),
            study_group: Some(group_address(0)),
            factory: Some(FACTORY),
        })
        .with_clock(|| 1_700_000_000_000);

        let workflow =
            StudySessionWorkflow::new(SessionRecorder::new(store), scorer, ledger.clone());

        Ok(TestHarness {
            chain,
            store: mock_store,
            assessor,
            ledger,
            workflow,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete mock environment.
pub struct TestHarness {
    pub chain: Arc<MockChain>,
    pub store: Arc<MockSessionStore>,
    pub assessor: Arc<MockAssessor>,
    pub ledger: Ledger,
    pub workflow: StudySessionWorkflow,
    _temp_dir: Option<tempfile::TempDir>,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    fn confirmation() -> ConfirmationPolicy {
        ConfirmationPolicy {
            timeout: Duration::from_secs(2),
            poll_interval: Duration::from_millis(1),
        }
    }

    /// A connection without a signer.
    pub fn read_only(&self) -> ChainConnection {
        ChainConnection::read_only(self.chain.clone()).with_confirmation(Self::confirmation())
    }

    /// A connection signing as [`ACCOUNT`].
    pub fn signed(&self) -> ChainConnection {
        self.read_only()
            .with_signer(Signer::new(ACCOUNT, self.chain.clone()))
    }

    /// Submits `notes` to the default group through the workflow.
    pub async fn submit(
        &self,
        conn: &ChainConnection,
        notes: &str,
        duration_minutes: u64,
    ) -> Result<WorkflowResult, StudyDaoError> {
        let request = SubmissionRequest {
            author: ACCOUNT.to_string(),
            group: None,
            notes: notes.to_string(),
            duration_minutes,
        };
        self.workflow.execute(&request, conn).await
    }
}
