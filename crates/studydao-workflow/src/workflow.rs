// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Arc;

use tracing::{info, warn};

use studydao_chain::{ChainConnection, Ledger, SessionSubmission};
use studydao_core::types::{Degradation, WorkflowResult, WorkflowStage};
use studydao_core::{Adapter, Address, QualityAssessor, StudyDaoError};
use studydao_storage::SessionRecorder;

/// Shown after a confirmed on-chain commit.
pub const COMMITTED_MESSAGE: &str =
    "Session recorded on blockchain! Rewards will be claimable after group deadline.";

/// Shown when no signer was available and the commit stage was skipped.
pub const OFFCHAIN_MESSAGE: &str =
    "Session saved and verified. Connect a wallet to record it on the blockchain.";

/// User input for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRequest {
    /// Submitter identity; normally the wallet address.
    pub author: String,
    /// Target group; the configured default group when `None`.
    pub group: Option<Address>,
    pub notes: String,
    pub duration_minutes: u64,
}

/// Persist, score, then commit one study session.
#[derive(Clone)]
pub struct StudySessionWorkflow {
    recorder: SessionRecorder,
    assessor: Arc<dyn QualityAssessor>,
    ledger: Ledger,
}

impl std::fmt::Debug for StudySessionWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudySessionWorkflow")
            .field("recorder", &self.recorder)
            .field("assessor", &self.assessor.name())
            .field("ledger", &self.ledger)
            .finish()
    }
}

impl StudySessionWorkflow {
    pub fn new(recorder: SessionRecorder, assessor: Arc<dyn QualityAssessor>, ledger: Ledger) -> Self {
        Self {
            recorder,
            assessor,
            ledger,
        }
    }

    /// Runs the pipeline.
    ///
    /// Returns a validation error before any stage runs when the notes are
    /// blank. Without a signer the commit stage is skipped and the result has
    /// no `ledger_commit_result`. With a signer, a failed commit (including an
    /// unresolvable group) is returned as the error and no result is
    /// produced.
    pub async fn execute(
        &self,
        request: &SubmissionRequest,
        conn: &ChainConnection,
    ) -> Result<WorkflowResult, StudyDaoError> {
        if request.notes.trim().is_empty() {
            return Err(StudyDaoError::Validation(
                "study notes must not be empty".into(),
            ));
        }
        // Only the commit needs a group; persisting records whatever is known.
        let group = request.group.or(self.ledger.addresses().study_group);
        let group_ref = group.map(|g| g.to_string()).unwrap_or_default();
        info!(
            stage = %WorkflowStage::Started,
            author = %request.author,
            group = %group_ref,
            duration = request.duration_minutes,
            "submission started"
        );

        let mut degradations = Vec::new();

        let persisted = self
            .recorder
            .persist(
                &request.author,
                &group_ref,
                &request.notes,
                request.duration_minutes,
            )
            .await;
        if let Some(reason) = persisted.degraded_reason {
            degradations.push(Degradation {
                stage: WorkflowStage::Persisted,
                reason,
            });
        }
        let fingerprint = persisted.fingerprint;
        info!(stage = %WorkflowStage::Persisted, fingerprint = %fingerprint, "notes persisted");

        let assessment = self.assessor.assess(&request.notes).await;
        if let Some(reason) = &assessment.degraded_reason {
            degradations.push(Degradation {
                stage: WorkflowStage::Scored,
                reason: reason.clone(),
            });
        }
        info!(
            stage = %WorkflowStage::Scored,
            score = assessment.score,
            label = %assessment.label,
            "notes scored"
        );

        if !conn.has_signer() {
            warn!("no signer connected, skipping on-chain commit");
            return Ok(WorkflowResult {
                success: true,
                submission_fingerprint: fingerprint,
                quality_assessment: assessment,
                duration_minutes: request.duration_minutes,
                ledger_commit_result: None,
                user_facing_message: OFFCHAIN_MESSAGE.to_string(),
                degradations,
            });
        }

        let group = self.ledger.addresses().group_or_default(group)?;
        let submission = SessionSubmission {
            duration: request.duration_minutes,
            fingerprint: fingerprint.as_str().to_string(),
            analysis: assessment.analysis.clone(),
        };
        let commit = self
            .ledger
            .submit_session(conn, &submission, Some(group))
            .await?;
        info!(
            stage = %WorkflowStage::Committed,
            tx = %commit.transaction_hash,
            session_index = commit.session_index,
            "session committed"
        );

        Ok(WorkflowResult {
            success: true,
            submission_fingerprint: fingerprint,
            quality_assessment: assessment,
            duration_minutes: request.duration_minutes,
            ledger_commit_result: Some(commit),
            user_facing_message: COMMITTED_MESSAGE.to_string(),
            degradations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Value;
    use studydao_chain::ContractAddresses;
    use studydao_core::types::{Fingerprint, NewStudySession, QualityLabel};
    use studydao_core::{AdapterType, ChainTransport, HealthStatus, RpcError, SessionStore};
    use studydao_scoring::QualityScorer;

    struct Unreachable;

    #[async_trait]
    impl Adapter for Unreachable {
        fn name(&self) -> &str {
            "unreachable"
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::ChainTransport
        }
        async fn health_check(&self) -> Result<HealthStatus, StudyDaoError> {
            Ok(HealthStatus::Unhealthy("offline".into()))
        }
    }

    #[async_trait]
    impl ChainTransport for Unreachable {
        async fn request(&self, method: &str, _: Value) -> Result<Value, RpcError> {
            Err(RpcError::Transport(format!("{method}: offline")))
        }
    }

    #[async_trait]
    impl SessionStore for Unreachable {
        async fn insert(&self, _: &NewStudySession) -> Result<String, StudyDaoError> {
            Err(StudyDaoError::Persistence {
                source: "store offline".into(),
            })
        }
    }

    fn workflow(group: Option<Address>) -> StudySessionWorkflow {
        let addresses = ContractAddresses {
            token: None,
            study_group: group,
            factory: None,
        };
        StudySessionWorkflow::new(
            SessionRecorder::new(Arc::new(Unreachable)),
            Arc::new(QualityScorer::heuristic_only()),
            Ledger::new(addresses),
        )
    }

    fn request(notes: &str) -> SubmissionRequest {
        SubmissionRequest {
            author: "0xabc".into(),
            group: None,
            notes: notes.into(),
            duration_minutes: 30,
        }
    }

    fn offline() -> ChainConnection {
        ChainConnection::read_only(Arc::new(Unreachable))
    }

    #[tokio::test]
    async fn blank_notes_are_rejected() {
        let wf = workflow(Some(Address([1; 20])));
        let err = wf.execute(&request("  \n\t "), &offline()).await.unwrap_err();
        assert!(matches!(err, StudyDaoError::Validation(_)));
    }

    #[tokio::test]
    async fn missing_group_still_succeeds_without_signer() {
        let wf = workflow(None);
        let result = wf
            .execute(&request("valid study notes about solidity"), &offline())
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.ledger_commit_result.is_none());
        assert_eq!(result.user_facing_message, OFFCHAIN_MESSAGE);
    }

    #[tokio::test]
    async fn every_fallback_is_reported() {
        let wf = workflow(Some(Address([1; 20])));
        let result = wf
            .execute(&request("valid study notes about solidity"), &offline())
            .await
            .unwrap();

        assert!(result.success);
        assert!(result.ledger_commit_result.is_none());
        assert!(result.submission_fingerprint.is_synthesized());
        assert!(matches!(result.submission_fingerprint, Fingerprint::Synthesized(ref f) if f.starts_with("session_")));
        assert_eq!(result.quality_assessment.label, QualityLabel::LowQuality);
        assert_eq!(result.user_facing_message, OFFCHAIN_MESSAGE);

        let stages: Vec<_> = result.degradations.iter().map(|d| d.stage).collect();
        assert_eq!(stages, vec![WorkflowStage::Persisted, WorkflowStage::Scored]);
        assert!(result.is_degraded());
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn skipped_commit_is_logged() {
        let wf = workflow(Some(Address([1; 20])));
        wf.execute(&request("notes"), &offline()).await.unwrap();
        assert!(logs_contain("skipping on-chain commit"));
        assert!(logs_contain("stage=persisted"));
    }
}
