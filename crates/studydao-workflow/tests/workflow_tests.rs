// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end submission runs against the in-memory chain.

use std::sync::Arc;

use studydao_chain::{ContractAddresses, Ledger};
use studydao_core::types::{AssessmentSource, Fingerprint, QualityLabel, WorkflowStage};
use studydao_core::StudyDaoError;
use studydao_scoring::QualityScorer;
use studydao_storage::SessionRecorder;
use studydao_test_utils::harness::{group_address, ACCOUNT};
use studydao_test_utils::{MockAssessor, MockSessionStore, TestHarness};
use studydao_workflow::{
    StudySessionWorkflow, SubmissionRequest, COMMITTED_MESSAGE, OFFCHAIN_MESSAGE,
};

const NOTES: &str = "valid study notes about solidity";

#[tokio::test]
async fn without_signer_the_run_succeeds_offchain() {
    let h = TestHarness::builder().build().await.unwrap();

    let result = h.submit(&h.read_only(), NOTES, 30).await.unwrap();

    assert!(result.success);
    assert!(result.ledger_commit_result.is_none());
    assert_eq!(result.duration_minutes, 30);
    assert_eq!(result.user_facing_message, OFFCHAIN_MESSAGE);
    assert!(!result.is_degraded());
    assert!(h.chain.sent_transactions().is_empty());

    let inserted = h.store.inserted().await;
    assert_eq!(inserted.len(), 1);
    assert_eq!(
        result.submission_fingerprint,
        Fingerprint::Stored(inserted[0].0.clone())
    );
    assert_eq!(inserted[0].1.notes, NOTES);
    assert_eq!(inserted[0].1.user_id, ACCOUNT.to_string());
    assert_eq!(inserted[0].1.group_id, group_address(0).to_string());
    assert_eq!(h.assessor.seen().await, vec![NOTES.to_string()]);
}

#[tokio::test]
async fn signed_run_commits_the_session() {
    let h = TestHarness::builder()
        .with_verdicts(vec![MockAssessor::verdict(0.82)])
        .build()
        .await
        .unwrap();

    let result = h.submit(&h.signed(), NOTES, 45).await.unwrap();

    assert!(result.success);
    assert_eq!(result.user_facing_message, COMMITTED_MESSAGE);
    assert_eq!(result.quality_assessment.score, 0.82);
    assert_eq!(result.quality_assessment.label, QualityLabel::Genuine);

    let commit = result.ledger_commit_result.expect("committed");
    assert_eq!(commit.session_index, 0);

    let stored = h
        .ledger
        .session(&h.read_only(), None, commit.session_index)
        .await
        .unwrap();
    assert_eq!(stored.member, ACCOUNT);
    assert_eq!(stored.duration, 45);
    assert_eq!(stored.submission_hash, result.submission_fingerprint.as_str());
    assert_eq!(stored.ai_analysis, result.quality_assessment.analysis);
}

#[tokio::test]
async fn session_index_counts_prior_submissions() {
    let h = TestHarness::builder().build().await.unwrap();
    let conn = h.signed();

    for expected in 0..3 {
        let result = h.submit(&conn, NOTES, 10).await.unwrap();
        assert_eq!(result.ledger_commit_result.unwrap().session_index, expected);
    }
}

#[tokio::test]
async fn reverted_commit_fails_the_run() {
    let h = TestHarness::builder().build().await.unwrap();
    h.chain.revert_writes("Not a member");

    let err = h.submit(&h.signed(), NOTES, 30).await.unwrap_err();

    assert!(matches!(err, StudyDaoError::ChainWrite { .. }));
    assert_eq!(err.revert_reason(), Some("Not a member"));
    // Stages before the commit still ran.
    assert_eq!(h.store.inserted().await.len(), 1);
    assert_eq!(h.assessor.seen().await.len(), 1);
}

#[tokio::test]
async fn failing_store_synthesizes_fingerprint() {
    let h = TestHarness::builder()
        .with_failing_store()
        .build()
        .await
        .unwrap();

    let result = h.submit(&h.signed(), NOTES, 30).await.unwrap();

    assert!(result.success);
    assert!(result.submission_fingerprint.is_synthesized());
    assert!(result.submission_fingerprint.as_str().starts_with("session_"));
    assert_eq!(result.degradations.len(), 1);
    assert_eq!(result.degradations[0].stage, WorkflowStage::Persisted);

    let stored = h.ledger.session(&h.read_only(), None, 0).await.unwrap();
    assert_eq!(stored.submission_hash, result.submission_fingerprint.as_str());
}

#[tokio::test]
async fn heuristic_scoring_is_reported_as_degraded() {
    let h = TestHarness::builder()
        .with_heuristic_scoring()
        .build()
        .await
        .unwrap();

    let result = h.submit(&h.read_only(), NOTES, 30).await.unwrap();

    assert!(result.success);
    assert_eq!(result.quality_assessment.source, AssessmentSource::Heuristic);
    assert_eq!(result.quality_assessment.label, QualityLabel::LowQuality);
    let stages: Vec<_> = result.degradations.iter().map(|d| d.stage).collect();
    assert_eq!(stages, vec![WorkflowStage::Scored]);
}

#[tokio::test]
async fn sqlite_backed_run_stores_the_notes() {
    let h = TestHarness::builder().with_sqlite().build().await.unwrap();

    let result = h.submit(&h.signed(), NOTES, 25).await.unwrap();

    assert!(matches!(result.submission_fingerprint, Fingerprint::Stored(_)));
    assert!(result.ledger_commit_result.is_some());
    assert!(h.store.inserted().await.is_empty());
}

#[tokio::test]
async fn explicit_group_is_used() {
    let h = TestHarness::builder().with_groups(3).build().await.unwrap();
    let request = SubmissionRequest {
        author: ACCOUNT.to_string(),
        group: Some(group_address(2)),
        notes: NOTES.into(),
        duration_minutes: 15,
    };

    h.workflow.execute(&request, &h.signed()).await.unwrap();

    assert_eq!(h.chain.group(group_address(2)).unwrap().sessions.len(), 1);
    assert!(h.chain.group(group_address(0)).unwrap().sessions.is_empty());
}

fn workflow_without_contracts(store: Arc<MockSessionStore>) -> StudySessionWorkflow {
    let addresses = ContractAddresses {
        token: None,
        study_group: None,
        factory: None,
    };
    StudySessionWorkflow::new(
        SessionRecorder::new(store),
        Arc::new(QualityScorer::heuristic_only()),
        Ledger::new(addresses),
    )
}

fn ungrouped_request() -> SubmissionRequest {
    SubmissionRequest {
        author: ACCOUNT.to_string(),
        group: None,
        notes: NOTES.into(),
        duration_minutes: 30,
    }
}

#[tokio::test]
async fn no_group_and_no_signer_still_succeeds() {
    let h = TestHarness::builder().build().await.unwrap();
    let store = Arc::new(MockSessionStore::new());
    let workflow = workflow_without_contracts(store.clone());

    let result = workflow
        .execute(&ungrouped_request(), &h.read_only())
        .await
        .unwrap();

    assert!(result.success);
    assert!(result.ledger_commit_result.is_none());
    assert_eq!(result.user_facing_message, OFFCHAIN_MESSAGE);
    let inserted = store.inserted().await;
    assert_eq!(inserted.len(), 1);
    assert_eq!(inserted[0].1.group_id, "");
}

#[tokio::test]
async fn no_group_with_signer_fails_at_commit() {
    let h = TestHarness::builder().build().await.unwrap();
    let store = Arc::new(MockSessionStore::new());
    let workflow = workflow_without_contracts(store.clone());

    let err = workflow
        .execute(&ungrouped_request(), &h.signed())
        .await
        .unwrap_err();

    assert!(matches!(err, StudyDaoError::Config(_)));
    // Persist ran before the commit stage needed the group.
    assert_eq!(store.inserted().await.len(), 1);
    assert!(h.chain.sent_transactions().is_empty());
}
