// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock quality assessor with pre-configured verdicts.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use studydao_core::types::{
    AssessmentDetails, AssessmentSource, QualityAssessment, QualityLabel,
};
use studydao_core::{Adapter, AdapterType, HealthStatus, QualityAssessor, StudyDaoError};

/// An assessor that pops verdicts from a FIFO queue.
///
/// When the queue is empty, a fixed `0.9` genuine verdict is returned.
pub struct MockAssessor {
    verdicts: Mutex<VecDeque<QualityAssessment>>,
    seen: Mutex<Vec<String>>,
}

impl MockAssessor {
    pub fn new() -> Self {
        Self {
            verdicts: Mutex::new(VecDeque::new()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn with_verdicts(verdicts: Vec<QualityAssessment>) -> Self {
        Self {
            verdicts: Mutex::new(VecDeque::from(verdicts)),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// A remote-looking verdict with the given score.
    pub fn verdict(score: f64) -> QualityAssessment {
        QualityAssessment {
            score,
            label: if score > 0.6 {
                QualityLabel::Genuine
            } else {
                QualityLabel::NeedsImprovement
            },
            analysis: format!("AI Verified (mock-model): score {score}..."),
            details: AssessmentDetails {
                source: Some("mock-model".into()),
                ..AssessmentDetails::default()
            },
            source: AssessmentSource::Remote {
                model: "mock-model".into(),
            },
            degraded_reason: None,
        }
    }

    /// Notes passed to `assess`, in order.
    pub async fn seen(&self) -> Vec<String> {
        self.seen.lock().await.clone()
    }
}

impl Default for MockAssessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Adapter for MockAssessor {
    fn name(&self) -> &str {
        "mock-assessor"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::QualityAssessor
    }

    async fn health_check(&self) -> Result<HealthStatus, StudyDaoError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl QualityAssessor for MockAssessor {
    async fn assess(&self, notes: &str) -> QualityAssessment {
        self.seen.lock().await.push(notes.to_string());
        self.verdicts
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Self::verdict(0.9))
    }
}
