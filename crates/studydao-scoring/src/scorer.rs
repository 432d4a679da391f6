// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The [`QualityAssessor`] used by the submission workflow.

use async_trait::async_trait;
use tracing::{info, warn};

use studydao_config::model::ScoringConfig;
use studydao_core::types::QualityAssessment;
use studydao_core::{Adapter, AdapterType, HealthStatus, QualityAssessor, StudyDaoError};

use crate::client::ChatCompletionsClient;
use crate::heuristic;
use crate::verdict::RemoteVerdict;

/// Remote-first scorer with a heuristic fallback.
#[derive(Debug, Clone)]
pub struct QualityScorer {
    remote: Option<ChatCompletionsClient>,
}

impl QualityScorer {
    pub fn new(remote: Option<ChatCompletionsClient>) -> Self {
        Self { remote }
    }

    /// Scorer that never leaves the process.
    pub fn heuristic_only() -> Self {
        Self { remote: None }
    }

    pub fn from_config(config: &ScoringConfig) -> Result<Self, StudyDaoError> {
        Ok(Self::new(ChatCompletionsClient::from_config(config)?))
    }

    pub fn is_remote(&self) -> bool {
        self.remote.is_some()
    }
}

#[async_trait]
impl Adapter for QualityScorer {
    fn name(&self) -> &str {
        match &self.remote {
            Some(client) => client.model(),
            None => "heuristic",
        }
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::QualityAssessor
    }

    async fn health_check(&self) -> Result<HealthStatus, StudyDaoError> {
        Ok(match &self.remote {
            Some(_) => HealthStatus::Healthy,
            None => HealthStatus::Degraded("no scoring credential, heuristic only".into()),
        })
    }
}

#[async_trait]
impl QualityAssessor for QualityScorer {
    async fn assess(&self, notes: &str) -> QualityAssessment {
        let Some(client) = &self.remote else {
            warn!("no scoring credential configured, using heuristic analysis");
            let mut assessment = heuristic::assess(notes);
            assessment.degraded_reason = Some("scoring credential not configured".into());
            return assessment;
        };

        match client.analyze(notes).await {
            Ok(text) => {
                let verdict = RemoteVerdict::parse(&text);
                if matches!(verdict, RemoteVerdict::Unparsed { .. }) {
                    warn!(model = client.model(), "no score in model output, applying default policy");
                }
                let assessment = verdict.into_assessment(client.model());
                info!(
                    model = client.model(),
                    score = assessment.score,
                    label = %assessment.label,
                    "remote assessment complete"
                );
                assessment
            }
            Err(e) => {
                warn!(error = %e, "scoring service failed, falling back to heuristic analysis");
                let mut assessment = heuristic::assess(notes);
                assessment.degraded_reason = Some(e.to_string());
                assessment
            }
        }
    }
}
