// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interpretation of free-form model output.

use std::sync::LazyLock;

use regex::Regex;
use studydao_core::types::{
    AssessmentDetails, AssessmentSource, QualityAssessment, QualityLabel,
};

/// Score assumed when the model answered but no `score` field could be found.
pub const UNPARSED_SCORE_POLICY: f64 = 0.85;

/// Scores strictly above this are labelled genuine.
pub const GENUINE_THRESHOLD: f64 = 0.6;

/// Characters of model output kept in the analysis text.
const ANALYSIS_PREVIEW_CHARS: usize = 150;

static SCORE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)score["']?\s*:\s*(\d+)"#).expect("score pattern is valid"));

/// What could be read out of a model answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteVerdict {
    /// A `score` field was found; `score` is already clamped to 0..=100.
    Parsed { score: u32, raw: String },
    /// The answer carried no recognizable score.
    Unparsed { raw: String },
}

impl RemoteVerdict {
    pub fn parse(raw: &str) -> Self {
        let captured = SCORE_PATTERN
            .captures(raw)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str());
        match captured {
            Some(digits) => {
                // Digit runs too long for u64 are far above the clamp anyway.
                let value = digits.parse::<u64>().unwrap_or(u64::MAX).min(100);
                Self::Parsed {
                    score: value as u32,
                    raw: raw.to_string(),
                }
            }
            None => Self::Unparsed {
                raw: raw.to_string(),
            },
        }
    }

    pub fn raw(&self) -> &str {
        match self {
            Self::Parsed { raw, .. } | Self::Unparsed { raw } => raw,
        }
    }

    /// Normalized score, applying [`UNPARSED_SCORE_POLICY`] when unparsed.
    pub fn normalized_score(&self) -> f64 {
        match self {
            Self::Parsed { score, .. } => f64::from(*score) / 100.0,
            Self::Unparsed { .. } => UNPARSED_SCORE_POLICY,
        }
    }

    pub fn into_assessment(self, model: &str) -> QualityAssessment {
        let score = self.normalized_score();
        let preview: String = self.raw().chars().take(ANALYSIS_PREVIEW_CHARS).collect();
        let parsed = matches!(self, Self::Parsed { .. });

        let mut details = AssessmentDetails {
            source: Some(short_model_name(model).to_string()),
            ..AssessmentDetails::default()
        };
        details
            .extra
            .insert("scoreParsed".to_string(), serde_json::Value::Bool(parsed));

        QualityAssessment {
            score,
            label: if score > GENUINE_THRESHOLD {
                QualityLabel::Genuine
            } else {
                QualityLabel::NeedsImprovement
            },
            analysis: format!("AI Verified ({model}): {preview}..."),
            details,
            source: AssessmentSource::Remote {
                model: model.to_string(),
            },
            degraded_reason: None,
        }
    }
}

/// `deepseek-ai/DeepSeek-V3.1` -> `DeepSeek-V3.1`.
fn short_model_name(model: &str) -> &str {
    model.rsplit('/').next().unwrap_or(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = "deepseek-ai/DeepSeek-V3.1";

    #[test]
    fn parses_json_style_score() {
        let v = RemoteVerdict::parse(r#"{"score": 82, "analysis": "solid notes"}"#);
        assert!(matches!(v, RemoteVerdict::Parsed { score: 82, .. }));
        assert_eq!(v.normalized_score(), 0.82);
    }

    #[test]
    fn parses_loose_score_case_insensitively() {
        assert!(matches!(
            RemoteVerdict::parse("Overall SCORE: 40 - thin"),
            RemoteVerdict::Parsed { score: 40, .. }
        ));
        assert!(matches!(
            RemoteVerdict::parse("{'score' : 7}"),
            RemoteVerdict::Parsed { score: 7, .. }
        ));
    }

    #[test]
    fn clamps_large_scores() {
        assert!(matches!(
            RemoteVerdict::parse("score: 250"),
            RemoteVerdict::Parsed { score: 100, .. }
        ));
        assert!(matches!(
            RemoteVerdict::parse("score: 99999999999999999999999"),
            RemoteVerdict::Parsed { score: 100, .. }
        ));
    }

    #[test]
    fn unparsed_uses_policy() {
        let v = RemoteVerdict::parse("These notes look thorough.");
        assert!(matches!(v, RemoteVerdict::Unparsed { .. }));
        let a = v.into_assessment(MODEL);
        assert_eq!(a.score, UNPARSED_SCORE_POLICY);
        assert_eq!(a.label, QualityLabel::Genuine);
        assert_eq!(a.details.extra["scoreParsed"], serde_json::Value::Bool(false));
    }

    #[test]
    fn low_remote_score_needs_improvement() {
        let a = RemoteVerdict::parse("score: 60").into_assessment(MODEL);
        assert_eq!(a.label, QualityLabel::NeedsImprovement);
        let a = RemoteVerdict::parse("score: 61").into_assessment(MODEL);
        assert_eq!(a.label, QualityLabel::Genuine);
    }

    #[test]
    fn analysis_is_truncated_preview() {
        let long = "x".repeat(400);
        let a = RemoteVerdict::parse(&long).into_assessment(MODEL);
        assert_eq!(
            a.analysis,
            format!("AI Verified ({MODEL}): {}...", "x".repeat(150))
        );
        assert_eq!(a.details.source.as_deref(), Some("DeepSeek-V3.1"));
        assert_eq!(
            a.source,
            AssessmentSource::Remote {
                model: MODEL.to_string()
            }
        );
    }
}
