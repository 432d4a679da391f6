// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local keyword and structure heuristic.
//!
//! Points: 30/20/10 for at least 200/100/50 words, 10 each for headers,
//! bullet points and code, 5 per vocabulary term (at most 30). The raw total
//! is clamped to 100 and divided by 100.

use studydao_core::types::{
    AssessmentDetails, AssessmentSource, QualityAssessment, QualityLabel,
};

/// Study vocabulary, matched case-insensitively as substrings.
pub const KEYWORDS: [&str; 15] = [
    "smart contract",
    "solidity",
    "blockchain",
    "ethereum",
    "gas",
    "security",
    "optimization",
    "learned",
    "study",
    "practice",
    "implement",
    "understand",
    "question",
    "review",
    "example",
];

const KEYWORD_POINTS: u32 = 5;
const KEYWORD_CAP: u32 = 30;
const STRUCTURE_POINTS: u32 = 10;

/// Raw scores strictly above this are labelled genuine.
pub const GENUINE_THRESHOLD: u32 = 60;

/// Observable features of a note text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signals {
    pub word_count: usize,
    pub has_headers: bool,
    pub has_bullets: bool,
    pub has_code: bool,
    pub keyword_matches: usize,
}

impl Signals {
    pub fn of(text: &str) -> Self {
        let lower = text.to_lowercase();
        Self {
            word_count: text.split_whitespace().count(),
            has_headers: text.contains('#'),
            has_bullets: text.contains("- ") || text.contains("* "),
            has_code: text.contains("```") || text.contains("function") || text.contains("contract"),
            keyword_matches: KEYWORDS.iter().filter(|k| lower.contains(*k)).count(),
        }
    }

    pub fn has_structure(&self) -> bool {
        self.has_headers || self.has_bullets
    }

    /// Unclamped point total.
    pub fn raw_score(&self) -> u32 {
        let length = match self.word_count {
            n if n >= 200 => 30,
            n if n >= 100 => 20,
            n if n >= 50 => 10,
            _ => 0,
        };
        let structure = [self.has_headers, self.has_bullets, self.has_code]
            .into_iter()
            .filter(|flag| *flag)
            .count() as u32
            * STRUCTURE_POINTS;
        let keywords = (self.keyword_matches as u32 * KEYWORD_POINTS).min(KEYWORD_CAP);
        length + structure + keywords
    }
}

/// Label for a raw heuristic score; the boundary is exclusive.
pub fn label_for_raw(raw: u32) -> QualityLabel {
    if raw > GENUINE_THRESHOLD {
        QualityLabel::Genuine
    } else {
        QualityLabel::LowQuality
    }
}

/// Scores `text` without any network access.
pub fn assess(text: &str) -> QualityAssessment {
    let signals = Signals::of(text);
    let raw = signals.raw_score().min(100);
    QualityAssessment {
        score: f64::from(raw) / 100.0,
        label: label_for_raw(raw),
        analysis: format!(
            "Heuristic Analysis: {raw}% confidence based on structure and keywords."
        ),
        details: AssessmentDetails {
            word_count: Some(signals.word_count),
            has_structure: Some(signals.has_structure()),
            has_code: Some(signals.has_code),
            source: Some("heuristic".to_string()),
            ..AssessmentDetails::default()
        },
        source: AssessmentSource::Heuristic,
        degraded_reason: None,
    }
}
