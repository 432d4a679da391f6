// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quality scoring client for StudyDAO.
//!
//! [`QualityScorer`] asks a chat-completions endpoint for a verdict on the
//! submitted notes and falls back to a local keyword/structure heuristic
//! whenever the remote path is unconfigured or fails. Scoring never returns
//! an error; fallbacks are reported through
//! [`QualityAssessment::degraded_reason`](studydao_core::types::QualityAssessment).

pub mod client;
pub mod heuristic;
pub mod scorer;
pub mod verdict;

pub use client::ChatCompletionsClient;
pub use scorer::QualityScorer;
pub use verdict::{RemoteVerdict, UNPARSED_SCORE_POLICY};
