// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quality assessor trait.

use async_trait::async_trait;

use crate::traits::adapter::Adapter;
use crate::types::QualityAssessment;

/// Produces a [`QualityAssessment`] for study notes.
///
/// Infallible by contract: implementations degrade internally instead of
/// returning errors.
#[async_trait]
pub trait QualityAssessor: Adapter {
    async fn assess(&self, notes: &str) -> QualityAssessment;
}
