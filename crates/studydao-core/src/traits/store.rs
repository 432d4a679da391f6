// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session store trait for durable submission records.

use async_trait::async_trait;

use crate::error::StudyDaoError;
use crate::traits::adapter::Adapter;
use crate::types::NewStudySession;

/// Durable record store for submitted study sessions.
///
/// Implementations surface failures; the fallback-fingerprint policy lives
/// in the recorder that wraps them.
#[async_trait]
pub trait SessionStore: Adapter {
    /// Inserts one record and returns the store-generated identifier.
    async fn insert(&self, session: &NewStudySession) -> Result<String, StudyDaoError>;
}
