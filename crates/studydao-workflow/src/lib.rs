// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Study-session submission workflow.
//!
//! Sequences the session store, the quality scorer and the ledger into one
//! pipeline: `Started -> Persisted -> Scored -> Committed`. Persistence and
//! scoring degrade instead of failing; only the ledger commit can abort a
//! run, and its error reaches the caller unchanged.

pub mod workflow;

pub use workflow::{StudySessionWorkflow, SubmissionRequest, COMMITTED_MESSAGE, OFFCHAIN_MESSAGE};
