// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for StudyDAO integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without a node, a wallet or a scoring
//! service.
//!
//! # Components
//!
//! - [`MockChain`] - In-memory node and wallet with the StudyDAO contracts
//! - [`MockSessionStore`] - Session store that records inserts or fails on demand
//! - [`MockAssessor`] - Assessor returning pre-configured verdicts
//! - [`TestHarness`] - Wires all of the above into a ready workflow

pub mod harness;
pub mod mock_assessor;
pub mod mock_chain;
pub mod mock_store;

pub use harness::TestHarness;
pub use mock_assessor::MockAssessor;
pub use mock_chain::{MockChain, MockGroup, MockMember, MockSession};
pub use mock_store::MockSessionStore;
