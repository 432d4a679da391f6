// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the StudyDAO client.
//!
//! This crate provides the error taxonomy, the domain types exchanged between
//! the ledger, session store, scoring, and workflow crates, and the adapter
//! traits placed at every external seam.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{RpcError, StudyDaoError};
pub use types::{Address, AdapterType, HealthStatus, TxHash, Wei};

pub use traits::{Adapter, ChainTransport, QualityAssessor, SessionStore};
