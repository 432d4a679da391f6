// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter traits placed at every external collaborator seam.
//!
//! All adapters extend the [`Adapter`] base trait and use `#[async_trait]`
//! so they can be held as trait objects.

pub mod adapter;
pub mod assessor;
pub mod store;
pub mod transport;

pub use adapter::Adapter;
pub use assessor::QualityAssessor;
pub use store::SessionStore;
pub use transport::ChainTransport;
