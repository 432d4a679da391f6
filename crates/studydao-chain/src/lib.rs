// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ledger access layer for StudyDAO.
//!
//! Talks to the token, registry and study group contracts over JSON-RPC
//! through an explicit [`ChainConnection`]. The ABI codec and unit
//! conversions are implemented here; there is no ambient provider state.

pub mod abi;
pub mod connection;
pub mod contracts;
pub mod ledger;
pub mod rpc;
pub mod units;
pub mod wallet;

pub use connection::{ChainConnection, ConfirmationPolicy, ReceiptLog, Signer, TransactionReceipt};
pub use contracts::{AuthData, ContractAddresses};
pub use ledger::{Ledger, NewGroup, SessionSubmission};
pub use rpc::JsonRpcTransport;
pub use wallet::{ChainParams, ConnectionSnapshot, WalletConnector, WalletEvent};
