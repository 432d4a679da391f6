// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wallet connection handshake and connection snapshots.
//!
//! The connector owns no mutable connection state of its own: each wallet
//! event produces a fresh [`ConnectionSnapshot`] which replaces the previous
//! one in a `tokio::sync::watch` channel. Subscribers observe whole
//! snapshots, never partial updates.

use std::sync::Arc;

use serde_json::{json, Value};
use studydao_config::model::ChainConfig;
use studydao_core::{Address, ChainTransport, RpcError, StudyDaoError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::connection::{parse_quantity, ChainConnection, ConfirmationPolicy, Signer};

/// Wallet error code for a chain the wallet does not know yet.
pub const UNRECOGNIZED_CHAIN: i64 = 4902;

/// Immutable view of the wallet connection at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionSnapshot {
    pub account: Option<Address>,
    pub chain_id: Option<u64>,
}

/// Notifications a wallet pushes to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
    Disconnected,
}

impl ConnectionSnapshot {
    pub fn is_connected(&self) -> bool {
        self.account.is_some()
    }

    /// The snapshot that results from `event`. An empty account list
    /// disconnects.
    pub fn apply(&self, event: &WalletEvent) -> Self {
        match event {
            WalletEvent::AccountsChanged(accounts) => match accounts.first() {
                Some(account) => Self {
                    account: Some(*account),
                    chain_id: self.chain_id,
                },
                None => Self::default(),
            },
            WalletEvent::ChainChanged(chain_id) => Self {
                account: self.account,
                chain_id: Some(*chain_id),
            },
            WalletEvent::Disconnected => Self::default(),
        }
    }
}

/// Parameters for `wallet_addEthereumChain`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainParams {
    pub chain_id: u64,
    pub chain_name: String,
    pub rpc_url: String,
    pub explorer_url: String,
}

impl ChainParams {
    pub fn from_config(config: &ChainConfig) -> Self {
        Self {
            chain_id: config.chain_id,
            chain_name: config.chain_name.clone(),
            rpc_url: config.rpc_url.clone(),
            explorer_url: config.explorer_url.clone(),
        }
    }

    pub fn hex_chain_id(&self) -> String {
        format!("0x{:x}", self.chain_id)
    }

    fn add_chain_request(&self) -> Value {
        json!([{
            "chainId": self.hex_chain_id(),
            "chainName": self.chain_name,
            "nativeCurrency": { "name": "ETH", "symbol": "ETH", "decimals": 18 },
            "rpcUrls": [self.rpc_url],
            "blockExplorerUrls": [self.explorer_url],
        }])
    }
}

/// Drives the wallet handshake and publishes connection snapshots.
pub struct WalletConnector {
    wallet: Arc<dyn ChainTransport>,
    target: ChainParams,
    confirmation: ConfirmationPolicy,
    state: watch::Sender<ConnectionSnapshot>,
}

impl std::fmt::Debug for WalletConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletConnector")
            .field("wallet", &self.wallet.name())
            .field("target", &self.target)
            .field("snapshot", &*self.state.borrow())
            .finish()
    }
}

fn wallet_error(what: &str, err: RpcError) -> StudyDaoError {
    StudyDaoError::Wallet {
        message: format!("{what}: {err}"),
        code: err.code(),
    }
}

fn parse_accounts(value: &Value) -> Result<Vec<Address>, StudyDaoError> {
    let items = value.as_array().ok_or_else(|| StudyDaoError::Wallet {
        message: format!("expected an account list, got {value}"),
        code: None,
    })?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .ok_or_else(|| StudyDaoError::Wallet {
                    message: format!("account entry is not a string: {item}"),
                    code: None,
                })?
                .parse()
        })
        .collect()
}

impl WalletConnector {
    pub fn new(wallet: Arc<dyn ChainTransport>, target: ChainParams) -> Self {
        let (state, _) = watch::channel(ConnectionSnapshot::default());
        Self {
            wallet,
            target,
            confirmation: ConfirmationPolicy::default(),
            state,
        }
    }

    pub fn with_confirmation(mut self, confirmation: ConfirmationPolicy) -> Self {
        self.confirmation = confirmation;
        self
    }

    pub fn snapshot(&self) -> ConnectionSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionSnapshot> {
        self.state.subscribe()
    }

    fn publish(&self, next: ConnectionSnapshot) -> ConnectionSnapshot {
        self.state.send_replace(next.clone());
        next
    }

    async fn current_chain(&self) -> Result<u64, StudyDaoError> {
        let value = self
            .wallet
            .request("eth_chainId", json!([]))
            .await
            .map_err(|e| wallet_error("eth_chainId", e))?;
        parse_quantity(&value).ok_or_else(|| StudyDaoError::Wallet {
            message: format!("eth_chainId returned {value}"),
            code: None,
        })
    }

    /// Picks up an already-authorized account without prompting.
    /// Failures leave the snapshot disconnected.
    pub async fn check_connection(&self) -> ConnectionSnapshot {
        let accounts = match self.wallet.request("eth_accounts", json!([])).await {
            Ok(value) => parse_accounts(&value),
            Err(e) => Err(wallet_error("eth_accounts", e)),
        };
        let account = match accounts {
            Ok(list) => list.first().copied(),
            Err(e) => {
                warn!(error = %e, "error checking wallet connection");
                None
            }
        };
        let Some(account) = account else {
            return self.snapshot();
        };
        let chain_id = self.current_chain().await.ok();
        debug!(account = %account, chain_id = ?chain_id, "existing wallet connection found");
        self.publish(ConnectionSnapshot {
            account: Some(account),
            chain_id,
        })
    }

    /// Requests accounts and moves the wallet onto the target chain.
    pub async fn connect(&self) -> Result<ConnectionSnapshot, StudyDaoError> {
        let value = self
            .wallet
            .request("eth_requestAccounts", json!([]))
            .await
            .map_err(|e| wallet_error("eth_requestAccounts", e))?;
        let account = parse_accounts(&value)?
            .first()
            .copied()
            .ok_or_else(|| StudyDaoError::Wallet {
                message: "wallet returned no accounts".into(),
                code: None,
            })?;

        let mut chain_id = self.current_chain().await?;
        if chain_id != self.target.chain_id {
            warn!(
                current = chain_id,
                target = self.target.chain_id,
                "wallet on wrong network, switching"
            );
            self.switch_network().await?;
            chain_id = self.current_chain().await?;
        }

        info!(account = %account, chain_id, "wallet connected");
        Ok(self.publish(ConnectionSnapshot {
            account: Some(account),
            chain_id: Some(chain_id),
        }))
    }

    /// Switches to the target chain, registering it first if the wallet
    /// reports it as unknown.
    pub async fn switch_network(&self) -> Result<(), StudyDaoError> {
        let switch = self
            .wallet
            .request(
                "wallet_switchEthereumChain",
                json!([{ "chainId": self.target.hex_chain_id() }]),
            )
            .await;
        match switch {
            Ok(_) => Ok(()),
            Err(e) if e.code() == Some(UNRECOGNIZED_CHAIN) => {
                info!(chain = %self.target.chain_name, "chain unknown to wallet, adding it");
                self.wallet
                    .request("wallet_addEthereumChain", self.target.add_chain_request())
                    .await
                    .map(|_| ())
                    .map_err(|e| StudyDaoError::Wallet {
                        message: format!("failed to add network: {e}"),
                        code: e.code(),
                    })
            }
            Err(e) => Err(wallet_error("wallet_switchEthereumChain", e)),
        }
    }

    /// Applies a wallet event and publishes the resulting snapshot.
    pub fn handle_event(&self, event: &WalletEvent) -> ConnectionSnapshot {
        let next = self.snapshot().apply(event);
        debug!(event = ?event, connected = next.is_connected(), "wallet event");
        self.publish(next)
    }

    pub fn disconnect(&self) -> ConnectionSnapshot {
        self.handle_event(&WalletEvent::Disconnected)
    }

    /// A ledger connection for the current snapshot: read-only when no
    /// account is connected, otherwise signing through the wallet.
    pub fn connection(&self, reader: Arc<dyn ChainTransport>) -> ChainConnection {
        let conn = ChainConnection::read_only(reader).with_confirmation(self.confirmation);
        match self.snapshot().account {
            Some(account) => conn.with_signer(Signer::new(account, Arc::clone(&self.wallet))),
            None => conn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address([b; 20])
    }

    #[test]
    fn accounts_changed_replaces_account() {
        let snap = ConnectionSnapshot {
            account: Some(addr(1)),
            chain_id: Some(1),
        };
        let next = snap.apply(&WalletEvent::AccountsChanged(vec![addr(2), addr(3)]));
        assert_eq!(next.account, Some(addr(2)));
        assert_eq!(next.chain_id, Some(1));
        assert_eq!(snap.account, Some(addr(1)));
    }

    #[test]
    fn empty_accounts_disconnects() {
        let snap = ConnectionSnapshot {
            account: Some(addr(1)),
            chain_id: Some(11_155_111),
        };
        let next = snap.apply(&WalletEvent::AccountsChanged(Vec::new()));
        assert_eq!(next, ConnectionSnapshot::default());
        assert!(!next.is_connected());
    }

    #[test]
    fn chain_changed_keeps_account() {
        let snap = ConnectionSnapshot {
            account: Some(addr(9)),
            chain_id: Some(1),
        };
        let next = snap.apply(&WalletEvent::ChainChanged(11_155_111));
        assert_eq!(next.account, Some(addr(9)));
        assert_eq!(next.chain_id, Some(11_155_111));
    }

    #[test]
    fn add_chain_request_shape() {
        let params = ChainParams {
            chain_id: 11_155_111,
            chain_name: "Sepolia Testnet".into(),
            rpc_url: "https://rpc.sepolia.org".into(),
            explorer_url: "https://sepolia.etherscan.io".into(),
        };
        assert_eq!(params.hex_chain_id(), "0xaa36a7");
        let req = params.add_chain_request();
        assert_eq!(req[0]["chainId"], "0xaa36a7");
        assert_eq!(req[0]["nativeCurrency"]["decimals"], 18);
        assert_eq!(req[0]["rpcUrls"][0], "https://rpc.sepolia.org");
    }
}
