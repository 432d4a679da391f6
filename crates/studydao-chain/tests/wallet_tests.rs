// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wallet handshake against the in-memory wallet.

use std::sync::Arc;

use studydao_chain::{ChainParams, ConnectionSnapshot, WalletConnector, WalletEvent};
use studydao_core::{Address, StudyDaoError};
use studydao_test_utils::MockChain;

const SEPOLIA: u64 = 11_155_111;
const ACCOUNT: Address = Address([0xa1; 20]);

fn sepolia() -> ChainParams {
    ChainParams {
        chain_id: SEPOLIA,
        chain_name: "Sepolia".into(),
        rpc_url: "https://rpc.sepolia.org".into(),
        explorer_url: "https://sepolia.etherscan.io".into(),
    }
}

fn wallet_with_account() -> Arc<MockChain> {
    let chain = Arc::new(MockChain::new(SEPOLIA));
    chain.set_accounts(vec![ACCOUNT]);
    chain
}

#[tokio::test]
async fn connect_on_target_chain() {
    let chain = wallet_with_account();
    let connector = WalletConnector::new(chain.clone(), sepolia());

    let snapshot = connector.connect().await.unwrap();
    assert_eq!(snapshot.account, Some(ACCOUNT));
    assert_eq!(snapshot.chain_id, Some(SEPOLIA));
    assert_eq!(chain.request_count("wallet_switchEthereumChain"), 0);
}

#[tokio::test]
async fn unknown_chain_is_added_then_used() {
    let chain = wallet_with_account();
    chain.move_wallet_to(1);
    let connector = WalletConnector::new(chain.clone(), sepolia());

    let snapshot = connector.connect().await.unwrap();
    assert_eq!(snapshot.chain_id, Some(SEPOLIA));
    assert_eq!(chain.request_count("wallet_switchEthereumChain"), 1);
    assert_eq!(chain.request_count("wallet_addEthereumChain"), 1);
}

#[tokio::test]
async fn connect_without_accounts_fails() {
    let chain = Arc::new(MockChain::new(SEPOLIA));
    let connector = WalletConnector::new(chain, sepolia());

    let err = connector.connect().await.unwrap_err();
    assert!(matches!(err, StudyDaoError::Wallet { .. }));
    assert!(!connector.snapshot().is_connected());
}

#[tokio::test]
async fn check_connection_is_silent_when_not_authorized() {
    let chain = Arc::new(MockChain::new(SEPOLIA));
    let connector = WalletConnector::new(chain.clone(), sepolia());

    let snapshot = connector.check_connection().await;
    assert_eq!(snapshot, ConnectionSnapshot::default());
    assert_eq!(chain.request_count("eth_requestAccounts"), 0);
}

#[tokio::test]
async fn subscribers_see_account_changes() {
    let chain = wallet_with_account();
    let connector = WalletConnector::new(chain.clone(), sepolia());
    let mut rx = connector.subscribe();

    connector.connect().await.unwrap();
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().account, Some(ACCOUNT));

    let other = Address([0xb2; 20]);
    connector.handle_event(&WalletEvent::AccountsChanged(vec![other]));
    rx.changed().await.unwrap();
    let snapshot = rx.borrow_and_update().clone();
    assert_eq!(snapshot.account, Some(other));
    assert_eq!(snapshot.chain_id, Some(SEPOLIA));

    connector.handle_event(&WalletEvent::AccountsChanged(Vec::new()));
    rx.changed().await.unwrap();
    assert!(!rx.borrow_and_update().is_connected());
}

#[tokio::test]
async fn connection_follows_snapshot() {
    let chain = wallet_with_account();
    let connector = WalletConnector::new(chain.clone(), sepolia());

    assert!(!connector.connection(chain.clone()).has_signer());

    connector.connect().await.unwrap();
    let conn = connector.connection(chain.clone());
    assert_eq!(conn.signer().map(|s| s.account()), Some(ACCOUNT));

    connector.disconnect();
    assert!(!connector.connection(chain).has_signer());
}
