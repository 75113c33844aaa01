//! Integration tests for signing, submission and balance polling

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use zklogin_client::{BalancePoller, LoginState};
use zklogin_core::{AccountRecord, SuiAddress};
use zklogin_crypto::address::ZKLOGIN_FLAG;

mod common;
use common::{Gate, MockLedger, MockProver, MockSalt, TestApp};

async fn logged_in(app: &TestApp, sub: &str) -> AccountRecord {
    match app.login(sub).await {
        LoginState::Completed(account) => account,
        other => panic!("login did not complete: {:?}", other),
    }
}

#[tokio::test]
async fn test_send_success() {
    let app = TestApp::signing();
    let account = logged_in(&app, "u1").await;
    let balance_calls = app.ledger.balance_calls();

    let result = app.ctx.send(&account.address).await;
    assert!(result.is_success(), "send failed: {:?}", result);
    assert_eq!(app.ledger.build_calls(), 1);
    assert_eq!(app.ledger.execute_calls(), 1);

    let signature = app.ledger.last_signature.lock().unwrap().clone().unwrap();
    let bytes = STANDARD.decode(signature).unwrap();
    assert_eq!(bytes[0], ZKLOGIN_FLAG);

    // balance refreshed after the send
    assert_eq!(app.ledger.balance_calls(), balance_calls + 1);
    assert!(app.ctx.status().borrow().is_none());
}

#[tokio::test]
async fn test_send_failure_is_not_retried() {
    let app = TestApp::signing();
    let account = logged_in(&app, "u1").await;
    let balance_calls = app.ledger.balance_calls();
    app.ledger.fail_execution("InsufficientGas");

    let result = app.ctx.send(&account.address).await;
    assert!(!result.is_success());
    assert!(result.error().unwrap().contains("InsufficientGas"));

    assert_eq!(app.ledger.execute_calls(), 1);
    assert_eq!(app.ledger.balance_calls(), balance_calls);
}

#[tokio::test]
async fn test_expired_epoch_rejected() {
    let app = TestApp::signing();
    let account = logged_in(&app, "u1").await;

    // still valid at max_epoch itself
    app.ledger.set_epoch(account.max_epoch);
    assert!(app.ctx.send(&account.address).await.is_success());

    app.ledger.set_epoch(account.max_epoch + 1);
    let result = app.ctx.send(&account.address).await;
    assert!(!result.is_success());
    assert!(result.error().unwrap().contains("expired"));
    assert_eq!(app.ledger.build_calls(), 1);
}

#[tokio::test]
async fn test_opaque_proof_fails_at_signing() {
    let app = TestApp::new();
    let account = logged_in(&app, "u1").await;

    let result = app.ctx.send(&account.address).await;
    assert!(!result.is_success());
    assert!(result.error().unwrap().contains("proof"));
    assert_eq!(app.ledger.execute_calls(), 0);
}

#[tokio::test]
async fn test_concurrent_send_rejected() {
    let gate = Arc::new(Gate::default());
    let app = TestApp::with(
        MockSalt::new("42"),
        MockProver::new(common::sample_proof()),
        MockLedger::gated(gate.clone()),
    );
    let account = logged_in(&app, "u1").await;

    let ctx = app.ctx.clone();
    let address = account.address;
    let first = tokio::spawn(async move { ctx.send(&address).await });

    gate.entered.notified().await;

    let second = app.ctx.send(&account.address).await;
    assert!(!second.is_success());
    assert!(second.error().unwrap().contains("in flight"));

    gate.release.notify_one();
    let first = first.await.unwrap();
    assert!(first.is_success(), "first send failed: {:?}", first);

    assert_eq!(app.ledger.build_calls(), 1);
    assert_eq!(app.ledger.execute_calls(), 1);

    // the guard is released once the first send finishes
    gate.release.notify_one();
    assert!(app.ctx.send(&account.address).await.is_success());
}

#[tokio::test]
async fn test_unknown_account() {
    let app = TestApp::signing();
    let result = app.ctx.send(&SuiAddress::from_bytes([7; 32])).await;
    assert!(result.error().unwrap().contains("unknown account"));
    assert_eq!(app.ledger.build_calls(), 0);
}

#[tokio::test]
async fn test_poll_once_skips_failures() {
    let app = TestApp::new();
    let good = logged_in(&app, "u1").await;
    let bad = logged_in(&app, "u2").await;
    app.ledger.failing_balances.lock().unwrap().insert(bad.address);

    let poller = BalancePoller::new(app.ledger.clone());
    let balances = poller.poll_once(&[good.clone(), bad.clone()]).await;

    assert_eq!(balances.get(&good.address), Some(&common::BALANCE));
    assert!(!balances.contains_key(&bad.address));
}

#[tokio::test]
async fn test_polling_task() {
    let app = TestApp::new();
    let account = logged_in(&app, "u1").await;
    let mut balances = app.ctx.balances();
    balances.borrow_and_update();

    let handle = app.ctx.start_polling();
    assert!(handle.is_running());

    handle.poll_now();
    tokio::time::timeout(Duration::from_secs(5), balances.changed())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        balances.borrow().get(&account.address).copied(),
        Some(common::BALANCE)
    );

    let calls = app.ledger.balance_calls();
    drop(handle);
    tokio::time::sleep(Duration::from_millis(50)).await;
    let after_drop = app.ledger.balance_calls();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(after_drop >= calls);
    assert_eq!(app.ledger.balance_calls(), after_drop);
}

#[tokio::test]
async fn test_poll_keeps_balance_of_account_saved_mid_poll() {
    let app = TestApp::new();
    let a = logged_in(&app, "u1").await;

    let gate = Arc::new(Gate::default());
    app.ledger.gate_balance(a.address, gate.clone());

    // the first tick reads [a] and blocks on a's balance
    let _handle = app.ctx.start_polling();
    tokio::time::timeout(Duration::from_secs(5), gate.entered.notified())
        .await
        .unwrap();

    // b logs in while the tick is still out
    let b = logged_in(&app, "u2").await;
    assert_eq!(
        app.ctx.balances().borrow().get(&b.address).copied(),
        Some(common::BALANCE)
    );

    let mut balances = app.ctx.balances();
    balances.borrow_and_update();
    gate.release.notify_one();
    tokio::time::timeout(Duration::from_secs(5), balances.changed())
        .await
        .unwrap()
        .unwrap();

    let after_tick = balances.borrow().clone();
    assert_eq!(after_tick.get(&a.address).copied(), Some(common::BALANCE));
    assert_eq!(after_tick.get(&b.address).copied(), Some(common::BALANCE));
}

#[tokio::test]
async fn test_poll_drops_cleared_accounts() {
    let app = TestApp::new();
    let a = logged_in(&app, "u1").await;
    assert!(app.ctx.balances().borrow().contains_key(&a.address));

    let gate = Arc::new(Gate::default());
    app.ledger.gate_balance(a.address, gate.clone());
    let _handle = app.ctx.start_polling();
    tokio::time::timeout(Duration::from_secs(5), gate.entered.notified())
        .await
        .unwrap();

    // the account disappears from the store while its query is out
    app.store.clear_all().await.unwrap();

    let mut balances = app.ctx.balances();
    balances.borrow_and_update();
    gate.release.notify_one();
    tokio::time::timeout(Duration::from_secs(5), balances.changed())
        .await
        .unwrap()
        .unwrap();
    assert!(balances.borrow().is_empty());
}

#[tokio::test]
async fn test_refresh_merges_balances() {
    let app = TestApp::new();
    let a = logged_in(&app, "u1").await;
    let b = logged_in(&app, "u2").await;

    let poller = BalancePoller::new(app.ledger.clone());
    poller.refresh(std::slice::from_ref(&a)).await;
    poller.refresh(std::slice::from_ref(&b)).await;

    let balances = poller.balances();
    assert_eq!(balances.len(), 2);

    poller.forget(&a.address);
    assert_eq!(poller.balances().len(), 1);
}
