#![allow(non_snake_case)]

use super::*;
use std::time::Duration;

// Lifecycle tests

#[test]
fn Lifecycle___new___starts_open() {
    let lifecycle = Lifecycle::new();

    assert_eq!(lifecycle.state(), BridgeState::Open);
}

#[test]
fn Lifecycle___close___transitions_once() {
    let lifecycle = Lifecycle::default();

    assert!(lifecycle.close());
    assert!(!lifecycle.close());
    assert_eq!(lifecycle.state(), BridgeState::Closed);
}

#[test]
fn Lifecycle___closed___signal_reflects_state() {
    let lifecycle = Lifecycle::new();
    let signal = lifecycle.closed();

    assert!(!signal.is_closed());
    lifecycle.close();
    assert!(signal.is_closed());
}

// ClosedSignal tests

#[tokio::test]
async fn ClosedSignal___wait___returns_immediately_when_already_closed() {
    let lifecycle = Lifecycle::new();
    lifecycle.close();
    let mut signal = lifecycle.closed();

    let result = tokio::time::timeout(Duration::from_millis(100), signal.wait()).await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn ClosedSignal___wait___completes_on_close() {
    let lifecycle = std::sync::Arc::new(Lifecycle::new());
    let mut signal = lifecycle.closed();
    let closer = lifecycle.clone();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        closer.close();
    });

    let result = tokio::time::timeout(Duration::from_secs(1), signal.wait()).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn ClosedSignal___clone___each_clone_observes_close() {
    let lifecycle = Lifecycle::new();
    let mut first = lifecycle.closed();
    let mut second = first.clone();

    lifecycle.close();

    first.wait().await;
    second.wait().await;
    assert!(first.is_closed() && second.is_closed());
}

// BridgeState tests

#[test]
fn BridgeState___display___names_state() {
    assert_eq!(BridgeState::Open.to_string(), "Open");
    assert_eq!(BridgeState::Closed.to_string(), "Closed");
}
