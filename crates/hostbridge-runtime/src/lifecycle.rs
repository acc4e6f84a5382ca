//! Endpoint lifecycle
//!
//! A bridge endpoint starts [`BridgeState::Open`] and moves to
//! [`BridgeState::Closed`] exactly once, when its transport reports closure.

use tokio::sync::watch;

/// Endpoint state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// Transport is live; calls and events flow
    Open,
    /// Transport terminated; new calls are rejected
    Closed,
}

impl BridgeState {
    /// Check if the endpoint can still carry traffic
    pub fn is_open(&self) -> bool {
        matches!(self, BridgeState::Open)
    }
}

impl std::fmt::Display for BridgeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BridgeState::Open => write!(f, "Open"),
            BridgeState::Closed => write!(f, "Closed"),
        }
    }
}

/// Owner side of an endpoint's state
#[derive(Debug)]
pub struct Lifecycle {
    sender: watch::Sender<BridgeState>,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(BridgeState::Open);
        Self { sender }
    }

    /// Current state
    pub fn state(&self) -> BridgeState {
        *self.sender.borrow()
    }

    /// Move to `Closed`
    ///
    /// Returns `true` only for the call that performed the transition.
    pub fn close(&self) -> bool {
        self.sender.send_if_modified(|state| {
            if state.is_open() {
                *state = BridgeState::Closed;
                true
            } else {
                false
            }
        })
    }

    /// Watcher that can be awaited until the endpoint closes
    pub fn closed(&self) -> ClosedSignal {
        ClosedSignal {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable watcher for endpoint closure
#[derive(Debug, Clone)]
pub struct ClosedSignal {
    receiver: watch::Receiver<BridgeState>,
}

impl ClosedSignal {
    /// Check if the endpoint has closed (non-blocking)
    pub fn is_closed(&self) -> bool {
        !self.receiver.borrow().is_open()
    }

    /// Wait for the endpoint to close
    ///
    /// Returns immediately if already closed. Also returns if the endpoint
    /// itself is dropped.
    pub async fn wait(&mut self) {
        let _ = self.receiver.wait_for(|state| !state.is_open()).await;
    }
}

#[cfg(test)]
#[path = "lifecycle/lifecycle_tests.rs"]
mod lifecycle_tests;
