//! Transport adapter boundary
//!
//! The bridge core makes no assumption about the channel beyond these three
//! operations. An HTTP request/response pair, an injected webview binding, or
//! a persistent socket can all sit behind [`Transport`].

use async_trait::async_trait;
use hostbridge_core::BridgeError;
use std::sync::Arc;
use thiserror::Error;

/// Inbound path: invoked once per received wire message
pub type ReceiveCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Invoked once when the channel terminates
pub type CloseCallback = Arc<dyn Fn() + Send + Sync>;

/// Failures reported by a transport
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The channel has terminated
    #[error("transport closed")]
    Closed,

    /// The message could not be delivered
    #[error("delivery failed: {0}")]
    Delivery(String),
}

impl From<TransportError> for BridgeError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Closed => BridgeError::BridgeClosed,
            TransportError::Delivery(reason) => BridgeError::Transport(reason),
        }
    }
}

/// Channel carrying serialized envelopes between frontend and host
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Send one serialized envelope to the other side
    async fn send(&self, envelope: String) -> Result<(), TransportError>;

    /// Register the inbound message callback
    ///
    /// Registering again replaces the previous callback.
    fn on_receive(&self, callback: ReceiveCallback);

    /// Register a callback fired when the channel terminates
    ///
    /// Fires immediately if the channel is already closed.
    fn on_close(&self, callback: CloseCallback);
}
