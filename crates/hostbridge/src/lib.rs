//! # hostbridge
//!
//! A bridge between a frontend execution context (e.g. a webview) and a
//! privileged host process.
//!
//! hostbridge carries two kinds of traffic over any channel that can move
//! text:
//! - Correlated calls: the frontend invokes named host methods and awaits
//!   their results
//! - Events: the host pushes named, uncorrelated notifications to frontend
//!   listeners
//!
//! ## Quick Start
//!
//! ```ignore
//! use hostbridge::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> BridgeResult<()> {
//!     let config = BridgeConfig::default();
//!     init_logging(&config);
//!
//!     let dispatcher = MethodDispatcher::from_config(&config);
//!     dispatcher
//!         .namespace("CustomAPI")
//!         .register_typed("echo", |_ctx, (message, number): (String, u32)| async move {
//!             hostbridge::anyhow::Ok(format!("Received message: {message} and number: {number}"))
//!         })?;
//!
//!     let (host, frontend, _link) = hostbridge::connect_in_memory(dispatcher, &config)?;
//!
//!     frontend.subscribe("pythonEvent", |payload| {
//!         println!("event: {payload}");
//!         Ok(())
//!     });
//!
//!     let reply: String = frontend
//!         .call_as("CustomAPI.echo", Params::positional([json!("Hello"), json!(42)]))
//!         .await?;
//!     host.emit("pythonEvent", json!({"message": reply})).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Crate Structure
//!
//! This is a facade crate that re-exports from:
//! - [`hostbridge_core`] - Error taxonomy and configuration
//! - [`hostbridge_transport`] - Envelopes, codec, and the transport boundary
//! - [`hostbridge_runtime`] - Correlator, dispatcher, event bus, endpoints
//! - [`hostbridge_logging`] - Tracing setup and log forwarding

use std::sync::Arc;

// Re-export core types
pub use hostbridge_core::{
    BridgeConfig, BridgeError, BridgeResult, ErrorDescriptor, ErrorKind, IdStrategy, LogLevel,
};

// Re-export wire types
pub use hostbridge_transport::{
    CallId, CallRequest, CallResponse, Codec, CodecError, Envelope, EnvelopeKind, EventMessage,
    JsonCodec, MemoryTransport, Outcome, Params, Transport, TransportError,
    rejection_value,
};

// Re-export endpoints
pub use hostbridge_runtime::{
    BridgeState, CallContext, CallCorrelator, ClosedSignal, DeliveryReport, EventPublisher,
    FnHandler, FrontendBridge, HostBridge, ListenerFault, MethodDispatcher, MethodHandler,
    Namespace, Subscription, SubscriptionRegistry,
};

// Re-export logging setup
pub use hostbridge_logging::{LogRecord, LogSink, LogSinkManager, ReloadHandle, init_logging};

// Re-export common dependencies that handler authors need
pub use anyhow;
pub use async_trait::async_trait;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;

/// Connect a host and a frontend over an in-process [`MemoryTransport`] pair
///
/// Returns both endpoints and the host end of the link; closing the link
/// closes both endpoints. Must be called from within a tokio runtime.
pub fn connect_in_memory(
    dispatcher: MethodDispatcher,
    config: &BridgeConfig,
) -> BridgeResult<(HostBridge, FrontendBridge, MemoryTransport)> {
    let (host_end, frontend_end) = MemoryTransport::pair();
    let host = HostBridge::new(Arc::new(host_end.clone()), Arc::new(dispatcher), config)?;
    let frontend = FrontendBridge::new(Arc::new(frontend_end), config);
    Ok((host, frontend, host_end))
}

/// Prelude module for convenient imports.
///
/// Use `use hostbridge::prelude::*;` to import commonly used types.
pub mod prelude {
    pub use crate::{
        BridgeConfig, BridgeError, BridgeResult, CallContext, ErrorDescriptor, ErrorKind,
        EventPublisher, FrontendBridge, HostBridge, LogLevel, MethodDispatcher, MethodHandler,
        Params, Subscription, Transport, async_trait, init_logging,
    };

    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{Value, json};
}
