//! hostbridge-logging - Tracing setup and log forwarding
//!
//! This crate provides:
//! - [`init_logging`] installing a console subscriber configured from [`BridgeConfig`](hostbridge_core::BridgeConfig)
//! - [`SinkLayer`] forwarding records to a registered [`LogSink`]
//! - [`ReloadHandle`] for changing the level at runtime

mod layer;
mod reload;
mod sink;

pub use hostbridge_core::LogLevel;
pub use layer::{SinkLayer, init_logging};
pub use reload::{LoggingError, ReloadHandle};
pub use sink::{LogRecord, LogSink, LogSinkManager};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{LogLevel, LogRecord, LogSink, LogSinkManager, SinkLayer, init_logging};
}
