//! Log sink registration
//!
//! An embedding application can register one sink to receive every bridge
//! log record at or above a level, e.g. to mirror host logs into the
//! frontend console.

use hostbridge_core::LogLevel;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// A single forwarded log record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: LogLevel,
    /// Module path that emitted the record
    pub target: String,
    pub message: String,
}

/// Receiver of forwarded log records
pub type LogSink = Arc<dyn Fn(&LogRecord) + Send + Sync>;

static SINK_MANAGER: OnceCell<LogSinkManager> = OnceCell::new();

/// Holds the registered sink and the minimum forwarded level
pub struct LogSinkManager {
    sink: RwLock<Option<LogSink>>,
    level: AtomicU8,
}

impl LogSinkManager {
    pub fn new() -> Self {
        Self {
            sink: RwLock::new(None),
            level: AtomicU8::new(LogLevel::Info as u8),
        }
    }

    /// Process-wide manager used by [`SinkLayer::new`](crate::SinkLayer::new)
    pub fn global() -> &'static LogSinkManager {
        SINK_MANAGER.get_or_init(LogSinkManager::new)
    }

    /// Register or clear the sink
    pub fn set_sink(&self, sink: Option<LogSink>) {
        *self.sink.write() = sink;
    }

    pub fn has_sink(&self) -> bool {
        self.sink.read().is_some()
    }

    pub fn set_level(&self, level: LogLevel) {
        self.level.store(level as u8, Ordering::SeqCst);
    }

    pub fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.level.load(Ordering::SeqCst))
    }

    /// Check if records at `level` are forwarded
    ///
    /// Nothing is forwarded at [`LogLevel::Off`].
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::Off && level >= self.level()
    }

    /// Forward a record to the sink if one is set and the level is enabled
    pub fn log(&self, level: LogLevel, target: &str, message: &str) {
        if !self.is_enabled(level) {
            return;
        }

        // Cloned out so the sink may itself call set_sink
        let Some(sink) = self.sink.read().clone() else {
            return;
        };

        sink(&LogRecord {
            level,
            target: target.to_string(),
            message: message.to_string(),
        });
    }
}

impl Default for LogSinkManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "sink/sink_tests.rs"]
mod sink_tests;
