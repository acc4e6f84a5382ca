//! Runtime log level changes

use crate::LogSinkManager;
use hostbridge_core::LogLevel;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, Registry, reload};

/// Failures changing the active log level
#[derive(Error, Debug)]
pub enum LoggingError {
    /// [`init_logging`](crate::init_logging) has not installed a subscriber
    #[error("logging not initialized")]
    NotInitialized,

    /// The subscriber rejected the new filter
    #[error("failed to reload filter: {0}")]
    Reload(String),
}

/// Handle to the reloadable filter installed by [`init_logging`](crate::init_logging)
pub struct ReloadHandle {
    handle: Mutex<Option<reload::Handle<EnvFilter, Registry>>>,
}

impl ReloadHandle {
    pub fn new() -> Self {
        Self {
            handle: Mutex::new(None),
        }
    }

    pub fn global() -> &'static ReloadHandle {
        static INSTANCE: OnceCell<ReloadHandle> = OnceCell::new();
        INSTANCE.get_or_init(ReloadHandle::new)
    }

    pub(crate) fn set_handle(&self, handle: reload::Handle<EnvFilter, Registry>) {
        *self.handle.lock() = Some(handle);
    }

    pub fn is_initialized(&self) -> bool {
        self.handle.lock().is_some()
    }

    /// Switch both the console filter and the sink threshold to `level`
    pub fn reload_level(&self, level: LogLevel) -> Result<(), LoggingError> {
        let guard = self.handle.lock();
        let handle = guard.as_ref().ok_or(LoggingError::NotInitialized)?;
        handle
            .reload(EnvFilter::new(level.as_directive()))
            .map_err(|e| LoggingError::Reload(e.to_string()))?;
        LogSinkManager::global().set_level(level);
        tracing::debug!("log level changed to {}", level);
        Ok(())
    }
}

impl Default for ReloadHandle {
    fn default() -> Self {
        Self::new()
    }
}
