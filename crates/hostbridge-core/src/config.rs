//! Bridge configuration types

use crate::LogLevel;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the frontend side mints correlation ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// Monotonically increasing integers starting at 1
    #[default]
    Sequential,
    /// Random UUID v4 strings
    Random,
}

/// Configuration shared by host and frontend endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Initial log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Reject calls that see no response within this many milliseconds
    ///
    /// `None` waits until a response arrives or the bridge closes.
    #[serde(default)]
    pub call_timeout_ms: Option<u64>,

    /// Largest wire message accepted or produced, in bytes
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,

    /// Separator between an API namespace and a method name
    #[serde(default = "default_namespace_separator")]
    pub namespace_separator: String,

    /// Correlation id strategy for outgoing calls
    #[serde(default)]
    pub id_strategy: IdStrategy,

    /// Application-specific configuration data
    #[serde(default)]
    pub data: serde_json::Value,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_message_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_namespace_separator() -> String {
    ".".to_string()
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            call_timeout_ms: None,
            max_message_bytes: default_max_message_bytes(),
            namespace_separator: default_namespace_separator(),
            id_strategy: IdStrategy::default(),
            data: serde_json::Value::Null,
        }
    }
}

impl BridgeConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create configuration from JSON bytes (empty input yields defaults)
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_slice(bytes)
    }

    /// Set the call timeout
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Set the id strategy
    pub fn with_id_strategy(mut self, strategy: IdStrategy) -> Self {
        self.id_strategy = strategy;
        self
    }

    /// Set the maximum message size
    pub fn with_max_message_bytes(mut self, limit: usize) -> Self {
        self.max_message_bytes = limit;
        self
    }

    /// Call timeout as a [`Duration`]
    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }

    /// Parsed log level, falling back to `Info` for unknown names
    pub fn log_level(&self) -> LogLevel {
        LogLevel::parse(&self.log_level).unwrap_or(LogLevel::Info)
    }

    /// Get a typed value from the configuration data
    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.data.get(key).and_then(|v| T::deserialize(v).ok())
    }

    /// Set a value in the configuration data
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(value)?;
        match self.data.as_object_mut() {
            Some(map) => {
                map.insert(key.to_string(), value);
            }
            None => {
                let mut map = serde_json::Map::new();
                map.insert(key.to_string(), value);
                self.data = serde_json::Value::Object(map);
            }
        }
        Ok(())
    }
}
