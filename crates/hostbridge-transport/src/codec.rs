//! Codec trait and JSON implementation

use crate::{CallId, Envelope};
use hostbridge_core::{BridgeConfig, BridgeError};
use thiserror::Error;

/// Errors that can occur during encoding/decoding
#[derive(Error, Debug, Clone)]
pub enum CodecError {
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// Request whose `params` is neither an array nor an object
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// Received wire text over the size limit
    #[error("incoming message of {size} bytes exceeds the {limit} byte limit")]
    InboundTooLarge { size: usize, limit: usize },

    /// Encoded envelope over the size limit; nothing was sent
    #[error("outgoing message of {size} bytes exceeds the {limit} byte limit")]
    OutboundTooLarge { size: usize, limit: usize },
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            CodecError::Deserialization(err.to_string())
        } else {
            CodecError::Serialization(err.to_string())
        }
    }
}

impl From<CodecError> for BridgeError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Serialization(_) => BridgeError::Internal(err.to_string()),
            CodecError::OutboundTooLarge { .. } => BridgeError::InvalidRequest(err.to_string()),
            CodecError::InvalidParams(detail) => BridgeError::InvalidParams(detail),
            CodecError::Deserialization(_)
            | CodecError::InvalidFormat(_)
            | CodecError::InboundTooLarge { .. } => {
                BridgeError::Decode(err.to_string())
            }
        }
    }
}

/// Converts envelopes to and from wire text
pub trait Codec: Send + Sync {
    /// Encode an envelope to wire text
    fn encode(&self, envelope: &Envelope) -> Result<String, CodecError>;

    /// Decode wire text to an envelope
    ///
    /// Malformed input yields an error, never a partial envelope.
    fn decode(&self, wire: &str) -> Result<Envelope, CodecError>;

    /// Correlation id of wire text that failed to decode, if one can be read
    fn recover_id(&self, wire: &str) -> Option<CallId> {
        let _ = wire;
        None
    }

    /// Get the content type for this codec
    fn content_type(&self) -> &'static str;
}

/// JSON codec implementation using serde_json
#[derive(Debug, Clone)]
pub struct JsonCodec {
    /// Whether to pretty-print output (default: false for efficiency)
    pretty: bool,
    /// Largest message accepted in either direction
    max_message_bytes: usize,
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonCodec {
    /// Create a new JSON codec with the default size limit
    pub fn new() -> Self {
        Self {
            pretty: false,
            max_message_bytes: BridgeConfig::default().max_message_bytes,
        }
    }

    /// Create a JSON codec that pretty-prints output
    pub fn pretty() -> Self {
        Self {
            pretty: true,
            ..Self::new()
        }
    }

    /// Create a codec honouring the configured size limit
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new().with_max_message_bytes(config.max_message_bytes)
    }

    /// Set the size limit
    pub fn with_max_message_bytes(mut self, limit: usize) -> Self {
        self.max_message_bytes = limit;
        self
    }

    pub fn max_message_bytes(&self) -> usize {
        self.max_message_bytes
    }

    fn exceeds_limit(&self, size: usize) -> bool {
        size > self.max_message_bytes
    }
}

impl Codec for JsonCodec {
    fn encode(&self, envelope: &Envelope) -> Result<String, CodecError> {
        let value = envelope.to_value();
        let wire = if self.pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        };
        if self.exceeds_limit(wire.len()) {
            return Err(CodecError::OutboundTooLarge {
                size: wire.len(),
                limit: self.max_message_bytes,
            });
        }
        Ok(wire)
    }

    fn decode(&self, wire: &str) -> Result<Envelope, CodecError> {
        if self.exceeds_limit(wire.len()) {
            return Err(CodecError::InboundTooLarge {
                size: wire.len(),
                limit: self.max_message_bytes,
            });
        }
        let value: serde_json::Value = serde_json::from_str(wire)?;
        Envelope::from_value(value)
    }

    fn recover_id(&self, wire: &str) -> Option<CallId> {
        if self.exceeds_limit(wire.len()) {
            return None;
        }
        let value: serde_json::Value = serde_json::from_str(wire).ok()?;
        CallId::recover(&value)
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }
}

#[cfg(test)]
#[path = "codec/codec_tests.rs"]
mod codec_tests;
