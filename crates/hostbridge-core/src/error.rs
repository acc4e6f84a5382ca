//! Error types for hostbridge

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Result type alias for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Category of a bridge failure, shared by both sides of the wire
///
/// Each kind carries a default JSON-RPC style numeric code so that
/// responses stay readable by plain JSON-RPC 2.0 clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// A method name was registered twice
    DuplicateMethod,
    /// No handler is registered under the requested name
    MethodNotFound,
    /// Params could not be parsed into what the handler expects
    InvalidParams,
    /// The message was well-formed but not a valid request for this side
    InvalidRequest,
    /// The handler returned an error or panicked
    HandlerFailed,
    /// Wire data could not be decoded
    DecodeError,
    /// The channel terminated before the call was resolved
    BridgeClosed,
    /// No response arrived within the configured call timeout
    Timeout,
    /// The transport refused to carry a message
    Transport,
    /// Application-defined failure raised by a handler
    Application,
    /// Anything else
    Internal,
}

impl ErrorKind {
    /// Default numeric code used on the wire for this kind
    pub fn default_code(&self) -> i32 {
        match self {
            ErrorKind::DecodeError => -32700,
            ErrorKind::InvalidRequest => -32600,
            ErrorKind::MethodNotFound => -32601,
            ErrorKind::InvalidParams => -32602,
            ErrorKind::Internal => -32603,
            ErrorKind::HandlerFailed => -32000,
            ErrorKind::Application => -32000,
            ErrorKind::BridgeClosed => -32001,
            ErrorKind::Timeout => -32002,
            ErrorKind::DuplicateMethod => -32003,
            ErrorKind::Transport => -32004,
        }
    }

    /// Infer a kind from a bare JSON-RPC error code
    ///
    /// Used when a peer sends an error object without a `kind` field.
    /// Codes outside the reserved range are application errors.
    pub fn from_code(code: i32) -> Self {
        match code {
            -32700 => ErrorKind::DecodeError,
            -32600 => ErrorKind::InvalidRequest,
            -32601 => ErrorKind::MethodNotFound,
            -32602 => ErrorKind::InvalidParams,
            -32603 => ErrorKind::Internal,
            -32001 => ErrorKind::BridgeClosed,
            -32002 => ErrorKind::Timeout,
            -32003 => ErrorKind::DuplicateMethod,
            -32004 => ErrorKind::Transport,
            -32099..=-32000 => ErrorKind::HandlerFailed,
            _ => ErrorKind::Application,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::DuplicateMethod => "DuplicateMethod",
            ErrorKind::MethodNotFound => "MethodNotFound",
            ErrorKind::InvalidParams => "InvalidParams",
            ErrorKind::InvalidRequest => "InvalidRequest",
            ErrorKind::HandlerFailed => "HandlerFailed",
            ErrorKind::DecodeError => "DecodeError",
            ErrorKind::BridgeClosed => "BridgeClosed",
            ErrorKind::Timeout => "Timeout",
            ErrorKind::Transport => "Transport",
            ErrorKind::Application => "Application",
            ErrorKind::Internal => "Internal",
        };
        f.write_str(name)
    }
}

/// Error object carried by a failed call response
///
/// Handlers may return this directly (wrapped in `anyhow::Error`) to send an
/// application-specific failure with its own code and structured data.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireDescriptor")]
#[error("{message}")]
pub struct ErrorDescriptor {
    /// Error category
    pub kind: ErrorKind,

    /// Human-readable description
    pub message: String,

    /// Numeric code (defaults to the kind's code)
    pub code: i32,

    /// Optional structured detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ErrorDescriptor {
    /// Create a descriptor with the kind's default code
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: kind.default_code(),
            data: None,
        }
    }

    /// Create an application-defined error with a custom code
    pub fn application(code: i32, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Application, message).with_code(code)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(ErrorKind::MethodNotFound, format!("method not found: {method}"))
    }

    pub fn handler_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::HandlerFailed, message)
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParams, message)
    }

    /// Override the numeric code
    pub fn with_code(mut self, code: i32) -> Self {
        self.code = code;
        self
    }

    /// Attach structured detail
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Lenient input shape: either `kind` or `code` may be missing, not both
#[derive(Deserialize)]
struct WireDescriptor {
    #[serde(default)]
    kind: Option<ErrorKind>,
    message: String,
    #[serde(default)]
    code: Option<i32>,
    #[serde(default, deserialize_with = "present_value")]
    data: Option<serde_json::Value>,
}

/// `"data": null` stays `Some(Null)`; only a missing key is `None`
fn present_value<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<serde_json::Value>, D::Error> {
    serde_json::Value::deserialize(deserializer).map(Some)
}

impl TryFrom<WireDescriptor> for ErrorDescriptor {
    type Error = String;

    fn try_from(wire: WireDescriptor) -> Result<Self, Self::Error> {
        let (kind, code) = match (wire.kind, wire.code) {
            (Some(kind), Some(code)) => (kind, code),
            (Some(kind), None) => (kind, kind.default_code()),
            (None, Some(code)) => (ErrorKind::from_code(code), code),
            (None, None) => return Err("error object needs a kind or a code".to_string()),
        };
        Ok(Self {
            kind,
            message: wire.message,
            code,
            data: wire.data,
        })
    }
}

/// Error type for bridge operations
#[derive(Error, Debug)]
pub enum BridgeError {
    /// A handler is already registered under this name
    #[error("method already registered: {0}")]
    DuplicateMethod(String),

    /// Params did not match what the handler expects
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// Message was valid wire data but not acceptable here
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Malformed wire data
    #[error("decode error: {0}")]
    Decode(String),

    /// The channel terminated; pending and new calls are rejected
    #[error("bridge closed")]
    BridgeClosed,

    /// No response arrived within the configured timeout
    #[error("call timed out")]
    Timeout,

    /// The transport failed to carry a message
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote side answered the call with an error
    #[error("call rejected ({}): {}", .0.kind, .0.message)]
    Rejected(ErrorDescriptor),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    /// Taxonomy category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::DuplicateMethod(_) => ErrorKind::DuplicateMethod,
            BridgeError::InvalidParams(_) => ErrorKind::InvalidParams,
            BridgeError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            BridgeError::Decode(_) => ErrorKind::DecodeError,
            BridgeError::BridgeClosed => ErrorKind::BridgeClosed,
            BridgeError::Timeout => ErrorKind::Timeout,
            BridgeError::Transport(_) => ErrorKind::Transport,
            BridgeError::Rejected(descriptor) => descriptor.kind,
            BridgeError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Numeric code as it would appear on the wire
    pub fn code(&self) -> i32 {
        match self {
            BridgeError::Rejected(descriptor) => descriptor.code,
            other => other.kind().default_code(),
        }
    }

    /// Wire form of this error
    pub fn to_descriptor(&self) -> ErrorDescriptor {
        match self {
            BridgeError::Rejected(descriptor) => descriptor.clone(),
            BridgeError::DuplicateMethod(detail)
            | BridgeError::InvalidParams(detail)
            | BridgeError::InvalidRequest(detail)
            | BridgeError::Decode(detail)
            | BridgeError::Transport(detail)
            | BridgeError::Internal(detail) => ErrorDescriptor::new(self.kind(), detail.clone()),
            BridgeError::BridgeClosed | BridgeError::Timeout => {
                ErrorDescriptor::new(self.kind(), self.to_string())
            }
        }
    }

    /// The remote descriptor, if the peer rejected the call
    pub fn descriptor(&self) -> Option<&ErrorDescriptor> {
        match self {
            BridgeError::Rejected(descriptor) => Some(descriptor),
            _ => None,
        }
    }
}

impl From<ErrorDescriptor> for BridgeError {
    fn from(descriptor: ErrorDescriptor) -> Self {
        BridgeError::Rejected(descriptor)
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Decode(err.to_string())
    }
}


#[cfg(test)]
#[path = "error/error_parameterized_tests.rs"]
mod error_parameterized_tests;
