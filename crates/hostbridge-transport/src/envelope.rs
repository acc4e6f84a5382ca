//! Wire envelopes
//!
//! The three envelope kinds are told apart from their decoded structure
//! alone: `id` + `method` is a request, `id` + exactly one of
//! `result`/`error` is a response, and a message without `id` carrying a
//! `topic` is an event.

use crate::CodecError;
use hostbridge_core::ErrorDescriptor;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::DeserializeOwned};
use serde_json::{Map, Value, json};

/// Protocol marker written on requests and responses
pub const JSONRPC_VERSION: &str = "2.0";

/// Correlation id linking a request to its response
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CallId {
    Number(u64),
    Text(String),
}

impl CallId {
    /// Read a valid `id` out of an undecodable message object
    pub fn recover(value: &Value) -> Option<Self> {
        let raw = value.as_object()?.get("id")?.clone();
        Self::from_value(raw).ok()
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::String(text) => Ok(CallId::Text(text)),
            Value::Number(number) => number.as_u64().map(CallId::Number).ok_or_else(|| {
                CodecError::InvalidFormat(format!(
                    "id must be a non-negative integer or a string, got {number}"
                ))
            }),
            other => Err(CodecError::InvalidFormat(format!(
                "id must be a non-negative integer or a string, got {other}"
            ))),
        }
    }
}

impl std::fmt::Display for CallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallId::Number(n) => write!(f, "{n}"),
            CallId::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<u64> for CallId {
    fn from(value: u64) -> Self {
        CallId::Number(value)
    }
}

impl From<String> for CallId {
    fn from(value: String) -> Self {
        CallId::Text(value)
    }
}

impl From<&str> for CallId {
    fn from(value: &str) -> Self {
        CallId::Text(value.to_string())
    }
}

/// Call arguments: an ordered list or a keyed mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Params {
    Positional(Vec<Value>),
    Named(Map<String, Value>),
}

impl Default for Params {
    fn default() -> Self {
        Params::Positional(Vec::new())
    }
}

impl Params {
    /// No arguments
    pub fn none() -> Self {
        Self::default()
    }

    /// Positional arguments
    pub fn positional(values: impl IntoIterator<Item = Value>) -> Self {
        Params::Positional(values.into_iter().collect())
    }

    /// Build params from any serializable value
    ///
    /// Arrays become positional arguments, objects become named arguments,
    /// and any other value becomes a single positional argument.
    pub fn from_typed<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(match serde_json::to_value(value)? {
            Value::Array(values) => Params::Positional(values),
            Value::Object(map) => Params::Named(map),
            Value::Null => Params::none(),
            scalar => Params::Positional(vec![scalar]),
        })
    }

    /// Deserialize the params into a typed value
    ///
    /// Positional params map onto tuples and sequences, named params onto
    /// structs. A single positional argument is also accepted as the value
    /// itself, so `["hi"]` parses as `String`.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        match self {
            Params::Named(map) => T::deserialize(&Value::Object(map.clone())),
            Params::Positional(values) => {
                let whole = Value::Array(values.clone());
                match T::deserialize(&whole) {
                    Ok(parsed) => Ok(parsed),
                    Err(err) => match values.as_slice() {
                        [single] => T::deserialize(single).map_err(|_| err),
                        _ => Err(err),
                    },
                }
            }
        }
    }

    /// Number of arguments
    pub fn len(&self) -> usize {
        match self {
            Params::Positional(values) => values.len(),
            Params::Named(map) => map.len(),
        }
    }

    /// Whether there are no arguments
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Positional argument at `index`
    pub fn get(&self, index: usize) -> Option<&Value> {
        match self {
            Params::Positional(values) => values.get(index),
            Params::Named(_) => None,
        }
    }

    /// Named argument `key`
    pub fn get_named(&self, key: &str) -> Option<&Value> {
        match self {
            Params::Named(map) => map.get(key),
            Params::Positional(_) => None,
        }
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Array(values) => Ok(Params::Positional(values)),
            Value::Object(map) => Ok(Params::Named(map)),
            other => Err(CodecError::InvalidParams(format!(
                "params must be an array or object, got {other}"
            ))),
        }
    }
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        Params::Positional(values)
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Params::Named(map)
    }
}

/// A call issued by the frontend
#[derive(Debug, Clone, PartialEq)]
pub struct CallRequest {
    pub id: CallId,
    pub method: String,
    pub params: Params,
}

impl CallRequest {
    pub fn new(id: impl Into<CallId>, method: impl Into<String>, params: Params) -> Self {
        Self {
            id: id.into(),
            method: method.into(),
            params,
        }
    }
}

/// Exactly one of result or error
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Result(Value),
    Error(ErrorDescriptor),
}

/// The host's answer to a [`CallRequest`]
#[derive(Debug, Clone, PartialEq)]
pub struct CallResponse {
    pub id: CallId,
    pub outcome: Outcome,
}

impl CallResponse {
    /// Successful response
    pub fn success(id: CallId, result: Value) -> Self {
        Self {
            id,
            outcome: Outcome::Result(result),
        }
    }

    /// Failed response
    pub fn failure(id: CallId, error: ErrorDescriptor) -> Self {
        Self {
            id,
            outcome: Outcome::Error(error),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Result(_))
    }

    /// The error descriptor, if this response is a failure
    pub fn error(&self) -> Option<&ErrorDescriptor> {
        match &self.outcome {
            Outcome::Error(descriptor) => Some(descriptor),
            Outcome::Result(_) => None,
        }
    }

    /// Consume the response into its outcome
    pub fn into_result(self) -> Result<Value, ErrorDescriptor> {
        match self.outcome {
            Outcome::Result(value) => Ok(value),
            Outcome::Error(descriptor) => Err(descriptor),
        }
    }
}

/// Host-originated push notification, uncorrelated to any call
#[derive(Debug, Clone, PartialEq)]
pub struct EventMessage {
    pub topic: String,
    pub payload: Value,
}

impl EventMessage {
    pub fn new(topic: impl Into<String>, payload: Value) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }

    /// Create from a topic and serializable payload
    pub fn from_typed<T: Serialize>(
        topic: impl Into<String>,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(topic, serde_json::to_value(payload)?))
    }

    /// Deserialize the payload to a typed value
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.payload)
    }
}

/// Discriminant of an [`Envelope`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeKind {
    Request,
    Response,
    Event,
}

impl std::fmt::Display for EnvelopeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnvelopeKind::Request => write!(f, "request"),
            EnvelopeKind::Response => write!(f, "response"),
            EnvelopeKind::Event => write!(f, "event"),
        }
    }
}

/// A single unit of bridge traffic
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Request(CallRequest),
    Response(CallResponse),
    Event(EventMessage),
}

impl Envelope {
    pub fn kind(&self) -> EnvelopeKind {
        match self {
            Envelope::Request(_) => EnvelopeKind::Request,
            Envelope::Response(_) => EnvelopeKind::Response,
            Envelope::Event(_) => EnvelopeKind::Event,
        }
    }

    /// Correlation id, absent for events
    pub fn id(&self) -> Option<&CallId> {
        match self {
            Envelope::Request(request) => Some(&request.id),
            Envelope::Response(response) => Some(&response.id),
            Envelope::Event(_) => None,
        }
    }

    /// Wire structure as a JSON value
    pub fn to_value(&self) -> Value {
        match self {
            Envelope::Request(request) => json!({
                "jsonrpc": JSONRPC_VERSION,
                "id": request.id,
                "method": request.method,
                "params": request.params,
            }),
            Envelope::Response(CallResponse {
                id,
                outcome: Outcome::Result(result),
            }) => json!({
                "jsonrpc": JSONRPC_VERSION,
                "id": id,
                "result": result,
            }),
            Envelope::Response(CallResponse {
                id,
                outcome: Outcome::Error(error),
            }) => json!({
                "jsonrpc": JSONRPC_VERSION,
                "id": id,
                "error": error,
            }),
            Envelope::Event(event) => json!({
                "topic": event.topic,
                "payload": event.payload,
            }),
        }
    }

    /// Classify and validate a decoded JSON value
    pub fn from_value(value: Value) -> Result<Self, CodecError> {
        let Value::Object(mut map) = value else {
            return Err(CodecError::InvalidFormat(
                "envelope must be a JSON object".to_string(),
            ));
        };

        if let Some(version) = map.remove("jsonrpc")
            && version.as_str() != Some(JSONRPC_VERSION)
        {
            return Err(CodecError::InvalidFormat(format!(
                "unsupported jsonrpc version {version}"
            )));
        }

        let Some(raw_id) = map.remove("id") else {
            return Self::event_from_map(map);
        };
        let id = CallId::from_value(raw_id)?;

        match (map.remove("method"), map.remove("result"), map.remove("error")) {
            (Some(Value::String(method)), None, None) => {
                let params = match map.remove("params") {
                    Some(raw) => Params::from_value(raw)?,
                    None => Params::none(),
                };
                Ok(Envelope::Request(CallRequest { id, method, params }))
            }
            (Some(Value::String(_)), _, _) => Err(CodecError::InvalidFormat(format!(
                "request {id} cannot carry result or error"
            ))),
            (Some(other), _, _) => Err(CodecError::InvalidFormat(format!(
                "method must be a string, got {other}"
            ))),
            (None, Some(result), None) => Ok(Envelope::Response(CallResponse::success(id, result))),
            (None, None, Some(error)) => {
                let descriptor: ErrorDescriptor = serde_json::from_value(error).map_err(|e| {
                    CodecError::InvalidFormat(format!("invalid error object for {id}: {e}"))
                })?;
                Ok(Envelope::Response(CallResponse::failure(id, descriptor)))
            }
            (None, Some(_), Some(_)) => Err(CodecError::InvalidFormat(format!(
                "response {id} carries both result and error"
            ))),
            (None, None, None) => Err(CodecError::InvalidFormat(format!(
                "message {id} has neither method nor result nor error"
            ))),
        }
    }

    fn event_from_map(mut map: Map<String, Value>) -> Result<Self, CodecError> {
        if map.contains_key("method") {
            return Err(CodecError::InvalidFormat(
                "requests must carry an id".to_string(),
            ));
        }
        match map.remove("topic") {
            Some(Value::String(topic)) => {
                let payload = map.remove("payload").unwrap_or(Value::Null);
                Ok(Envelope::Event(EventMessage { topic, payload }))
            }
            Some(other) => Err(CodecError::InvalidFormat(format!(
                "topic must be a string, got {other}"
            ))),
            None => Err(CodecError::InvalidFormat(
                "message has neither id nor topic".to_string(),
            )),
        }
    }
}

/// Error reply for input that never became a request
///
/// Unlike a [`CallResponse`], the id may be unknown, in which case it is
/// written as `null`.
pub fn rejection_value(id: Option<&CallId>, descriptor: &ErrorDescriptor) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "error": descriptor,
    })
}

impl From<CallRequest> for Envelope {
    fn from(request: CallRequest) -> Self {
        Envelope::Request(request)
    }
}

impl From<CallResponse> for Envelope {
    fn from(response: CallResponse) -> Self {
        Envelope::Response(response)
    }
}

impl From<EventMessage> for Envelope {
    fn from(event: EventMessage) -> Self {
        Envelope::Event(event)
    }
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Envelope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Envelope::from_value(value).map_err(serde::de::Error::custom)
    }
}
