#![allow(non_snake_case)]

use super::*;
use crate::{CallId, CallRequest, CallResponse, EventMessage, Params};
use hostbridge_core::ErrorDescriptor;
use serde_json::json;

fn sample_request() -> Envelope {
    Envelope::from(CallRequest::new(
        1u64,
        "CustomAPI.echo",
        Params::positional([json!("Hello"), json!(42)]),
    ))
}

// JsonCodec tests

#[test]
fn JsonCodec___encode_decode___request_survives() {
    let codec = JsonCodec::new();

    let wire = codec.encode(&sample_request()).unwrap();
    let decoded = codec.decode(&wire).unwrap();

    assert_eq!(decoded, sample_request());
}

#[test]
fn JsonCodec___encode_decode___error_response_keeps_data() {
    let codec = JsonCodec::new();
    let envelope = Envelope::from(CallResponse::failure(
        CallId::from("req-1"),
        ErrorDescriptor::application(4001, "quota").with_data(json!({"used": 10})),
    ));

    let decoded = codec.decode(&codec.encode(&envelope).unwrap()).unwrap();

    assert_eq!(decoded, envelope);
}

#[test]
fn JsonCodec___pretty___output_contains_newlines() {
    let codec = JsonCodec::pretty();

    let encoded = codec.encode(&sample_request()).unwrap();

    assert!(encoded.contains('\n'));
}

#[test]
fn JsonCodec___new___output_is_compact() {
    let codec = JsonCodec::new();

    let encoded = codec.encode(&sample_request()).unwrap();

    assert!(!encoded.contains('\n'));
}

#[test]
fn JsonCodec___decode___invalid_json_returns_deserialization_error() {
    let codec = JsonCodec::new();

    let result = codec.decode("{not json");

    assert!(matches!(result, Err(CodecError::Deserialization(_))));
}

#[test]
fn JsonCodec___decode___ambiguous_structure_returns_invalid_format() {
    let codec = JsonCodec::new();

    let result = codec.decode(r#"{"id": 1, "result": 1, "error": {"code": -32000, "message": "x"}}"#);

    assert!(matches!(result, Err(CodecError::InvalidFormat(_))));
}

#[test]
fn JsonCodec___decode___oversize_input_is_rejected_before_parsing() {
    let codec = JsonCodec::new().with_max_message_bytes(16);

    let result = codec.decode(r#"{"topic": "a-rather-long-topic", "payload": null}"#);

    assert!(matches!(result, Err(CodecError::InboundTooLarge { limit: 16, .. })));
}

#[test]
fn JsonCodec___encode___oversize_output_is_rejected() {
    let codec = JsonCodec::new().with_max_message_bytes(32);
    let envelope = Envelope::from(EventMessage::new("big", json!("x".repeat(100))));

    let result = codec.encode(&envelope);

    assert!(matches!(result, Err(CodecError::OutboundTooLarge { .. })));
}

#[test]
fn JsonCodec___recover_id___reads_id_of_malformed_response() {
    let codec = JsonCodec::new();

    let id = codec.recover_id(r#"{"id": "call-9", "error": {"message": 1}}"#);

    assert_eq!(id, Some(CallId::from("call-9")));
}

#[test]
fn JsonCodec___recover_id___unparseable_or_oversize_text_has_none() {
    let codec = JsonCodec::new().with_max_message_bytes(24);

    assert_eq!(codec.recover_id("{not json"), None);
    assert_eq!(codec.recover_id(r#"{"id": 1, "padding": "............"}"#), None);
}

#[test]
fn JsonCodec___from_config___uses_configured_limit() {
    let config = hostbridge_core::BridgeConfig::new().with_max_message_bytes(1234);

    let codec = JsonCodec::from_config(&config);

    assert_eq!(codec.max_message_bytes(), 1234);
}

#[test]
fn JsonCodec___content_type___returns_application_json() {
    assert_eq!(JsonCodec::new().content_type(), "application/json");
}

#[test]
fn JsonCodec___as_trait_object___is_usable() {
    let codec: std::sync::Arc<dyn Codec> = std::sync::Arc::new(JsonCodec::default());

    let wire = codec.encode(&sample_request()).unwrap();

    assert!(wire.contains("\"jsonrpc\":\"2.0\""));
}

// CodecError tests

#[test]
fn CodecError___from_serde_error___syntax_error_becomes_deserialization() {
    let err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();

    let codec_err: CodecError = err.into();

    assert!(matches!(codec_err, CodecError::Deserialization(_)));
}

#[test]
fn CodecError___into_bridge_error___decode_failures_become_decode() {
    let err: BridgeError = CodecError::InvalidFormat("bad".into()).into();

    assert!(matches!(err, BridgeError::Decode(_)));
}

#[test]
fn CodecError___into_bridge_error___inbound_too_large_becomes_decode() {
    let err: BridgeError = CodecError::InboundTooLarge { size: 10, limit: 5 }.into();

    assert!(matches!(err, BridgeError::Decode(_)));
    assert_eq!(err.code(), -32700);
}

#[test]
fn CodecError___into_bridge_error___invalid_params_keeps_json_rpc_code() {
    let err: BridgeError = CodecError::InvalidParams("params must be an array".into()).into();

    assert!(matches!(err, BridgeError::InvalidParams(_)));
    assert_eq!(err.code(), -32602);
}

#[test]
fn CodecError___into_bridge_error___outbound_too_large_becomes_invalid_request() {
    let err: BridgeError = CodecError::OutboundTooLarge { size: 10, limit: 5 }.into();

    assert!(matches!(err, BridgeError::InvalidRequest(_)));
}
