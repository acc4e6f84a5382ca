#![allow(non_snake_case)]

use super::*;
use test_case::test_case;

// ============================================================================
// Local variants map onto the shared taxonomy
// ============================================================================

#[test_case(BridgeError::DuplicateMethod("m".into()), ErrorKind::DuplicateMethod, -32003)]
#[test_case(BridgeError::InvalidParams("p".into()), ErrorKind::InvalidParams, -32602)]
#[test_case(BridgeError::InvalidRequest("r".into()), ErrorKind::InvalidRequest, -32600)]
#[test_case(BridgeError::Decode("d".into()), ErrorKind::DecodeError, -32700)]
#[test_case(BridgeError::BridgeClosed, ErrorKind::BridgeClosed, -32001)]
#[test_case(BridgeError::Timeout, ErrorKind::Timeout, -32002)]
#[test_case(BridgeError::Transport("t".into()), ErrorKind::Transport, -32004)]
#[test_case(BridgeError::Internal("i".into()), ErrorKind::Internal, -32603)]
fn BridgeError___variant___maps_to_kind_and_code(
    error: BridgeError,
    expected_kind: ErrorKind,
    expected_code: i32,
) {
    assert_eq!(error.kind(), expected_kind);
    assert_eq!(error.code(), expected_code);
    assert_eq!(error.to_descriptor().code, expected_code);
}

// ============================================================================
// Code inference used for peers that omit `kind`
// ============================================================================

#[test_case(ErrorKind::DecodeError)]
#[test_case(ErrorKind::InvalidRequest)]
#[test_case(ErrorKind::MethodNotFound)]
#[test_case(ErrorKind::InvalidParams)]
#[test_case(ErrorKind::Internal)]
#[test_case(ErrorKind::HandlerFailed)]
#[test_case(ErrorKind::BridgeClosed)]
#[test_case(ErrorKind::Timeout)]
#[test_case(ErrorKind::DuplicateMethod)]
#[test_case(ErrorKind::Transport)]
fn ErrorKind___from_code___inverts_default_code(kind: ErrorKind) {
    assert_eq!(ErrorKind::from_code(kind.default_code()), kind);
}

#[test_case(-32050, ErrorKind::HandlerFailed)]
#[test_case(1, ErrorKind::Application)]
#[test_case(4001, ErrorKind::Application)]
fn ErrorKind___from_code___classifies_unreserved_codes(code: i32, expected: ErrorKind) {
    assert_eq!(ErrorKind::from_code(code), expected);
}

// ============================================================================
// Wire names match the variant names
// ============================================================================

#[test_case(ErrorKind::MethodNotFound, "\"MethodNotFound\"")]
#[test_case(ErrorKind::HandlerFailed, "\"HandlerFailed\"")]
#[test_case(ErrorKind::BridgeClosed, "\"BridgeClosed\"")]
fn ErrorKind___serialize___uses_variant_name(kind: ErrorKind, expected: &str) {
    assert_eq!(serde_json::to_string(&kind).unwrap(), expected);
    assert_eq!(format!("\"{kind}\""), expected);
}
