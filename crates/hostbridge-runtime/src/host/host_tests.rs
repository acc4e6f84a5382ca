#![allow(non_snake_case)]

use super::*;
use crate::dispatcher::CallContext;
use hostbridge_core::ErrorKind;
use hostbridge_transport::{CallId, EventMessage, MemoryTransport, Outcome, Params};
use parking_lot::Mutex;
use serde_json::json;
use std::time::Duration;

struct Harness {
    host: HostBridge,
    frontend_end: MemoryTransport,
    received: Arc<Mutex<Vec<Envelope>>>,
}

fn harness(dispatcher: MethodDispatcher) -> Harness {
    let (host_end, frontend_end) = MemoryTransport::pair();
    let host = HostBridge::new(
        Arc::new(host_end),
        Arc::new(dispatcher),
        &BridgeConfig::default(),
    )
    .unwrap();

    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();
    let codec = JsonCodec::new();
    frontend_end.on_receive(Arc::new(move |wire: String| {
        sink.lock().push(codec.decode(&wire).unwrap());
    }));

    Harness {
        host,
        frontend_end,
        received,
    }
}

fn sample_dispatcher() -> MethodDispatcher {
    let dispatcher = MethodDispatcher::new();
    dispatcher
        .namespace("CustomAPI")
        .register_typed("echo", |_ctx, (message, number): (String, u32)| async move {
            anyhow::Ok(format!("Received message: {message} and number: {number}"))
        })
        .unwrap();
    dispatcher
        .register_fn("notify", |ctx: CallContext, params: Params| async move {
            let events = ctx.events.ok_or_else(|| anyhow::anyhow!("no event channel"))?;
            events
                .publish("pythonEvent", params.get(0).cloned().unwrap_or(Value::Null))
                .await?;
            anyhow::Ok(json!("sent"))
        })
        .unwrap();
    dispatcher
}

async fn send_request(harness: &Harness, request: CallRequest) {
    let wire = JsonCodec::new().encode(&Envelope::from(request)).unwrap();
    harness.frontend_end.send(wire).await.unwrap();
}

async fn wait_for_received(harness: &Harness, count: usize) -> Vec<Envelope> {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if harness.received.lock().len() >= count {
                return harness.received.lock().clone();
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("host did not answer in time")
}

// Inbound requests

#[tokio::test]
async fn HostBridge___receive___request_is_dispatched_and_answered() {
    let harness = harness(sample_dispatcher());

    send_request(
        &harness,
        CallRequest::new(1u64, "CustomAPI.echo", Params::positional([json!("Hello"), json!(42)])),
    )
    .await;

    let received = wait_for_received(&harness, 1).await;
    assert_eq!(
        received[0],
        Envelope::Response(CallResponse::success(
            CallId::Number(1),
            json!("Received message: Hello and number: 42")
        ))
    );
}

#[tokio::test]
async fn HostBridge___receive___unknown_method_is_answered_with_error() {
    let harness = harness(sample_dispatcher());

    send_request(&harness, CallRequest::new("abc", "nope", Params::none())).await;

    let received = wait_for_received(&harness, 1).await;
    let Envelope::Response(response) = &received[0] else {
        panic!("expected response");
    };
    assert_eq!(response.id, CallId::from("abc"));
    assert_eq!(response.error().map(|d| d.kind), Some(ErrorKind::MethodNotFound));
}

#[tokio::test]
async fn HostBridge___receive___handler_can_emit_events() {
    let harness = harness(sample_dispatcher());

    send_request(
        &harness,
        CallRequest::new(2u64, "notify", Params::positional([json!({"message": "hi"})])),
    )
    .await;

    let received = wait_for_received(&harness, 2).await;
    assert_eq!(
        received[0],
        Envelope::Event(EventMessage::new("pythonEvent", json!({"message": "hi"})))
    );
    let Envelope::Response(response) = &received[1] else {
        panic!("expected response after event");
    };
    assert_eq!(response.outcome, Outcome::Result(json!("sent")));
}

#[tokio::test]
async fn HostBridge___receive___malformed_and_unexpected_messages_are_dropped() {
    let harness = harness(sample_dispatcher());

    harness.frontend_end.send("{not json".to_string()).await.unwrap();
    harness
        .frontend_end
        .send(r#"{"jsonrpc":"2.0","id":1,"result":"stray"}"#.to_string())
        .await
        .unwrap();
    send_request(
        &harness,
        CallRequest::new(3u64, "CustomAPI.echo", Params::positional([json!("x"), json!(1)])),
    )
    .await;

    let received = wait_for_received(&harness, 1).await;
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].id(), Some(&CallId::Number(3)));
}

// emit

#[tokio::test]
async fn HostBridge___emit___reaches_frontend_end() {
    let harness = harness(MethodDispatcher::new());

    harness.host.emit("tick", json!(1)).await.unwrap();
    harness.host.emit_typed("tock", &vec![1, 2]).await.unwrap();

    let received = wait_for_received(&harness, 2).await;
    assert_eq!(received[0], Envelope::Event(EventMessage::new("tick", json!(1))));
    assert_eq!(received[1], Envelope::Event(EventMessage::new("tock", json!([1, 2]))));
}

#[tokio::test]
async fn HostBridge___emit___after_close_is_bridge_closed() {
    let harness = harness(MethodDispatcher::new());
    harness.frontend_end.close();

    let result = harness.host.publisher().publish("late", Value::Null).await;

    assert!(matches!(result, Err(BridgeError::BridgeClosed)));
}

// handle_text

#[tokio::test]
async fn HostBridge___handle_text___returns_encoded_response() {
    let harness = harness(sample_dispatcher());

    let wire = harness
        .host
        .handle_text(r#"{"jsonrpc":"2.0","id":7,"method":"CustomAPI.echo","params":["Hi",1]}"#)
        .await
        .unwrap();

    let response: Value = serde_json::from_str(&wire).unwrap();
    assert_eq!(
        response,
        json!({"jsonrpc": "2.0", "id": 7, "result": "Received message: Hi and number: 1"})
    );
}

#[tokio::test]
async fn HostBridge___handle_text___invalid_params_use_json_rpc_code() {
    let harness = harness(sample_dispatcher());

    let wire = harness
        .host
        .handle_text(r#"{"id":8,"method":"CustomAPI.echo","params":{"wrong":true}}"#)
        .await
        .unwrap();

    let response: Value = serde_json::from_str(&wire).unwrap();
    assert_eq!(response["error"]["code"], json!(-32602));
    assert_eq!(response["error"]["kind"], json!("InvalidParams"));
}

#[tokio::test]
async fn HostBridge___handle_text___malformed_input_is_decode_error() {
    let harness = harness(sample_dispatcher());

    let result = harness.host.handle_text("[]").await;

    assert!(matches!(result, Err(BridgeError::Decode(_))));
}

#[tokio::test]
async fn HostBridge___handle_text___event_is_invalid_request() {
    let harness = harness(sample_dispatcher());

    let result = harness.host.handle_text(r#"{"topic":"t","payload":1}"#).await;

    assert!(matches!(result, Err(BridgeError::InvalidRequest(_))));
}

#[tokio::test]
async fn HostBridge___handle_text___oversize_request_is_decode_error() {
    let (host_end, _frontend_end) = MemoryTransport::pair();
    let config = BridgeConfig::new().with_max_message_bytes(32);
    let host = HostBridge::new(Arc::new(host_end), Arc::new(sample_dispatcher()), &config).unwrap();

    let result = host
        .handle_text(r#"{"jsonrpc":"2.0","id":1,"method":"CustomAPI.echo","params":["x",1]}"#)
        .await;

    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DecodeError);
    assert_eq!(err.code(), -32700);
}

// respond_text

#[tokio::test]
async fn HostBridge___respond_text___success_is_plain_response() {
    let harness = harness(sample_dispatcher());

    let wire = harness
        .host
        .respond_text(r#"{"id":"w1","method":"CustomAPI.echo","params":["Hi",2]}"#)
        .await;

    let response: Value = serde_json::from_str(&wire).unwrap();
    assert_eq!(response["id"], json!("w1"));
    assert_eq!(response["result"], json!("Received message: Hi and number: 2"));
}

#[tokio::test]
async fn HostBridge___respond_text___invalid_json_answers_with_null_id() {
    let harness = harness(sample_dispatcher());

    let wire = harness.host.respond_text("{not json").await;

    let response: Value = serde_json::from_str(&wire).unwrap();
    assert_eq!(response["jsonrpc"], json!("2.0"));
    assert_eq!(response["id"], Value::Null);
    assert_eq!(response["error"]["code"], json!(-32700));
}

#[tokio::test]
async fn HostBridge___respond_text___scalar_params_keep_recovered_id() {
    let harness = harness(sample_dispatcher());

    let wire = harness
        .host
        .respond_text(r#"{"jsonrpc":"2.0","id":5,"method":"CustomAPI.echo","params":3}"#)
        .await;

    let response: Value = serde_json::from_str(&wire).unwrap();
    assert_eq!(response["id"], json!(5));
    assert_eq!(response["error"]["code"], json!(-32602));
    assert_eq!(response["error"]["kind"], json!("InvalidParams"));
}

#[tokio::test]
async fn HostBridge___respond_text___event_is_invalid_request() {
    let harness = harness(sample_dispatcher());

    let wire = harness.host.respond_text(r#"{"topic":"t","payload":1}"#).await;

    let response: Value = serde_json::from_str(&wire).unwrap();
    assert_eq!(response["id"], Value::Null);
    assert_eq!(response["error"]["code"], json!(-32600));
}

// Lifecycle

#[tokio::test]
async fn HostBridge___closed___completes_when_transport_closes() {
    let harness = harness(MethodDispatcher::new());
    let mut closed = harness.host.closed();
    assert_eq!(harness.host.state(), BridgeState::Open);

    harness.frontend_end.close();

    tokio::time::timeout(Duration::from_secs(1), closed.wait())
        .await
        .unwrap();
    assert_eq!(harness.host.state(), BridgeState::Closed);
}

#[test]
fn HostBridge___new___outside_runtime_fails() {
    let (host_end, _frontend_end) = MemoryTransport::pair();

    let result = HostBridge::new(
        Arc::new(host_end),
        Arc::new(MethodDispatcher::new()),
        &BridgeConfig::default(),
    );

    assert!(matches!(result, Err(BridgeError::Internal(_))));
}

#[tokio::test]
async fn HostBridge___dispatcher___exposes_registered_methods() {
    let harness = harness(sample_dispatcher());

    assert_eq!(
        harness.host.dispatcher().methods(),
        vec!["CustomAPI.echo".to_string(), "notify".to_string()]
    );
}
