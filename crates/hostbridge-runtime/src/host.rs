//! Host endpoint
//!
//! Wires a [`MethodDispatcher`] and an [`EventPublisher`] to a transport:
//! inbound requests are dispatched on the runtime that created the bridge
//! and their responses are sent back through the same transport.

use crate::dispatcher::MethodDispatcher;
use crate::events::EventPublisher;
use crate::lifecycle::{BridgeState, ClosedSignal, Lifecycle};
use hostbridge_core::{BridgeConfig, BridgeError, BridgeResult};
use hostbridge_transport::{
    CallRequest, CallResponse, Codec, Envelope, JsonCodec, ReceiveCallback, Transport,
    rejection_value,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;

struct HostInner {
    transport: Arc<dyn Transport>,
    codec: Arc<dyn Codec>,
    dispatcher: Arc<MethodDispatcher>,
    publisher: EventPublisher,
    lifecycle: Lifecycle,
    runtime: Handle,
}

impl HostInner {
    fn receive(self: &Arc<Self>, wire: String) {
        let envelope = match self.codec.decode(&wire) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!("host dropping undecodable message: {}", e);
                return;
            }
        };

        match envelope {
            Envelope::Request(request) => {
                let inner = self.clone();
                self.runtime.spawn(async move { inner.serve(request).await });
            }
            other => {
                tracing::warn!("host dropping unexpected {} envelope", other.kind());
            }
        }
    }

    async fn serve(&self, request: CallRequest) {
        let response = self
            .dispatcher
            .dispatch(request, Some(self.publisher.clone()))
            .await;
        let id = response.id.clone();

        let Some(wire) = self.encode_response(response) else {
            return;
        };
        if let Err(e) = self.transport.send(wire).await {
            tracing::warn!("could not send response for call {}: {}", id, e);
        }
    }

    /// Encode a response, degrading to an error response if the result itself cannot be sent
    fn encode_response(&self, response: CallResponse) -> Option<String> {
        let id = response.id.clone();
        match self.codec.encode(&Envelope::from(response)) {
            Ok(wire) => Some(wire),
            Err(e) => {
                tracing::warn!("response for call {} could not be encoded: {}", id, e);
                let fallback = CallResponse::failure(id, BridgeError::from(e).to_descriptor());
                match self.codec.encode(&Envelope::from(fallback)) {
                    Ok(wire) => Some(wire),
                    Err(e) => {
                        tracing::error!("error response could not be encoded either: {}", e);
                        None
                    }
                }
            }
        }
    }
}

/// Host side of a bridge
///
/// Dropping the bridge detaches it from the transport; messages arriving
/// afterwards are ignored.
pub struct HostBridge {
    inner: Arc<HostInner>,
}

impl HostBridge {
    /// Attach `dispatcher` to `transport`
    ///
    /// Must be called from within a tokio runtime; requests are dispatched
    /// on that runtime even when the transport delivers from another thread.
    pub fn new(
        transport: Arc<dyn Transport>,
        dispatcher: Arc<MethodDispatcher>,
        config: &BridgeConfig,
    ) -> BridgeResult<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| BridgeError::Internal(format!("host bridge needs a tokio runtime: {e}")))?;
        let codec: Arc<dyn Codec> = Arc::new(JsonCodec::from_config(config));

        let inner = Arc::new(HostInner {
            publisher: EventPublisher::new(transport.clone(), codec.clone()),
            transport: transport.clone(),
            codec,
            dispatcher,
            lifecycle: Lifecycle::new(),
            runtime,
        });

        let weak: Weak<HostInner> = Arc::downgrade(&inner);
        transport.on_close(Arc::new(move || {
            if let Some(inner) = weak.upgrade()
                && inner.lifecycle.close()
            {
                tracing::info!("host bridge closed");
            }
        }));

        let weak: Weak<HostInner> = Arc::downgrade(&inner);
        let on_receive: ReceiveCallback = Arc::new(move |wire| {
            if let Some(inner) = weak.upgrade() {
                inner.receive(wire);
            }
        });
        transport.on_receive(on_receive);

        Ok(Self { inner })
    }

    /// Push an event to the frontend
    pub async fn emit(&self, topic: impl Into<String>, payload: Value) -> BridgeResult<()> {
        self.inner.publisher.publish(topic, payload).await
    }

    /// Push an event with a serializable payload
    pub async fn emit_typed<T: Serialize>(
        &self,
        topic: impl Into<String>,
        payload: &T,
    ) -> BridgeResult<()> {
        self.inner.publisher.publish_typed(topic, payload).await
    }

    /// Cloneable publisher for code that outlives a single call
    pub fn publisher(&self) -> EventPublisher {
        self.inner.publisher.clone()
    }

    /// Serve one wire request directly and return the wire response
    ///
    /// For request/response transports (e.g. an HTTP POST endpoint) where
    /// the response travels back on the same exchange instead of through
    /// [`Transport::send`].
    pub async fn handle_text(&self, wire: &str) -> BridgeResult<String> {
        let request = match self.inner.codec.decode(wire)? {
            Envelope::Request(request) => request,
            other => {
                return Err(BridgeError::InvalidRequest(format!(
                    "expected a request, got a {}",
                    other.kind()
                )));
            }
        };

        let response = self
            .inner
            .dispatcher
            .dispatch(request, Some(self.inner.publisher.clone()))
            .await;
        Ok(self.inner.codec.encode(&Envelope::from(response))?)
    }

    /// Serve one wire request and always produce a wire reply
    ///
    /// Input that never becomes a request is answered with an error object
    /// carrying the id read from the input, or `null` when none can be read.
    pub async fn respond_text(&self, wire: &str) -> String {
        match self.handle_text(wire).await {
            Ok(reply) => reply,
            Err(err) => {
                let id = self.inner.codec.recover_id(wire);
                tracing::debug!("answering unservable input with {}: {}", err.kind(), err);
                rejection_value(id.as_ref(), &err.to_descriptor()).to_string()
            }
        }
    }

    pub fn dispatcher(&self) -> &Arc<MethodDispatcher> {
        &self.inner.dispatcher
    }

    pub fn state(&self) -> BridgeState {
        self.inner.lifecycle.state()
    }

    /// Watcher completing when the transport closes
    pub fn closed(&self) -> ClosedSignal {
        self.inner.lifecycle.closed()
    }
}

#[cfg(test)]
#[path = "host/host_tests.rs"]
mod host_tests;
