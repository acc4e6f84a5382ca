//! Frontend endpoint
//!
//! Issues calls through a [`CallCorrelator`] and fans host events out to a
//! [`SubscriptionRegistry`]. Closure of the transport rejects every pending
//! call and moves the endpoint to [`BridgeState::Closed`].

use crate::correlator::CallCorrelator;
use crate::events::{Subscription, SubscriptionRegistry};
use crate::lifecycle::{BridgeState, ClosedSignal, Lifecycle};
use hostbridge_core::{BridgeConfig, BridgeError, BridgeResult};
use hostbridge_transport::{Codec, Envelope, JsonCodec, ReceiveCallback, Params, Transport};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, Weak};

struct FrontendInner {
    codec: Arc<dyn Codec>,
    correlator: CallCorrelator,
    subscriptions: SubscriptionRegistry,
    lifecycle: Lifecycle,
}

impl FrontendInner {
    fn receive(&self, wire: String) {
        match self.codec.decode(&wire) {
            Ok(Envelope::Response(response)) => {
                self.correlator.handle_response(response);
            }
            Ok(Envelope::Event(event)) => {
                self.subscriptions.deliver(&event);
            }
            Ok(Envelope::Request(request)) => {
                tracing::warn!(
                    "frontend dropping request {} ({}): calls flow host-ward only",
                    request.id,
                    request.method
                );
            }
            Err(e) => {
                let settled = self
                    .codec
                    .recover_id(&wire)
                    .is_some_and(|id| self.correlator.reject(&id, BridgeError::from(e.clone())));
                if !settled {
                    tracing::warn!("frontend dropping undecodable message: {}", e);
                }
            }
        }
    }

    fn close(&self) {
        if self.lifecycle.close() {
            self.correlator.close();
        }
    }
}

/// Frontend side of a bridge
pub struct FrontendBridge {
    inner: Arc<FrontendInner>,
}

impl FrontendBridge {
    /// Attach a frontend endpoint to `transport`
    pub fn new(transport: Arc<dyn Transport>, config: &BridgeConfig) -> Self {
        let codec: Arc<dyn Codec> = Arc::new(JsonCodec::from_config(config));
        let inner = Arc::new(FrontendInner {
            correlator: CallCorrelator::new(transport.clone(), codec.clone(), config),
            codec,
            subscriptions: SubscriptionRegistry::new(),
            lifecycle: Lifecycle::new(),
        });

        let weak: Weak<FrontendInner> = Arc::downgrade(&inner);
        transport.on_close(Arc::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.close();
            }
        }));

        let weak: Weak<FrontendInner> = Arc::downgrade(&inner);
        let on_receive: ReceiveCallback = Arc::new(move |wire| {
            if let Some(inner) = weak.upgrade() {
                inner.receive(wire);
            }
        });
        transport.on_receive(on_receive);

        Self { inner }
    }

    /// Call a host method and wait for its result
    pub async fn call(&self, method: impl Into<String>, params: Params) -> BridgeResult<Value> {
        self.inner.correlator.call(method, params).await
    }

    /// Call a host method and deserialize its result
    pub async fn call_as<R: DeserializeOwned>(
        &self,
        method: impl Into<String>,
        params: Params,
    ) -> BridgeResult<R> {
        self.inner.correlator.call_as(method, params).await
    }

    /// Listen for host events on `topic`
    pub fn subscribe<F>(&self, topic: impl Into<String>, listener: F) -> Subscription
    where
        F: Fn(&Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.inner.subscriptions.subscribe(topic, listener)
    }

    /// Listen for host events on `topic` with a typed payload
    pub fn subscribe_typed<T, F>(&self, topic: impl Into<String>, listener: F) -> Subscription
    where
        T: DeserializeOwned,
        F: Fn(T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.inner.subscriptions.subscribe_typed(topic, listener)
    }

    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        self.inner.subscriptions.unsubscribe(subscription)
    }

    /// Drop every listener of `topic`
    pub fn unsubscribe_topic(&self, topic: &str) -> usize {
        self.inner.subscriptions.unsubscribe_topic(topic)
    }

    pub fn listener_count(&self, topic: &str) -> usize {
        self.inner.subscriptions.listener_count(topic)
    }

    /// Calls still waiting for a response
    pub fn pending_calls(&self) -> usize {
        self.inner.correlator.pending_count()
    }

    pub fn state(&self) -> BridgeState {
        self.inner.lifecycle.state()
    }

    /// Watcher completing when the transport closes
    pub fn closed(&self) -> ClosedSignal {
        self.inner.lifecycle.closed()
    }
}
