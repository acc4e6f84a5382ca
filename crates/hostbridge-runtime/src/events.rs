//! Event bus: host-side publishing and frontend-side subscriptions
//!
//! Events are fire-and-forget. The host sends them whether or not anybody
//! listens; the frontend fans each one out to the listeners subscribed to
//! its topic at the moment it arrives, in subscription order.

use crate::panic_guard::catch_panic;
use hostbridge_core::BridgeResult;
use hostbridge_transport::{Codec, Envelope, EventMessage, Transport};
use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Frontend callback for one topic
pub type Listener = Arc<dyn Fn(&Value) -> anyhow::Result<()> + Send + Sync>;

/// Host-side handle for pushing events to the frontend
#[derive(Clone)]
pub struct EventPublisher {
    transport: Arc<dyn Transport>,
    codec: Arc<dyn Codec>,
}

impl EventPublisher {
    pub fn new(transport: Arc<dyn Transport>, codec: Arc<dyn Codec>) -> Self {
        Self { transport, codec }
    }

    /// Send an event on `topic`
    ///
    /// Completes once the transport accepted the message. There is no
    /// acknowledgment from the frontend.
    pub async fn publish(&self, topic: impl Into<String>, payload: Value) -> BridgeResult<()> {
        let event = EventMessage::new(topic, payload);
        tracing::trace!("publishing event on {}", event.topic);
        let wire = self.codec.encode(&Envelope::from(event))?;
        self.transport.send(wire).await?;
        Ok(())
    }

    /// Send an event with a serializable payload
    pub async fn publish_typed<T: Serialize>(
        &self,
        topic: impl Into<String>,
        payload: &T,
    ) -> BridgeResult<()> {
        self.publish(topic, serde_json::to_value(payload)?).await
    }
}

impl std::fmt::Debug for EventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPublisher")
            .field("content_type", &self.codec.content_type())
            .finish()
    }
}

/// Handle returned by [`SubscriptionRegistry::subscribe`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subscription {
    id: u64,
    topic: String,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

/// A listener that failed while handling an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerFault {
    pub subscription: u64,
    pub message: String,
}

/// Outcome of delivering one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub topic: String,
    /// Listeners that ran to completion without a fault
    pub delivered: usize,
    pub faults: Vec<ListenerFault>,
}

impl DeliveryReport {
    /// Check if every invoked listener succeeded
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }
}

/// Frontend-side map of topic to listeners
#[derive(Default)]
pub struct SubscriptionRegistry {
    topics: RwLock<HashMap<String, Vec<(u64, Listener)>>>,
    next_id: AtomicU64,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener for `topic`
    pub fn subscribe<F>(&self, topic: impl Into<String>, listener: F) -> Subscription
    where
        F: Fn(&Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let topic = topic.into();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.topics
            .write()
            .entry(topic.clone())
            .or_default()
            .push((id, Arc::new(listener)));
        tracing::debug!("subscription {} added for {}", id, topic);
        Subscription { id, topic }
    }

    /// Add a listener receiving the payload deserialized as `T`
    ///
    /// A payload that does not deserialize counts as this listener's fault.
    pub fn subscribe_typed<T, F>(&self, topic: impl Into<String>, listener: F) -> Subscription
    where
        T: DeserializeOwned,
        F: Fn(T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.subscribe(topic, move |payload| {
            let typed = T::deserialize(payload)?;
            listener(typed)
        })
    }

    /// Remove exactly the listener behind `subscription`
    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        let mut topics = self.topics.write();
        let Some(listeners) = topics.get_mut(&subscription.topic) else {
            return false;
        };

        let before = listeners.len();
        listeners.retain(|(id, _)| *id != subscription.id);
        let removed = listeners.len() != before;
        if listeners.is_empty() {
            topics.remove(&subscription.topic);
        }
        removed
    }

    /// Remove every listener of `topic`, returning how many were removed
    pub fn unsubscribe_topic(&self, topic: &str) -> usize {
        self.topics
            .write()
            .remove(topic)
            .map(|listeners| listeners.len())
            .unwrap_or(0)
    }

    /// Number of listeners on `topic`
    pub fn listener_count(&self, topic: &str) -> usize {
        self.topics.read().get(topic).map(Vec::len).unwrap_or(0)
    }

    /// Invoke every listener of the event's topic in subscription order
    ///
    /// Listeners run against a snapshot taken before the first one is
    /// invoked, so a listener may subscribe or unsubscribe without
    /// deadlocking. Faults are collected and logged, never propagated.
    pub fn deliver(&self, event: &EventMessage) -> DeliveryReport {
        let listeners: Vec<(u64, Listener)> = self
            .topics
            .read()
            .get(&event.topic)
            .cloned()
            .unwrap_or_default();

        let mut report = DeliveryReport {
            topic: event.topic.clone(),
            delivered: 0,
            faults: Vec::new(),
        };

        for (id, listener) in listeners {
            let message = match catch_panic(|| listener(&event.payload)) {
                Ok(Ok(())) => {
                    report.delivered += 1;
                    continue;
                }
                Ok(Err(e)) => format!("{e:#}"),
                Err(panic_message) => panic_message,
            };
            tracing::warn!(
                "listener {} on {} failed: {}",
                id,
                event.topic,
                message
            );
            report.faults.push(ListenerFault {
                subscription: id,
                message,
            });
        }

        if report.delivered == 0 && report.faults.is_empty() {
            tracing::trace!("event on {} had no subscribers", event.topic);
        }
        report
    }
}
