//! Frontend-side call correlation
//!
//! Every outgoing call gets a fresh id and a pending entry holding the
//! caller's oneshot sender. Responses are matched back by id; whatever is
//! still pending when the transport closes is rejected with
//! [`BridgeError::BridgeClosed`].

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use hostbridge_core::{BridgeConfig, BridgeError, BridgeResult, IdStrategy};
use hostbridge_transport::{CallId, CallRequest, CallResponse, Codec, Envelope, Params, Transport};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

/// A call awaiting its response
struct PendingCall {
    method: String,
    issued_at: Instant,
    responder: oneshot::Sender<BridgeResult<Value>>,
}

/// Removes the pending entry when the call future finishes or is dropped
struct PendingGuard<'a> {
    pending: &'a DashMap<CallId, PendingCall>,
    id: CallId,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.remove(&self.id);
    }
}

/// Registry of outstanding calls for one frontend endpoint
pub struct CallCorrelator {
    transport: Arc<dyn Transport>,
    codec: Arc<dyn Codec>,
    pending: DashMap<CallId, PendingCall>,
    next_id: AtomicU64,
    closed: AtomicBool,
    call_timeout: Option<Duration>,
    id_strategy: IdStrategy,
}

impl CallCorrelator {
    /// Create a correlator sending through `transport`
    pub fn new(transport: Arc<dyn Transport>, codec: Arc<dyn Codec>, config: &BridgeConfig) -> Self {
        Self {
            transport,
            codec,
            pending: DashMap::new(),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
            call_timeout: config.call_timeout(),
            id_strategy: config.id_strategy,
        }
    }

    /// Issue a call and wait for its outcome
    ///
    /// Resolves with the remote result, or rejects with
    /// [`BridgeError::Rejected`] carrying the remote error descriptor.
    /// Dropping the returned future discards the pending entry.
    pub async fn call(&self, method: impl Into<String>, params: Params) -> BridgeResult<Value> {
        let method = method.into();
        if self.is_closed() {
            return Err(BridgeError::BridgeClosed);
        }

        let (responder, receiver) = oneshot::channel();
        let id = self.register(&method, responder);
        let _guard = PendingGuard {
            pending: &self.pending,
            id: id.clone(),
        };

        // close() may have drained the table between the first check and the insert
        if self.is_closed() {
            return Err(BridgeError::BridgeClosed);
        }

        let request = CallRequest::new(id.clone(), method.as_str(), params);
        let wire = self.codec.encode(&Envelope::from(request))?;
        tracing::trace!("sending call {} ({})", id, method);
        self.transport.send(wire).await?;

        let received = match self.call_timeout {
            Some(limit) => match tokio::time::timeout(limit, receiver).await {
                Ok(received) => received,
                Err(_) => {
                    tracing::warn!("call {} ({}) timed out after {:?}", id, method, limit);
                    return Err(BridgeError::Timeout);
                }
            },
            None => receiver.await,
        };

        received.unwrap_or(Err(BridgeError::BridgeClosed))
    }

    /// Issue a call and deserialize its result
    pub async fn call_as<R: DeserializeOwned>(
        &self,
        method: impl Into<String>,
        params: Params,
    ) -> BridgeResult<R> {
        let value = self.call(method, params).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Settle the pending call matching `response`
    ///
    /// Returns `false` when no call with that id is pending; the response
    /// is logged and dropped.
    pub fn handle_response(&self, response: CallResponse) -> bool {
        let Some((id, pending)) = self.pending.remove(&response.id) else {
            tracing::warn!("dropping response for unknown call id {}", response.id);
            return false;
        };

        let outcome = response.into_result().map_err(BridgeError::Rejected);
        tracing::debug!(
            "call {} ({}) settled in {:?}, success={}",
            id,
            pending.method,
            pending.issued_at.elapsed(),
            outcome.is_ok()
        );

        if pending.responder.send(outcome).is_err() {
            tracing::debug!("caller for {} went away before resolution", id);
        }
        true
    }

    /// Reject the pending call `id` with a local error
    ///
    /// Used when the answer to a pending call arrives but cannot be decoded.
    /// Returns `false` when no call with that id is pending.
    pub fn reject(&self, id: &CallId, error: BridgeError) -> bool {
        let Some((id, pending)) = self.pending.remove(id) else {
            return false;
        };

        tracing::warn!("call {} ({}) rejected: {}", id, pending.method, error);
        if pending.responder.send(Err(error)).is_err() {
            tracing::debug!("caller for {} went away before resolution", id);
        }
        true
    }

    /// Reject every pending call with [`BridgeError::BridgeClosed`]
    ///
    /// Later calls reject immediately. Returns the number of calls rejected;
    /// only the first close rejects anything.
    pub fn close(&self) -> usize {
        if self.closed.swap(true, Ordering::SeqCst) {
            return 0;
        }

        let ids: Vec<CallId> = self.pending.iter().map(|entry| entry.key().clone()).collect();
        let mut rejected = 0;
        for id in ids {
            if let Some((_, pending)) = self.pending.remove(&id) {
                let _ = pending.responder.send(Err(BridgeError::BridgeClosed));
                rejected += 1;
            }
        }

        tracing::info!("bridge closed, rejected {} pending call(s)", rejected);
        rejected
    }

    /// Check if the correlator has been closed
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of calls awaiting a response
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn mint_id(&self) -> CallId {
        match self.id_strategy {
            IdStrategy::Sequential => CallId::Number(self.next_id.fetch_add(1, Ordering::SeqCst)),
            IdStrategy::Random => CallId::Text(uuid::Uuid::new_v4().to_string()),
        }
    }

    fn register(&self, method: &str, responder: oneshot::Sender<BridgeResult<Value>>) -> CallId {
        loop {
            let id = self.mint_id();
            match self.pending.entry(id.clone()) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(slot) => {
                    slot.insert(PendingCall {
                        method: method.to_string(),
                        issued_at: Instant::now(),
                        responder,
                    });
                    return id;
                }
            }
        }
    }
}
