//! In-process transport pair
//!
//! Two linked endpoints that hand wire text straight to the peer's receive
//! callback, the way an injected webview binding does. Messages sent before
//! the peer registers a callback are buffered and flushed on registration.

use crate::adapter::{CloseCallback, ReceiveCallback, Transport, TransportError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Default)]
struct Endpoint {
    receiver: Mutex<Option<ReceiveCallback>>,
    // Also guards the receiver hand-off, so nothing is stranded here.
    backlog: Mutex<VecDeque<String>>,
    close_callbacks: Mutex<Vec<CloseCallback>>,
}

struct Link {
    closed: AtomicBool,
    ends: [Endpoint; 2],
}

/// One end of an in-memory link
#[derive(Clone)]
pub struct MemoryTransport {
    link: Arc<Link>,
    side: usize,
}

impl MemoryTransport {
    /// Create two connected endpoints
    pub fn pair() -> (MemoryTransport, MemoryTransport) {
        let link = Arc::new(Link {
            closed: AtomicBool::new(false),
            ends: [Endpoint::default(), Endpoint::default()],
        });
        (
            MemoryTransport {
                link: link.clone(),
                side: 0,
            },
            MemoryTransport { link, side: 1 },
        )
    }

    /// Terminate the link and fire every close callback on both ends
    ///
    /// Only the first call has any effect.
    pub fn close(&self) {
        if self.link.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::debug!("memory transport closed");

        for end in &self.link.ends {
            end.receiver.lock().take();
            end.backlog.lock().clear();
            let callbacks = std::mem::take(&mut *end.close_callbacks.lock());
            for callback in callbacks {
                callback();
            }
        }
    }

    /// Check if the link has been closed
    pub fn is_closed(&self) -> bool {
        self.link.closed.load(Ordering::SeqCst)
    }

    /// Messages waiting for this end to register a receive callback
    pub fn backlog_len(&self) -> usize {
        self.local().backlog.lock().len()
    }

    fn local(&self) -> &Endpoint {
        &self.link.ends[self.side]
    }

    fn peer(&self) -> &Endpoint {
        &self.link.ends[1 - self.side]
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, envelope: String) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }

        let peer = self.peer();
        let receiver = {
            let mut backlog = peer.backlog.lock();
            match peer.receiver.lock().clone() {
                Some(receiver) => receiver,
                None => {
                    backlog.push_back(envelope);
                    return Ok(());
                }
            }
        };

        receiver(envelope);
        Ok(())
    }

    fn on_receive(&self, callback: ReceiveCallback) {
        if self.is_closed() {
            return;
        }

        let pending: Vec<String> = {
            let mut backlog = self.local().backlog.lock();
            *self.local().receiver.lock() = Some(callback.clone());
            backlog.drain(..).collect()
        };

        for envelope in pending {
            callback(envelope);
        }
    }

    fn on_close(&self, callback: CloseCallback) {
        {
            let mut callbacks = self.local().close_callbacks.lock();
            if !self.is_closed() {
                callbacks.push(callback);
                return;
            }
        }
        callback();
    }
}
