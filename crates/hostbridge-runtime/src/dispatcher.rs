//! Host-side method dispatch
//!
//! Handlers are looked up by name. Every dispatch runs its handler on its
//! own task, so an error or a panic in one handler becomes a failed
//! response for that call only.

use crate::events::EventPublisher;
use crate::panic_guard::panic_to_string;
use async_trait::async_trait;
use hostbridge_core::{BridgeConfig, BridgeError, BridgeResult, ErrorDescriptor};
use hostbridge_transport::{CallId, CallRequest, CallResponse, Params};
use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

/// Per-call information handed to a handler
#[derive(Debug, Clone)]
pub struct CallContext {
    /// Correlation id of the request being served
    pub id: CallId,
    /// Full method name, namespace included
    pub method: String,
    /// Event channel back to the frontend, when dispatching behind a host endpoint
    pub events: Option<EventPublisher>,
}

impl CallContext {
    pub fn new(id: CallId, method: impl Into<String>) -> Self {
        Self {
            id,
            method: method.into(),
            events: None,
        }
    }

    pub fn with_events(mut self, events: EventPublisher) -> Self {
        self.events = Some(events);
        self
    }
}

/// A bridged method
///
/// Returning an [`ErrorDescriptor`] or [`BridgeError`] (inside the
/// `anyhow::Error`) sends that error to the caller unchanged. Any other
/// error is reported as `HandlerFailed`.
#[async_trait]
pub trait MethodHandler: Send + Sync + 'static {
    async fn handle(&self, ctx: CallContext, params: Params) -> anyhow::Result<Value>;
}

/// Adapter turning an async closure into a [`MethodHandler`]
pub struct FnHandler<F>(F);

impl<F> FnHandler<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F, Fut> MethodHandler for FnHandler<F>
where
    F: Fn(CallContext, Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    async fn handle(&self, ctx: CallContext, params: Params) -> anyhow::Result<Value> {
        (self.0)(ctx, params).await
    }
}

fn typed_handler<P, R, F, Fut>(f: F) -> impl MethodHandler
where
    P: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    F: Fn(CallContext, P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
{
    let f = Arc::new(f);
    FnHandler(move |ctx: CallContext, params: Params| {
        let f = f.clone();
        async move {
            let parsed: P = params
                .parse()
                .map_err(|e| ErrorDescriptor::invalid_params(format!("{}: {e}", ctx.method)))?;
            let result = f(ctx, parsed).await?;
            Ok::<Value, anyhow::Error>(serde_json::to_value(result)?)
        }
    })
}

/// Name to handler table for one host endpoint
pub struct MethodDispatcher {
    handlers: RwLock<HashMap<String, Arc<dyn MethodHandler>>>,
    separator: String,
}

impl Default for MethodDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MethodDispatcher {
    /// Create an empty dispatcher using `.` between namespace and name
    pub fn new() -> Self {
        Self::with_separator(".")
    }

    /// Create an empty dispatcher using the configured namespace separator
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::with_separator(config.namespace_separator.as_str())
    }

    /// Create an empty dispatcher with a custom namespace separator
    pub fn with_separator(separator: impl Into<String>) -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            separator: separator.into(),
        }
    }

    /// Register `handler` under `name`
    ///
    /// Fails with [`BridgeError::DuplicateMethod`] if the name is taken; the
    /// existing handler stays in place.
    pub fn register(&self, name: impl Into<String>, handler: impl MethodHandler) -> BridgeResult<()> {
        let name = name.into();
        let mut handlers = self.handlers.write();
        if handlers.contains_key(&name) {
            return Err(BridgeError::DuplicateMethod(name));
        }
        tracing::debug!("registered method {}", name);
        handlers.insert(name, Arc::new(handler));
        Ok(())
    }

    /// Register an async closure taking raw params
    pub fn register_fn<F, Fut>(&self, name: impl Into<String>, f: F) -> BridgeResult<()>
    where
        F: Fn(CallContext, Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.register(name, FnHandler(f))
    }

    /// Register an async closure with typed params and result
    ///
    /// Params that do not deserialize into `P` fail the call with
    /// `InvalidParams` before the closure runs.
    pub fn register_typed<P, R, F, Fut>(&self, name: impl Into<String>, f: F) -> BridgeResult<()>
    where
        P: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(CallContext, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    {
        self.register(name, typed_handler(f))
    }

    /// Install `handler` under `name`, returning the handler it displaced
    pub fn replace(
        &self,
        name: impl Into<String>,
        handler: impl MethodHandler,
    ) -> Option<Arc<dyn MethodHandler>> {
        let name = name.into();
        tracing::debug!("replacing method {}", name);
        self.handlers.write().insert(name, Arc::new(handler))
    }

    /// Remove the handler registered under `name`
    pub fn unregister(&self, name: &str) -> Option<Arc<dyn MethodHandler>> {
        self.handlers.write().remove(name)
    }

    /// Check if `name` has a handler
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.read().contains_key(name)
    }

    /// Registered method names, sorted
    pub fn methods(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Registration view prefixing every name with `prefix` and the separator
    pub fn namespace(&self, prefix: impl Into<String>) -> Namespace<'_> {
        Namespace {
            dispatcher: self,
            prefix: prefix.into(),
        }
    }

    /// Serve one request
    ///
    /// Never fails. Lookup misses and handler faults are answered with an
    /// error response.
    pub async fn dispatch(&self, request: CallRequest, events: Option<EventPublisher>) -> CallResponse {
        let CallRequest { id, method, params } = request;

        let handler = self.handlers.read().get(&method).cloned();
        let Some(handler) = handler else {
            tracing::debug!("no handler for {} (call {})", method, id);
            return CallResponse::failure(id, ErrorDescriptor::method_not_found(&method));
        };

        let ctx = CallContext {
            id: id.clone(),
            method: method.clone(),
            events,
        };
        let started = Instant::now();
        let joined = tokio::spawn(async move { handler.handle(ctx, params).await }).await;

        let response = match joined {
            Ok(Ok(result)) => CallResponse::success(id, result),
            Ok(Err(err)) => CallResponse::failure(id, handler_error_descriptor(err)),
            Err(join_err) if join_err.is_panic() => {
                let message = panic_to_string(join_err.into_panic().as_ref());
                tracing::error!("method {} panicked: {}", method, message);
                CallResponse::failure(id, ErrorDescriptor::handler_failed(message))
            }
            Err(join_err) => {
                CallResponse::failure(id, ErrorDescriptor::handler_failed(join_err.to_string()))
            }
        };

        tracing::debug!(
            "dispatched {} in {:?}, success={}",
            method,
            started.elapsed(),
            response.is_success()
        );
        response
    }
}

/// Convert a handler's error into the descriptor sent to the caller
fn handler_error_descriptor(err: anyhow::Error) -> ErrorDescriptor {
    match err.downcast::<ErrorDescriptor>() {
        Ok(descriptor) => descriptor,
        Err(err) => match err.downcast::<BridgeError>() {
            Ok(bridge_err) => bridge_err.to_descriptor(),
            Err(err) => ErrorDescriptor::handler_failed(format!("{err:#}")),
        },
    }
}

/// Registration view under a name prefix, e.g. `CustomAPI`
pub struct Namespace<'a> {
    dispatcher: &'a MethodDispatcher,
    prefix: String,
}

impl Namespace<'_> {
    /// Full method name for `name` inside this namespace
    pub fn qualify(&self, name: &str) -> String {
        format!("{}{}{}", self.prefix, self.dispatcher.separator, name)
    }

    pub fn register(&self, name: &str, handler: impl MethodHandler) -> BridgeResult<()> {
        self.dispatcher.register(self.qualify(name), handler)
    }

    pub fn register_fn<F, Fut>(&self, name: &str, f: F) -> BridgeResult<()>
    where
        F: Fn(CallContext, Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.dispatcher.register_fn(self.qualify(name), f)
    }

    pub fn register_typed<P, R, F, Fut>(&self, name: &str, f: F) -> BridgeResult<()>
    where
        P: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(CallContext, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    {
        self.dispatcher.register_typed(self.qualify(name), f)
    }
}
