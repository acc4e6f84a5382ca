//! hostbridge-runtime - Call correlation and event delivery between host and frontend
//!
//! This crate provides:
//! - [`CallCorrelator`] matching responses to outstanding frontend calls
//! - [`MethodDispatcher`] routing host-side requests to named handlers
//! - [`EventPublisher`] and [`SubscriptionRegistry`] for host-to-frontend events
//! - [`HostBridge`] and [`FrontendBridge`], the two endpoints wired to a transport

mod correlator;
mod dispatcher;
mod events;
mod frontend;
mod host;
mod lifecycle;
mod panic_guard;

pub use correlator::CallCorrelator;
pub use dispatcher::{CallContext, FnHandler, MethodDispatcher, MethodHandler, Namespace};
pub use events::{
    DeliveryReport, EventPublisher, Listener, ListenerFault, Subscription, SubscriptionRegistry,
};
pub use frontend::FrontendBridge;
pub use host::HostBridge;
pub use lifecycle::{BridgeState, ClosedSignal, Lifecycle};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        BridgeState, CallContext, CallCorrelator, EventPublisher, FrontendBridge, HostBridge,
        MethodDispatcher, MethodHandler, Subscription, SubscriptionRegistry,
    };
}
