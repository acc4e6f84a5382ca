//! hostbridge-transport - Wire envelopes and the transport boundary
//!
//! This crate provides:
//! - [`Envelope`] with its three kinds: [`CallRequest`], [`CallResponse`], [`EventMessage`]
//! - [`Codec`] trait and [`JsonCodec`] for wire text
//! - [`Transport`] trait describing the channel the bridge runs over
//! - [`MemoryTransport`], an in-process pair used as the reference channel

mod adapter;
mod codec;
mod envelope;
mod memory;

pub use adapter::{CloseCallback, ReceiveCallback, Transport, TransportError};
pub use codec::{Codec, CodecError, JsonCodec};
pub use envelope::{
    CallId, CallRequest, CallResponse, Envelope, EnvelopeKind, EventMessage, JSONRPC_VERSION,
    Outcome, Params, rejection_value,
};
pub use memory::MemoryTransport;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        CallId, CallRequest, CallResponse, Codec, CodecError, Envelope, EnvelopeKind,
        EventMessage, JsonCodec, MemoryTransport, Outcome, Params, Transport, TransportError,
    };
}
