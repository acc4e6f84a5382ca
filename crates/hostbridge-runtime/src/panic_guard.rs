//! Fault containment for user callbacks
//!
//! Handlers and listeners are user code. A panic inside one must end up as
//! an error for that unit alone, never unwinding into the bridge.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Run a synchronous callback, converting a panic into its message
pub fn catch_panic<F, R>(f: F) -> Result<R, String>
where
    F: FnOnce() -> R,
{
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_to_string(payload.as_ref()))
}

/// Convert a panic payload to a human-readable string
///
/// Handles the common payload types (&str, String) and falls back to a
/// fixed message for anything else.
pub fn panic_to_string(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("handler panicked: {s}")
    } else {
        "handler panicked with unknown payload".to_string()
    }
}
