//! The one-shot notification seam.
//!
//! The engine announces each transition exactly once: it asks the host
//! notifier for a toast, then updates it with the message and the
//! configured auto-close. Never repeating an announcement while a state
//! persists is the transition detector's job, not the notifier's.

use std::time::Duration;

/// Identifier of a raised toast, assigned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ToastId(pub u64);

/// Update applied to a raised toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastUpdate {
    pub toast_id: ToastId,
    pub message: String,
    /// How long the toast stays up. Engine configuration, never a
    /// constant at the call site.
    pub auto_close: Duration,
}

/// The host notification collaborator.
pub trait Notifier: Send {
    /// Raise an informational toast and return its id.
    fn info(&mut self, message: &str) -> ToastId;

    /// Update a raised toast (message, auto-close).
    fn update(&mut self, update: ToastUpdate);
}
