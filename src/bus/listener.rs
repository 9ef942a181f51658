//! Listener trait for point-to-point messaging.

use super::message::{BusError, Message};

/// Trait for listening on a named queue (point-to-point).
///
/// Listeners on the same queue compete; each message is delivered to
/// exactly one of them.
pub trait Listener: Send + Sync {
    /// Listen for the next message on a named queue, blocking until one
    /// is available or the timeout expires.
    fn listen(&self, queue: &str, timeout_ms: u64) -> Result<Option<Message>, BusError>;
}
