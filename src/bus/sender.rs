//! Sender trait for point-to-point messaging.

use super::message::{BusError, Message};

/// Trait for sending messages to a named queue (point-to-point).
///
/// Each message is consumed by exactly one listener on that queue.
pub trait Sender: Send + Sync {
    /// Send a message to a named queue.
    fn send(&self, queue: &str, message: Message) -> Result<(), BusError>;
}
