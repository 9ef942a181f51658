//! Message bus - point-to-point transport used to reach the index service.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  send(routing key)   ┌────────────────────┐
//! │ RemoteIndex  │ ───────────────────► │ IndexServiceThread │
//! │ (BusChannel) │ ◄─────────────────── │  (IndexService)    │
//! └──────────────┘  send(reply queue)   └────────────────────┘
//!          │                                      │
//!          ▼                                      ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │        Sender: send(queue, msg)   Listener: listen()    │
//! └─────────────────────────────────────────────────────────┘
//!          │                       │
//!          ▼                       ▼
//! ┌─────────────────┐    ┌──────────────────────┐
//! │  InMemoryQueue  │    │  AMQP / other broker │
//! │   (included)    │    │      (external)      │
//! └─────────────────┘    └──────────────────────┘
//! ```
//!
//! Delivery is at-least-once with no ordering guarantee across independent
//! calls; callers correlate replies by message id.

mod in_memory_queue;
mod listener;
mod message;
mod sender;

pub use in_memory_queue::InMemoryQueue;
pub use listener::Listener;
pub use message::{BusError, Message, REPLY_TO};
pub use sender::Sender;

/// Build a fresh queue name from a base name.
///
/// Used to give every client instance its own reply queue.
pub fn unique_queue_name(base: &str) -> String {
    format!("{}_{}", base, uuid::Uuid::new_v4().simple())
}
