//! In-memory queue for testing and single-process scenarios.
//!
//! This module provides a thread-safe set of named queues that implements
//! both `Sender` and `Listener`, useful for:
//! - Unit and integration testing without a broker
//! - Running a client and an `IndexService` in one process

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use super::{BusError, Listener, Message, Sender};

/// In-memory named queues.
///
/// Features:
/// - Thread-safe (clones share the same queues)
/// - Each named queue is FIFO with competing consumers
/// - Every sent message is also recorded in a history log for inspection
///
/// ## Example
///
/// ```
/// use platefile_index::bus::{InMemoryQueue, Listener, Message, Sender};
///
/// let queue = InMemoryQueue::new();
/// queue.send("orbit1", Message::new("req-1", "index.open", Vec::new())).unwrap();
///
/// let message = queue.listen("orbit1", 100).unwrap();
/// assert_eq!(message.unwrap().message_type, "index.open");
/// ```
#[derive(Clone, Default)]
pub struct InMemoryQueue {
    /// Pending messages per queue name
    queues: Arc<Mutex<HashMap<String, VecDeque<Message>>>>,
    /// Every message ever sent, with its destination queue
    history: Arc<RwLock<Vec<(String, Message)>>>,
}

impl InMemoryQueue {
    /// Create an empty set of queues.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages waiting on a queue.
    pub fn pending(&self, queue: &str) -> usize {
        self.queues
            .lock()
            .map(|queues| queues.get(queue).map_or(0, VecDeque::len))
            .unwrap_or(0)
    }

    /// All messages sent so far, in send order.
    pub fn history(&self) -> Vec<(String, Message)> {
        self.history
            .read()
            .map(|history| history.clone())
            .unwrap_or_default()
    }

    /// Message types sent to one queue, in send order.
    pub fn message_types(&self, queue: &str) -> Vec<String> {
        self.history()
            .into_iter()
            .filter(|(name, _)| name == queue)
            .map(|(_, message)| message.message_type)
            .collect()
    }

    /// Drop all pending messages and the history (useful for test cleanup).
    pub fn clear(&self) {
        if let Ok(mut queues) = self.queues.lock() {
            queues.clear();
        }
        if let Ok(mut history) = self.history.write() {
            history.clear();
        }
    }

    fn pop(&self, queue: &str) -> Result<Option<Message>, BusError> {
        let mut queues = self
            .queues
            .lock()
            .map_err(|_| BusError::Poisoned("in-memory queues"))?;
        Ok(queues.get_mut(queue).and_then(VecDeque::pop_front))
    }
}

impl Sender for InMemoryQueue {
    fn send(&self, queue: &str, message: Message) -> Result<(), BusError> {
        self.history
            .write()
            .map_err(|_| BusError::Poisoned("in-memory history"))?
            .push((queue.to_string(), message.clone()));
        self.queues
            .lock()
            .map_err(|_| BusError::Poisoned("in-memory queues"))?
            .entry(queue.to_string())
            .or_default()
            .push_back(message);
        Ok(())
    }
}

impl Listener for InMemoryQueue {
    fn listen(&self, queue: &str, timeout_ms: u64) -> Result<Option<Message>, BusError> {
        let deadline = Instant::now().checked_add(Duration::from_millis(timeout_ms));

        loop {
            if let Some(message) = self.pop(queue)? {
                return Ok(Some(message));
            }

            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Ok(None);
            }

            // Small sleep to avoid busy-waiting
            std::thread::sleep(Duration::from_millis(1));
        }
    }
}
