//! Client-side buffer of pending index write updates.

use crate::types::WriteUpdate;

/// Bounded FIFO of write updates waiting to be sent as one batch.
///
/// `push` reports when the buffer has reached its threshold; the owner is
/// expected to drain it before returning control to its caller, so at most
/// `threshold - 1` updates are ever left pending.
#[derive(Debug)]
pub struct WriteQueue {
    pending: Vec<WriteUpdate>,
    threshold: usize,
}

impl WriteQueue {
    pub fn new(threshold: usize) -> Self {
        Self {
            pending: Vec::with_capacity(threshold),
            threshold: threshold.max(1),
        }
    }

    /// Enqueue an update. Returns `true` once the buffer must be flushed.
    pub fn push(&mut self, update: WriteUpdate) -> bool {
        self.pending.push(update);
        self.pending.len() >= self.threshold
    }

    /// Remove every pending update, or `None` if there is nothing to send.
    pub fn drain(&mut self) -> Option<Vec<WriteUpdate>> {
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::replace(
                &mut self.pending,
                Vec::with_capacity(self.threshold),
            ))
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }
}
