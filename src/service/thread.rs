//! Background thread serving an `IndexService` on a bus queue.
//!
//! `IndexServiceThread` listens for requests on a named queue
//! (point-to-point), hands each one to the service, and sends the reply to
//! the queue named in the request's `reply-to` metadata under the request's
//! correlation id.

use std::sync::mpsc::{channel, Sender as StopSender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{info, warn};

use super::index_service::IndexService;
use crate::bus::{Listener, Message, Sender};
use crate::rpc::{IndexReply, IndexRequest, RemoteFault, REPLY_MESSAGE_TYPE};

/// Statistics from the service thread.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceStats {
    /// Requests answered with a result.
    pub requests_handled: usize,
    /// Requests answered with a fault, or dropped as undeliverable.
    pub requests_failed: usize,
    /// Number of poll cycles completed.
    pub polls: usize,
}

/// A background thread that answers index requests arriving on a named
/// queue.
///
/// ## Example
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use platefile_index::bus::InMemoryQueue;
/// use platefile_index::service::{IndexService, IndexServiceThread};
///
/// let queue = InMemoryQueue::new();
/// let service = Arc::new(IndexService::new("/plates"));
/// let handle = IndexServiceThread::spawn(service, "orbit1", queue.clone(), Duration::from_millis(5));
///
/// // ... clients send requests to "orbit1" ...
///
/// let stats = handle.stop();
/// assert_eq!(stats.requests_handled, 0);
/// ```
pub struct IndexServiceThread {
    stop_tx: StopSender<()>,
    handle: Option<JoinHandle<ServiceStats>>,
}

impl IndexServiceThread {
    pub fn spawn<T>(
        service: Arc<IndexService>,
        queue_name: impl Into<String>,
        transport: T,
        poll_interval: Duration,
    ) -> Self
    where
        T: Sender + Listener + 'static,
    {
        let queue_name = queue_name.into();
        let (stop_tx, stop_rx) = channel();

        let handle = thread::spawn(move || {
            info!(queue = %queue_name, "index service listening");
            let mut stats = ServiceStats::default();

            loop {
                match stop_rx.try_recv() {
                    Ok(()) | Err(TryRecvError::Disconnected) => break,
                    Err(TryRecvError::Empty) => {}
                }

                stats.polls += 1;

                match transport.listen(&queue_name, poll_interval.as_millis() as u64) {
                    Ok(Some(message)) => {
                        if serve(&service, &transport, &message) {
                            stats.requests_handled += 1;
                        } else {
                            stats.requests_failed += 1;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(queue = %queue_name, error = %e, "listen failed");
                    }
                }
            }

            info!(queue = %queue_name, ?stats, "index service stopped");
            stats
        });

        Self {
            stop_tx,
            handle: Some(handle),
        }
    }

    /// Signal the service to stop and wait for it to finish.
    pub fn stop(mut self) -> ServiceStats {
        let _ = self.stop_tx.send(());
        match self.handle.take() {
            Some(handle) => handle.join().unwrap_or_default(),
            None => ServiceStats::default(),
        }
    }

    /// Signal the service to stop without waiting.
    pub fn signal_stop(&self) {
        let _ = self.stop_tx.send(());
    }
}

impl Drop for IndexServiceThread {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
    }
}

/// Answer one request. Returns false when the reply is a fault or could not
/// be delivered.
fn serve<T: Sender>(service: &IndexService, transport: &T, message: &Message) -> bool {
    let Some(reply_to) = message.reply_to() else {
        warn!(id = %message.id, message_type = %message.message_type, "request has no reply-to queue");
        return false;
    };

    let reply = match message.decode::<IndexRequest>() {
        Ok(request) if request.operation().as_str() == message.message_type => {
            service.handle(request)
        }
        Ok(request) => IndexReply::Fault(RemoteFault::malformed(format!(
            "message type {} does not match {} payload",
            message.message_type,
            request.operation()
        ))),
        Err(e) => IndexReply::Fault(RemoteFault::malformed(format!(
            "could not decode {}: {}",
            message.message_type, e
        ))),
    };
    let succeeded = !matches!(reply, IndexReply::Fault(_));

    let outgoing = match message.reply(REPLY_MESSAGE_TYPE, &reply) {
        Ok(outgoing) => outgoing,
        Err(e) => {
            warn!(id = %message.id, error = %e, "could not encode reply");
            return false;
        }
    };

    if let Err(e) = transport.send(reply_to, outgoing) {
        warn!(id = %message.id, reply_to, error = %e, "could not deliver reply");
        return false;
    }
    succeeded
}
