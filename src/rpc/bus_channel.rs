//! `CallChannel` over a message bus.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::bus::{InMemoryQueue, Listener, Message, Sender, REPLY_TO};
use crate::config::ClientConfig;
use crate::endpoint::Endpoint;
use crate::error::IndexError;

use super::channel::{CallChannel, Connect};
use super::protocol::{IndexReply, IndexRequest};

/// Longest single wait on the reply queue.
const MAX_LISTEN: Duration = Duration::from_secs(60);

/// Request/response over point-to-point queues.
///
/// Requests go to the service's routing key with a fresh correlation id and
/// this channel's reply queue in the metadata. Replies are read from the
/// reply queue; any reply whose id does not match the outstanding request
/// (a redelivered duplicate, or a late reply to a call that already timed
/// out) is discarded.
pub struct BusChannel<T> {
    transport: T,
    request_queue: String,
    reply_queue: String,
    timeout: Duration,
}

impl<T: Sender + Listener> BusChannel<T> {
    pub fn new(
        transport: T,
        request_queue: impl Into<String>,
        reply_queue: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            request_queue: request_queue.into(),
            reply_queue: reply_queue.into(),
            timeout,
        }
    }

    pub fn reply_queue(&self) -> &str {
        &self.reply_queue
    }

    pub fn request_queue(&self) -> &str {
        &self.request_queue
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn await_reply(&self, correlation_id: &str) -> Result<Message, IndexError> {
        // A timeout too large for `Instant` means no deadline.
        let deadline = Instant::now().checked_add(self.timeout);

        loop {
            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => MAX_LISTEN,
            };
            if remaining.is_zero() {
                return Err(crate::bus::BusError::Timeout.into());
            }

            let wait_ms = (remaining.min(MAX_LISTEN).as_millis() as u64).max(1);
            match self.transport.listen(&self.reply_queue, wait_ms)? {
                Some(reply) if reply.id == correlation_id => return Ok(reply),
                Some(stale) => {
                    warn!(
                        reply_queue = %self.reply_queue,
                        expected = correlation_id,
                        received = %stale.id,
                        "discarding uncorrelated reply"
                    );
                }
                None => {}
            }
        }
    }
}

impl<T: Sender + Listener> CallChannel for BusChannel<T> {
    fn call(&self, request: IndexRequest) -> Result<IndexReply, IndexError> {
        let operation = request.operation();
        let correlation_id = uuid::Uuid::new_v4().to_string();

        let message = Message::encode(&correlation_id, operation.as_str(), &request)?
            .with_metadata(REPLY_TO, &self.reply_queue);

        debug!(
            %operation,
            request_queue = %self.request_queue,
            id = %correlation_id,
            "sending index request"
        );
        self.transport.send(&self.request_queue, message)?;

        let reply = self.await_reply(&correlation_id)?;
        Ok(reply.decode::<IndexReply>()?)
    }
}

impl Connect for InMemoryQueue {
    type Channel = BusChannel<InMemoryQueue>;

    fn connect(
        &self,
        endpoint: &Endpoint,
        reply_queue: &str,
        config: &ClientConfig,
    ) -> Result<Self::Channel, IndexError> {
        debug!(
            host = %endpoint.host,
            port = endpoint.port,
            routing_key = %endpoint.routing_key,
            "in-memory transport ignores host and port"
        );
        Ok(BusChannel::new(
            self.clone(),
            endpoint.routing_key.clone(),
            reply_queue,
            config.reply_timeout(),
        ))
    }
}
