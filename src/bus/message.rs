//! Messages carried by the bus and the transport error type.

use thiserror::Error;

/// Metadata key naming the queue a reply should be sent to.
pub const REPLY_TO: &str = "reply-to";

/// A message travelling over the bus.
#[derive(Clone, Debug)]
pub struct Message {
    /// Correlation identifier; replies reuse the id of their request.
    pub id: String,
    /// Message type (the remote operation name, e.g. "index.read").
    pub message_type: String,
    /// Serialized payload (bitcode binary).
    pub payload: Vec<u8>,
    /// Optional metadata (reply queue, headers).
    pub metadata: Option<Vec<(String, String)>>,
}

impl Message {
    /// Create a new message with the given type and payload.
    pub fn new(id: impl Into<String>, message_type: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            message_type: message_type.into(),
            payload,
            metadata: None,
        }
    }

    /// Create a message with a bitcode-serialized payload.
    pub fn encode<T: serde::Serialize>(
        id: impl Into<String>,
        message_type: impl Into<String>,
        payload: &T,
    ) -> Result<Self, bitcode::Error> {
        let bytes = bitcode::serialize(payload)?;
        Ok(Self::new(id, message_type, bytes))
    }

    /// Decode the payload from bitcode binary format.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T, bitcode::Error> {
        bitcode::deserialize(&self.payload)
    }

    /// Set a metadata entry, replacing any earlier value under `key`.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let (key, value) = (key.into(), value.into());
        let entries = self.metadata.get_or_insert_with(Vec::new);
        match entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => entries.push((key, value)),
        }
        self
    }

    /// Build the reply to this message: same correlation id, no metadata.
    pub fn reply<T: serde::Serialize>(
        &self,
        message_type: impl Into<String>,
        payload: &T,
    ) -> Result<Message, bitcode::Error> {
        Message::encode(self.id.clone(), message_type, payload)
    }

    /// Look up a metadata value by key.
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .as_ref()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The queue a reply to this message should be sent to, if any.
    pub fn reply_to(&self) -> Option<&str> {
        self.metadata_value(REPLY_TO)
    }
}

/// Error type for bus operations.
#[derive(Debug, Error)]
pub enum BusError {
    /// No message arrived before the deadline.
    #[error("timed out waiting for reply")]
    Timeout,
    /// Shared queue state was poisoned by a panicking thread.
    #[error("queue state poisoned: {0}")]
    Poisoned(&'static str),
}
