//! Client configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::error::IndexError;

/// Pending write updates that trigger a flush.
pub const DEFAULT_MAX_PENDING_WRITE_UPDATES: usize = 10;
/// How long a call waits for its reply.
pub const DEFAULT_REPLY_TIMEOUT_MS: u64 = 30_000;
/// Prefix of the per-client reply queue name.
pub const DEFAULT_QUEUE_PREFIX: &str = "remote_index_";

/// Settings for a `RemoteIndex`.
///
/// ## Example
///
/// ```
/// use platefile_index::ClientConfig;
///
/// let config = ClientConfig::from_json(r#"{ "reply_timeout_ms": 500 }"#).unwrap();
/// assert_eq!(config.reply_timeout_ms, 500);
/// assert_eq!(config.max_pending_write_updates, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub max_pending_write_updates: usize,
    pub reply_timeout_ms: u64,
    pub queue_prefix: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_pending_write_updates: DEFAULT_MAX_PENDING_WRITE_UPDATES,
            reply_timeout_ms: DEFAULT_REPLY_TIMEOUT_MS,
            queue_prefix: DEFAULT_QUEUE_PREFIX.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON document. Missing keys take their defaults; unknown
    /// keys are rejected.
    pub fn from_json(json: &str) -> Result<Self, IndexError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| IndexError::Argument(format!("invalid client configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the number of pending write updates that triggers a flush.
    pub fn with_max_pending_write_updates(mut self, max: usize) -> Self {
        self.max_pending_write_updates = max;
        self
    }

    /// Set the reply timeout. Rounded up to whole milliseconds; saturates
    /// at `u64::MAX` ms.
    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        let millis = timeout.as_nanos().div_ceil(1_000_000);
        self.reply_timeout_ms = u64::try_from(millis).unwrap_or(u64::MAX);
        self
    }

    /// Set the reply queue prefix.
    pub fn with_queue_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.queue_prefix = prefix.into();
        self
    }

    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), IndexError> {
        if self.max_pending_write_updates == 0 {
            return Err(IndexError::Argument(
                "max_pending_write_updates must be at least 1".into(),
            ));
        }
        if self.reply_timeout_ms == 0 {
            return Err(IndexError::Argument(
                "reply_timeout_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
