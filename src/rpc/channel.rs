//! The call primitive the index client is built on.

use crate::config::ClientConfig;
use crate::endpoint::Endpoint;
use crate::error::IndexError;

use super::protocol::{IndexReply, IndexRequest};

/// Blocking request/response call to the index service.
///
/// Returns once a reply arrives or the transport gives up. Service faults
/// come back as `IndexReply::Fault`; `Err` is reserved for transport and
/// codec failures.
pub trait CallChannel {
    fn call(&self, request: IndexRequest) -> Result<IndexReply, IndexError>;
}

impl<C: CallChannel + ?Sized> CallChannel for Box<C> {
    fn call(&self, request: IndexRequest) -> Result<IndexReply, IndexError> {
        (**self).call(request)
    }
}

impl<C: CallChannel + ?Sized> CallChannel for std::sync::Arc<C> {
    fn call(&self, request: IndexRequest) -> Result<IndexReply, IndexError> {
        (**self).call(request)
    }
}

/// Opens call channels for resolved endpoints.
pub trait Connect {
    type Channel: CallChannel;

    /// Connect to `endpoint`, binding replies to `reply_queue`.
    fn connect(
        &self,
        endpoint: &Endpoint,
        reply_queue: &str,
        config: &ClientConfig,
    ) -> Result<Self::Channel, IndexError>;
}
