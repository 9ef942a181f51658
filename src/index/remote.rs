//! `RemoteIndex`: index client that talks to the service through a
//! `CallChannel`.

use tracing::{debug, info, warn};

use crate::bus::unique_queue_name;
use crate::config::ClientConfig;
use crate::endpoint::Endpoint;
use crate::error::IndexError;
use crate::rpc::{CallChannel, Connect, FaultKind, IndexReply, IndexRequest, Operation, RemoteFault};
use crate::types::{
    BlobId, IndexHeader, IndexRecord, PlatefileId, PlatefileIdentity, TileHeader, TileRegion,
    TransactionId, WriteUpdate,
};

use super::write_queue::WriteQueue;
use super::Index;

/// Client handle to one platefile held by the remote index service.
///
/// Construction performs the open/create round trip; a value of this type
/// always carries the identity and header the service assigned. Write
/// updates are buffered and sent in batches; every read-type call flushes
/// the buffer first so callers see their own writes. The buffer is also
/// flushed on drop.
///
/// Methods that may flush take `&mut self`. Share an instance across
/// threads by wrapping it in a `Mutex`.
///
/// ## Example
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use platefile_index::bus::InMemoryQueue;
/// use platefile_index::service::{IndexService, IndexServiceThread};
/// use platefile_index::{ChannelType, Index, IndexHeader, PixelFormat, RemoteIndex};
///
/// let queue = InMemoryQueue::new();
/// let service = Arc::new(IndexService::new("/plates"));
/// let server = IndexServiceThread::spawn(service, "orbit1", queue.clone(), Duration::from_millis(5));
///
/// let header = IndexHeader::new(256, "png", PixelFormat::Rgba, ChannelType::Uint8);
/// let mut index = RemoteIndex::create("pf://orbit1/mars.plate", header, &queue).unwrap();
/// assert_eq!(index.platefile_name(), "/plates/mars.plate");
/// assert_eq!(index.num_levels().unwrap(), 0);
///
/// drop(index);
/// server.stop();
/// ```
pub struct RemoteIndex<C: CallChannel> {
    channel: C,
    identity: PlatefileIdentity,
    header: IndexHeader,
    write_queue: WriteQueue,
}

impl<C: CallChannel> RemoteIndex<C> {
    /// Open an existing platefile at `url` with the default configuration.
    pub fn open<T>(url: &str, connector: &T) -> Result<Self, IndexError>
    where
        T: Connect<Channel = C>,
    {
        Self::open_with_config(url, connector, ClientConfig::default())
    }

    pub fn open_with_config<T>(
        url: &str,
        connector: &T,
        config: ClientConfig,
    ) -> Result<Self, IndexError>
    where
        T: Connect<Channel = C>,
    {
        config.validate()?;
        let endpoint = Endpoint::parse(url)?;
        let channel = connect(&endpoint, connector, &config)?;
        Self::open_on_channel(&endpoint.index_name, channel, config)
    }

    /// Open a platefile over an already established channel.
    pub fn open_on_channel(
        plate_name: &str,
        channel: C,
        config: ClientConfig,
    ) -> Result<Self, IndexError> {
        config.validate()?;
        let reply = channel.call(IndexRequest::Open {
            plate_name: plate_name.to_string(),
        })?;
        let index = Self::from_reply(channel, Operation::Open, reply, &config)?;

        info!(
            platefile = %index.identity.short_name,
            platefile_id = index.identity.platefile_id,
            "opened remote platefile"
        );
        Ok(index)
    }

    /// Create a new platefile at `url` with the default configuration.
    ///
    /// Any `platefile_id` in `header` is ignored; the service assigns one.
    pub fn create<T>(url: &str, header: IndexHeader, connector: &T) -> Result<Self, IndexError>
    where
        T: Connect<Channel = C>,
    {
        Self::create_with_config(url, header, connector, ClientConfig::default())
    }

    pub fn create_with_config<T>(
        url: &str,
        header: IndexHeader,
        connector: &T,
        config: ClientConfig,
    ) -> Result<Self, IndexError>
    where
        T: Connect<Channel = C>,
    {
        config.validate()?;
        let endpoint = Endpoint::parse(url)?;
        let channel = connect(&endpoint, connector, &config)?;
        Self::create_on_channel(&endpoint.index_name, header, channel, config)
    }

    /// Create a platefile over an already established channel.
    pub fn create_on_channel(
        plate_name: &str,
        mut header: IndexHeader,
        channel: C,
        config: ClientConfig,
    ) -> Result<Self, IndexError> {
        config.validate()?;
        header.platefile_id = None;
        let reply = channel.call(IndexRequest::Create {
            plate_name: plate_name.to_string(),
            header,
        })?;
        let index = Self::from_reply(channel, Operation::Create, reply, &config)?;

        info!(
            platefile = %index.identity.short_name,
            platefile_id = index.identity.platefile_id,
            "created remote platefile"
        );
        Ok(index)
    }

    fn from_reply(
        channel: C,
        operation: Operation,
        reply: IndexReply,
        config: &ClientConfig,
    ) -> Result<Self, IndexError> {
        match reply {
            IndexReply::Opened {
                header,
                short_name,
                full_name,
            } => {
                let platefile_id = header.platefile_id.ok_or_else(|| {
                    IndexError::Codec(format!("{} reply carried no platefile id", operation))
                })?;
                Ok(Self {
                    channel,
                    identity: PlatefileIdentity {
                        platefile_id,
                        short_name,
                        full_name,
                    },
                    header,
                    write_queue: WriteQueue::new(config.max_pending_write_updates),
                })
            }
            IndexReply::Fault(fault) => Err(fault_error(fault)),
            other => Err(unexpected(operation, &other)),
        }
    }

    pub fn identity(&self) -> &PlatefileIdentity {
        &self.identity
    }

    pub fn platefile_id(&self) -> PlatefileId {
        self.identity.platefile_id
    }

    /// Logical name the platefile was opened or created under.
    pub fn short_name(&self) -> &str {
        &self.identity.short_name
    }

    /// Number of write updates queued but not yet sent.
    pub fn pending_write_updates(&self) -> usize {
        self.write_queue.len()
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Issue a call, turning service faults into errors.
    fn call(&self, request: IndexRequest) -> Result<IndexReply, IndexError> {
        match self.channel.call(request)? {
            IndexReply::Fault(fault) => Err(fault_error(fault)),
            reply => Ok(reply),
        }
    }

    fn call_ack(&self, request: IndexRequest) -> Result<(), IndexError> {
        let operation = request.operation();
        match self.call(request)? {
            IndexReply::Ack => Ok(()),
            other => Err(unexpected(operation, &other)),
        }
    }
}

impl<C: CallChannel> Index for RemoteIndex<C> {
    fn index_header(&self) -> &IndexHeader {
        &self.header
    }

    fn platefile_name(&self) -> &str {
        &self.identity.full_name
    }

    fn read_request(
        &mut self,
        col: i32,
        row: i32,
        level: i32,
        transaction_id: TransactionId,
        exact_transaction_match: bool,
    ) -> Result<IndexRecord, IndexError> {
        self.flush_write_queue()?;

        let request = IndexRequest::Read {
            platefile_id: self.identity.platefile_id,
            col,
            row,
            level,
            transaction_id,
            exact_transaction_match,
        };
        match self.channel.call(request)? {
            IndexReply::Record(record) => Ok(record),
            IndexReply::Fault(fault) if fault.kind == FaultKind::TileNotFound => {
                Err(IndexError::TileNotFound {
                    col,
                    row,
                    level,
                    transaction_id,
                })
            }
            IndexReply::Fault(fault) => Err(fault_error(fault)),
            other => Err(unexpected(Operation::Read, &other)),
        }
    }

    fn multi_read_request(
        &mut self,
        col: i32,
        row: i32,
        level: i32,
        begin_transaction_id: TransactionId,
        end_transaction_id: TransactionId,
    ) -> Result<Vec<(TransactionId, IndexRecord)>, IndexError> {
        self.flush_write_queue()?;

        let request = IndexRequest::MultiRead {
            platefile_id: self.identity.platefile_id,
            col,
            row,
            level,
            begin_transaction_id,
            end_transaction_id,
        };
        match self.call(request)? {
            IndexReply::Records(records) => Ok(records),
            other => Err(unexpected(Operation::MultiRead, &other)),
        }
    }

    fn write_request(&mut self, size: u64) -> Result<BlobId, IndexError> {
        let request = IndexRequest::WriteRequest {
            platefile_id: self.identity.platefile_id,
            size,
        };
        match self.call(request)? {
            IndexReply::BlobId(blob_id) => Ok(blob_id),
            other => Err(unexpected(Operation::WriteRequest, &other)),
        }
    }

    fn write_update(&mut self, header: TileHeader, record: IndexRecord) -> Result<(), IndexError> {
        let update = WriteUpdate {
            platefile_id: self.identity.platefile_id,
            header,
            record,
        };
        if self.write_queue.push(update) {
            self.flush_write_queue()?;
        }
        Ok(())
    }

    fn write_complete(&mut self, blob_id: BlobId, blob_offset: u64) -> Result<(), IndexError> {
        self.flush_write_queue()?;

        self.call_ack(IndexRequest::WriteComplete {
            platefile_id: self.identity.platefile_id,
            blob_id,
            blob_offset,
        })
    }

    // Updates leave the queue before the batch is sent; a failed send
    // loses them and reports the error to the caller.
    fn flush_write_queue(&mut self) -> Result<(), IndexError> {
        let Some(updates) = self.write_queue.drain() else {
            return Ok(());
        };

        debug!(
            platefile_id = self.identity.platefile_id,
            count = updates.len(),
            "flushing write updates"
        );
        self.call_ack(IndexRequest::MultiWriteUpdate { updates })
    }

    fn valid_tiles(
        &mut self,
        level: i32,
        region: TileRegion,
        begin_transaction_id: TransactionId,
        end_transaction_id: TransactionId,
        min_num_matches: u32,
    ) -> Result<Vec<TileHeader>, IndexError> {
        self.flush_write_queue()?;

        let request = IndexRequest::ValidTiles {
            platefile_id: self.identity.platefile_id,
            level,
            region,
            begin_transaction_id,
            end_transaction_id,
            min_num_matches,
        };
        match self.call(request)? {
            IndexReply::TileHeaders(headers) => Ok(headers),
            other => Err(unexpected(Operation::ValidTiles, &other)),
        }
    }

    fn num_levels(&mut self) -> Result<i32, IndexError> {
        self.flush_write_queue()?;

        let request = IndexRequest::NumLevels {
            platefile_id: self.identity.platefile_id,
        };
        match self.call(request)? {
            IndexReply::NumLevels(levels) => Ok(levels),
            other => Err(unexpected(Operation::NumLevels, &other)),
        }
    }

    fn transaction_request(
        &mut self,
        description: &str,
        transaction_id_override: Option<TransactionId>,
    ) -> Result<TransactionId, IndexError> {
        let request = IndexRequest::TransactionRequest {
            platefile_id: self.identity.platefile_id,
            description: description.to_string(),
            transaction_id_override,
        };
        match self.call(request)? {
            IndexReply::TransactionId(id) => {
                debug!(transaction_id = id, description, "transaction started");
                Ok(id)
            }
            other => Err(unexpected(Operation::TransactionRequest, &other)),
        }
    }

    fn transaction_complete(
        &mut self,
        transaction_id: TransactionId,
        update_read_cursor: bool,
    ) -> Result<(), IndexError> {
        self.flush_write_queue()?;

        self.call_ack(IndexRequest::TransactionComplete {
            platefile_id: self.identity.platefile_id,
            transaction_id,
            update_read_cursor,
        })
    }

    fn transaction_failed(&mut self, transaction_id: TransactionId) -> Result<(), IndexError> {
        self.flush_write_queue()?;

        self.call_ack(IndexRequest::TransactionFailed {
            platefile_id: self.identity.platefile_id,
            transaction_id,
        })
    }

    fn transaction_cursor(&mut self) -> Result<TransactionId, IndexError> {
        let request = IndexRequest::TransactionCursor {
            platefile_id: self.identity.platefile_id,
        };
        match self.call(request)? {
            IndexReply::TransactionId(id) => Ok(id),
            other => Err(unexpected(Operation::TransactionCursor, &other)),
        }
    }
}

impl<C: CallChannel> Drop for RemoteIndex<C> {
    fn drop(&mut self) {
        let pending = self.write_queue.len();
        if let Err(e) = self.flush_write_queue() {
            warn!(
                platefile_id = self.identity.platefile_id,
                pending,
                error = %e,
                "failed to flush write updates on drop"
            );
        }
    }
}

fn connect<T: Connect>(
    endpoint: &Endpoint,
    connector: &T,
    config: &ClientConfig,
) -> Result<T::Channel, IndexError> {
    let reply_queue = unique_queue_name(&format!("{}{}", config.queue_prefix, endpoint.index_name));
    connector.connect(endpoint, &reply_queue, config)
}

fn fault_error(fault: RemoteFault) -> IndexError {
    match fault.kind {
        FaultKind::NotFound | FaultKind::TileNotFound => IndexError::NotFound(fault.message),
        FaultKind::Rejected | FaultKind::Malformed => IndexError::Remote(fault.message),
    }
}

fn unexpected(operation: Operation, reply: &IndexReply) -> IndexError {
    IndexError::Codec(format!("unexpected {} reply to {}", reply.kind(), operation))
}
