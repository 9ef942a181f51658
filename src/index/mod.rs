//! The index client: write buffering, read-your-writes flushing, and the
//! transaction lifecycle.
//!
//! ## Quick Start
//!
//! ```ignore
//! use platefile_index::{Index, RemoteIndex, TileHeader, IndexRecord, CURSOR_TRANSACTION};
//! use platefile_index::bus::InMemoryQueue;
//!
//! let queue = InMemoryQueue::new();
//! let mut index = RemoteIndex::open("pf://orbit1/mars.plate", &queue)?;
//!
//! let tx = index.transaction_request("mosaic-batch-1", None)?;
//! let blob = index.write_request(4096)?;
//! index.write_update(TileHeader::new(3, 4, 2, tx, "png"), IndexRecord::new(blob, 0, 4096))?;
//! index.write_complete(blob, 0)?;
//! index.transaction_complete(tx, true)?;
//!
//! let record = index.read_request(3, 4, 2, CURSOR_TRANSACTION, false)?;
//! ```

mod remote;
mod write_queue;

pub use remote::RemoteIndex;
pub use write_queue::WriteQueue;

use crate::error::IndexError;
use crate::types::{
    BlobId, ChannelType, IndexHeader, IndexRecord, PixelFormat, TileHeader, TileRegion,
    TransactionId,
};

/// Operations on a versioned tile index.
///
/// Every read-type operation observes all writes previously queued through
/// the same instance.
pub trait Index {
    fn index_header(&self) -> &IndexHeader;

    /// Full storage name of the platefile.
    fn platefile_name(&self) -> &str;

    fn version(&self) -> i32 {
        self.index_header().version
    }

    fn tile_size(&self) -> i32 {
        self.index_header().tile_size
    }

    fn tile_filetype(&self) -> &str {
        &self.index_header().tile_filetype
    }

    fn pixel_format(&self) -> PixelFormat {
        self.index_header().pixel_format
    }

    fn channel_type(&self) -> ChannelType {
        self.index_header().channel_type
    }

    /// The record for a tile visible at or before `transaction_id`, or
    /// exactly at it when `exact_transaction_match` is set. A negative
    /// transaction id reads at the service's transaction cursor.
    ///
    /// Absence is reported as `IndexError::TileNotFound`.
    fn read_request(
        &mut self,
        col: i32,
        row: i32,
        level: i32,
        transaction_id: TransactionId,
        exact_transaction_match: bool,
    ) -> Result<IndexRecord, IndexError>;

    /// Every record for a tile within `[begin_transaction_id, end_transaction_id]`,
    /// in the order the service returns them.
    fn multi_read_request(
        &mut self,
        col: i32,
        row: i32,
        level: i32,
        begin_transaction_id: TransactionId,
        end_transaction_id: TransactionId,
    ) -> Result<Vec<(TransactionId, IndexRecord)>, IndexError>;

    /// Reserve `size` bytes in the blob store. Returns the blob to write into.
    fn write_request(&mut self, size: u64) -> Result<BlobId, IndexError>;

    /// Queue an index update. Sent in batches.
    fn write_update(&mut self, header: TileHeader, record: IndexRecord) -> Result<(), IndexError>;

    /// Release a blob reserved by `write_request` once its bytes are written.
    fn write_complete(&mut self, blob_id: BlobId, blob_offset: u64) -> Result<(), IndexError>;

    /// Send every queued update as one batch. A no-op when nothing is queued.
    fn flush_write_queue(&mut self) -> Result<(), IndexError>;

    /// Headers of tiles in `region` at `level` having at least
    /// `min_num_matches` records within the transaction range.
    fn valid_tiles(
        &mut self,
        level: i32,
        region: TileRegion,
        begin_transaction_id: TransactionId,
        end_transaction_id: TransactionId,
        min_num_matches: u32,
    ) -> Result<Vec<TileHeader>, IndexError>;

    fn num_levels(&mut self) -> Result<i32, IndexError>;

    /// Start a transaction. `transaction_id_override` asks for a specific id
    /// (replay/recovery) and fails if that id is already in use.
    fn transaction_request(
        &mut self,
        description: &str,
        transaction_id_override: Option<TransactionId>,
    ) -> Result<TransactionId, IndexError>;

    fn transaction_complete(
        &mut self,
        transaction_id: TransactionId,
        update_read_cursor: bool,
    ) -> Result<(), IndexError>;

    fn transaction_failed(&mut self, transaction_id: TransactionId) -> Result<(), IndexError>;

    /// Highest transaction visible to default reads.
    fn transaction_cursor(&mut self) -> Result<TransactionId, IndexError>;
}
