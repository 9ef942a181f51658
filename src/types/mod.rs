//! Data model shared by the client, the wire protocol, and the service.

mod header;
mod tile;

pub use header::{ChannelType, IndexHeader, PixelFormat, PlatefileIdentity};
pub use tile::{IndexRecord, RecordStatus, TileCoordinate, TileHeader, TileRegion, WriteUpdate};

/// Identifier the remote service assigns to a platefile at open/create time.
pub type PlatefileId = i32;

/// Monotonically assigned version stamp for a unit of mosaicking work.
pub type TransactionId = i32;

/// Identifier of a blob in the companion blob store.
pub type BlobId = i32;

/// Read at whatever the service's transaction cursor currently is.
pub const CURSOR_TRANSACTION: TransactionId = -1;
