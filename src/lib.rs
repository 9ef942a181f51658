//! Client for a remote platefile tile index.
//!
//! A platefile is a pyramid of image tiles whose bytes live in a blob
//! store; the index maps `(col, row, level, transaction)` to the blob
//! location of each tile. `RemoteIndex` talks to an index service over a
//! request/response channel, buffering write updates and flushing them
//! before any call whose answer could depend on them.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use platefile_index::bus::InMemoryQueue;
//! use platefile_index::service::{IndexService, IndexServiceThread};
//! use platefile_index::{
//!     ChannelType, Index, IndexHeader, IndexRecord, PixelFormat, RemoteIndex, TileHeader,
//! };
//!
//! let queue = InMemoryQueue::new();
//! let server = IndexServiceThread::spawn(
//!     Arc::new(IndexService::new("/plates")),
//!     "orbit1",
//!     queue.clone(),
//!     Duration::from_millis(5),
//! );
//!
//! let header = IndexHeader::new(256, "png", PixelFormat::Rgba, ChannelType::Uint8);
//! let mut index = RemoteIndex::create("pf://orbit1/mars.plate", header, &queue).unwrap();
//!
//! let tx = index.transaction_request("first pass", None).unwrap();
//! index
//!     .write_update(TileHeader::new(0, 0, 0, tx, "png"), IndexRecord::new(1, 0, 4096))
//!     .unwrap();
//!
//! // Reads flush buffered writes first.
//! let record = index.read_request(0, 0, 0, tx, true).unwrap();
//! assert_eq!(record.block_size, 4096);
//!
//! index.transaction_complete(tx, true).unwrap();
//! assert_eq!(index.transaction_cursor().unwrap(), tx);
//!
//! drop(index);
//! server.stop();
//! ```

pub mod bus;
pub mod rpc;
pub mod service;

mod config;
mod endpoint;
mod error;
mod index;
mod types;

pub use config::ClientConfig;
pub use endpoint::Endpoint;
pub use error::IndexError;
pub use index::{Index, RemoteIndex, WriteQueue};
pub use types::{
    BlobId, ChannelType, IndexHeader, IndexRecord, PixelFormat, PlatefileId, PlatefileIdentity,
    RecordStatus, TileCoordinate, TileHeader, TileRegion, TransactionId, WriteUpdate,
    CURSOR_TRANSACTION,
};
