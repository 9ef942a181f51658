//! Request and reply payloads exchanged with the index service.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{
    BlobId, IndexHeader, IndexRecord, PlatefileId, TileHeader, TileRegion, TransactionId,
    WriteUpdate,
};

/// Remote operations, named 1:1 with the index client's calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Open,
    Create,
    Read,
    MultiRead,
    WriteRequest,
    MultiWriteUpdate,
    WriteComplete,
    ValidTiles,
    NumLevels,
    TransactionRequest,
    TransactionComplete,
    TransactionFailed,
    TransactionCursor,
}

impl Operation {
    pub const ALL: [Operation; 13] = [
        Operation::Open,
        Operation::Create,
        Operation::Read,
        Operation::MultiRead,
        Operation::WriteRequest,
        Operation::MultiWriteUpdate,
        Operation::WriteComplete,
        Operation::ValidTiles,
        Operation::NumLevels,
        Operation::TransactionRequest,
        Operation::TransactionComplete,
        Operation::TransactionFailed,
        Operation::TransactionCursor,
    ];

    /// Message type used on the bus.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Open => "index.open",
            Operation::Create => "index.create",
            Operation::Read => "index.read",
            Operation::MultiRead => "index.multi_read",
            Operation::WriteRequest => "index.write_request",
            Operation::MultiWriteUpdate => "index.multi_write_update",
            Operation::WriteComplete => "index.write_complete",
            Operation::ValidTiles => "index.valid_tiles",
            Operation::NumLevels => "index.num_levels",
            Operation::TransactionRequest => "index.transaction_request",
            Operation::TransactionComplete => "index.transaction_complete",
            Operation::TransactionFailed => "index.transaction_failed",
            Operation::TransactionCursor => "index.transaction_cursor",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| format!("unknown index operation: {}", s))
    }
}

/// A request to the index service.
///
/// Every variant other than `Open` and `Create` carries the platefile id
/// the client was assigned at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IndexRequest {
    Open {
        plate_name: String,
    },
    Create {
        plate_name: String,
        header: IndexHeader,
    },
    Read {
        platefile_id: PlatefileId,
        col: i32,
        row: i32,
        level: i32,
        transaction_id: TransactionId,
        exact_transaction_match: bool,
    },
    MultiRead {
        platefile_id: PlatefileId,
        col: i32,
        row: i32,
        level: i32,
        begin_transaction_id: TransactionId,
        end_transaction_id: TransactionId,
    },
    WriteRequest {
        platefile_id: PlatefileId,
        size: u64,
    },
    MultiWriteUpdate {
        updates: Vec<WriteUpdate>,
    },
    WriteComplete {
        platefile_id: PlatefileId,
        blob_id: BlobId,
        blob_offset: u64,
    },
    ValidTiles {
        platefile_id: PlatefileId,
        level: i32,
        region: TileRegion,
        begin_transaction_id: TransactionId,
        end_transaction_id: TransactionId,
        min_num_matches: u32,
    },
    NumLevels {
        platefile_id: PlatefileId,
    },
    TransactionRequest {
        platefile_id: PlatefileId,
        description: String,
        transaction_id_override: Option<TransactionId>,
    },
    TransactionComplete {
        platefile_id: PlatefileId,
        transaction_id: TransactionId,
        update_read_cursor: bool,
    },
    TransactionFailed {
        platefile_id: PlatefileId,
        transaction_id: TransactionId,
    },
    TransactionCursor {
        platefile_id: PlatefileId,
    },
}

impl IndexRequest {
    pub fn operation(&self) -> Operation {
        match self {
            IndexRequest::Open { .. } => Operation::Open,
            IndexRequest::Create { .. } => Operation::Create,
            IndexRequest::Read { .. } => Operation::Read,
            IndexRequest::MultiRead { .. } => Operation::MultiRead,
            IndexRequest::WriteRequest { .. } => Operation::WriteRequest,
            IndexRequest::MultiWriteUpdate { .. } => Operation::MultiWriteUpdate,
            IndexRequest::WriteComplete { .. } => Operation::WriteComplete,
            IndexRequest::ValidTiles { .. } => Operation::ValidTiles,
            IndexRequest::NumLevels { .. } => Operation::NumLevels,
            IndexRequest::TransactionRequest { .. } => Operation::TransactionRequest,
            IndexRequest::TransactionComplete { .. } => Operation::TransactionComplete,
            IndexRequest::TransactionFailed { .. } => Operation::TransactionFailed,
            IndexRequest::TransactionCursor { .. } => Operation::TransactionCursor,
        }
    }
}

/// Kind of fault the service reports instead of a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultKind {
    /// Unknown platefile, transaction, or blob.
    NotFound,
    /// No record for the tile under the requested constraints.
    TileNotFound,
    /// The request conflicts with service state (duplicate name, reused
    /// transaction id, transaction already finalized).
    Rejected,
    /// The request itself is invalid (bad header, wrong platefile id).
    Malformed,
}

/// A fault reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFault {
    pub kind: FaultKind,
    pub message: String,
}

impl RemoteFault {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(FaultKind::NotFound, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Rejected, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Malformed, message)
    }
}

/// Message type the service stamps on every reply.
pub const REPLY_MESSAGE_TYPE: &str = "index.reply";

/// A reply from the index service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IndexReply {
    /// Reply to `Open` and `Create`.
    Opened {
        header: IndexHeader,
        short_name: String,
        full_name: String,
    },
    Record(IndexRecord),
    Records(Vec<(TransactionId, IndexRecord)>),
    BlobId(BlobId),
    TileHeaders(Vec<TileHeader>),
    NumLevels(i32),
    TransactionId(TransactionId),
    Ack,
    Fault(RemoteFault),
}

impl IndexReply {
    /// Short variant name, used in mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            IndexReply::Opened { .. } => "opened",
            IndexReply::Record(_) => "record",
            IndexReply::Records(_) => "records",
            IndexReply::BlobId(_) => "blob id",
            IndexReply::TileHeaders(_) => "tile headers",
            IndexReply::NumLevels(_) => "level count",
            IndexReply::TransactionId(_) => "transaction id",
            IndexReply::Ack => "ack",
            IndexReply::Fault(_) => "fault",
        }
    }
}
