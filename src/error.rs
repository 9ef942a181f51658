//! Error type shared by every index operation.

use thiserror::Error;

use crate::bus::BusError;
use crate::types::TransactionId;

/// Errors surfaced by the index client and its collaborators.
///
/// Every remote call is synchronous, so each error is returned by the call
/// that triggered it. Nothing is retried automatically.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Malformed endpoint string or invalid configuration value.
    #[error("invalid argument: {0}")]
    Argument(String),

    /// The named platefile, transaction, or blob does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// No record exists for the tile under the requested transaction constraints.
    #[error("tile not found: col={col} row={row} level={level} transaction={transaction_id}")]
    TileNotFound {
        col: i32,
        row: i32,
        level: i32,
        transaction_id: TransactionId,
    },

    /// The remote service rejected the request or reported a fault.
    #[error("remote error: {0}")]
    Remote(String),

    /// The transport failed to deliver the request or the reply.
    #[error("transport error: {0}")]
    Transport(#[from] BusError),

    /// A request or reply payload could not be encoded or decoded, or the
    /// reply did not match the request.
    #[error("codec error: {0}")]
    Codec(String),
}

impl IndexError {
    /// True for absence conditions callers are expected to handle as a
    /// normal branch.
    pub fn is_not_found(&self) -> bool {
        matches!(self, IndexError::NotFound(_) | IndexError::TileNotFound { .. })
    }
}

impl From<bitcode::Error> for IndexError {
    fn from(err: bitcode::Error) -> Self {
        IndexError::Codec(err.to_string())
    }
}
