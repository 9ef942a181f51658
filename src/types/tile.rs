use serde::{Deserialize, Serialize};

use super::{BlobId, PlatefileId, TransactionId};

/// Position of a tile in the power-of-two pyramid. Range checks are left
/// to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoordinate {
    pub col: i32,
    pub row: i32,
    pub level: i32,
}

impl TileCoordinate {
    pub fn new(col: i32, row: i32, level: i32) -> Self {
        Self { col, row, level }
    }
}

/// Rectangular block of tiles at one level: `width` columns starting at
/// `col`, `height` rows starting at `row`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRegion {
    pub col: i32,
    pub row: i32,
    pub width: i32,
    pub height: i32,
}

impl TileRegion {
    pub fn new(col: i32, row: i32, width: i32, height: i32) -> Self {
        Self {
            col,
            row,
            width,
            height,
        }
    }

    /// Region spanning `[min_col, max_col) x [min_row, max_row)`. Extents
    /// wider than `i32::MAX` saturate; inverted corners give an empty region.
    pub fn from_corners(min_col: i32, min_row: i32, max_col: i32, max_row: i32) -> Self {
        Self::new(
            min_col,
            min_row,
            extent(min_col, max_col),
            extent(min_row, max_row),
        )
    }

    pub fn contains(&self, col: i32, row: i32) -> bool {
        let (col, row) = (i64::from(col), i64::from(row));
        let (min_col, min_row) = (i64::from(self.col), i64::from(self.row));
        col >= min_col
            && col < min_col + i64::from(self.width)
            && row >= min_row
            && row < min_row + i64::from(self.height)
    }
}

fn extent(min: i32, max: i32) -> i32 {
    let span = (i64::from(max) - i64::from(min)).max(0);
    i32::try_from(span).unwrap_or(i32::MAX)
}

/// Descriptive metadata about one tile, supplied by the writer and stored
/// verbatim by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileHeader {
    pub col: i32,
    pub row: i32,
    pub level: i32,
    pub transaction_id: TransactionId,
    pub filetype: String,
}

impl TileHeader {
    pub fn new(
        col: i32,
        row: i32,
        level: i32,
        transaction_id: TransactionId,
        filetype: impl Into<String>,
    ) -> Self {
        Self {
            col,
            row,
            level,
            transaction_id,
            filetype: filetype.into(),
        }
    }

    pub fn coordinate(&self) -> TileCoordinate {
        TileCoordinate::new(self.col, self.row, self.level)
    }
}

/// Whether a record points at usable tile bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RecordStatus {
    #[default]
    Valid,
    Invalid,
}

/// Where a tile's bytes live in the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IndexRecord {
    pub blob_id: BlobId,
    pub blob_offset: u64,
    pub block_size: u64,
    pub status: RecordStatus,
}

impl IndexRecord {
    pub fn new(blob_id: BlobId, blob_offset: u64, block_size: u64) -> Self {
        Self {
            blob_id,
            blob_offset,
            block_size,
            status: RecordStatus::Valid,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status == RecordStatus::Valid
    }
}

/// One buffered index update, stamped with the platefile it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteUpdate {
    pub platefile_id: PlatefileId,
    pub header: TileHeader,
    pub record: IndexRecord,
}
