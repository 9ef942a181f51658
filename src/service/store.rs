//! Per-platefile state held by the in-process index service.

use std::collections::{BTreeMap, BTreeSet};

use crate::rpc::{FaultKind, RemoteFault};
use crate::types::{
    BlobId, IndexHeader, IndexRecord, TileCoordinate, TileHeader, TileRegion, TransactionId,
    WriteUpdate,
};

/// Lifecycle of a transaction id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Active,
    Completed,
    Failed,
}

#[derive(Debug, Clone)]
struct Transaction {
    description: String,
    state: TransactionState,
}

#[derive(Debug, Clone)]
struct TileEntry {
    header: TileHeader,
    record: IndexRecord,
}

/// Records, transactions, and blob reservations of one platefile.
///
/// Records written under a failed transaction stay stored but are hidden
/// from every read.
#[derive(Debug)]
pub struct PlatefileStore {
    header: IndexHeader,
    short_name: String,
    full_name: String,
    tiles: BTreeMap<TileCoordinate, BTreeMap<TransactionId, TileEntry>>,
    transactions: BTreeMap<TransactionId, Transaction>,
    next_transaction_id: TransactionId,
    read_cursor: TransactionId,
    reserved_blobs: BTreeSet<BlobId>,
    next_blob_id: BlobId,
}

impl PlatefileStore {
    pub fn new(header: IndexHeader, short_name: String, full_name: String) -> Self {
        Self {
            header,
            short_name,
            full_name,
            tiles: BTreeMap::new(),
            transactions: BTreeMap::new(),
            next_transaction_id: 1,
            read_cursor: 0,
            reserved_blobs: BTreeSet::new(),
            next_blob_id: 0,
        }
    }

    pub fn header(&self) -> &IndexHeader {
        &self.header
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn read_cursor(&self) -> TransactionId {
        self.read_cursor
    }

    pub fn transaction_state(&self, id: TransactionId) -> Option<TransactionState> {
        self.transactions.get(&id).map(|t| t.state)
    }

    pub fn transaction_description(&self, id: TransactionId) -> Option<&str> {
        self.transactions.get(&id).map(|t| t.description.as_str())
    }

    fn visible(&self, id: TransactionId) -> bool {
        self.transaction_state(id) != Some(TransactionState::Failed)
    }

    pub fn apply(&mut self, update: WriteUpdate) {
        let WriteUpdate { header, record, .. } = update;
        self.tiles
            .entry(header.coordinate())
            .or_default()
            .insert(header.transaction_id, TileEntry { header, record });
    }

    /// Negative `transaction_id` reads at the read cursor.
    pub fn read(
        &self,
        coordinate: TileCoordinate,
        transaction_id: TransactionId,
        exact: bool,
    ) -> Result<IndexRecord, RemoteFault> {
        let target = if transaction_id < 0 {
            self.read_cursor
        } else {
            transaction_id
        };

        let found = self.tiles.get(&coordinate).and_then(|history| {
            if exact {
                history.get(&target).filter(|_| self.visible(target))
            } else {
                history
                    .range(..=target)
                    .rev()
                    .find(|(id, _)| self.visible(**id))
                    .map(|(_, entry)| entry)
            }
        });

        found.map(|entry| entry.record.clone()).ok_or_else(|| {
            RemoteFault::new(
                FaultKind::TileNotFound,
                format!(
                    "no record for col={} row={} level={} at transaction {}",
                    coordinate.col, coordinate.row, coordinate.level, target
                ),
            )
        })
    }

    pub fn multi_read(
        &self,
        coordinate: TileCoordinate,
        begin: TransactionId,
        end: TransactionId,
    ) -> Vec<(TransactionId, IndexRecord)> {
        if begin > end {
            return Vec::new();
        }
        self.tiles
            .get(&coordinate)
            .map(|history| {
                history
                    .range(begin..=end)
                    .filter(|(id, _)| self.visible(**id))
                    .map(|(id, entry)| (*id, entry.record.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// For each tile in `region` with at least `min_num_matches` visible
    /// records in `[begin, end]`, the header of its newest matching record.
    pub fn valid_tiles(
        &self,
        level: i32,
        region: TileRegion,
        begin: TransactionId,
        end: TransactionId,
        min_num_matches: u32,
    ) -> Vec<TileHeader> {
        if begin > end {
            return Vec::new();
        }
        self.tiles
            .iter()
            .filter(|(coord, _)| coord.level == level && region.contains(coord.col, coord.row))
            .filter_map(|(_, history)| {
                let matches: Vec<&TileEntry> = history
                    .range(begin..=end)
                    .filter(|(id, _)| self.visible(**id))
                    .map(|(_, entry)| entry)
                    .collect();
                let newest = matches.last()?;
                (matches.len() as u64 >= u64::from(min_num_matches)).then(|| newest.header.clone())
            })
            .collect()
    }

    pub fn num_levels(&self) -> i32 {
        self.tiles
            .keys()
            .map(|coord| coord.level.saturating_add(1).max(0))
            .max()
            .unwrap_or(0)
    }

    pub fn reserve_blob(&mut self) -> Result<BlobId, RemoteFault> {
        let blob_id = self.next_blob_id;
        self.next_blob_id = blob_id
            .checked_add(1)
            .ok_or_else(|| RemoteFault::rejected("blob ids exhausted"))?;
        self.reserved_blobs.insert(blob_id);
        Ok(blob_id)
    }

    pub fn release_blob(&mut self, blob_id: BlobId) -> Result<(), RemoteFault> {
        if self.reserved_blobs.remove(&blob_id) {
            Ok(())
        } else {
            Err(RemoteFault::not_found(format!(
                "blob {} is not reserved",
                blob_id
            )))
        }
    }

    pub fn begin_transaction(
        &mut self,
        description: String,
        override_id: Option<TransactionId>,
    ) -> Result<TransactionId, RemoteFault> {
        let id = match override_id {
            Some(id) if id < 0 => {
                return Err(RemoteFault::malformed(format!(
                    "transaction id override {} is negative",
                    id
                )))
            }
            Some(id) if self.transactions.contains_key(&id) => {
                return Err(RemoteFault::rejected(format!(
                    "transaction id {} is already in use",
                    id
                )))
            }
            Some(id) => id,
            None => self.next_transaction_id,
        };

        let following = id.checked_add(1).ok_or_else(|| {
            RemoteFault::malformed(format!("transaction id {} leaves no successor", id))
        })?;
        self.next_transaction_id = self.next_transaction_id.max(following);
        self.transactions.insert(
            id,
            Transaction {
                description,
                state: TransactionState::Active,
            },
        );
        Ok(id)
    }

    pub fn complete_transaction(
        &mut self,
        id: TransactionId,
        update_read_cursor: bool,
    ) -> Result<(), RemoteFault> {
        self.finish(id, TransactionState::Completed)?;
        if update_read_cursor {
            self.read_cursor = self.read_cursor.max(id);
        }
        Ok(())
    }

    pub fn fail_transaction(&mut self, id: TransactionId) -> Result<(), RemoteFault> {
        self.finish(id, TransactionState::Failed)
    }

    fn finish(&mut self, id: TransactionId, state: TransactionState) -> Result<(), RemoteFault> {
        let transaction = self
            .transactions
            .get_mut(&id)
            .ok_or_else(|| RemoteFault::not_found(format!("unknown transaction {}", id)))?;
        if transaction.state != TransactionState::Active {
            return Err(RemoteFault::rejected(format!(
                "transaction {} is already {:?}",
                id, transaction.state
            )));
        }
        transaction.state = state;
        Ok(())
    }
}
