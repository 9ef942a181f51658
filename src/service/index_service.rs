//! Request dispatch for the in-process index service.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use super::store::PlatefileStore;
use crate::rpc::{IndexReply, IndexRequest, RemoteFault};
use crate::types::{IndexHeader, PlatefileId, TileCoordinate, WriteUpdate};

#[derive(Debug, Default)]
struct ServiceState {
    platefiles: BTreeMap<PlatefileId, PlatefileStore>,
    names: HashMap<String, PlatefileId>,
    next_platefile_id: PlatefileId,
}

impl ServiceState {
    fn store(&self, platefile_id: PlatefileId) -> Result<&PlatefileStore, RemoteFault> {
        self.platefiles
            .get(&platefile_id)
            .ok_or_else(|| unknown_platefile(platefile_id))
    }

    fn store_mut(&mut self, platefile_id: PlatefileId) -> Result<&mut PlatefileStore, RemoteFault> {
        self.platefiles
            .get_mut(&platefile_id)
            .ok_or_else(|| unknown_platefile(platefile_id))
    }
}

fn unknown_platefile(platefile_id: PlatefileId) -> RemoteFault {
    RemoteFault::not_found(format!("unknown platefile id {}", platefile_id))
}

/// Authoritative index for every platefile under one root directory.
///
/// Requests are handled one at a time under a single lock; the reply to a
/// request reflects every request handled before it.
#[derive(Debug)]
pub struct IndexService {
    root_directory: String,
    state: Mutex<ServiceState>,
}

impl IndexService {
    pub fn new(root_directory: impl Into<String>) -> Self {
        let root_directory = root_directory.into().trim_end_matches('/').to_string();
        Self {
            root_directory,
            state: Mutex::new(ServiceState {
                next_platefile_id: 1,
                ..ServiceState::default()
            }),
        }
    }

    pub fn root_directory(&self) -> &str {
        &self.root_directory
    }

    /// Short names of every platefile, sorted.
    pub fn platefile_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().names.keys().cloned().collect();
        names.sort();
        names
    }

    /// Handle one request. Failures come back as `IndexReply::Fault`.
    pub fn handle(&self, request: IndexRequest) -> IndexReply {
        let operation = request.operation();
        let mut state = self.lock();

        debug!(%operation, "handling index request");
        match self.dispatch(&mut state, request) {
            Ok(reply) => reply,
            Err(fault) => {
                debug!(%operation, kind = ?fault.kind, message = %fault.message, "request faulted");
                IndexReply::Fault(fault)
            }
        }
    }

    // Handlers validate before mutating; a poisoned guard still holds a
    // consistent state.
    fn lock(&self) -> MutexGuard<'_, ServiceState> {
        self.state.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            warn!("index state lock was poisoned; continuing with last state");
            poisoned.into_inner()
        })
    }

    fn dispatch(
        &self,
        state: &mut ServiceState,
        request: IndexRequest,
    ) -> Result<IndexReply, RemoteFault> {
        match request {
            IndexRequest::Open { plate_name } => {
                let id = *state
                    .names
                    .get(&plate_name)
                    .ok_or_else(|| RemoteFault::not_found(format!("no platefile named {}", plate_name)))?;
                Ok(opened(state.store(id)?))
            }
            IndexRequest::Create { plate_name, header } => {
                self.create(state, plate_name, header)
            }
            IndexRequest::Read {
                platefile_id,
                col,
                row,
                level,
                transaction_id,
                exact_transaction_match,
            } => state
                .store(platefile_id)?
                .read(
                    TileCoordinate::new(col, row, level),
                    transaction_id,
                    exact_transaction_match,
                )
                .map(IndexReply::Record),
            IndexRequest::MultiRead {
                platefile_id,
                col,
                row,
                level,
                begin_transaction_id,
                end_transaction_id,
            } => Ok(IndexReply::Records(state.store(platefile_id)?.multi_read(
                TileCoordinate::new(col, row, level),
                begin_transaction_id,
                end_transaction_id,
            ))),
            IndexRequest::WriteRequest { platefile_id, size } => {
                let store = state.store_mut(platefile_id)?;
                let blob_id = store.reserve_blob()?;
                debug!(platefile_id, blob_id, size, "reserved blob");
                Ok(IndexReply::BlobId(blob_id))
            }
            IndexRequest::MultiWriteUpdate { updates } => apply_updates(state, updates),
            IndexRequest::WriteComplete {
                platefile_id,
                blob_id,
                blob_offset,
            } => {
                state.store_mut(platefile_id)?.release_blob(blob_id)?;
                debug!(platefile_id, blob_id, blob_offset, "released blob");
                Ok(IndexReply::Ack)
            }
            IndexRequest::ValidTiles {
                platefile_id,
                level,
                region,
                begin_transaction_id,
                end_transaction_id,
                min_num_matches,
            } => Ok(IndexReply::TileHeaders(state.store(platefile_id)?.valid_tiles(
                level,
                region,
                begin_transaction_id,
                end_transaction_id,
                min_num_matches,
            ))),
            IndexRequest::NumLevels { platefile_id } => {
                Ok(IndexReply::NumLevels(state.store(platefile_id)?.num_levels()))
            }
            IndexRequest::TransactionRequest {
                platefile_id,
                description,
                transaction_id_override,
            } => {
                let store = state.store_mut(platefile_id)?;
                let id = store.begin_transaction(description, transaction_id_override)?;
                info!(platefile_id, transaction_id = id, "transaction started");
                Ok(IndexReply::TransactionId(id))
            }
            IndexRequest::TransactionComplete {
                platefile_id,
                transaction_id,
                update_read_cursor,
            } => {
                let store = state.store_mut(platefile_id)?;
                store.complete_transaction(transaction_id, update_read_cursor)?;
                info!(
                    platefile_id,
                    transaction_id,
                    read_cursor = store.read_cursor(),
                    "transaction complete"
                );
                Ok(IndexReply::Ack)
            }
            IndexRequest::TransactionFailed {
                platefile_id,
                transaction_id,
            } => {
                state.store_mut(platefile_id)?.fail_transaction(transaction_id)?;
                info!(platefile_id, transaction_id, "transaction failed");
                Ok(IndexReply::Ack)
            }
            IndexRequest::TransactionCursor { platefile_id } => {
                Ok(IndexReply::TransactionId(state.store(platefile_id)?.read_cursor()))
            }
        }
    }

    fn create(
        &self,
        state: &mut ServiceState,
        plate_name: String,
        mut header: IndexHeader,
    ) -> Result<IndexReply, RemoteFault> {
        if plate_name.is_empty() || plate_name.contains('/') {
            return Err(RemoteFault::malformed(format!(
                "invalid platefile name {:?}",
                plate_name
            )));
        }
        if header.tile_size <= 0 || !(header.tile_size as u32).is_power_of_two() {
            return Err(RemoteFault::malformed(format!(
                "tile size {} is not a positive power of two",
                header.tile_size
            )));
        }
        if state.names.contains_key(&plate_name) {
            return Err(RemoteFault::rejected(format!(
                "platefile {} already exists",
                plate_name
            )));
        }

        let id = state.next_platefile_id;
        state.next_platefile_id = id
            .checked_add(1)
            .ok_or_else(|| RemoteFault::rejected("platefile ids exhausted"))?;
        header.platefile_id = Some(id);

        let full_name = format!("{}/{}", self.root_directory, plate_name);
        info!(platefile_id = id, name = %full_name, "platefile created");

        let store = PlatefileStore::new(header, plate_name.clone(), full_name);
        let reply = opened(&store);
        state.names.insert(plate_name, id);
        state.platefiles.insert(id, store);
        Ok(reply)
    }
}

fn opened(store: &PlatefileStore) -> IndexReply {
    IndexReply::Opened {
        header: store.header().clone(),
        short_name: store.short_name().to_string(),
        full_name: store.full_name().to_string(),
    }
}

/// All-or-nothing: every update must name a known platefile before any is
/// applied.
fn apply_updates(
    state: &mut ServiceState,
    updates: Vec<WriteUpdate>,
) -> Result<IndexReply, RemoteFault> {
    if let Some(bad) = updates
        .iter()
        .find(|u| !state.platefiles.contains_key(&u.platefile_id))
    {
        return Err(unknown_platefile(bad.platefile_id));
    }

    let count = updates.len();
    for update in updates {
        state.store_mut(update.platefile_id)?.apply(update);
    }
    debug!(count, "applied write updates");
    Ok(IndexReply::Ack)
}
