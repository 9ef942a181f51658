//! In-process index service.
//!
//! `IndexService` holds the authoritative index for a set of platefiles
//! and answers `IndexRequest`s directly via `handle()`.
//! `IndexServiceThread` serves it on a bus queue so that `RemoteIndex`
//! clients can reach it through a `BusChannel`.
//!
//! ## Behavior
//!
//! - Platefile and transaction ids are assigned in increasing order.
//! - Reads with a negative transaction id read at the read cursor.
//! - Records written under a failed transaction are never returned.
//! - `num_levels` is one more than the deepest level holding a record.

mod index_service;
mod store;
mod thread;

pub use index_service::IndexService;
pub use store::{PlatefileStore, TransactionState};
pub use thread::{IndexServiceThread, ServiceStats};
