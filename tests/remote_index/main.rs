//! RemoteIndex integration tests.
//!
//! Every test runs a `RemoteIndex` against a live `IndexServiceThread`
//! over an `InMemoryQueue`:
//! - Reads and queries see buffered writes
//! - Write batching and blob reservations
//! - Transaction lifecycle and the read cursor

mod support;
mod reads;
mod transactions;
mod writes;
