#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use platefile_index::bus::InMemoryQueue;
use platefile_index::rpc::{BusChannel, IndexRequest};
use platefile_index::service::{IndexService, IndexServiceThread};
use platefile_index::{
    ChannelType, ClientConfig, IndexHeader, IndexRecord, PixelFormat, RemoteIndex, TileHeader,
    TransactionId,
};

pub const ROUTING_KEY: &str = "orbit1";

pub type BusIndex = RemoteIndex<BusChannel<InMemoryQueue>>;

/// A running service plus the queue clients reach it through.
pub struct Harness {
    pub queue: InMemoryQueue,
    pub service: Arc<IndexService>,
    pub server: Option<IndexServiceThread>,
}

impl Harness {
    pub fn start() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();

        let queue = InMemoryQueue::new();
        let service = Arc::new(IndexService::new("/plates"));
        let server = IndexServiceThread::spawn(
            service.clone(),
            ROUTING_KEY,
            queue.clone(),
            Duration::from_millis(2),
        );
        Self {
            queue,
            service,
            server: Some(server),
        }
    }

    pub fn url(name: &str) -> String {
        format!("pf://{}/{}", ROUTING_KEY, name)
    }

    pub fn create(&self, name: &str) -> BusIndex {
        RemoteIndex::create(&Self::url(name), header(), &self.queue).unwrap()
    }

    pub fn create_with_config(&self, name: &str, config: ClientConfig) -> BusIndex {
        RemoteIndex::create_with_config(&Self::url(name), header(), &self.queue, config).unwrap()
    }

    pub fn open(&self, name: &str) -> BusIndex {
        RemoteIndex::open(&Self::url(name), &self.queue).unwrap()
    }

    /// Batches the service has received so far, by size.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.queue
            .history()
            .into_iter()
            .filter(|(queue, msg)| queue == ROUTING_KEY && msg.message_type == "index.multi_write_update")
            .map(|(_, msg)| match msg.decode::<IndexRequest>().unwrap() {
                IndexRequest::MultiWriteUpdate { updates } => updates.len(),
                other => panic!("unexpected request {:?}", other),
            })
            .collect()
    }

    /// Operation names sent to the service, in order.
    pub fn operations(&self) -> Vec<String> {
        self.queue
            .history()
            .into_iter()
            .filter(|(queue, _)| queue == ROUTING_KEY)
            .map(|(_, msg)| msg.message_type)
            .collect()
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        if let Some(server) = self.server.take() {
            server.stop();
        }
    }
}

pub fn header() -> IndexHeader {
    IndexHeader::new(256, "png", PixelFormat::Rgba, ChannelType::Uint8)
}

pub fn tile(col: i32, row: i32, level: i32, transaction_id: TransactionId) -> TileHeader {
    TileHeader::new(col, row, level, transaction_id, "png")
}

pub fn record(blob_id: i32, offset: u64) -> IndexRecord {
    IndexRecord::new(blob_id, offset, 1024)
}
