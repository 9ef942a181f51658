use platefile_index::{ClientConfig, Index};

use crate::support::{record, tile, Harness};

#[test]
fn updates_are_sent_in_threshold_batches() {
    let harness = Harness::start();
    let mut index = harness.create("mars.plate");

    for i in 0..25 {
        index.write_update(tile(i, 0, 5, 1), record(1, i as u64 * 1024)).unwrap();
        assert!(index.pending_write_updates() < 10);
    }
    assert_eq!(harness.batch_sizes(), vec![10, 10]);
    assert_eq!(index.pending_write_updates(), 5);

    index.flush_write_queue().unwrap();
    assert_eq!(harness.batch_sizes(), vec![10, 10, 5]);

    index.flush_write_queue().unwrap();
    assert_eq!(harness.batch_sizes(), vec![10, 10, 5]);
}

#[test]
fn configured_threshold_is_honored() {
    let harness = Harness::start();
    let config = ClientConfig::new().with_max_pending_write_updates(4);
    let mut index = harness.create_with_config("mars.plate", config);

    for i in 0..9 {
        index.write_update(tile(i, 0, 1, 1), record(1, 0)).unwrap();
    }
    assert_eq!(harness.batch_sizes(), vec![4, 4]);
    assert_eq!(index.pending_write_updates(), 1);
}

#[test]
fn dropping_the_client_flushes() {
    let harness = Harness::start();
    {
        let mut index = harness.create("mars.plate");
        index.write_update(tile(1, 2, 3, 1), record(4, 0)).unwrap();
    }
    assert_eq!(harness.batch_sizes(), vec![1]);

    let mut reader = harness.open("mars.plate");
    assert_eq!(reader.read_request(1, 2, 3, 1, true).unwrap(), record(4, 0));
}

#[test]
fn blob_reservation_round_trip() {
    let harness = Harness::start();
    let mut index = harness.create("mars.plate");

    let first = index.write_request(4096).unwrap();
    let second = index.write_request(4096).unwrap();
    assert_ne!(first, second);

    index.write_update(tile(0, 0, 0, 1), record(first, 0)).unwrap();
    index.write_complete(first, 4096).unwrap();
    assert_eq!(index.pending_write_updates(), 0);
    assert_eq!(harness.batch_sizes(), vec![1]);

    assert!(index.write_complete(first, 4096).unwrap_err().is_not_found());
    index.write_complete(second, 0).unwrap();
}

#[test]
fn write_request_does_not_flush() {
    let harness = Harness::start();
    let mut index = harness.create("mars.plate");

    index.write_update(tile(0, 0, 0, 1), record(1, 0)).unwrap();
    index.write_request(512).unwrap();
    assert_eq!(index.pending_write_updates(), 1);
    assert!(harness.batch_sizes().is_empty());
}

#[test]
fn clients_of_different_platefiles_do_not_mix() {
    let harness = Harness::start();
    let mut mars = harness.create("mars.plate");
    let mut moon = harness.create("moon.plate");
    assert_ne!(mars.platefile_id(), moon.platefile_id());

    mars.write_update(tile(0, 0, 0, 1), record(1, 0)).unwrap();
    mars.flush_write_queue().unwrap();

    assert!(moon.read_request(0, 0, 0, 1, false).unwrap_err().is_not_found());
    assert_eq!(moon.num_levels().unwrap(), 0);
    assert_eq!(mars.num_levels().unwrap(), 1);
}
