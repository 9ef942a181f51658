use platefile_index::{Index, IndexError};

use crate::support::{record, tile, Harness};

#[test]
fn transaction_ids_increase() {
    let harness = Harness::start();
    let mut index = harness.create("mars.plate");

    let ids: Vec<i32> = (0..5)
        .map(|i| index.transaction_request(&format!("pass {}", i), None).unwrap())
        .collect();
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]), "ids {:?}", ids);
}

#[test]
fn completing_with_cursor_update_advances_cursor() {
    let harness = Harness::start();
    let mut index = harness.create("mars.plate");

    let tx = index.transaction_request("replay", Some(42)).unwrap();
    assert_eq!(tx, 42);
    index.write_update(tile(0, 0, 0, tx), record(1, 0)).unwrap();

    index.transaction_complete(tx, true).unwrap();
    assert_eq!(index.pending_write_updates(), 0);
    assert!(index.transaction_cursor().unwrap() >= 42);
}

#[test]
fn completing_without_cursor_update_leaves_cursor() {
    let harness = Harness::start();
    let mut index = harness.create("mars.plate");

    let before = index.transaction_cursor().unwrap();
    let tx = index.transaction_request("quiet", None).unwrap();
    index.transaction_complete(tx, false).unwrap();
    assert_eq!(index.transaction_cursor().unwrap(), before);
}

#[test]
fn reused_override_is_rejected() {
    let harness = Harness::start();
    let mut index = harness.create("mars.plate");

    index.transaction_request("first", Some(42)).unwrap();
    match index.transaction_request("again", Some(42)) {
        Err(IndexError::Remote(message)) => assert!(message.contains("42"), "{}", message),
        other => panic!("unexpected result {:?}", other),
    }

    let next = index.transaction_request("next", None).unwrap();
    assert!(next > 42);
}

#[test]
fn failed_transaction_is_hidden_from_reads() {
    let harness = Harness::start();
    let mut index = harness.create("mars.plate");

    let good = index.transaction_request("good", None).unwrap();
    let bad = index.transaction_request("bad", None).unwrap();
    index.write_update(tile(0, 0, 0, good), record(1, 0)).unwrap();
    index.write_update(tile(0, 0, 0, bad), record(2, 0)).unwrap();

    index.transaction_failed(bad).unwrap();
    assert_eq!(index.pending_write_updates(), 0);
    assert_eq!(index.read_request(0, 0, 0, bad, false).unwrap(), record(1, 0));

    let history = index.multi_read_request(0, 0, 0, 0, bad).unwrap();
    assert_eq!(history, vec![(good, record(1, 0))]);
}

#[test]
fn unknown_transaction_is_not_found() {
    let harness = Harness::start();
    let mut index = harness.create("mars.plate");
    assert!(index.transaction_complete(999, true).unwrap_err().is_not_found());
    assert!(index.transaction_failed(999).unwrap_err().is_not_found());
}

#[test]
fn transaction_cursor_does_not_flush() {
    let harness = Harness::start();
    let mut index = harness.create("mars.plate");

    index.write_update(tile(0, 0, 0, 1), record(1, 0)).unwrap();
    index.transaction_cursor().unwrap();
    index.transaction_request("later", None).unwrap();
    assert_eq!(index.pending_write_updates(), 1);
    assert!(harness.batch_sizes().is_empty());
}

#[test]
fn override_at_max_id_fails_and_service_stays_up() {
    let harness = Harness::start();
    let mut index = harness.create("mars.plate");

    match index.transaction_request("edge", Some(i32::MAX)) {
        Err(IndexError::Remote(_)) => {}
        other => panic!("unexpected result {:?}", other),
    }
    assert_eq!(index.transaction_cursor().unwrap(), 0);
    assert_eq!(index.transaction_request("next", None).unwrap(), 1);
}

#[test]
fn extreme_level_write_keeps_service_answering() {
    let harness = Harness::start();
    let mut index = harness.create("mars.plate");

    index.write_update(tile(0, 0, i32::MAX, 1), record(1, 0)).unwrap();
    assert_eq!(index.num_levels().unwrap(), i32::MAX);

    let mut other = harness.create("moon.plate");
    assert_eq!(other.num_levels().unwrap(), 0);
}
