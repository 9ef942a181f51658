use platefile_index::{Index, IndexError, TileRegion, CURSOR_TRANSACTION};

use crate::support::{record, tile, Harness};

#[test]
fn open_reads_back_created_platefile() {
    let harness = Harness::start();
    let created = harness.create("mars.plate");
    let opened = harness.open("mars.plate");

    assert_eq!(opened.platefile_id(), created.platefile_id());
    assert_eq!(opened.platefile_name(), "/plates/mars.plate");
    assert_eq!(opened.short_name(), "mars.plate");
    assert_eq!(opened.tile_size(), 256);
    assert_eq!(opened.tile_filetype(), "png");
}

#[test]
fn open_unknown_platefile_is_not_found() {
    let harness = Harness::start();
    let err = platefile_index::RemoteIndex::open(&Harness::url("venus.plate"), &harness.queue)
        .err()
        .unwrap();
    assert!(err.is_not_found(), "unexpected error {:?}", err);
}

#[test]
fn read_sees_buffered_writes() {
    let harness = Harness::start();
    let mut index = harness.create("mars.plate");

    index.write_update(tile(3, 4, 2, 7), record(11, 0)).unwrap();
    index.write_update(tile(3, 5, 2, 7), record(11, 1024)).unwrap();
    assert_eq!(index.pending_write_updates(), 2);
    assert!(harness.batch_sizes().is_empty());

    let found = index.read_request(3, 4, 2, 7, false).unwrap();
    assert_eq!(found, record(11, 0));
    assert_eq!(index.pending_write_updates(), 0);
    assert_eq!(harness.batch_sizes(), vec![2]);

    let ops = harness.operations();
    let flush = ops.iter().position(|op| op == "index.multi_write_update").unwrap();
    let read = ops.iter().position(|op| op == "index.read").unwrap();
    assert!(flush < read);
}

#[test]
fn read_miss_reports_the_tile() {
    let harness = Harness::start();
    let mut index = harness.create("mars.plate");

    match index.read_request(3, 4, 2, 0, false) {
        Err(IndexError::TileNotFound {
            col,
            row,
            level,
            transaction_id,
        }) => assert_eq!((col, row, level, transaction_id), (3, 4, 2, 0)),
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn exact_match_and_latest_at_or_before() {
    let harness = Harness::start();
    let mut index = harness.create("mars.plate");

    index.write_update(tile(0, 0, 1, 5), record(1, 0)).unwrap();
    index.write_update(tile(0, 0, 1, 9), record(2, 0)).unwrap();

    assert_eq!(index.read_request(0, 0, 1, 8, false).unwrap().blob_id, 1);
    assert_eq!(index.read_request(0, 0, 1, 100, false).unwrap().blob_id, 2);
    assert!(index.read_request(0, 0, 1, 8, true).unwrap_err().is_not_found());
}

#[test]
fn multi_read_returns_history_in_range() {
    let harness = Harness::start();
    let mut index = harness.create("mars.plate");

    for tx in [2, 4, 6, 8] {
        index.write_update(tile(1, 1, 1, tx), record(tx, 0)).unwrap();
    }

    let history = index.multi_read_request(1, 1, 1, 3, 7).unwrap();
    let ids: Vec<i32> = history.iter().map(|(tx, _)| *tx).collect();
    assert_eq!(ids, vec![4, 6]);
    assert!(index.multi_read_request(1, 1, 1, 9, 20).unwrap().is_empty());
}

#[test]
fn valid_tiles_filters_by_region_range_and_matches() {
    let harness = Harness::start();
    let mut index = harness.create("mars.plate");

    index.write_update(tile(2, 3, 5, 12), record(1, 0)).unwrap();
    index.write_update(tile(2, 3, 5, 40), record(2, 0)).unwrap();
    index.write_update(tile(4, 4, 5, 20), record(3, 0)).unwrap();
    index.write_update(tile(12, 1, 5, 20), record(4, 0)).unwrap();
    index.write_update(tile(12, 1, 5, 30), record(5, 0)).unwrap();

    let region = TileRegion::from_corners(0, 0, 10, 10);
    let tiles = index.valid_tiles(5, region, 10, 50, 2).unwrap();
    assert_eq!(tiles, vec![tile(2, 3, 5, 40)]);

    let tiles = index.valid_tiles(5, region, 10, 50, 1).unwrap();
    assert_eq!(tiles.len(), 2);
    assert!(index.valid_tiles(4, region, 10, 50, 1).unwrap().is_empty());
}

#[test]
fn num_levels_tracks_deepest_level() {
    let harness = Harness::start();
    let mut index = harness.create("mars.plate");
    assert_eq!(index.num_levels().unwrap(), 0);

    index.write_update(tile(0, 0, 0, 1), record(1, 0)).unwrap();
    index.write_update(tile(9, 9, 6, 1), record(1, 1024)).unwrap();
    assert_eq!(index.num_levels().unwrap(), 7);
}

#[test]
fn cursor_reads_only_see_published_transactions() {
    let harness = Harness::start();
    let mut index = harness.create("mars.plate");

    let tx = index.transaction_request("draft", None).unwrap();
    index.write_update(tile(0, 0, 0, tx), record(1, 0)).unwrap();
    assert!(index
        .read_request(0, 0, 0, CURSOR_TRANSACTION, false)
        .unwrap_err()
        .is_not_found());

    index.transaction_complete(tx, true).unwrap();
    assert_eq!(
        index.read_request(0, 0, 0, CURSOR_TRANSACTION, false).unwrap(),
        record(1, 0)
    );
}
