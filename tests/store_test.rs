//! Integration tests for the turn-record store and the JSONL result log
//!
//! Toyota Way: Genchi Genbutsu (check the files actually on disk)

use por_engine::store::{
    read_records, result_log, rotated_siblings, RecordStore, ResultLogWriter, TurnRecord,
};
use por_engine::Config;
use tempfile::tempdir;

fn turn(id: i64) -> TurnRecord {
    TurnRecord::builder(id, format!("Who are you? ({id})"), "I am a question.")
        .q_self(0.8)
        .s_q(0.6)
        .t_total(250)
        .m(0.1)
        .build()
}

#[test]
fn test_appends_preserve_insertion_order() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("por_logs").join("turns.parquet");
    let store = RecordStore::new(&Config::default());

    let k = 12;
    for id in 0..k {
        let outcome = store.append(&turn(id), &target).unwrap();
        assert!(outcome.rotated_to.is_none());
        assert_eq!(outcome.records_in_file, usize::try_from(id + 1).unwrap());
    }

    let records = read_records(&target).unwrap();
    assert_eq!(records.len(), 12);
    let ids: Vec<i64> = records.iter().map(TurnRecord::turn_id).collect();
    assert_eq!(ids, (0..k).collect::<Vec<_>>());
    assert_eq!(records[3], turn(3));
    assert!(rotated_siblings(&target).unwrap().is_empty());
}

#[test]
fn test_rotation_splits_old_and_new_records() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("turns.parquet");

    // build a file under a large threshold first
    let roomy = RecordStore::with_max_bytes(u64::MAX);
    for id in 0..3 {
        roomy.append(&turn(id), &target).unwrap();
    }
    let size = std::fs::metadata(&target).unwrap().len();

    // the existing file is already over this threshold
    let tight = RecordStore::with_max_bytes(size - 1);
    let outcome = tight.append(&turn(3), &target).unwrap();

    let rotated = outcome.rotated_to.expect("file should have rotated");
    assert_eq!(rotated.parent(), target.parent());
    let name = rotated.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("turns_"));
    assert!(name.ends_with(".parquet"));

    let old: Vec<i64> = read_records(&rotated).unwrap().iter().map(TurnRecord::turn_id).collect();
    assert_eq!(old, vec![0, 1, 2]);
    assert_eq!(read_records(&target).unwrap(), vec![turn(3)]);
    assert_eq!(rotated_siblings(&target).unwrap(), vec![rotated]);
}

#[test]
fn test_threshold_equal_to_size_does_not_rotate() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("turns.parquet");

    RecordStore::with_max_bytes(u64::MAX).append(&turn(0), &target).unwrap();
    let size = std::fs::metadata(&target).unwrap().len();

    let outcome = RecordStore::with_max_bytes(size).append(&turn(1), &target).unwrap();
    assert!(outcome.rotated_to.is_none());
    assert_eq!(outcome.records_in_file, 2);
}

#[test]
fn test_result_log_flushes_on_drop() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("logs").join("por_log.jsonl");
    let config = Config::default();

    {
        let mut writer = ResultLogWriter::new(&path, &config).unwrap();
        writer
            .log_results(
                &[("What is consciousness?", 0.82), ("What is 2 + 2?", 0.1)],
                "philosophy",
                0.75,
                0.5,
                None,
            )
            .unwrap();
        assert_eq!(writer.buffered(), 2);
    }

    let entries = result_log::read_entries(&path).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].question, "What is consciousness?");
    assert!(entries[0].fired);
    assert!(!entries[1].fired);
    assert_eq!(entries[1].context, "philosophy");
}
