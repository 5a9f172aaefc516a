mod support;

use std::fs;

use album_engine::{CheckpointStore, CHECKPOINT_FILENAME};
use pretty_assertions::assert_eq;
use support::{url, urls};
use tempfile::TempDir;

fn line_count(temp: &TempDir) -> usize {
    fs::read_to_string(temp.path().join(CHECKPOINT_FILENAME))
        .unwrap()
        .lines()
        .count()
}

#[test]
fn append_is_idempotent_for_overlapping_input() {
    let temp = TempDir::new().unwrap();
    let batch = urls("https://img.example", 5);

    let mut store = CheckpointStore::open(temp.path()).unwrap();
    assert_eq!(store.append(&batch).unwrap().len(), 5);
    assert_eq!(store.append(&batch).unwrap().len(), 0);
    assert_eq!(store.append(&batch[2..]).unwrap().len(), 0);

    assert_eq!(store.len(), 5);
    assert_eq!(line_count(&temp), 5);
}

#[test]
fn duplicates_inside_one_batch_are_written_once() {
    let temp = TempDir::new().unwrap();
    let a = url("https://img.example/a.jpg");
    let mut store = CheckpointStore::open(temp.path()).unwrap();

    let written = store.append(&[a.clone(), a.clone()]).unwrap();
    assert_eq!(written, vec![a]);
    assert_eq!(line_count(&temp), 1);
}

#[test]
fn reopened_store_resumes_with_previous_lines() {
    let temp = TempDir::new().unwrap();
    let first = urls("https://img.example", 3);
    {
        let mut store = CheckpointStore::open(temp.path()).unwrap();
        store.append(&first).unwrap();
    }

    let mut store = CheckpointStore::open(temp.path()).unwrap();
    assert_eq!(store.load(), &first[..]);
    assert!(store.contains(&first[1]));

    let more = vec![first[0].clone(), url("https://img.example/new.jpg")];
    let appended = store.append(&more).unwrap();
    assert_eq!(appended, vec![url("https://img.example/new.jpg")]);
    assert_eq!(line_count(&temp), 4);
}

#[test]
fn append_is_durable_before_returning() {
    let temp = TempDir::new().unwrap();
    let mut store = CheckpointStore::open(temp.path()).unwrap();
    store.append(&urls("https://img.example", 2)).unwrap();

    // A second store opened while the first is still alive sees the lines.
    let observer = CheckpointStore::open(temp.path()).unwrap();
    assert_eq!(observer.len(), 2);
    drop(store);
}
