//! Tests for exclusive creation and locked appends

use std::collections::HashSet;
use std::sync::{Arc, Barrier, Mutex};
use std::thread;

use pretty_assertions::assert_eq;
use tab_fs::{CreateOutcome, NormalizedPath, io};
use tempfile::tempdir;

#[test]
fn create_exclusive_creates_parent_directories() {
    let dir = tempdir().unwrap();
    let path = NormalizedPath::new(dir.path()).join("ledger/host_1.ledger");

    assert_eq!(io::create_exclusive(&path).unwrap(), CreateOutcome::Created);
    assert!(path.is_file());
    assert_eq!(io::read_text(&path).unwrap(), "");
}

#[test]
fn create_exclusive_reports_existing_file() {
    let dir = tempdir().unwrap();
    let path = NormalizedPath::new(dir.path()).join("taken.ledger");
    std::fs::write(path.to_native(), "keep me").unwrap();

    assert_eq!(
        io::create_exclusive(&path).unwrap(),
        CreateOutcome::AlreadyExists
    );
    assert_eq!(io::read_text(&path).unwrap(), "keep me");
}

#[test]
fn only_one_racing_creator_wins() {
    let dir = tempdir().unwrap();
    let path = Arc::new(NormalizedPath::new(dir.path()).join("contested.ledger"));
    let num_threads = 8;
    let barrier = Arc::new(Barrier::new(num_threads));
    let outcomes = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = (0..num_threads)
        .map(|_| {
            let path = Arc::clone(&path);
            let barrier = Arc::clone(&barrier);
            let outcomes = Arc::clone(&outcomes);
            thread::spawn(move || {
                barrier.wait();
                let outcome = io::create_exclusive(&path).unwrap();
                outcomes.lock().unwrap().push(outcome);
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread should not panic");
    }

    let outcomes = outcomes.lock().unwrap();
    let created = outcomes
        .iter()
        .filter(|o| **o == CreateOutcome::Created)
        .count();
    assert_eq!(created, 1);
}

#[test]
fn concurrent_appends_do_not_interleave() {
    let dir = tempdir().unwrap();
    let path = Arc::new(NormalizedPath::new(dir.path()).join("ledger/dynamic.ledger"));
    let num_threads = 10;
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|thread_id| {
            let path = Arc::clone(&path);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let line = format!("include \"host_{thread_id}.ledger\"\n");
                io::append_locked(&path, line.as_bytes()).unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread should not panic");
    }

    let content = io::read_text(&path).unwrap();
    let lines: HashSet<&str> = content.lines().collect();
    assert_eq!(lines.len(), num_threads);
    assert!(lines.iter().all(|l| l.starts_with("include \"host_")));
}

#[test]
fn remove_if_exists_is_idempotent() {
    let dir = tempdir().unwrap();
    let path = NormalizedPath::new(dir.path()).join("gone.ledger");
    io::create_exclusive(&path).unwrap();

    io::remove_if_exists(&path).unwrap();
    io::remove_if_exists(&path).unwrap();
    assert!(!path.exists());
}
