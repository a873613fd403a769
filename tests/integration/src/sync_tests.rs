//! Two engines sharing one bare remote through the real `git` binary
//!
//! Each checkout stands in for a separate server process.

use std::path::Path;

use pretty_assertions::assert_eq;
use tab_core::{Error, Member, Money, RepoData, ServerConfig, Transaction};
use tab_git::GitCli;
use tab_test_utils::GitRemote;
use tab_test_utils::fixtures::{ALICE, BOB, CASH, MASTER_LEDGER};
use tab_test_utils::git::head_of;

fn engine(dir: &Path, name: &str) -> RepoData<GitCli> {
    let mut config = ServerConfig::new(dir);
    config.instance_name = Some(name.to_string());
    let engine = RepoData::open(&config).unwrap();
    engine.load_data().unwrap();
    engine
}

fn member(engine: &RepoData<GitCli>, internal_name: &str) -> Member {
    engine.directory().member(internal_name).cloned().unwrap()
}

fn eur(engine: &RepoData<GitCli>, account: &str) -> String {
    engine.accounts_raw()[account].balance_in("EUR").to_string()
}

fn deposit(engine: &RepoData<GitCli>, who: &str, amount: &str) -> Transaction {
    let member = member(engine, who);
    Transaction::deposit(&member, Money::parse(amount).unwrap(), "EUR", None).unwrap()
}

#[test]
fn transaction_reaches_other_engine_after_pull() {
    let remote = GitRemote::seeded();
    let a = engine(&remote.clone_checkout("a"), "a");
    let b = engine(&remote.clone_checkout("b"), "b");

    a.apply_txn(&deposit(&a, "Alice", "5")).unwrap();
    assert_eq!(eur(&b, ALICE), "-20.00");

    b.pull_changes().unwrap();

    assert_eq!(eur(&b, ALICE), "-25.00");
    assert_eq!(eur(&b, CASH), "15.00");
    assert_eq!(*b.directory(), *a.directory());
}

#[test]
fn rejected_push_rolls_back_the_loser() {
    let remote = GitRemote::seeded();
    let dir_a = remote.clone_checkout("a");
    let a = engine(&dir_a, "a");
    let b = engine(&remote.clone_checkout("b"), "b");
    let shard_a = a.open_instance_ledger().unwrap();

    // b catches up and registers its own shard, moving upstream past a
    b.pull_changes().unwrap();
    b.apply_txn(&deposit(&b, "Bob", "3")).unwrap();

    let head_before = head_of(&dir_a);
    let directory_before = a.directory();
    let result = a.apply_txn(&deposit(&a, "Alice", "5"));

    assert!(matches!(
        result,
        Err(Error::Git(tab_git::Error::PushFailed { .. }))
    ));
    assert_eq!(head_of(&dir_a), head_before);
    assert_eq!(*a.directory(), *directory_before);
    assert_eq!(std::fs::read_to_string(dir_a.join(&shard_a)).unwrap(), "");

    a.pull_changes().unwrap();
    assert_eq!(eur(&a, BOB), "-8.00");
    a.apply_txn(&deposit(&a, "Alice", "5")).unwrap();
    assert_eq!(head_of(&dir_a), remote.remote_head());

    b.pull_changes().unwrap();
    assert_eq!(eur(&b, ALICE), "-25.00");
    assert_eq!(eur(&b, CASH), "18.00");
}

#[test]
fn pulled_parse_errors_reset_the_checkout() {
    let remote = GitRemote::seeded();
    let dir = remote.clone_checkout("a");
    let a = engine(&dir, "a");
    let head_before = head_of(&dir);

    remote.push_change(
        "other",
        "bartab.ledger",
        &format!("{MASTER_LEDGER}\nthis line is not a ledger entry\n"),
    );
    let err = a.pull_changes().unwrap_err();

    let Error::UpdateFailed { message, .. } = &err else {
        panic!("expected UpdateFailed, got {err:?}");
    };
    assert!(message.contains("bartab.ledger"), "{message}");
    assert_eq!(head_of(&dir), head_before);
    assert_eq!(
        std::fs::read_to_string(dir.join("bartab.ledger")).unwrap(),
        MASTER_LEDGER
    );
    assert_eq!(eur(&a, ALICE), "-20.00");
}

#[test]
fn concurrent_engines_allocate_separate_shards() {
    let remote = GitRemote::seeded();
    let a = engine(&remote.clone_checkout("a"), "a");
    let b = engine(&remote.clone_checkout("b"), "b");

    let shard_a = a.open_instance_ledger().unwrap();
    b.pull_changes().unwrap();
    let shard_b = b.instance_ledger_name().unwrap();

    assert!(shard_a.starts_with("ledger/a_"));
    assert!(shard_b.starts_with("ledger/b_"));

    a.pull_changes().unwrap();
    assert_eq!(a.instance_ledger_name(), Some(shard_a));
}
