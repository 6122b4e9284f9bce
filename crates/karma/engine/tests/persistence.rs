//! Ledger persistence across restarts.
//!
//! Each test writes through one `Ledger`, drops it, and reopens the same file
//! the way a restarted bot process would.

use std::fs;
use std::sync::Arc;

use karma_engine::{Delta, EventOutcome, KarmaEngine, Ledger, LedgerError, SubjectKey};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn bump(ledger: &Ledger, key: &str, delta: Delta, times: usize) {
    let key = SubjectKey::from(key);
    for _ in 0..times {
        ledger.apply(&key, delta).unwrap();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn scores_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("karma.json");

    {
        let ledger = Ledger::open(&path).unwrap();
        bump(&ledger, "alice", Delta::Increment, 5);
        bump(&ledger, "bob", Delta::Decrement, 2);
        bump(&ledger, "carol", Delta::Increment, 1);
        bump(&ledger, "carol", Delta::Decrement, 1);
    }

    let reopened = Ledger::open(&path).unwrap();
    assert_eq!(reopened.get("alice").unwrap(), 5);
    assert_eq!(reopened.get("bob").unwrap(), -2);
    assert_eq!(reopened.get("carol").unwrap(), 0);
    assert_eq!(reopened.get("dave").unwrap(), 0);
}

#[test]
fn snapshot_file_is_a_plain_json_object() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("karma.json");

    let ledger = Ledger::open(&path).unwrap();
    bump(&ledger, "alice", Delta::Increment, 5);
    bump(&ledger, "bob", Delta::Decrement, 2);

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw, serde_json::json!({"alice": 5, "bob": -2}));
}

#[test]
fn missing_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("never-written.json");

    let ledger = Ledger::open(&path).unwrap();
    assert!(ledger.is_empty().unwrap());
    assert!(!path.exists());
}

#[test]
fn corrupt_file_refuses_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("karma.json");
    fs::write(&path, "this is not json").unwrap();

    let err = Ledger::open(&path).unwrap_err();
    assert!(matches!(err, LedgerError::Corrupt { .. }));
    assert_eq!(fs::read_to_string(&path).unwrap(), "this is not json");
}

#[test]
fn legacy_file_is_upgraded_on_first_write() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("karma.json");
    fs::write(
        &path,
        r#"[{"name": "<@U1>", "pluses": 7, "minuses": 2}, {"name": "pizza", "pluses": 1, "minuses": 4}]"#,
    )
    .unwrap();

    let ledger = Ledger::open(&path).unwrap();
    assert_eq!(ledger.get("U1").unwrap(), 5);
    assert_eq!(ledger.get("pizza").unwrap(), -3);

    bump(&ledger, "pizza", Delta::Increment, 1);

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw, serde_json::json!({"U1": 5, "pizza": -2}));
}

#[test]
fn engine_results_match_persisted_scores() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("karma.json");

    {
        let engine = KarmaEngine::new(Arc::new(Ledger::open(&path).unwrap()));
        let results = engine.process("U1", "<@U2>++ \"Ice Cream\"++ <@U1>++");
        assert_eq!(results.len(), 3);
        assert!(matches!(results[2].outcome, EventOutcome::Rejected { .. }));
    }

    let reopened = Ledger::open(&path).unwrap();
    assert_eq!(reopened.get("U2").unwrap(), 1);
    assert_eq!(reopened.get("ice cream").unwrap(), 1);
    assert_eq!(reopened.get("U1").unwrap(), 0);
}

#[test]
fn leaderboard_reflects_reopened_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("karma.json");

    {
        let ledger = Ledger::open(&path).unwrap();
        bump(&ledger, "U1", Delta::Increment, 3);
        bump(&ledger, "U2", Delta::Increment, 5);
        bump(&ledger, "pizza", Delta::Increment, 2);
    }

    let board = Ledger::open(&path).unwrap().leaderboard(10).unwrap();
    let users: Vec<(&str, i64)> = board
        .users
        .iter()
        .map(|s| (s.subject_key.as_str(), s.score))
        .collect();
    assert_eq!(users, vec![("U2", 5), ("U1", 3)]);
    assert_eq!(board.topics.len(), 1);
}
