//! Overlapping message deliveries against one shared ledger.
//!
//! Transports are async; the engine is synchronous, so each delivery runs on
//! the blocking pool the way a webhook handler would call it.

use std::sync::Arc;

use karma_engine::{Delta, KarmaEngine, Ledger, SubjectKey};

const DELIVERIES: usize = 64;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_applies_against_file_ledger_lose_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("karma.json");
    let ledger = Arc::new(Ledger::open(&path).unwrap());

    let handles: Vec<_> = (0..DELIVERIES)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            tokio::task::spawn_blocking(move || {
                ledger.apply(&SubjectKey::from("alice"), Delta::Increment)
            })
        })
        .collect();

    let mut scores = Vec::with_capacity(DELIVERIES);
    for handle in handles {
        scores.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(ledger.get("alice").unwrap(), DELIVERIES as i64);

    // Every apply observed a distinct running total.
    scores.sort_unstable();
    let expected: Vec<i64> = (1..=DELIVERIES as i64).collect();
    assert_eq!(scores, expected);

    let reopened = Ledger::open(&path).unwrap();
    assert_eq!(reopened.get("alice").unwrap(), DELIVERIES as i64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_messages_through_the_engine() {
    let engine = KarmaEngine::new(Arc::new(Ledger::in_memory()));

    let handles: Vec<_> = (0..DELIVERIES)
        .map(|i| {
            let engine = engine.clone();
            tokio::task::spawn_blocking(move || {
                let author = format!("U{}", i % 4);
                engine.process(&author, "pizza++ <@U0>++")
            })
        })
        .collect();

    let mut applied_to_u0 = 0;
    for handle in handles {
        let results = handle.await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_applied());
        if results[1].is_applied() {
            applied_to_u0 += 1;
        }
    }

    let ledger = engine.ledger();
    assert_eq!(ledger.get("pizza").unwrap(), DELIVERIES as i64);
    // Author U0 cannot bump themselves.
    assert_eq!(applied_to_u0, DELIVERIES - DELIVERIES / 4);
    assert_eq!(ledger.get("U0").unwrap(), applied_to_u0 as i64);
}
