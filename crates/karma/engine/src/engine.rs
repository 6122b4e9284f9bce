//! Message orchestration: parse, reject self-bumps, apply in order.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::event::{Delta, KarmaEvent};
use crate::ledger::Ledger;
use crate::parser;
use crate::subject::Subject;

/// Why an event was refused without touching the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// The author targeted their own identity.
    SelfBump,
}

/// What happened to one parsed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EventOutcome {
    Applied { new_score: i64 },
    Rejected { reason: Rejection },
    /// The ledger refused the change; nothing was retained.
    Failed { reason: String },
}

/// Per-event result handed back to the transport for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventResult {
    pub subject: Subject,
    pub delta: Delta,
    pub outcome: EventOutcome,
}

impl EventResult {
    pub fn is_applied(&self) -> bool {
        matches!(self.outcome, EventOutcome::Applied { .. })
    }

    pub fn new_score(&self) -> Option<i64> {
        match self.outcome {
            EventOutcome::Applied { new_score } => Some(new_score),
            _ => None,
        }
    }
}

impl fmt::Display for EventResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            EventOutcome::Applied { new_score } => {
                let unit = if new_score.abs() == 1 { "point" } else { "points" };
                write!(f, "{} now has {} {}.", self.subject, new_score, unit)
            }
            EventOutcome::Rejected {
                reason: Rejection::SelfBump,
            } => write!(f, "{}: self-karma is not allowed.", self.subject),
            EventOutcome::Failed { reason } => {
                write!(f, "{}: karma not recorded ({}).", self.subject, reason)
            }
        }
    }
}

/// Stateless orchestrator over a shared [`Ledger`].
///
/// Cheap to clone; build one per process or per message as convenient.
#[derive(Debug, Clone)]
pub struct KarmaEngine {
    ledger: Arc<Ledger>,
}

impl KarmaEngine {
    pub fn new(ledger: Arc<Ledger>) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    /// Process one inbound message from `author`.
    ///
    /// Events are handled sequentially in message order. A ledger failure
    /// affects only its own event; later events are still applied.
    pub fn process(&self, author: &str, text: &str) -> Vec<EventResult> {
        let events = parser::parse(text);
        if events.is_empty() {
            return Vec::new();
        }
        debug!(author, events = events.len(), "processing karma message");

        events
            .into_iter()
            .map(|event| self.handle(author, event))
            .collect()
    }

    fn handle(&self, author: &str, event: KarmaEvent) -> EventResult {
        let KarmaEvent { subject, delta } = event;

        let outcome = if is_self_bump(author, &subject) {
            warn!(author, subject = %subject.key(), "self-karma rejected");
            EventOutcome::Rejected {
                reason: Rejection::SelfBump,
            }
        } else {
            match self.ledger.apply(subject.key(), delta) {
                Ok(new_score) => EventOutcome::Applied { new_score },
                Err(e) => EventOutcome::Failed {
                    reason: e.to_string(),
                },
            }
        };

        EventResult {
            subject,
            delta,
            outcome,
        }
    }
}

/// Exact identifier equality between the author and the target key.
fn is_self_bump(author: &str, subject: &Subject) -> bool {
    !author.is_empty() && subject.key().as_str() == author
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LedgerError, Result};
    use crate::store::{MemorySnapshotStore, Snapshot, SnapshotStore};

    fn engine() -> KarmaEngine {
        KarmaEngine::new(Arc::new(Ledger::in_memory()))
    }

    #[test]
    fn self_bump_is_rejected_and_score_untouched() {
        let engine = engine();
        let results = engine.process("U1", "<@U1>++");

        assert_eq!(results.len(), 1);
        assert_eq!(
            results[0].outcome,
            EventOutcome::Rejected {
                reason: Rejection::SelfBump
            }
        );
        assert_eq!(engine.ledger().get("U1").unwrap(), 0);
    }

    #[test]
    fn self_decrement_is_rejected_too() {
        let engine = engine();
        let results = engine.process("U1", "<@U1>--");
        assert!(!results[0].is_applied());
        assert_eq!(engine.ledger().get("U1").unwrap(), 0);
    }

    #[test]
    fn repeated_subject_sees_sequential_scores() {
        let engine = engine();
        let results = engine.process("U1", "pizza++ pizza++");

        let scores: Vec<i64> = results.iter().filter_map(EventResult::new_score).collect();
        assert_eq!(scores, vec![1, 2]);
    }

    #[test]
    fn self_bump_only_blocks_its_own_event() {
        let engine = engine();
        let results = engine.process("U1", "<@U1>++ <@U2>++");

        assert!(!results[0].is_applied());
        assert_eq!(results[1].new_score(), Some(1));
        assert_eq!(engine.ledger().get("U2").unwrap(), 1);
    }

    #[test]
    fn plain_text_yields_no_results() {
        assert!(engine().process("U1", "good morning everyone").is_empty());
    }

    #[test]
    fn empty_author_never_matches() {
        assert!(!is_self_bump("", &Subject::mention("")));
    }

    #[test]
    fn ledger_failure_is_isolated_to_one_event() {
        let store = Arc::new(MemorySnapshotStore::new());
        let ledger = Arc::new(Ledger::load(Arc::clone(&store)).unwrap());
        let engine = KarmaEngine::new(Arc::clone(&ledger));

        store.fail_next_saves(1);
        let results = engine.process("U9", "pizza++ tea++");

        assert!(matches!(results[0].outcome, EventOutcome::Failed { .. }));
        assert_eq!(results[1].new_score(), Some(1));
        assert_eq!(ledger.get("pizza").unwrap(), 0);
        assert_eq!(ledger.get("tea").unwrap(), 1);
    }

    struct PanickingStore;

    impl SnapshotStore for PanickingStore {
        fn load(&self) -> Result<Option<Snapshot>> {
            Ok(None)
        }

        fn save(&self, _snapshot: &Snapshot) -> Result<()> {
            panic!("flush panicked");
        }

        fn location(&self) -> String {
            "panicking".to_string()
        }
    }

    #[test]
    fn poisoned_ledger_yields_failed_outcomes() {
        let engine = KarmaEngine::new(Arc::new(Ledger::load(PanickingStore).unwrap()));

        let worker = engine.clone();
        let joined = std::thread::spawn(move || worker.process("U1", "pizza++")).join();
        assert!(joined.is_err());

        let results = engine.process("U1", "pizza++ <@U2>--");
        assert_eq!(results.len(), 2);
        for result in &results {
            assert_eq!(
                result.outcome,
                EventOutcome::Failed {
                    reason: LedgerError::LockPoisoned.to_string()
                }
            );
        }
    }

    #[test]
    fn results_render_for_replies() {
        let engine = engine();
        let results = engine.process("U1", "<@U2>++ pizza-- <@U1>++");

        assert_eq!(results[0].to_string(), "<@U2> now has 1 point.");
        assert_eq!(results[1].to_string(), "pizza now has -1 point.");
        assert_eq!(results[2].to_string(), "<@U1>: self-karma is not allowed.");
    }

    #[test]
    fn results_serialize_with_status_tag() {
        let results = engine().process("U1", "pizza++");
        let json = serde_json::to_value(&results[0]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "subject": {"kind": "topic", "key": "pizza"},
                "delta": "increment",
                "outcome": {"status": "applied", "new_score": 1}
            })
        );
    }
}
