//! Karma Engine: chat reputation scoring.
//!
//! Recognizes `subject++` / `subject--` tokens in free-form chat text and
//! keeps a durable score per subject. The engine provides:
//! - A declarative token grammar (`parser`)
//! - A mutex-guarded ledger that flushes a JSON snapshot on every change
//! - Self-bump rejection in the message orchestrator (`KarmaEngine`)
//! - User and topic leaderboards
//!
//! The engine never sees a transport payload; callers hand it the author id
//! and the raw message text.

#![deny(unsafe_code)]

pub mod engine;
pub mod error;
pub mod event;
pub mod leaderboard;
pub mod ledger;
pub mod parser;
pub mod store;
pub mod subject;

pub use engine::{EventOutcome, EventResult, KarmaEngine, Rejection};
pub use error::{LedgerError, Result};
pub use event::{Delta, KarmaEvent};
pub use leaderboard::{Leaderboard, Standing};
pub use ledger::Ledger;
pub use parser::parse;
pub use store::{JsonFileStore, MemorySnapshotStore, Snapshot, SnapshotStore};
pub use subject::{Subject, SubjectKey, SubjectKind};
