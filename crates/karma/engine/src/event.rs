//! Karma events extracted from a single message.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::subject::Subject;

/// Direction of a karma change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delta {
    Increment,
    Decrement,
}

impl Delta {
    /// Signed score change: `+1` or `-1`.
    pub fn value(self) -> i64 {
        match self {
            Delta::Increment => 1,
            Delta::Decrement => -1,
        }
    }

    /// Map an operator token; a lone em or en dash reads as `--`.
    pub(crate) fn from_operator(op: &str) -> Option<Self> {
        match op {
            "++" => Some(Delta::Increment),
            "--" | "\u{2014}" | "\u{2013}" => Some(Delta::Decrement),
            _ => None,
        }
    }
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delta::Increment => f.write_str("++"),
            Delta::Decrement => f.write_str("--"),
        }
    }
}

/// One parsed increment or decrement instruction.
///
/// Transient: produced per message and never persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KarmaEvent {
    pub subject: Subject,
    pub delta: Delta,
}

impl KarmaEvent {
    pub fn new(subject: Subject, delta: Delta) -> Self {
        Self { subject, delta }
    }
}
