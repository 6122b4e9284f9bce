//! User and topic standings derived from a ledger snapshot.

use serde::{Deserialize, Serialize};

use crate::store::Snapshot;
use crate::subject::{SubjectKey, SubjectKind};

/// One row of a leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub subject_key: SubjectKey,
    pub score: i64,
}

/// Standings split into mentioned users and free-text topics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub users: Vec<Standing>,
    pub topics: Vec<Standing>,
}

impl Leaderboard {
    /// Rank `snapshot` by score (descending, ties by key), keeping at most
    /// `limit` rows per list. A `limit` of 0 keeps everything.
    pub fn from_snapshot(snapshot: &Snapshot, limit: usize) -> Self {
        let mut board = Leaderboard::default();
        for (key, score) in snapshot {
            let standing = Standing {
                subject_key: key.clone(),
                score: *score,
            };
            match key.kind() {
                SubjectKind::Mention => board.users.push(standing),
                SubjectKind::Topic => board.topics.push(standing),
            }
        }

        for list in [&mut board.users, &mut board.topics] {
            list.sort_by(|a, b| {
                b.score
                    .cmp(&a.score)
                    .then_with(|| a.subject_key.cmp(&b.subject_key))
            });
            if limit > 0 {
                list.truncate(limit);
            }
        }
        board
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.topics.is_empty()
    }
}
