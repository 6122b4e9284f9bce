//! The karma ledger: durable subject-to-score map.
//!
//! All mutation goes through [`Ledger::apply`], which holds the ledger mutex
//! across read, modify, and flush. Concurrent `apply` calls therefore
//! serialize and no increment is lost. The snapshot is flushed on every
//! mutation; when the flush fails the change is rolled back so memory never
//! runs ahead of what is on disk.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, error, info, warn};

use crate::error::{LedgerError, Result};
use crate::event::Delta;
use crate::leaderboard::Leaderboard;
use crate::store::{JsonFileStore, MemorySnapshotStore, Snapshot, SnapshotStore};
use crate::subject::SubjectKey;

/// Durable, concurrency-safe karma ledger.
pub struct Ledger {
    scores: Mutex<Snapshot>,
    store: Box<dyn SnapshotStore>,
}

impl Ledger {
    /// Load the ledger from `store`.
    ///
    /// A store with nothing persisted yields an empty ledger. A corrupt
    /// snapshot is returned as [`LedgerError::Corrupt`] and must stop startup.
    pub fn load(store: impl SnapshotStore + 'static) -> Result<Self> {
        let scores = match store.load() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                info!(location = %store.location(), "no karma snapshot found, starting fresh");
                Snapshot::new()
            }
            Err(e) => {
                error!(location = %store.location(), error = %e, "failed to load karma snapshot");
                return Err(e);
            }
        };

        info!(location = %store.location(), subjects = scores.len(), "karma ledger loaded");
        Ok(Self {
            scores: Mutex::new(scores),
            store: Box::new(store),
        })
    }

    /// Load a ledger backed by a JSON file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::load(JsonFileStore::new(path))
    }

    /// An empty ledger backed by memory only.
    pub fn in_memory() -> Self {
        Self {
            scores: Mutex::new(Snapshot::new()),
            store: Box::new(MemorySnapshotStore::new()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Snapshot>> {
        self.scores.lock().map_err(|_| LedgerError::LockPoisoned)
    }

    /// Current score for `key`; 0 if never recorded.
    pub fn get(&self, key: &str) -> Result<i64> {
        Ok(self.lock()?.get(key).copied().unwrap_or(0))
    }

    /// Atomically add `delta` to `key`, persist the whole map, and return the
    /// new score.
    ///
    /// On a failed flush the previous value is restored (or the key removed
    /// if it was absent) and [`LedgerError::Persist`] is returned.
    pub fn apply(&self, key: &SubjectKey, delta: Delta) -> Result<i64> {
        let mut scores = self.lock()?;

        let previous = scores.get(key).copied();
        let new_score = previous
            .unwrap_or(0)
            .checked_add(delta.value())
            .ok_or_else(|| LedgerError::ScoreOverflow {
                key: key.to_string(),
            })?;
        scores.insert(key.clone(), new_score);

        if let Err(e) = self.store.save(&scores) {
            match previous {
                Some(score) => scores.insert(key.clone(), score),
                None => scores.remove(key),
            };
            warn!(
                subject = %key,
                location = %self.store.location(),
                error = %e,
                "snapshot flush failed, karma change rolled back"
            );
            return Err(LedgerError::Persist(Box::new(e)));
        }

        debug!(subject = %key, delta = delta.value(), score = new_score, "karma applied");
        Ok(new_score)
    }

    /// Consistent copy of every recorded score.
    pub fn snapshot(&self) -> Result<Snapshot> {
        Ok(self.lock()?.clone())
    }

    /// Number of subjects with a recorded score.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    /// User and topic standings, best first, each capped at `limit`
    /// (`0` means no cap).
    pub fn leaderboard(&self, limit: usize) -> Result<Leaderboard> {
        Ok(Leaderboard::from_snapshot(&*self.lock()?, limit))
    }

    /// Where the ledger persists its snapshot.
    pub fn location(&self) -> String {
        self.store.location()
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("location", &self.store.location())
            .finish_non_exhaustive()
    }
}
