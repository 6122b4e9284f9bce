//! Snapshot persistence for the ledger.
//!
//! Provides the `SnapshotStore` trait, a `JsonFileStore` that keeps the whole
//! score map as one JSON object, and a `MemorySnapshotStore` for tests.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{LedgerError, Result};
use crate::subject::{Subject, SubjectKey};

/// Complete persisted state: subject key to score.
pub type Snapshot = BTreeMap<SubjectKey, i64>;

/// Backing store for ledger snapshots.
///
/// `save` must replace the previous snapshot atomically: after a crash the
/// store holds either the old or the new snapshot, never a partial one.
pub trait SnapshotStore: Send + Sync {
    /// Load the persisted snapshot.
    ///
    /// Returns `Ok(None)` if nothing has been persisted yet.
    fn load(&self) -> Result<Option<Snapshot>>;

    /// Replace the persisted snapshot with `snapshot`.
    fn save(&self, snapshot: &Snapshot) -> Result<()>;

    /// Human-readable location, for logs.
    fn location(&self) -> String;
}

impl<T: SnapshotStore + ?Sized> SnapshotStore for Arc<T> {
    fn load(&self) -> Result<Option<Snapshot>> {
        (**self).load()
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        (**self).save(snapshot)
    }

    fn location(&self) -> String {
        (**self).location()
    }
}

/// Record shape written by the original bot: `[{"name", "pluses", "minuses"}]`.
#[derive(Debug, Deserialize)]
struct LegacyRecord {
    name: String,
    pluses: i64,
    minuses: i64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredSnapshot {
    Current(Snapshot),
    Legacy(Vec<LegacyRecord>),
}

/// JSON-file snapshot store.
///
/// Writes go to `<file>.tmp`, are synced, then renamed over the target; the
/// parent directory is synced after the rename on Unix.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("ledger"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Flush the directory entry so the rename survives power loss.
    #[cfg(unix)]
    fn sync_parent_dir(&self) -> Result<()> {
        fs::File::open(self.parent_dir())?.sync_all()?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_parent_dir(&self) -> Result<()> {
        Ok(())
    }

    fn corrupt(&self, reason: impl Into<String>) -> LedgerError {
        LedgerError::Corrupt {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }

    fn convert_legacy(&self, records: Vec<LegacyRecord>) -> Result<Snapshot> {
        let mut snapshot = Snapshot::new();
        for record in records {
            let subject = Subject::from_legacy_name(&record.name)
                .ok_or_else(|| self.corrupt(format!("unusable subject name {:?}", record.name)))?;
            let score = record
                .pluses
                .checked_sub(record.minuses)
                .ok_or_else(|| self.corrupt(format!("score overflow for {:?}", record.name)))?;
            let entry = snapshot.entry(subject.into_key()).or_insert(0);
            *entry = entry
                .checked_add(score)
                .ok_or_else(|| self.corrupt(format!("score overflow for {:?}", record.name)))?;
        }
        Ok(snapshot)
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        let stored: StoredSnapshot =
            serde_json::from_slice(&bytes).map_err(|e| self.corrupt(e.to_string()))?;
        match stored {
            StoredSnapshot::Current(snapshot) => Ok(Some(snapshot)),
            StoredSnapshot::Legacy(records) => {
                warn!(
                    path = %self.path.display(),
                    records = records.len(),
                    "converting legacy karma records; next write uses the current format"
                );
                self.convert_legacy(records).map(Some)
            }
        }
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        fs::create_dir_all(self.parent_dir())?;

        let bytes = serde_json::to_vec_pretty(snapshot)?;
        let tmp_path = self.temp_path();
        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        self.sync_parent_dir()?;

        debug!(path = %self.path.display(), subjects = snapshot.len(), "ledger snapshot written");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory snapshot store (for testing).
///
/// Can be armed to fail upcoming saves, which exercises ledger rollback.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    data: Mutex<Option<Snapshot>>,
    failing_saves: AtomicUsize,
    saves: AtomicUsize,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing snapshot, as if it had been persisted earlier.
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            data: Mutex::new(Some(snapshot)),
            ..Self::default()
        }
    }

    /// Make the next `count` calls to `save` fail.
    pub fn fail_next_saves(&self, count: usize) {
        self.failing_saves.store(count, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// The last successfully saved snapshot.
    pub fn persisted(&self) -> Result<Option<Snapshot>> {
        self.load()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        let data = self.data.lock().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(data.clone())
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let armed = self
            .failing_saves
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if armed {
            return Err(std::io::Error::other("injected snapshot save failure").into());
        }

        let mut data = self.data.lock().map_err(|_| LedgerError::LockPoisoned)?;
        *data = Some(snapshot.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
