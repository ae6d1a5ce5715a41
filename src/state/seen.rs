//! Seen-set storage used to deduplicate listings across cycles.
//!
//! Identifiers are only ever added during a session. Entries older than the
//! retention window are pruned when the store is opened or flushed, which can
//! make an old listing look unseen again but never the other way round.

use crate::error::StoreError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Storage for processed listing identifiers.
///
/// Implementations are owned by a single watch loop and need no locking.
pub trait DedupStore: Send {
    /// Whether `id` has already been processed.
    fn has_seen(&self, id: &str) -> bool;

    /// Record `id` as processed. Idempotent.
    fn mark_seen(&mut self, id: &str) -> Result<(), StoreError>;

    /// Persist pending changes.
    fn flush(&mut self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Number of remembered identifiers.
    fn len(&self) -> usize;

    /// Whether no identifiers are remembered.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Identifier to first-seen timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeenSet {
    entries: BTreeMap<String, DateTime<Utc>>,
}

impl SeenSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the set contains `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Insert `id` first seen at `at`. Returns false if it was already
    /// present, in which case the original timestamp is kept.
    pub fn insert(&mut self, id: &str, at: DateTime<Utc>) -> bool {
        if self.entries.contains_key(id) {
            return false;
        }
        self.entries.insert(id.to_string(), at);
        true
    }

    /// When `id` was first seen.
    pub fn first_seen(&self, id: &str) -> Option<DateTime<Utc>> {
        self.entries.get(id).copied()
    }

    /// Remove entries first seen before `cutoff`. Returns how many were removed.
    pub fn prune_before(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, seen| *seen >= cutoff);
        before - self.entries.len()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// In-memory store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemorySeenStore {
    set: SeenSet,
}

impl MemorySeenStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DedupStore for MemorySeenStore {
    fn has_seen(&self, id: &str) -> bool {
        self.set.contains(id)
    }

    fn mark_seen(&mut self, id: &str) -> Result<(), StoreError> {
        self.set.insert(id, Utc::now());
        Ok(())
    }

    fn len(&self) -> usize {
        self.set.len()
    }
}

const STATE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    version: u32,
    seen: SeenSet,
}

/// JSON-file-backed store.
///
/// Marks are buffered in memory and written by [`DedupStore::flush`]. A crash
/// before a flush loses the marks since the last one, so those listings are
/// processed again on the next run.
#[derive(Debug)]
pub struct FileSeenStore {
    path: PathBuf,
    set: SeenSet,
    retention: Option<Duration>,
    dirty: bool,
}

impl FileSeenStore {
    /// Open the store at `path`. A missing file is an empty store; an
    /// unreadable or corrupt file is an error.
    pub fn open(path: impl Into<PathBuf>, retention: Option<Duration>) -> Result<Self, StoreError> {
        let path = path.into();
        let set = match std::fs::read_to_string(&path) {
            Ok(content) => Self::parse(&path, &content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No seen store yet, starting empty");
                SeenSet::new()
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        let mut store = Self {
            path,
            set,
            retention,
            dirty: false,
        };
        let pruned = store.prune(Utc::now());
        info!(
            path = %store.path.display(),
            entries = store.set.len(),
            pruned,
            "Seen store opened"
        );
        Ok(store)
    }

    fn parse(path: &Path, content: &str) -> Result<SeenSet, StoreError> {
        let state: StateFile =
            serde_json::from_str(content).map_err(|e| StoreError::Corrupt {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        if state.version != STATE_VERSION {
            return Err(StoreError::Corrupt {
                path: path.to_path_buf(),
                message: format!("unsupported state version {}", state.version),
            });
        }
        Ok(state.seen)
    }

    /// Drop entries older than the retention window as of `now`.
    pub fn prune(&mut self, now: DateTime<Utc>) -> usize {
        let Some(retention) = self.retention else {
            return 0;
        };
        // A window reaching past the earliest representable time keeps everything.
        let Some(cutoff) = now.checked_sub_signed(retention) else {
            return 0;
        };
        let removed = self.set.prune_before(cutoff);
        if removed > 0 {
            self.dirty = true;
        }
        removed
    }

    /// Path of the state file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The in-memory seen set.
    pub fn seen(&self) -> &SeenSet {
        &self.set
    }
}

impl DedupStore for FileSeenStore {
    fn has_seen(&self, id: &str) -> bool {
        self.set.contains(id)
    }

    fn mark_seen(&mut self, id: &str) -> Result<(), StoreError> {
        if self.set.insert(id, Utc::now()) {
            self.dirty = true;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        self.prune(Utc::now());
        if !self.dirty {
            return Ok(());
        }

        let state = StateFile {
            version: STATE_VERSION,
            seen: self.set.clone(),
        };
        let content = serde_json::to_vec_pretty(&state).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        crate::config::write_atomic(&self.path, &content).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;

        self.dirty = false;
        debug!(path = %self.path.display(), entries = self.set.len(), "Seen store flushed");
        Ok(())
    }

    fn len(&self) -> usize {
        self.set.len()
    }
}
