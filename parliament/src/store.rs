//! Session store — durable per-tab key/value persistence
//!
//! The orchestration core never touches storage directly; it is handed a
//! [`SessionStore`] capability. Two implementations ship:
//!
//! - [`MemorySessionStore`]: survives navigation within a process, used in tests
//! - [`FileSessionStore`]: JSON file, used by the CLI to resume across runs
//!
//! Key names are an external contract shared with other consumers of the
//! same storage and must stay stable (see [`keys`]).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::error::{ParliamentError, ParliamentResult};

/// Stable storage keys.
pub mod keys {
    /// Selected paper id (string).
    pub const PAPER_ID: &str = "paperid";
    /// Debate id of the loaded transcript (string).
    pub const DEBATE_ID: &str = "debate_id";
    /// Serialized `Paper` of the selection.
    pub const PAPER_INFO: &str = "paper_info";
    /// Serialized `VoteSummary`, written once the tally is released.
    pub const SUMMARY: &str = "summary";
    /// Serialized `DebateTranscript` cache.
    pub const TRANSCRIPT: &str = "transcript";

    /// Keys derived from the selection; cleared when the paper changes.
    pub const DERIVED: [&str; 4] = [DEBATE_ID, PAPER_INFO, SUMMARY, TRANSCRIPT];
}

/// String key/value persistence for one session.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> ParliamentResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> ParliamentResult<()>;
    fn remove(&self, key: &str) -> ParliamentResult<()>;
    fn clear(&self) -> ParliamentResult<()>;
}

/// Shared reference to a session store
pub type SharedSessionStore = Arc<dyn SessionStore>;

/// Read and deserialize a JSON value.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn SessionStore,
    key: &str,
) -> ParliamentResult<Option<T>> {
    match store.get(key)? {
        Some(raw) => {
            let value = serde_json::from_str(&raw).map_err(|e| {
                ParliamentError::store(format!("corrupt value under '{}': {}", key, e))
            })?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

/// Serialize and write a JSON value.
pub fn save_json<T: Serialize>(store: &dyn SessionStore, key: &str, value: &T) -> ParliamentResult<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> SharedSessionStore {
        Arc::new(self)
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> ParliamentResult<Option<String>> {
        let entries = self.entries.read().map_err(|_| lock_poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> ParliamentResult<()> {
        let mut entries = self.entries.write().map_err(|_| lock_poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> ParliamentResult<()> {
        let mut entries = self.entries.write().map_err(|_| lock_poisoned())?;
        entries.remove(key);
        Ok(())
    }

    fn clear(&self) -> ParliamentResult<()> {
        let mut entries = self.entries.write().map_err(|_| lock_poisoned())?;
        entries.clear();
        Ok(())
    }
}

fn lock_poisoned() -> ParliamentError {
    ParliamentError::store("lock poisoned")
}

// ============================================================================
// JSON file store
// ============================================================================

/// Store backed by a pretty-printed JSON object on disk. Every write
/// rewrites the whole file.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileSessionStore {
    /// Open the store, loading existing entries if the file exists.
    pub fn open(path: impl Into<PathBuf>) -> ParliamentResult<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let json = std::fs::read_to_string(&path).map_err(|e| {
                ParliamentError::store(format!("cannot read {}: {}", path.display(), e))
            })?;
            if json.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&json).map_err(|e| {
                    ParliamentError::store(format!("corrupt store {}: {}", path.display(), e))
                })?
            }
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), entries = entries.len(), "Opened session store");
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn shared(self) -> SharedSessionStore {
        Arc::new(self)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> ParliamentResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| ParliamentError::store(format!("cannot create {}: {}", parent.display(), e)))?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        // Write beside the target, then rename over it.
        let staging = self.staging_path();
        std::fs::write(&staging, json).map_err(|e| {
            ParliamentError::store(format!("cannot write {}: {}", staging.display(), e))
        })?;
        std::fs::rename(&staging, &self.path).map_err(|e| {
            ParliamentError::store(format!(
                "cannot replace {} with {}: {}",
                self.path.display(),
                staging.display(),
                e
            ))
        })
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> ParliamentResult<Option<String>> {
        let entries = self.entries.read().map_err(|_| lock_poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> ParliamentResult<()> {
        let mut entries = self.entries.write().map_err(|_| lock_poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> ParliamentResult<()> {
        let mut entries = self.entries.write().map_err(|_| lock_poisoned())?;
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }

    fn clear(&self) -> ParliamentResult<()> {
        let mut entries = self.entries.write().map_err(|_| lock_poisoned())?;
        entries.clear();
        self.flush(&entries)
    }
}
