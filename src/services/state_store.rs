//! State store: the per-repository record of fix outcomes.
//!
//! Lives at `<state_dir>/state.json` inside the target repository. An
//! advisory flock on the sibling `state.lock` is held for the lifetime of
//! an open store, so a second concurrent invocation against the same
//! repository fails fast instead of interleaving. Flushes are crash-safe:
//! write to a temp file in the same directory, then rename over the
//! current file.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::errors::{EngineError, EngineResult};
use crate::domain::models::{FixId, FixRecord};

const STATE_FILE: &str = "state.json";
const LOCK_FILE: &str = "state.lock";
const FORMAT_VERSION: u32 = 1;

/// Current record plus superseded history for one fix identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FixEntry {
    current: FixRecord,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    history: Vec<FixRecord>,
}

/// On-disk document. Unknown fields are ignored on load so older engines
/// can read state written by newer ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StateDocument {
    format_version: u32,
    #[serde(default)]
    fixes: BTreeMap<String, FixEntry>,
}

impl Default for StateDocument {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            fixes: BTreeMap::new(),
        }
    }
}

/// Handle over one repository's persisted fix records.
#[derive(Debug)]
pub struct StateStore {
    state_path: PathBuf,
    document: StateDocument,
    /// Held for the store's lifetime; releasing the flock happens on drop.
    /// `None` for read-only opens.
    _lock: Option<File>,
}

impl StateStore {
    /// Open the store for a mutating run, taking the advisory lock.
    #[instrument(skip_all, fields(repo_root = %repo_root.display()))]
    pub fn open(repo_root: &Path, state_dir: &str) -> EngineResult<Self> {
        let dir = repo_root.join(state_dir);
        fs::create_dir_all(&dir)?;

        let lock_path = dir.join(LOCK_FILE);
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        if lock.try_lock_exclusive().is_err() {
            return Err(EngineError::ConcurrentRun {
                repo_root: repo_root.to_path_buf(),
            });
        }

        let state_path = dir.join(STATE_FILE);
        let document = load_document(&state_path)?;
        Ok(Self {
            state_path,
            document,
            _lock: Some(lock),
        })
    }

    /// Open without the lock, for dry runs and status listings. A
    /// read-only store never flushes.
    pub fn open_read_only(repo_root: &Path, state_dir: &str) -> EngineResult<Self> {
        let state_path = repo_root.join(state_dir).join(STATE_FILE);
        let document = load_document(&state_path)?;
        Ok(Self {
            state_path,
            document,
            _lock: None,
        })
    }

    /// The current record for a fix identity, if any.
    pub fn current(&self, id: &FixId) -> Option<&FixRecord> {
        self.document.fixes.get(&id.to_string()).map(|e| &e.current)
    }

    /// Iterate `(identity, current record)` in identity order.
    pub fn iter_current(&self) -> impl Iterator<Item = (&str, &FixRecord)> {
        self.document
            .fixes
            .iter()
            .map(|(k, e)| (k.as_str(), &e.current))
    }

    /// Install a new current record, preserving the prior one as history.
    pub fn record(&mut self, id: &FixId, record: FixRecord) {
        debug!(fix = %id, outcome = record.outcome.as_str(), "Recording fix outcome");
        self.document
            .fixes
            .entry(id.to_string())
            .and_modify(|entry| {
                let prior = std::mem::replace(&mut entry.current, record.clone());
                entry.history.push(prior);
            })
            .or_insert_with(|| FixEntry {
                current: record,
                history: Vec::new(),
            });
    }

    /// Persist atomically: temp file in the same directory, then rename.
    /// Only a locked store may flush.
    pub fn flush(&self) -> EngineResult<()> {
        debug_assert!(self._lock.is_some(), "flush on a read-only state store");
        let tmp_path = self.state_path.with_extension("json.tmp");
        let body = serde_json::to_string_pretty(&self.document).map_err(|e| {
            EngineError::StateStoreCorruption {
                path: self.state_path.clone(),
                detail: e.to_string(),
            }
        })?;
        {
            let mut tmp = File::create(&tmp_path)?;
            tmp.write_all(body.as_bytes())?;
            tmp.sync_all()?;
        }
        fs::rename(&tmp_path, &self.state_path)?;
        Ok(())
    }
}

fn load_document(state_path: &Path) -> EngineResult<StateDocument> {
    match fs::read_to_string(state_path) {
        Ok(raw) => {
            serde_json::from_str(&raw).map_err(|e| EngineError::StateStoreCorruption {
                path: state_path.to_path_buf(),
                detail: e.to_string(),
            })
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StateDocument::default()),
        Err(e) => Err(EngineError::StateStoreCorruption {
            path: state_path.to_path_buf(),
            detail: e.to_string(),
        }),
    }
}
