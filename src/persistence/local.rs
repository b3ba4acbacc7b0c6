//! Local State Cache
//!
//! Guest/offline persistence: two scalar entries, `points` and `levelIndex`,
//! stored as text and written on every change. Reading falls back to the
//! built-in defaults for anything absent or unparseable.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::warn;

use crate::game::state::SessionState;

/// Key of the saved point total.
pub const POINTS_KEY: &str = "points";
/// Key of the saved tier index.
pub const LEVEL_INDEX_KEY: &str = "levelIndex";

/// Local store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Entries could not be encoded.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Shared entries were poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,
}

/// String key-value cache.
pub trait LocalStore: Send {
    /// Read an entry.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write an entry.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Write several entries as one update.
    fn set_many(&mut self, entries: &[(&str, &str)]) -> Result<(), StoreError> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// In-memory cache. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with entries.
    pub fn with_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            entries: Arc::new(Mutex::new(map)),
        }
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn set_many(&mut self, updates: &[(&str, &str)]) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        for (key, value) in updates {
            entries.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }
}

// =============================================================================
// FILE STORE
// =============================================================================

/// Cache backed by a JSON object file, replaced on every update.
///
/// The new contents go to a sibling `.tmp` file which is then renamed over
/// the cache, so a crash mid-write leaves the previous file intact. Inside a
/// tokio runtime the write runs on the blocking pool; writes that finish out
/// of order never replace newer contents with older ones.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
    generation: u64,
    written: Arc<Mutex<u64>>,
}

impl FileStore {
    /// Open (or start) the cache at `path`.
    ///
    /// A missing file starts empty; an unreadable or corrupt one is logged and
    /// treated as empty so the next write replaces it.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!("Ignoring corrupt state file {}: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!("Cannot read state file {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };
        Self {
            path,
            entries,
            generation: 0,
            written: Arc::new(Mutex::new(0)),
        }
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the staging file renamed over the cache.
    pub fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("state"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        self.generation += 1;
        let job = WriteJob {
            path: self.path.clone(),
            temp_path: self.temp_path(),
            text: serde_json::to_string_pretty(&self.entries)?,
            generation: self.generation,
            written: self.written.clone(),
        };

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn_blocking(move || {
                    if let Err(e) = job.run() {
                        warn!("Failed to write state file {}: {}", job.path.display(), e);
                    }
                });
                Ok(())
            }
            Err(_) => job.run(),
        }
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.persist()
    }

    fn set_many(&mut self, updates: &[(&str, &str)]) -> Result<(), StoreError> {
        for (key, value) in updates {
            self.entries.insert(key.to_string(), value.to_string());
        }
        self.persist()
    }
}

/// One snapshot of the cache on its way to disk.
struct WriteJob {
    path: PathBuf,
    temp_path: PathBuf,
    text: String,
    generation: u64,
    written: Arc<Mutex<u64>>,
}

impl WriteJob {
    fn run(&self) -> Result<(), StoreError> {
        let mut written = self.written.lock().map_err(|_| StoreError::Poisoned)?;
        if *written >= self.generation {
            // A newer snapshot already landed
            return Ok(());
        }

        let mut file = File::create(&self.temp_path)?;
        file.write_all(self.text.as_bytes())?;
        file.sync_all()?;
        drop(file);
        fs::rename(&self.temp_path, &self.path)?;

        *written = self.generation;
        Ok(())
    }
}

// =============================================================================
// SAVED STATE
// =============================================================================

/// Read the saved state, falling back per entry to `defaults`.
pub fn load_saved_state(store: &dyn LocalStore, defaults: SessionState) -> SessionState {
    SessionState {
        points: read_entry(store, POINTS_KEY).unwrap_or(defaults.points),
        tier_index: read_entry(store, LEVEL_INDEX_KEY).unwrap_or(defaults.tier_index),
    }
}

/// Write both entries in one update.
pub fn save_state(store: &mut dyn LocalStore, state: &SessionState) -> Result<(), StoreError> {
    let points = state.points.to_string();
    let tier_index = state.tier_index.to_string();
    store.set_many(&[(POINTS_KEY, points.as_str()), (LEVEL_INDEX_KEY, tier_index.as_str())])
}

fn read_entry<T: std::str::FromStr>(store: &dyn LocalStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!("Cannot read saved {}: {}", key, e);
            return None;
        }
    };

    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Saved {} is not a number ({:?}), using default", key, raw);
            None
        }
    }
}
