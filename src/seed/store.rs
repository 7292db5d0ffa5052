//! Key-value backends for the seed store
//!
//! A backend holds whole collections as JSON values under string keys.
//! A miss is reported as `Error::NotFound`; a backend that cannot be used at
//! all reports `Error::StorageUnavailable`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Synchronous key-value cache. Every `put` replaces the whole value.
pub trait KeyValueStore: Send + Sync {
    /// Read the collection stored under `key`
    fn get(&self, key: &str) -> Result<Value>;

    /// Replace the collection stored under `key`
    fn put(&self, key: &str, value: Value) -> Result<()>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

// ─────────────────────────────────────────────────────────────────
// In-memory store
// ─────────────────────────────────────────────────────────────────

/// Process-local store. Counts writes so seeding can be verified.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
    writes: AtomicUsize,
    unavailable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects every operation, as on a host with no storage
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Number of successful `put` calls
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable {
            return Err(Error::storage_unavailable("in-memory store disabled"));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Value> {
        self.check_available()?;
        self.entries
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| Error::NotFound { key: key.to_string() })
    }

    fn put(&self, key: &str, value: Value) -> Result<()> {
        self.check_available()?;
        self.entries.write().insert(key.to_string(), value);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

// ─────────────────────────────────────────────────────────────────
// File store
// ─────────────────────────────────────────────────────────────────

/// Single JSON document mapping keys to collections.
///
/// Writes go to a sibling temp file and are renamed into place so a reader
/// never observes a half-written document.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Open a store at `path`, creating its parent directory.
    ///
    /// Failing to create the directory means the host cannot persist
    /// anything, so it is reported as `StorageUnavailable`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    Error::storage_unavailable(format!(
                        "cannot create {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }
        debug!(path = %path.display(), "Opened seed file");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<HashMap<String, Value>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let content = fs::read_to_string(&self.path).map_err(|e| Error::IoRead {
            path: self.path.clone(),
            source: e,
        })?;
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&content).map_err(|e| Error::SeedCorrupted {
            key: self.path.display().to_string(),
            message: e.to_string(),
        })
    }

    fn write_document(&self, document: &HashMap<String, Value>) -> Result<()> {
        let content = serde_json::to_string_pretty(document)
            .map_err(|e| Error::Internal(format!("seed serialization failed: {}", e)))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).map_err(|e| Error::IoWrite {
            path: tmp.clone(),
            source: e,
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| Error::IoWrite {
            path: self.path.clone(),
            source: e,
        })
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Value> {
        let mut document = self.read_document()?;
        trace!(key, path = %self.path.display(), "Seed file read");
        document
            .remove(key)
            .ok_or_else(|| Error::NotFound { key: key.to_string() })
    }

    fn put(&self, key: &str, value: Value) -> Result<()> {
        let mut document = self.read_document()?;
        document.insert(key.to_string(), value);
        self.write_document(&document)
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
