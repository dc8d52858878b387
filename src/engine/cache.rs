//! Capability cache.
//!
//! Probing ffmpeg costs a process spawn, so the detected version and encoder
//! list are stored under a closed set of keys and read before any probe runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::version::Version;

pub const CACHE_FILE_NAME: &str = "capabilities.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheKey {
    Version,
    Encoders,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheEntry {
    /// `None` records a failed detection
    Version(Option<Version>),
    Encoders(Vec<String>),
}

impl CacheEntry {
    pub fn key(&self) -> CacheKey {
        match self {
            Self::Version(_) => CacheKey::Version,
            Self::Encoders(_) => CacheKey::Encoders,
        }
    }
}

/// Key/value store for probe results.
///
/// No locking protocol spans a read and the following write; two callers that
/// miss at the same time both probe and the last write wins.
pub trait Cache: Send + Sync {
    fn read(&self, key: CacheKey) -> Option<CacheEntry>;
    fn write(&self, entry: CacheEntry);
}

/// Process-lifetime cache
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<BTreeMap<CacheKey, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cache for MemoryCache {
    fn read(&self, key: CacheKey) -> Option<CacheEntry> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(&key).cloned()
    }

    fn write(&self, entry: CacheEntry) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(entry.key(), entry);
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheDocument {
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    entries: BTreeMap<CacheKey, CacheEntry>,
}

/// JSON-file cache that survives across invocations
#[derive(Debug)]
pub struct FileCache {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCache {
    /// Cache stored as `capabilities.json` inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(CACHE_FILE_NAME))
    }

    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the cache file was last written, if it exists
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.load().updated_at
    }

    /// Remove the cache file. A missing file is not an error.
    pub fn clear(&self) -> io::Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    fn load(&self) -> CacheDocument {
        let Ok(json) = fs::read_to_string(&self.path) else {
            return CacheDocument::default();
        };
        match serde_json::from_str(&json) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring corrupt cache file");
                CacheDocument::default()
            }
        }
    }

    fn store(&self, doc: &CacheDocument) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(doc)?;
        fs::write(&self.path, json)
    }
}

impl Cache for FileCache {
    fn read(&self, key: CacheKey) -> Option<CacheEntry> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.load().entries.remove(&key)
    }

    fn write(&self, entry: CacheEntry) {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut doc = self.load();
        doc.entries.insert(entry.key(), entry);
        doc.updated_at = Some(Utc::now());

        // Unwritable cache means the next run probes again
        if let Err(e) = self.store(&doc) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to write cache file");
        }
    }
}
