//! Persistent cache store
//!
//! Provides a `CacheStore` that keeps every cached response in memory and
//! mirrors it to a single JSON file after each insertion.

use directories::ProjectDirs;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use super::fetch::FetchError;

/// File name of the durable cache
pub const CACHE_FILE_NAME: &str = "cache.json";

/// Errors that can occur while filling or persisting the cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// The network request for a cache miss failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The store could not be serialized
    #[error("Failed to encode cache: {0}")]
    Encode(#[from] serde_json::Error),

    /// The cache file could not be written
    #[error("Failed to write cache file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Returns the default location of the cache file
///
/// Uses the XDG cache directory (`~/.cache/npsexplorer/cache.json` on Linux), or
/// `cache.json` in the working directory when no home directory is available.
pub fn default_cache_path() -> PathBuf {
    ProjectDirs::from("", "", "npsexplorer")
        .map(|dirs| dirs.cache_dir().join(CACHE_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(CACHE_FILE_NAME))
}

/// In-memory copy of the durable cache, keyed by request fingerprint
///
/// Page fetches are stored as JSON strings, API calls as whatever JSON value the
/// API returned. The map is ordered so the file on disk stays stable between runs.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStore {
    /// Location of the durable copy
    path: PathBuf,
    /// Fingerprint to payload
    entries: BTreeMap<String, Value>,
}

impl CacheStore {
    /// Creates an empty store that will persist to `path`
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Loads the store from `path`
    ///
    /// A missing file, unreadable file, or malformed content all yield an empty
    /// store; the next successful insertion overwrites whatever was there.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<BTreeMap<String, Value>>(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Discarding unreadable cache file");
                    BTreeMap::new()
                }
            },
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No cache file, starting empty");
                BTreeMap::new()
            }
        };
        Self { path, entries }
    }

    /// Writes the whole store to disk
    ///
    /// The file is replaced via a temporary sibling and a rename, so readers never
    /// observe a half-written cache.
    pub fn save(&self) -> Result<(), CacheError> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        write_atomic(&self.path, json.as_bytes()).map_err(|source| CacheError::Write {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), entries = self.entries.len(), "Saved cache");
        Ok(())
    }

    /// Returns the cached payload for a fingerprint
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Returns true if the fingerprint is cached
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Inserts or replaces a payload (in memory only, see [`CacheStore::save`])
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Location of the durable copy
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path)?;
    file.write_all(contents)?;
    file.sync_all()?;
    fs::rename(&temp_path, path)
}
