//! Key-value persistence backends.
//!
//! The session store talks to storage through the `StorageBackend` trait so
//! the persistence medium stays out of the core logic. `FileBackend` keeps
//! one JSON file per key under a directory; `MemoryBackend` is for tests and
//! ephemeral sessions.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Synchronous key-value persistence.
///
/// Keys are short identifiers (the store uses a single fixed key); values are
/// serialized JSON. A missing key is `Ok(None)`, not an error. `remove` of a
/// missing key is a no-op.
pub trait StorageBackend {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// File-per-key backend rooted at a directory. Each key maps to
/// `<dir>/<key>.json`; the directory is created on first write.
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read storage entry: {}", key))?;
        Ok(Some(contents))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create storage directory: {}", self.dir.display()))?;
        std::fs::write(self.entry_path(key), value)
            .with_context(|| format!("Failed to write storage entry: {}", key))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.entry_path(key);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove storage entry: {}", key))?;
        }
        Ok(())
    }
}

/// In-process backend with no durability. Useful for tests and for running
/// the demo without touching the filesystem.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: HashMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entry directly, bypassing the store. Lets tests stage stale
    /// or corrupt records before a restore.
    pub fn seed(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}
