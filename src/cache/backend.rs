use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

/// Byte store behind a derived cache.
///
/// Writers replace whole entries; the last write wins.
pub trait CacheBackend: Send + Sync {
    fn get(&self, key: &str) -> Option<Vec<u8>>;
    fn replace(&self, key: &str, value: Vec<u8>) -> Result<()>;
    fn invalidate(&self, key: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

type Entries = Arc<Mutex<HashMap<String, Vec<u8>>>>;

fn lock(entries: &Entries) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
    entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Process-local cache. Used in tests and with `--no-cache`.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    entries: Entries,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheBackend for MemoryBackend {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        lock(&self.entries).get(key).cloned()
    }

    fn replace(&self, key: &str, value: Vec<u8>) -> Result<()> {
        lock(&self.entries).insert(key.to_string(), value);
        Ok(())
    }

    fn invalidate(&self, key: &str) -> Result<()> {
        lock(&self.entries).remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        lock(&self.entries).clear();
        Ok(())
    }
}

/// Disk-persistent cache
///
/// Uses cacache for disk persistence and an in-memory HashMap for fast access.
/// Entries are loaded from disk on first use.
#[derive(Clone)]
pub struct DiskBackend {
    memory: Entries,
    cache_path: PathBuf,
}

impl DiskBackend {
    pub fn new(cache_path: PathBuf) -> Self {
        // Don't pre-load disk cache - entries are loaded on demand
        Self {
            memory: Arc::new(Mutex::new(HashMap::new())),
            cache_path,
        }
    }

    /// Drop the in-memory layer so the next read goes to disk
    pub fn clear_memory(&self) {
        lock(&self.memory).clear();
    }

    fn load_from_disk(&self, key: &str) -> Option<Vec<u8>> {
        let bytes = cacache::read_sync(&self.cache_path, key).ok()?;
        lock(&self.memory).insert(key.to_string(), bytes.clone());
        Some(bytes)
    }
}

impl CacheBackend for DiskBackend {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        if let Some(bytes) = lock(&self.memory).get(key) {
            return Some(bytes.clone());
        }
        self.load_from_disk(key)
    }

    fn replace(&self, key: &str, value: Vec<u8>) -> Result<()> {
        cacache::write_sync(&self.cache_path, key, &value)
            .with_context(|| format!("Failed to write cache entry '{}'", key))?;
        lock(&self.memory).insert(key.to_string(), value);
        Ok(())
    }

    fn invalidate(&self, key: &str) -> Result<()> {
        lock(&self.memory).remove(key);
        cacache::remove_sync(&self.cache_path, key)
            .with_context(|| format!("Failed to remove cache entry '{}'", key))
    }

    fn clear(&self) -> Result<()> {
        self.clear_memory();
        match std::fs::remove_dir_all(&self.cache_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to remove cache directory"),
        }
    }
}
