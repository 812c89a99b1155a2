//! Storage adapters: the narrow `{get, set, delete, clear, keys, size_bytes}`
//! capability the cache persists through. Three interchangeable
//! implementations, matching the reference's in-memory/file/host-local
//! trio.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::crypto::{sha256, to_hex};
use crate::error::{Error, Result};

/// The capability a [`super::Cache`] persists entries through. Values are
/// opaque byte strings (already-serialized, possibly-encrypted JSON); the
/// adapter never interprets them.
pub trait StorageAdapter: Send + Sync {
    /// Fetch the raw bytes stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    /// Write `value` under `key`, replacing any existing entry.
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;
    /// Remove `key`. Not an error if it was already absent.
    fn delete(&self, key: &str) -> Result<()>;
    /// Remove every key this adapter holds.
    fn clear(&self) -> Result<()>;
    /// List every key currently stored. No ordering is promised.
    fn keys(&self) -> Result<Vec<String>>;
    /// Approximate total size of stored payloads, in bytes.
    fn size_bytes(&self) -> Result<u64>;
    /// A short label identifying this backend, surfaced in
    /// [`super::CacheStats::storage_backend`].
    fn label(&self) -> &'static str;
}

/// In-memory adapter: a lock-guarded map, used for tests and as the
/// fallback when `persistToDisk` is `false`.
#[derive(Default)]
pub struct InMemoryAdapter {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryAdapter {
    /// Build an empty in-memory adapter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageAdapter for InMemoryAdapter {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().expect("cache storage lock poisoned").get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entries
            .write()
            .expect("cache storage lock poisoned")
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().expect("cache storage lock poisoned").remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.entries.write().expect("cache storage lock poisoned").clear();
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.read().expect("cache storage lock poisoned").keys().cloned().collect())
    }

    fn size_bytes(&self) -> Result<u64> {
        Ok(self
            .entries
            .read()
            .expect("cache storage lock poisoned")
            .values()
            .map(|v| v.len() as u64)
            .sum())
    }

    fn label(&self) -> &'static str {
        "memory"
    }
}

/// File adapter: each entry is a file under `base_dir`, named
/// `hex(sha256(key)) + ".json"`. The directory is created on construction.
pub struct FileAdapter {
    base_dir: PathBuf,
}

impl FileAdapter {
    /// Build a file adapter rooted at `base_dir`, creating it if absent.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)
            .map_err(|e| Error::CacheWriteFailed(format!("could not create cache directory: {e}")))?;
        Ok(Self { base_dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", to_hex(&sha256(key.as_bytes()))))
    }
}

impl StorageAdapter for FileAdapter {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::CacheReadFailed(e.to_string())),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        fs::write(self.path_for(key), value).map_err(|e| Error::CacheWriteFailed(e.to_string()))
    }

    fn delete(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::CacheWriteFailed(e.to_string())),
        }
    }

    fn clear(&self) -> Result<()> {
        for entry in fs::read_dir(&self.base_dir).map_err(|e| Error::CacheReadFailed(e.to_string()))? {
            let entry = entry.map_err(|e| Error::CacheReadFailed(e.to_string()))?;
            fs::remove_file(entry.path()).map_err(|e| Error::CacheWriteFailed(e.to_string()))?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        // File names are content-hashed, not reversible to the original
        // key; callers that need the logical key set maintain their own
        // index (see `Cache`'s in-memory entry index) rather than relying
        // on directory listing.
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.base_dir).map_err(|e| Error::CacheReadFailed(e.to_string()))? {
            let entry = entry.map_err(|e| Error::CacheReadFailed(e.to_string()))?;
            if let Some(name) = entry.file_name().to_str() {
                out.push(name.to_string());
            }
        }
        Ok(out)
    }

    fn size_bytes(&self) -> Result<u64> {
        let mut total = 0u64;
        for entry in fs::read_dir(&self.base_dir).map_err(|e| Error::CacheReadFailed(e.to_string()))? {
            let entry = entry.map_err(|e| Error::CacheReadFailed(e.to_string()))?;
            total += entry.metadata().map_err(|e| Error::CacheReadFailed(e.to_string()))?.len();
        }
        Ok(total)
    }

    fn label(&self) -> &'static str {
        "file"
    }
}

/// Host-local-storage adapter (e.g. browser `localStorage`). This crate has
/// no DOM binding of its own; the adapter models the capability — a
/// quota-bounded string-keyed store reached through a caller-supplied
/// [`HostLocalStore`] — so a host embedding can plug in its actual
/// `localStorage`/`SharedPreferences`/etc. binding.
pub trait HostLocalStore: Send + Sync {
    /// Read the raw string stored under `key`.
    fn get_item(&self, key: &str) -> Option<String>;
    /// Write `value` under `key`. `Err` with a host-specific message on
    /// quota exhaustion.
    fn set_item(&self, key: &str, value: &str) -> std::result::Result<(), String>;
    /// Remove `key`.
    fn remove_item(&self, key: &str);
    /// All keys currently stored under this store (unfiltered by prefix).
    fn all_keys(&self) -> Vec<String>;
}

/// Adapter over a [`HostLocalStore`], namespacing every key with `prefix`.
pub struct HostLocalAdapter<S: HostLocalStore> {
    store: S,
    prefix: String,
}

impl<S: HostLocalStore> HostLocalAdapter<S> {
    /// Wrap `store`, namespacing all keys with `prefix`.
    pub fn new(store: S, prefix: impl Into<String>) -> Self {
        Self { store, prefix: prefix.into() }
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }
}

impl<S: HostLocalStore> StorageAdapter for HostLocalAdapter<S> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.store.get_item(&self.namespaced(key)).map(String::into_bytes))
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let text = std::str::from_utf8(value)
            .map_err(|e| Error::CacheWriteFailed(format!("non-UTF-8 payload: {e}")))?;
        self.store
            .set_item(&self.namespaced(key), text)
            .map_err(|reason| Error::CacheWriteFailed(format!("quota exceeded: {reason}")))
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.store.remove_item(&self.namespaced(key));
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        for key in self.store.all_keys() {
            if key.starts_with(&self.prefix) {
                self.store.remove_item(&key);
            }
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self
            .store
            .all_keys()
            .into_iter()
            .filter(|k| k.starts_with(&self.prefix))
            .map(|k| k[self.prefix.len()..].to_string())
            .collect())
    }

    fn size_bytes(&self) -> Result<u64> {
        Ok(self
            .keys()?
            .iter()
            .filter_map(|k| self.get(k).ok().flatten())
            .map(|v| v.len() as u64)
            .sum())
    }

    fn label(&self) -> &'static str {
        "host-local"
    }
}

#[cfg(test)]
pub(crate) struct QuotaLimitedStore {
    inner: RwLock<BTreeMap<String, String>>,
    quota_bytes: usize,
}

#[cfg(test)]
impl QuotaLimitedStore {
    pub(crate) fn new(quota_bytes: usize) -> Self {
        Self { inner: RwLock::new(BTreeMap::new()), quota_bytes }
    }

    fn total_bytes(&self) -> usize {
        self.inner.read().expect("lock").iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

#[cfg(test)]
impl HostLocalStore for QuotaLimitedStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.inner.read().expect("lock").get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> std::result::Result<(), String> {
        if self.total_bytes() + key.len() + value.len() > self.quota_bytes {
            return Err("storage quota exceeded".to_string());
        }
        self.inner.write().expect("lock").insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) {
        self.inner.write().expect("lock").remove(key);
    }

    fn all_keys(&self) -> Vec<String> {
        self.inner.read().expect("lock").keys().cloned().collect()
    }
}
