//! Cache store - Map keys to cache files
//!
//! `Cache` validates keys and ttls, computes expiration timestamps, encodes
//! values, and hands every filesystem operation to a [`CacheFile`] kept in a
//! per-store handle cache.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::cache::codec::{decode, encode};
use crate::cache::file::CacheFile;
use crate::cache::key::{file_name, is_cache_file_name, key_from_file_name, validate_key};
use crate::cache::ttl::{expiration_timestamp, Expiration, Ttl};
use crate::core::clock::{Clock, SystemClock};
use crate::core::config::CacheConfig;
use crate::core::error::Result;
use crate::core::paths::{sanitize_dir, validate_dir};

/// File-backed key/value cache
#[derive(Debug)]
pub struct Cache {
    directory: PathBuf,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    files: HashMap<PathBuf, CacheFile>,
}

impl Cache {
    /// Open a cache over an existing, writable directory
    pub fn new(directory: impl AsRef<Path>) -> Result<Self> {
        Self::with_config(directory, CacheConfig::default())
    }

    /// Open a cache with explicit settings and the system clock
    pub fn with_config(directory: impl AsRef<Path>, config: CacheConfig) -> Result<Self> {
        Self::with_clock(directory, config, Arc::new(SystemClock))
    }

    /// Open a cache using the given clock for expiration arithmetic
    pub fn with_clock(
        directory: impl AsRef<Path>,
        config: CacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let directory = sanitize_dir(directory.as_ref());
        validate_dir(&directory)?;

        debug!(directory = %directory.display(), "cache opened");
        Ok(Self {
            directory,
            config,
            clock,
            files: HashMap::new(),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Fetch a value, or `default` when the entry is missing, expired or
    /// unreadable. Expired entries are deleted.
    pub fn get<T: DeserializeOwned>(&mut self, key: &str, default: T) -> Result<T> {
        validate_key(key)?;

        let file = self.file(key);
        if !file.exists() {
            return Ok(default);
        }

        // Empty file left behind by `lock` on a key that has no value yet
        if file.size() == Some(0) {
            return Ok(default);
        }

        if file.is_expired() {
            debug!(key, "evicting expired entry");
            if let Err(e) = file.delete() {
                warn!(key, error = %e, "failed to evict expired entry");
            }
            return Ok(default);
        }

        let content = match file.read() {
            Ok(content) => content,
            Err(e) => {
                warn!(key, error = %e, "failed to read entry");
                return Ok(default);
            }
        };

        match decode(&content) {
            Ok(value) => Ok(value),
            Err(e) => {
                debug!(key, error = %e, "failed to decode entry");
                Ok(default)
            }
        }
    }

    /// Store a value. A missing or zero ttl never expires.
    ///
    /// Returns false when the write or the timestamp update fails.
    pub fn set<T: Serialize + ?Sized>(
        &mut self,
        key: &str,
        value: &T,
        ttl: Option<Ttl>,
    ) -> Result<bool> {
        validate_key(key)?;
        let expiration = expiration_timestamp(ttl, self.clock.now())?;
        let content = encode(value)?;

        Ok(self.save(key, &content, expiration))
    }

    fn save(&mut self, key: &str, content: &str, expiration: i64) -> bool {
        let file = self.file(key);

        if let Err(e) = file.write(content) {
            warn!(key, error = %e, "failed to write entry");
            return false;
        }

        match file.set_expiration(expiration) {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "failed to set expiration");
                false
            }
        }
    }

    /// Remove an entry. Returns whether the file is gone afterward.
    pub fn delete(&mut self, key: &str) -> Result<bool> {
        validate_key(key)?;
        Ok(delete_file(self.file(key)))
    }

    /// Whether the entry's file exists.
    ///
    /// Expiration is ignored unless `has_checks_expiration` is configured.
    pub fn has(&mut self, key: &str) -> Result<bool> {
        validate_key(key)?;

        let checks_expiration = self.config.has_checks_expiration;
        let file = self.file(key);
        if checks_expiration {
            Ok(file.exists() && !file.is_expired())
        } else {
            Ok(file.exists())
        }
    }

    /// Expiration of an entry, or `None` when it does not exist
    pub fn expiration(&mut self, key: &str) -> Result<Option<Expiration>> {
        validate_key(key)?;
        Ok(self.file(key).expiration().map(Expiration::from_timestamp))
    }

    /// Whether an existing entry is past its expiration. Does not evict.
    pub fn is_expired(&mut self, key: &str) -> Result<bool> {
        validate_key(key)?;
        Ok(self.file(key).is_expired())
    }

    /// Delete every cache file in the directory. Best effort: returns true
    /// only if none remain.
    pub fn clear(&mut self) -> Result<bool> {
        self.close();

        let paths = self.cache_file_paths();
        for path in &paths {
            delete_file(&mut CacheFile::new(path, self.clock.clone()));
        }

        let remaining = paths.iter().filter(|path| path.exists()).count();
        debug!(deleted = paths.len() - remaining, remaining, "cache cleared");
        Ok(remaining == 0)
    }

    /// Fetch several values in input order
    pub fn get_multiple<K, T>(&mut self, keys: &[K], default: T) -> Result<Vec<T>>
    where
        K: AsRef<str>,
        T: DeserializeOwned + Clone,
    {
        for key in keys {
            validate_key(key.as_ref())?;
        }

        keys.iter()
            .map(|key| self.get(key.as_ref(), default.clone()))
            .collect()
    }

    /// Store several values with the same ttl. Every item is attempted;
    /// returns false if any of them failed.
    pub fn set_multiple<K, T>(&mut self, values: &[(K, T)], ttl: Option<Ttl>) -> Result<bool>
    where
        K: AsRef<str>,
        T: Serialize,
    {
        for (key, _) in values {
            validate_key(key.as_ref())?;
        }
        let expiration = expiration_timestamp(ttl, self.clock.now())?;
        let encoded = values
            .iter()
            .map(|(_, value)| encode(value))
            .collect::<Result<Vec<_>>>()?;

        let mut success = true;
        for ((key, _), content) in values.iter().zip(&encoded) {
            success &= self.save(key.as_ref(), content, expiration);
        }
        Ok(success)
    }

    /// Delete several entries. Every key is attempted; returns false if any
    /// deletion failed.
    pub fn delete_multiple<K: AsRef<str>>(&mut self, keys: &[K]) -> Result<bool> {
        for key in keys {
            validate_key(key.as_ref())?;
        }

        let mut success = true;
        for key in keys {
            success &= delete_file(self.file(key.as_ref()));
        }
        Ok(success)
    }

    /// Try to take the key's advisory lock without blocking
    pub fn lock(&mut self, key: &str) -> Result<bool> {
        validate_key(key)?;
        Ok(self.file(key).lock())
    }

    /// Release the key's lock if this store holds it
    pub fn unlock(&mut self, key: &str) -> Result<bool> {
        validate_key(key)?;
        Ok(self.file(key).unlock())
    }

    /// Keys of every cache file in the directory, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .cache_file_paths()
            .iter()
            .filter_map(|path| path.file_name().and_then(|name| name.to_str()))
            .filter_map(key_from_file_name)
            .map(str::to_string)
            .collect();
        keys.sort();
        keys
    }

    /// Delete every expired entry now. Returns how many were removed.
    ///
    /// Never runs on its own; `get` already evicts what it touches. Lock
    /// placeholders are left alone.
    pub fn purge_expired(&mut self) -> usize {
        let mut purged = 0;
        for key in self.keys() {
            let file = self.file(&key);
            if file.size() != Some(0) && file.is_expired() && delete_file(file) {
                purged += 1;
            }
        }

        debug!(purged, "expired entries purged");
        purged
    }

    /// Close every open handle, releasing held locks
    pub fn close(&mut self) {
        for file in self.files.values_mut() {
            file.close();
        }
        self.files.clear();
    }

    fn path(&self, key: &str) -> PathBuf {
        self.directory.join(file_name(key))
    }

    fn file(&mut self, key: &str) -> &mut CacheFile {
        let path = self.path(key);
        let clock = &self.clock;
        self.files
            .entry(path)
            .or_insert_with_key(|path| CacheFile::new(path.clone(), clock.clone()))
    }

    fn cache_file_paths(&self) -> Vec<PathBuf> {
        WalkDir::new(&self.directory)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| entry.file_name().to_str().is_some_and(is_cache_file_name))
            .map(|entry| entry.into_path())
            .collect()
    }
}

impl Drop for Cache {
    fn drop(&mut self) {
        self.close();
    }
}

fn delete_file(file: &mut CacheFile) -> bool {
    match file.delete() {
        Ok(gone) => gone,
        Err(e) => {
            warn!(path = %file.path().display(), error = %e, "failed to delete entry");
            false
        }
    }
}
