//! Expiring binary cache of parsed datasets.
//!
//! Each dataset is stored `bitcode`-encoded as `<cache_dir>/<name>_cache.bin`.
//! An entry is fresh while its modification time is younger than the
//! expiry. Stale or undecodable entries are treated as misses and rebuilt.
//! Entries built from settings carry a key and are rebuilt when it changes.

use std::path::Path;

use bitcode::{DecodeOwned, Encode};
use chrono::{DateTime, Duration, Utc};

use crate::IngestError;
use crate::paths::{DataPaths, ensure_dir};

/// Whether a value came from the cache or was rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Read from a fresh cache file.
    Hit,
    /// Parsed from the raw inputs and written to the cache.
    Rebuilt,
}

/// Dataset cache rooted in a data directory.
#[derive(Debug, Clone)]
pub struct DatasetCache {
    paths: DataPaths,
    expiry: Duration,
}

impl DatasetCache {
    /// Creates a cache whose entries expire after `expiry_days`.
    #[must_use]
    pub fn new(paths: DataPaths, expiry_days: u32) -> Self {
        Self {
            paths,
            expiry: Duration::days(i64::from(expiry_days)),
        }
    }

    /// Whether the cache file at `path` exists and is younger than the expiry.
    #[must_use]
    pub fn is_fresh(&self, path: &Path) -> bool {
        let Ok(modified) = std::fs::metadata(path).and_then(|m| m.modified()) else {
            return false;
        };
        let modified: DateTime<Utc> = modified.into();
        Utc::now() - modified < self.expiry
    }

    /// Reads a fresh entry. Missing, stale and undecodable entries give `None`.
    #[must_use]
    pub fn load<T: DecodeOwned>(&self, dataset: &str) -> Option<T> {
        let path = self.paths.cache_file(dataset);
        if !path.exists() {
            return None;
        }
        if !self.is_fresh(&path) {
            log::info!("Cache for {dataset} expired ({})", path.display());
            return None;
        }

        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Failed to read cache {}: {e}", path.display());
                return None;
            }
        };

        match bitcode::decode::<T>(&bytes) {
            Ok(value) => {
                log::debug!("Decoded cache {}", path.display());
                Some(value)
            }
            Err(e) => {
                log::warn!("Discarding unreadable cache {}: {e}", path.display());
                None
            }
        }
    }

    /// Writes an entry, replacing any previous one.
    ///
    /// The bytes go to `<name>_cache.bin.tmp` first and are renamed into
    /// place, so readers never see a partial entry.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Io`] if the file cannot be written.
    pub fn store<T: Encode + ?Sized>(&self, dataset: &str, value: &T) -> Result<(), IngestError> {
        let io_err = |path: &Path, e| IngestError::Io {
            path: path.display().to_string(),
            source: e,
        };

        let dir = self.paths.cache_dir();
        ensure_dir(&dir).map_err(|e| io_err(&dir, e))?;

        let path = self.paths.cache_file(dataset);
        let tmp = path.with_extension("bin.tmp");
        std::fs::write(&tmp, bitcode::encode(value)).map_err(|e| io_err(&tmp, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;

        log::info!("Cached {dataset} at {}", path.display());
        Ok(())
    }

    /// Returns the cached value, or builds, stores and returns it.
    ///
    /// A failed write is logged; the built value is still returned.
    ///
    /// # Errors
    ///
    /// Propagates the error of `build`.
    pub fn get_or_build<T, F>(&self, dataset: &str, build: F) -> Result<(T, CacheStatus), IngestError>
    where
        T: Encode + DecodeOwned,
        F: FnOnce() -> Result<T, IngestError>,
    {
        if let Some(value) = self.load(dataset) {
            log::info!("Cache hit for {dataset}");
            return Ok((value, CacheStatus::Hit));
        }

        log::info!("Cache miss for {dataset}, rebuilding");
        let value = build()?;
        if let Err(e) = self.store(dataset, &value) {
            log::warn!("Failed to cache {dataset}: {e}");
        }
        Ok((value, CacheStatus::Rebuilt))
    }

    /// Like [`Self::get_or_build`], for values that depend on settings.
    ///
    /// `key` is stored with the value. An entry stored under another key is
    /// a miss.
    ///
    /// # Errors
    ///
    /// Propagates the error of `build`.
    pub fn get_or_build_keyed<K, T, F>(
        &self,
        dataset: &str,
        key: &K,
        build: F,
    ) -> Result<(T, CacheStatus), IngestError>
    where
        K: Encode + DecodeOwned + PartialEq + Clone,
        T: Encode + DecodeOwned,
        F: FnOnce() -> Result<T, IngestError>,
    {
        match self.load::<(K, T)>(dataset) {
            Some((stored, value)) if stored == *key => {
                log::info!("Cache hit for {dataset}");
                return Ok((value, CacheStatus::Hit));
            }
            Some(_) => log::info!("Cache for {dataset} was built with other settings, rebuilding"),
            None => log::info!("Cache miss for {dataset}, rebuilding"),
        }

        let entry = (key.clone(), build()?);
        if let Err(e) = self.store(dataset, &entry) {
            log::warn!("Failed to cache {dataset}: {e}");
        }
        Ok((entry.1, CacheStatus::Rebuilt))
    }

    /// Deletes every cache file. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Io`] if the directory cannot be listed or a
    /// file cannot be removed.
    pub fn clear(&self) -> Result<usize, IngestError> {
        let dir = self.paths.cache_dir();
        if !dir.exists() {
            return Ok(0);
        }
        let io_err = |path: &Path, e| IngestError::Io {
            path: path.display().to_string(),
            source: e,
        };

        let mut removed = 0;
        for entry in std::fs::read_dir(&dir).map_err(|e| io_err(&dir, e))? {
            let path = entry.map_err(|e| io_err(&dir, e))?.path();
            if path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with("_cache.bin"))
            {
                std::fs::remove_file(&path).map_err(|e| io_err(&path, e))?;
                removed += 1;
            }
        }

        log::info!("Removed {removed} cache files from {}", dir.display());
        Ok(removed)
    }
}
