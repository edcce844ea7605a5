#![allow(clippy::module_name_repetitions)]
//! Canonical file paths under the data directory.
//!
//! ```text
//! data/
//!   raw/     source tables and archives
//!   cache/   <name>_cache.bin
//! ```

use std::path::{Path, PathBuf};

/// Resolved locations of the raw inputs and the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    /// Paths rooted at `root` (usually `data/`).
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The data directory itself.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the `raw/` directory holding the downloaded source files.
    #[must_use]
    pub fn raw_dir(&self) -> PathBuf {
        self.root.join("raw")
    }

    /// Returns the `cache/` directory.
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("cache")
    }

    /// Returns the path of a raw input file.
    #[must_use]
    pub fn raw_file(&self, name: &str) -> PathBuf {
        self.raw_dir().join(name)
    }

    /// Returns the cache file for a dataset.
    #[must_use]
    pub fn cache_file(&self, dataset: &str) -> PathBuf {
        self.cache_dir().join(format!("{dataset}_cache.bin"))
    }
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
