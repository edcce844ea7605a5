#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Loading of the municipality record store.
//!
//! Three source files are read from `data/raw/`:
//!
//! - the INSEE housing table (`base-cc-logement`), extracted from its ZIP
//!   archive when only the archive is present
//! - a commune income table (optional)
//! - the commune boundaries as `GeoJSON`
//!
//! Each parsed dataset and the merged [`MunicipalityRecord`] store are
//! cached under `data/cache/` and reused until they expire.

pub mod archive;
pub mod cache;
pub mod geography;
pub mod housing;
pub mod income;
pub mod merge;
pub mod paths;
pub mod progress;
pub mod table;

use std::path::{Path, PathBuf};

use franchise_zones_commune_models::MunicipalityRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::{CacheStatus, DatasetCache};
use crate::geography::CommuneGeo;
use crate::housing::HousingRow;
use crate::income::{IncomeDefaults, IncomeRow};
use crate::paths::DataPaths;
use crate::progress::ProgressCallback;

/// Cache name of the parsed commune geography.
pub const COMMUNES_DATASET: &str = "communes_geo";
/// Cache name of the parsed housing table.
pub const HOUSING_DATASET: &str = "housing";
/// Cache name of the parsed income table.
pub const INCOME_DATASET: &str = "income";
/// Cache name of the merged record store.
pub const RECORDS_DATASET: &str = "records";

/// Errors raised while reading, parsing or caching source data.
#[derive(Debug, Error)]
pub enum IngestError {
    /// A file could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Offending path.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },
    /// A delimited table is malformed.
    #[error("CSV error in {path}: {source}")]
    Csv {
        /// Offending path.
        path: String,
        /// Underlying error.
        source: csv::Error,
    },
    /// A required column is absent from a table header.
    #[error("{file} has no {column} column")]
    MissingColumn {
        /// Table name.
        file: String,
        /// Expected column.
        column: String,
    },
    /// A record failed validation.
    #[error("invalid record {code}: {message}")]
    InvalidRecord {
        /// Commune code, empty when not applicable.
        code: String,
        /// What was wrong.
        message: String,
    },
    /// Two records share a commune code.
    #[error("duplicate commune code {code}")]
    DuplicateCode {
        /// The repeated code.
        code: String,
    },
    /// The commune boundaries are not valid `GeoJSON`.
    #[error(transparent)]
    GeoJson(#[from] geojson::Error),
    /// A ZIP archive is corrupt or lacks the expected entry.
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    /// Malformed ingestion configuration.
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

/// Source file names and ingestion defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct IngestConfig {
    /// Root of `raw/` and `cache/`.
    pub data_dir: PathBuf,
    /// Age after which a cache entry is rebuilt.
    pub cache_expiry_days: u32,
    /// Multiplier bringing the income table to current euros.
    pub income_inflation_factor: f64,
    /// Median income (before inflation) of communes missing from the
    /// income table.
    pub default_median_income: f64,
    /// Poverty rate when the income table has none.
    pub default_poverty_rate: f64,
    /// Housing table inside `raw/`.
    pub housing_file: String,
    /// Archive the housing table is extracted from when missing.
    pub housing_archive: String,
    /// Income table inside `raw/`.
    pub income_file: String,
    /// Commune boundaries inside `raw/`.
    pub communes_file: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            cache_expiry_days: 7,
            income_inflation_factor: 1.18,
            default_median_income: 22_000.0,
            default_poverty_rate: 14.0,
            housing_file: "base-cc-logement-2021.CSV".to_string(),
            housing_archive: "base-cc-logement-2021.zip".to_string(),
            income_file: "niveau-de-vie-communes.csv".to_string(),
            communes_file: "communes.geojson".to_string(),
        }
    }
}

#[derive(Deserialize)]
struct IngestSection {
    #[serde(default)]
    ingest: IngestConfig,
}

impl IngestConfig {
    /// Reads the `[ingest]` table of a TOML document. Other tables are
    /// ignored, so the analysis settings can share the file.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Toml`] on malformed input.
    pub fn from_toml_str(s: &str) -> Result<Self, IngestError> {
        let section: IngestSection = toml::de::from_str(s)?;
        Ok(section.ingest)
    }

    /// Reads the `[ingest]` table of a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Io`] if the file cannot be read, otherwise
    /// see [`Self::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, IngestError> {
        let contents = std::fs::read_to_string(path).map_err(|e| IngestError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Defaults applied to the income table.
    #[must_use]
    pub const fn income_defaults(&self) -> IncomeDefaults {
        IncomeDefaults {
            inflation_factor: self.income_inflation_factor,
            median_income: self.default_median_income,
            poverty_rate: self.default_poverty_rate,
        }
    }
}

/// Outcome of warming one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetReport {
    /// Cache name.
    pub name: &'static str,
    /// Rows in the dataset.
    pub rows: usize,
    /// Whether it was already cached.
    pub cached: bool,
}

/// Reads the source datasets through the cache.
#[derive(Debug, Clone)]
pub struct DataLoader {
    config: IngestConfig,
    paths: DataPaths,
    cache: DatasetCache,
}

impl DataLoader {
    #[must_use]
    pub fn new(config: IngestConfig) -> Self {
        let paths = DataPaths::new(&config.data_dir);
        let cache = DatasetCache::new(paths.clone(), config.cache_expiry_days);
        Self {
            config,
            paths,
            cache,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &IngestConfig {
        &self.config
    }

    #[must_use]
    pub const fn paths(&self) -> &DataPaths {
        &self.paths
    }

    #[must_use]
    pub const fn cache(&self) -> &DatasetCache {
        &self.cache
    }

    fn communes_geo_with_status(&self) -> Result<(Vec<CommuneGeo>, CacheStatus), IngestError> {
        self.cache.get_or_build(COMMUNES_DATASET, || {
            geography::parse_communes_file(&self.paths.raw_file(&self.config.communes_file))
        })
    }

    fn housing_with_status(&self) -> Result<(Vec<HousingRow>, CacheStatus), IngestError> {
        self.cache.get_or_build(HOUSING_DATASET, || {
            let target = self.paths.raw_file(&self.config.housing_file);
            archive::extract_if_missing(
                &self.paths.raw_file(&self.config.housing_archive),
                &self.config.housing_file,
                &target,
            )?;
            housing::parse_housing_file(&target)
        })
    }

    fn income_with_status(&self) -> Result<(Vec<IncomeRow>, CacheStatus), IngestError> {
        let defaults = self.config.income_defaults();
        self.cache
            .get_or_build_keyed(INCOME_DATASET, &defaults.cache_key(), || {
                income::parse_income_file(&self.paths.raw_file(&self.config.income_file), &defaults)
            })
    }

    fn records_with_status(
        &self,
    ) -> Result<(Vec<MunicipalityRecord>, CacheStatus), IngestError> {
        let defaults = self.config.income_defaults();
        self.cache
            .get_or_build_keyed(RECORDS_DATASET, &defaults.cache_key(), || {
                let communes = self.communes_geo()?;
                let housing = self.housing()?;
                let income = self.income()?;
                merge::merge_records(&communes, &housing, &income, &defaults)
            })
    }

    /// Commune centroids.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] if the boundaries cannot be read or parsed.
    pub fn communes_geo(&self) -> Result<Vec<CommuneGeo>, IngestError> {
        Ok(self.communes_geo_with_status()?.0)
    }

    /// Housing rows, extracting the table from its archive when needed.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] if the table cannot be extracted, read or
    /// parsed.
    pub fn housing(&self) -> Result<Vec<HousingRow>, IngestError> {
        Ok(self.housing_with_status()?.0)
    }

    /// Income rows. Empty when the income table is absent.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] if the table exists but cannot be parsed.
    pub fn income(&self) -> Result<Vec<IncomeRow>, IngestError> {
        Ok(self.income_with_status()?.0)
    }

    /// The merged record store, sorted by commune code.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] if any source fails to load or a merged
    /// record is invalid.
    pub fn records(&self) -> Result<Vec<MunicipalityRecord>, IngestError> {
        Ok(self.records_with_status()?.0)
    }

    /// Loads every dataset in dependency order so later runs hit the cache.
    ///
    /// # Errors
    ///
    /// Returns the first [`IngestError`] encountered.
    pub fn build_caches(
        &self,
        progress: &dyn ProgressCallback,
    ) -> Result<Vec<DatasetReport>, IngestError> {
        fn report<T>(name: &'static str, (rows, status): (Vec<T>, CacheStatus)) -> DatasetReport {
            DatasetReport {
                name,
                rows: rows.len(),
                cached: status == CacheStatus::Hit,
            }
        }

        progress.set_total(4);
        let mut reports = Vec::with_capacity(4);

        progress.set_message(format!("Loading {COMMUNES_DATASET}"));
        reports.push(report(COMMUNES_DATASET, self.communes_geo_with_status()?));
        progress.inc(1);

        progress.set_message(format!("Loading {HOUSING_DATASET}"));
        reports.push(report(HOUSING_DATASET, self.housing_with_status()?));
        progress.inc(1);

        progress.set_message(format!("Loading {INCOME_DATASET}"));
        reports.push(report(INCOME_DATASET, self.income_with_status()?));
        progress.inc(1);

        progress.set_message(format!("Merging {RECORDS_DATASET}"));
        reports.push(report(RECORDS_DATASET, self.records_with_status()?));
        progress.inc(1);

        progress.finish(format!("{} datasets ready", reports.len()));
        for r in &reports {
            log::info!(
                "{}: {} rows ({})",
                r.name,
                r.rows,
                if r.cached { "cached" } else { "rebuilt" }
            );
        }

        Ok(reports)
    }
}
