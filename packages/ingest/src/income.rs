//! Commune income table.
//!
//! The income extracts come with varying headers, so columns are found by
//! name fragments: the code column is `CODGEO`, or else contains `CODE` or
//! `COM`, the income
//! column `REVENU`, `NIVEAU`, `MEDIAN` or `VIE`, and the optional poverty
//! column `PAUVRETE` or `TP60`. The delimiter is sniffed from the header.

use std::path::Path;

use bitcode::{Decode, Encode};

use crate::IngestError;
use crate::table::{Header, number, sniff_delimiter, text};

const CODE_COLUMN: &str = "CODGEO";
const CODE_HINTS: &[&str] = &["CODE", "COM"];
const INCOME_HINTS: &[&str] = &["REVENU", "NIVEAU", "MEDIAN", "VIE"];
const POVERTY_HINTS: &[&str] = &["PAUVRETE", "TP60"];

/// Defaults applied while reading the income table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncomeDefaults {
    /// Multiplier bringing the source year to current euros.
    pub inflation_factor: f64,
    /// Median income (before inflation) for rows with no readable value.
    pub median_income: f64,
    /// Poverty rate when the table has no poverty column or value.
    pub poverty_rate: f64,
}

impl IncomeDefaults {
    /// Bit patterns of the three defaults, stored with the caches they
    /// shape.
    #[must_use]
    pub const fn cache_key(&self) -> [u64; 3] {
        [
            self.inflation_factor.to_bits(),
            self.median_income.to_bits(),
            self.poverty_rate.to_bits(),
        ]
    }
}

/// Income figures for one commune.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct IncomeRow {
    /// INSEE commune code.
    pub code: String,
    /// Median income in current euros.
    pub median_income: f64,
    /// Poverty rate in percent.
    pub poverty_rate: f64,
}

/// Parses the income table from its raw bytes.
///
/// # Errors
///
/// Returns [`IngestError::MissingColumn`] if no code or income column can be
/// found or [`IngestError::Csv`] if the bytes are not valid delimited text.
pub fn parse_income(
    bytes: &[u8],
    file: &str,
    defaults: &IncomeDefaults,
) -> Result<Vec<IncomeRow>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(sniff_delimiter(bytes))
        .flexible(true)
        .from_reader(bytes);

    let csv_err = |source| IngestError::Csv {
        path: file.to_string(),
        source,
    };

    let header = Header::new(reader.byte_headers().map_err(csv_err)?);
    let code = header
        .position(CODE_COLUMN)
        .or_else(|| header.find_containing(CODE_HINTS, None))
        .ok_or_else(|| IngestError::MissingColumn {
            file: file.to_string(),
            column: format!("{CODE_COLUMN}|{}", CODE_HINTS.join("|")),
        })?;
    let income = header
        .find_containing(INCOME_HINTS, Some(code))
        .ok_or_else(|| IngestError::MissingColumn {
            file: file.to_string(),
            column: INCOME_HINTS.join("|"),
        })?;
    let poverty = header.find_containing(POVERTY_HINTS, Some(code));

    log::debug!(
        "{file}: code column {:?}, income column {:?}, poverty column {:?}",
        header.names().get(code),
        header.names().get(income),
        poverty.and_then(|i| header.names().get(i))
    );

    let mut rows = Vec::new();
    let mut defaulted = 0_u64;

    for record in reader.byte_records() {
        let record = record.map_err(csv_err)?;

        let code_value = text(&record, code);
        if code_value.is_empty() {
            continue;
        }

        let raw_income = number(&record, income).unwrap_or_else(|| {
            defaulted += 1;
            defaults.median_income
        });

        rows.push(IncomeRow {
            code: code_value.into_owned(),
            median_income: raw_income * defaults.inflation_factor,
            poverty_rate: poverty
                .and_then(|i| number(&record, i))
                .map_or(defaults.poverty_rate, |p| p.clamp(0.0, 100.0)),
        });
    }

    if defaulted > 0 {
        log::warn!("{file}: {defaulted} rows had no readable income and use the default");
    }
    log::info!(
        "{file}: parsed {} income rows (inflation x{})",
        rows.len(),
        defaults.inflation_factor
    );

    Ok(rows)
}

/// Parses the income table at `path`. A missing file yields no rows, so
/// every commune falls back to the default income.
///
/// # Errors
///
/// Returns [`IngestError::Io`] if the file exists but cannot be read,
/// otherwise see [`parse_income`].
pub fn parse_income_file(
    path: &Path,
    defaults: &IncomeDefaults,
) -> Result<Vec<IncomeRow>, IngestError> {
    if !path.exists() {
        log::warn!(
            "Income table {} not found; every commune uses the default income",
            path.display()
        );
        return Ok(Vec::new());
    }

    log::info!("Reading income table {}", path.display());
    let bytes = std::fs::read(path).map_err(|e| IngestError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_income(&bytes, &path.display().to_string(), defaults)
}
