//! INSEE housing table (`base-cc-logement`).
//!
//! Semicolon-separated, one row per commune. Besides the housing counts it
//! carries households and population, so it doubles as the population
//! source.

use std::io::Read;
use std::path::Path;

use bitcode::{Decode, Encode};

use crate::IngestError;
use crate::table::{Header, count, number, text};

/// Average persons per household used when the population column is absent.
pub const PERSONS_PER_HOUSEHOLD: f64 = 2.2;

const CODE: &str = "CODGEO";
const NAME: &str = "LIBGEO";
const HOUSEHOLDS: &str = "P21_MEN";
const POPULATION: &str = "P21_POP";
const DWELLINGS: &str = "P21_LOG";
const HOUSES: &str = "P21_MAISON";
const PRIMARY_RESIDENCES: &str = "P21_RP";

/// Housing and household figures for one commune.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct HousingRow {
    /// INSEE commune code.
    pub code: String,
    /// Commune name, when the table has one.
    pub name: Option<String>,
    /// Households.
    pub households: u64,
    /// Population, or households x [`PERSONS_PER_HOUSEHOLD`].
    pub population: u64,
    /// Dwellings.
    pub dwellings: u64,
    /// Percent of dwellings that are houses, in `[0, 100]`.
    pub pct_single_family: f64,
    /// Percent of dwellings that are primary residences, in `[0, 100]`.
    pub pct_primary_residences: f64,
}

fn share(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        0.0
    } else {
        (part / whole * 100.0).clamp(0.0, 100.0)
    }
}

/// Parses the housing table from any reader.
///
/// Rows without a code are skipped. Unreadable counts default to zero, and
/// an unreadable dwelling count to one.
///
/// # Errors
///
/// Returns [`IngestError::MissingColumn`] if a required column is absent or
/// [`IngestError::Csv`] if the input is not valid delimited text.
pub fn parse_housing<R: Read>(reader: R, file: &str) -> Result<Vec<HousingRow>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(reader);

    let csv_err = |source| IngestError::Csv {
        path: file.to_string(),
        source,
    };

    let header = Header::new(reader.byte_headers().map_err(csv_err)?);
    let code = header.require(file, CODE)?;
    let households = header.require(file, HOUSEHOLDS)?;
    let dwellings = header.require(file, DWELLINGS)?;
    let houses = header.require(file, HOUSES)?;
    let primary = header.require(file, PRIMARY_RESIDENCES)?;
    let name = header.position(NAME);
    let population = header.position(POPULATION);

    if population.is_none() {
        log::warn!("{file}: no {POPULATION} column, estimating population from households");
    }

    let mut rows = Vec::new();
    let mut skipped = 0_u64;

    for record in reader.byte_records() {
        let record = record.map_err(csv_err)?;

        let code_value = text(&record, code);
        if code_value.is_empty() {
            skipped += 1;
            continue;
        }

        let household_count = number(&record, households).unwrap_or(0.0);
        let dwelling_count = number(&record, dwellings).unwrap_or(1.0);
        let population_count = population
            .and_then(|i| number(&record, i))
            .unwrap_or(household_count * PERSONS_PER_HOUSEHOLD);

        rows.push(HousingRow {
            code: code_value.into_owned(),
            name: name
                .map(|i| text(&record, i).into_owned())
                .filter(|n| !n.is_empty()),
            households: count(household_count),
            population: count(population_count),
            dwellings: count(dwelling_count),
            pct_single_family: share(number(&record, houses).unwrap_or(0.0), dwelling_count),
            pct_primary_residences: share(
                number(&record, primary).unwrap_or(0.0),
                dwelling_count,
            ),
        });
    }

    if skipped > 0 {
        log::warn!("{file}: skipped {skipped} rows without a commune code");
    }
    log::info!("{file}: parsed {} housing rows", rows.len());

    Ok(rows)
}

/// Parses the housing table at `path`.
///
/// # Errors
///
/// Returns [`IngestError::Io`] if the file cannot be opened, otherwise see
/// [`parse_housing`].
pub fn parse_housing_file(path: &Path) -> Result<Vec<HousingRow>, IngestError> {
    log::info!("Reading housing table {}", path.display());
    let file = std::fs::File::open(path).map_err(|e| IngestError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_housing(std::io::BufReader::new(file), &path.display().to_string())
}
