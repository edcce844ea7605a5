//! Joins geography, housing and income rows into municipality records.

use std::collections::{BTreeMap, HashMap};

use franchise_zones_commune_models::MunicipalityRecord;
use franchise_zones_commune_models::regions::region_for_department;

use crate::IngestError;
use crate::geography::CommuneGeo;
use crate::housing::HousingRow;
use crate::income::{IncomeDefaults, IncomeRow};

/// Builds one record per commune present in both the geography and the
/// housing table, sorted by code.
///
/// Communes missing from the income table get the inflated default income
/// and the default poverty rate.
///
/// # Errors
///
/// Returns [`IngestError::DuplicateCode`] if the geography lists a code twice
/// or [`IngestError::InvalidRecord`] if a merged record fails validation.
pub fn merge_records(
    communes: &[CommuneGeo],
    housing: &[HousingRow],
    income: &[IncomeRow],
    defaults: &IncomeDefaults,
) -> Result<Vec<MunicipalityRecord>, IngestError> {
    let housing: HashMap<&str, &HousingRow> =
        housing.iter().map(|row| (row.code.as_str(), row)).collect();
    let income: HashMap<&str, &IncomeRow> =
        income.iter().map(|row| (row.code.as_str(), row)).collect();

    let mut records = BTreeMap::new();
    let mut without_housing = 0_u64;
    let mut without_income = 0_u64;

    for commune in communes {
        let Some(housing) = housing.get(commune.code.as_str()) else {
            without_housing += 1;
            continue;
        };

        let (median_income, poverty_rate) = income.get(commune.code.as_str()).map_or_else(
            || {
                without_income += 1;
                (
                    defaults.median_income * defaults.inflation_factor,
                    defaults.poverty_rate,
                )
            },
            |row| (row.median_income, row.poverty_rate),
        );

        let name = if commune.name.is_empty() || commune.name == commune.code {
            housing.name.clone().unwrap_or_else(|| commune.name.clone())
        } else {
            commune.name.clone()
        };

        let record = MunicipalityRecord {
            code: commune.code.clone(),
            name,
            region: region_for_department(&commune.department).to_string(),
            department: commune.department.clone(),
            latitude: commune.latitude,
            longitude: commune.longitude,
            population: housing.population,
            households: housing.households,
            pct_single_family: housing.pct_single_family,
            pct_primary_residences: housing.pct_primary_residences,
            median_income,
            poverty_rate,
        };

        record.validate().map_err(|issue| IngestError::InvalidRecord {
            code: record.code.clone(),
            message: issue.to_string(),
        })?;

        if records.insert(record.code.clone(), record).is_some() {
            return Err(IngestError::DuplicateCode {
                code: commune.code.clone(),
            });
        }
    }

    if without_housing > 0 {
        log::warn!("{without_housing} communes have no housing row and were dropped");
    }
    if without_income > 0 {
        log::warn!("{without_income} communes have no income row and use the default income");
    }
    log::info!("Merged {} municipality records", records.len());

    Ok(records.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULTS: IncomeDefaults = IncomeDefaults {
        inflation_factor: 1.18,
        median_income: 22_000.0,
        poverty_rate: 14.0,
    };

    fn geo(code: &str, name: &str) -> CommuneGeo {
        CommuneGeo {
            code: code.to_string(),
            name: name.to_string(),
            department: code[..2].to_string(),
            latitude: 46.2,
            longitude: -1.15,
        }
    }

    fn housing(code: &str) -> HousingRow {
        HousingRow {
            code: code.to_string(),
            name: Some(format!("Logement {code}")),
            households: 1_000,
            population: 2_200,
            dwellings: 1_100,
            pct_single_family: 70.0,
            pct_primary_residences: 90.0,
        }
    }

    #[test]
    fn joins_tables_and_applies_defaults() {
        let communes = [geo("17300", "La Rochelle"), geo("17200", "17200"), geo("17999", "Orphan")];
        let housing = [housing("17200"), housing("17300")];
        let income = [IncomeRow {
            code: "17300".to_string(),
            median_income: 25_000.0,
            poverty_rate: 9.0,
        }];

        let records = merge_records(&communes, &housing, &income, &DEFAULTS).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].code, "17200");
        assert_eq!(records[0].name, "Logement 17200");
        assert_eq!(records[0].region, "Nouvelle-Aquitaine");
        assert!((records[0].median_income - 22_000.0 * 1.18).abs() < 1e-6);
        assert!((records[0].poverty_rate - 14.0).abs() < f64::EPSILON);

        assert_eq!(records[1].name, "La Rochelle");
        assert!((records[1].median_income - 25_000.0).abs() < f64::EPSILON);
        assert_eq!(records[1].households, 1_000);
    }

    #[test]
    fn duplicate_geography_code() {
        let communes = [geo("17300", "A"), geo("17300", "B")];
        let err = merge_records(&communes, &[housing("17300")], &[], &DEFAULTS).unwrap_err();
        assert!(matches!(err, IngestError::DuplicateCode { ref code } if code == "17300"));
    }

    #[test]
    fn invalid_record_is_rejected() {
        let mut commune = geo("17300", "A");
        commune.latitude = 123.0;
        let err = merge_records(&[commune], &[housing("17300")], &[], &DEFAULTS).unwrap_err();
        assert!(matches!(err, IngestError::InvalidRecord { ref code, .. } if code == "17300"));
    }
}
