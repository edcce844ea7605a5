use std::collections::BTreeSet;

use franchise_zones_commune_models::{MunicipalityRecord, regions};
use franchise_zones_zone::distance::{KM_PER_DEGREE_LAT, haversine_km};
use franchise_zones_zone::run_analysis;
use franchise_zones_zone_models::{AnalysisConfig, ScoreWeights, WeightPreset};

const ORIGIN: (f64, f64) = (46.0, -1.0);

#[allow(clippy::too_many_arguments)]
fn record(
    code: &str,
    name: &str,
    (lat, lng): (f64, f64),
    population: u64,
    households: u64,
    pct_single_family: f64,
    pct_primary_residences: f64,
    poverty_rate: f64,
) -> MunicipalityRecord {
    let department = regions::department_from_code(code)
        .unwrap_or_default()
        .to_string();
    MunicipalityRecord {
        code: code.to_string(),
        name: name.to_string(),
        region: regions::region_for_department(&department).to_string(),
        department,
        latitude: lat,
        longitude: lng,
        population,
        households,
        pct_single_family,
        pct_primary_residences,
        median_income: 22_000.0,
        poverty_rate,
    }
}

fn east_of((lat, lng): (f64, f64), km: f64) -> (f64, f64) {
    (lat, lng + km / (KM_PER_DEGREE_LAT * lat.to_radians().cos()))
}

fn north_of((lat, lng): (f64, f64), km: f64) -> (f64, f64) {
    (lat + km / KM_PER_DEGREE_LAT, lng)
}

/// Deterministic pseudo-random sequence in `[0, 1)`.
struct Lcg(u64);

impl Lcg {
    #[allow(clippy::cast_precision_loss)]
    fn next(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.0 >> 11) as f64 / (1_u64 << 53) as f64
    }
}

/// Five centers 35 km apart along an east-west line with members scattered
/// around each, plus a few isolated municipalities.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn synthetic_store() -> Vec<MunicipalityRecord> {
    let mut rng = Lcg(17);
    let mut records = Vec::new();

    for k in 0..5_u32 {
        let position = east_of(ORIGIN, f64::from(k) * 35.0);
        let households = 1_500 + u64::from(k) * 4_000;
        records.push(record(
            &format!("17{k}00"),
            &format!("Centre {k}"),
            position,
            households * 2,
            households,
            60.0 + f64::from(k) * 5.0,
            80.0 + f64::from(k),
            8.0 + f64::from(k),
        ));

        for j in 0..(3 + k * 2) {
            let east = (rng.next() - 0.5) * 30.0;
            let north = (rng.next() - 0.5) * 30.0;
            records.push(record(
                &format!("17{k}{:02}", j + 1),
                &format!("Village {k}-{j}"),
                north_of(east_of(position, east), north),
                200 + (rng.next() * 700.0) as u64,
                100 + (rng.next() * 400.0) as u64,
                55.0 + rng.next() * 40.0,
                72.0 + rng.next() * 26.0,
                5.0 + rng.next() * 15.0,
            ));
        }
    }

    for (i, km) in [200.0, 260.0].into_iter().enumerate() {
        records.push(record(
            &format!("79{i:03}"),
            "Isolé",
            north_of(ORIGIN, km),
            400,
            300,
            80.0,
            90.0,
            10.0,
        ));
    }

    records
}

#[test]
fn three_commune_scenario() {
    let a = record("17001", "A", ORIGIN, 5_000, 2_000, 60.0, 80.0, 10.0);
    let b = record("17002", "B", east_of(ORIGIN, 5.0), 400, 150, 70.0, 75.0, 12.0);
    let c = record("17003", "C", east_of(ORIGIN, 25.0), 700, 300, 60.0, 80.0, 11.0);
    let config = AnalysisConfig {
        national_median_income: Some(22_000.0),
        ..AnalysisConfig::default()
    };

    let result = run_analysis(&[a, b, c], &config, &WeightPreset::Equilibre.weights()).unwrap();

    assert_eq!(result.zones.len(), 1);
    let zone = &result.zones[0];
    assert_eq!(
        zone.zone.members,
        BTreeSet::from(["17001".to_string(), "17002".to_string()])
    );
    assert_eq!(zone.zone.households, 2_150);
    assert_eq!(result.stats.unassigned, 1);
    assert!(zone.scores.total > 0.0 && zone.scores.total < 100.0);
    assert!((zone.potential_clients - 43.0).abs() < 1e-9);
}

#[test]
fn repeated_runs_are_identical() {
    let records = synthetic_store();
    let config = AnalysisConfig::default();
    let weights = WeightPreset::Marche.weights();

    let first = run_analysis(&records, &config, &weights).unwrap();
    let second = run_analysis(&records, &config, &weights).unwrap();
    assert_eq!(first, second);

    let reversed: Vec<MunicipalityRecord> = records.into_iter().rev().collect();
    let third = run_analysis(&reversed, &config, &weights).unwrap();
    assert_eq!(first, third);
}

#[test]
fn zones_are_disjoint_and_members_use_nearest_center() {
    let records = synthetic_store();
    let config = AnalysisConfig::default();
    let result = run_analysis(&records, &config, &ScoreWeights::default()).unwrap();

    let centers: Vec<&MunicipalityRecord> = records
        .iter()
        .filter(|r| r.population >= config.center_min_population)
        .collect();
    let by_code = |code: &str| records.iter().find(|r| r.code == code).unwrap();

    let mut seen = BTreeSet::new();
    for scored in &result.zones {
        let center = by_code(&scored.zone.center_code);
        for code in &scored.zone.members {
            assert!(seen.insert(code.clone()), "{code} appears in two zones");
            if *code == scored.zone.center_code {
                continue;
            }
            let member = by_code(code);
            let own = haversine_km(
                member.latitude,
                member.longitude,
                center.latitude,
                center.longitude,
            );
            assert!(own <= config.zone_radius_km, "{code} is {own} km away");
            for other in &centers {
                let d = haversine_km(
                    member.latitude,
                    member.longitude,
                    other.latitude,
                    other.longitude,
                );
                assert!(d >= own, "{code} is closer to {}", other.code);
            }
        }
    }
}

#[test]
fn scored_zones_meet_zone_criteria() {
    let result =
        run_analysis(&synthetic_store(), &AnalysisConfig::default(), &ScoreWeights::default())
            .unwrap();

    assert!(!result.zones.is_empty());
    for scored in &result.zones {
        assert!(scored.zone.member_count() >= 2);
        assert!(scored.zone.pct_single_family >= 50.0);
        assert!(scored.zone.pct_primary_residences >= 70.0);
        for score in [
            scored.scores.housing,
            scored.scores.income,
            scored.scores.market_size,
            scored.scores.total,
        ] {
            assert!((0.0..=100.0).contains(&score));
        }
    }
    assert!(!result.zones.iter().any(|z| z.zone.members.contains("79000")));
}

#[test]
fn market_size_spans_smallest_to_largest_zone() {
    let mut records = synthetic_store();
    // A two-commune zone with 400 households, below the 500 household floor.
    let small_center = north_of(ORIGIN, 400.0);
    records.push(record("16100", "Petit Bourg", small_center, 1_200, 250, 80.0, 90.0, 9.0));
    records.push(record(
        "16101",
        "Hameau",
        east_of(small_center, 3.0),
        350,
        150,
        80.0,
        90.0,
        9.0,
    ));

    let result =
        run_analysis(&records, &AnalysisConfig::default(), &ScoreWeights::default()).unwrap();
    assert!(result.zones.len() >= 2);

    let smallest = result
        .zones
        .iter()
        .min_by_key(|z| z.zone.households)
        .unwrap();
    let largest = result
        .zones
        .iter()
        .max_by_key(|z| z.zone.households)
        .unwrap();

    assert_eq!(smallest.zone.id, "16100");
    assert_eq!(smallest.zone.households, 400);
    assert!(smallest.scores.market_size.abs() < 1e-9);
    assert!((largest.scores.market_size - 100.0).abs() < 1e-9);
}

#[test]
fn zones_above_market_floor_keep_a_market_score() {
    let result =
        run_analysis(&synthetic_store(), &AnalysisConfig::default(), &ScoreWeights::default())
            .unwrap();

    let smallest = result
        .zones
        .iter()
        .min_by_key(|z| z.zone.households)
        .unwrap();
    let largest = result
        .zones
        .iter()
        .max_by_key(|z| z.zone.households)
        .unwrap();
    assert!(smallest.zone.households > 500);

    #[allow(clippy::cast_precision_loss)]
    let expected = ((smallest.zone.households as f64 + 1.0).ln() - 500.0_f64.ln())
        / ((largest.zone.households as f64 + 1.0).ln() - 500.0_f64.ln())
        * 100.0;
    assert!(smallest.scores.market_size > 0.0);
    assert!((smallest.scores.market_size - expected).abs() < 1e-9);
}

#[test]
fn ranks_follow_total_score() {
    let result =
        run_analysis(&synthetic_store(), &AnalysisConfig::default(), &ScoreWeights::default())
            .unwrap();

    for (i, pair) in result.zones.windows(2).enumerate() {
        assert_eq!(pair[0].rank, i + 1);
        assert!(pair[0].scores.total >= pair[1].scores.total);
    }
}

#[test]
fn strict_thresholds_give_empty_result() {
    let config = AnalysisConfig {
        zone_criteria: franchise_zones_zone_models::ZoneCriteria {
            min_avg_pct_single_family: 99.0,
            ..Default::default()
        },
        ..AnalysisConfig::default()
    };
    let result = run_analysis(&synthetic_store(), &config, &ScoreWeights::default()).unwrap();
    assert!(result.is_empty());
    assert_eq!(result.summary().zone_count, 0);
}
