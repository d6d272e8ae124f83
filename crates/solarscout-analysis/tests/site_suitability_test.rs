//! End-to-end site suitability checks over small planar datasets.

use geo::{line_string, polygon, Geometry};
use solarscout_analysis::{analyze, BuilderSettings, DatasetBuilder, DatasetSnapshot, ResultEncoder};
use solarscout_core::models::{AnalysisConfig, RawFeature};

const PLANAR: BuilderSettings = BuilderSettings {
    canonical_srid: 25832,
    default_source_srid: 25832,
};

fn rect(id: &str, x0: f64, y0: f64, x1: f64, y1: f64) -> RawFeature {
    RawFeature::new(
        id,
        polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1), (x: x0, y: y0)],
    )
}

fn grid_line(id: &str, from: (f64, f64), to: (f64, f64)) -> RawFeature {
    RawFeature::new(
        id,
        Geometry::LineString(line_string![(x: from.0, y: from.1), (x: to.0, y: to.1)]),
    )
    .with_tag("power", "line")
}

fn build(features: &[RawFeature]) -> DatasetSnapshot {
    DatasetBuilder::new(PLANAR).build(1, features).unwrap()
}

/// A 5 ha farmland parcel, a residential area overlapping 1 ha of it and a
/// grid line 300 m from what remains.
fn five_hectare_scenario() -> DatasetSnapshot {
    build(&[
        rect("parcel", 0.0, 0.0, 250.0, 200.0).with_tag("landuse", "farmland"),
        rect("village", 200.0, 0.0, 300.0, 200.0).with_tag("landuse", "residential"),
        grid_line("line", (-1_000.0, 500.0), (1_000.0, 500.0)),
    ])
}

/// Several parcels with every exclusion category somewhere nearby
fn mixed_landscape() -> DatasetSnapshot {
    build(&[
        rect("p1", 0.0, 0.0, 400.0, 400.0).with_tag("landuse", "farmland"),
        rect("p2", 600.0, 0.0, 1_000.0, 300.0).with_tag("landuse", "meadow"),
        rect("p3", 0.0, 700.0, 300.0, 1_000.0).with_tag("landuse", "farm"),
        rect("p4", 1_500.0, 1_500.0, 1_800.0, 1_800.0).with_tag("landuse", "farmland"),
        rect("p5", 3_000.0, 0.0, 3_150.0, 150.0).with_tag("landuse", "meadow"),
        rect("houses", 350.0, 350.0, 450.0, 450.0).with_tag("landuse", "residential"),
        rect("forest", 1_000.0, 0.0, 1_100.0, 300.0).with_tag("natural", "wood"),
        rect("graves", 0.0, 1_000.0, 50.0, 1_050.0).with_tag("landuse", "cemetery"),
        rect("lake", 500.0, 500.0, 600.0, 650.0).with_tag("natural", "water"),
        rect("park", 2_000.0, 2_000.0, 2_100.0, 2_100.0).with_tag("leisure", "park"),
        rect("reserve", 1_400.0, 1_400.0, 1_750.0, 1_900.0).with_tag("leisure", "nature_reserve"),
        grid_line("l1", (-500.0, 550.0), (2_000.0, 550.0)),
        grid_line("l2", (2_500.0, -500.0), (2_500.0, 2_500.0)),
    ])
}

fn config(buffer: f64, exclude_nature: bool, min_area: f64, max_grid: f64) -> AnalysisConfig {
    AnalysisConfig::new(buffer, exclude_nature, min_area, max_grid).unwrap()
}

fn total_suitable_area(snapshot: &DatasetSnapshot, config: &AnalysisConfig) -> f64 {
    analyze(snapshot, config)
        .unwrap()
        .iter()
        .map(|site| site.suitable_area_ha)
        .sum()
}

#[test]
fn test_residential_overlap_scenario() {
    let snapshot = five_hectare_scenario();
    assert!((snapshot.parcels[0].area_ha - 5.0).abs() < 1e-9);

    let sites = analyze(&snapshot, &config(0.0, true, 2.0, 2_000.0)).unwrap();

    assert_eq!(sites.len(), 1);
    let site = &sites[0];
    assert_eq!(site.parcel_id, 1);
    assert_eq!(site.land_use_category, "farmland");
    assert!((site.original_area_ha - 5.0).abs() < 1e-9);
    assert!((site.suitable_area_ha - 4.0).abs() < 1e-6);
    assert!((site.grid_distance_m - 300.0).abs() < 1e-6);
    assert!(site.score > 0.0 && site.score < 100.0);
}

#[test]
fn test_min_area_above_residual_empties_result() {
    let snapshot = five_hectare_scenario();
    let sites = analyze(&snapshot, &config(0.0, true, 4.5, 2_000.0)).unwrap();
    assert!(sites.is_empty());
}

#[test]
fn test_grid_beyond_reach_empties_result() {
    let snapshot = five_hectare_scenario();
    let sites = analyze(&snapshot, &config(0.0, true, 2.0, 100.0)).unwrap();
    assert!(sites.is_empty());
}

#[test]
fn test_area_conservation() {
    let snapshot = mixed_landscape();
    for buffer in [0.0, 25.0, 100.0, 400.0] {
        for exclude_nature in [true, false] {
            let sites = analyze(&snapshot, &config(buffer, exclude_nature, 0.1, 10_000.0)).unwrap();
            for site in &sites {
                assert!(
                    site.suitable_area_ha <= site.original_area_ha,
                    "parcel {} grew from {} to {} ha",
                    site.parcel_id,
                    site.original_area_ha,
                    site.suitable_area_ha
                );
            }
        }
    }
}

#[test]
fn test_larger_buffer_never_increases_total_area() {
    let snapshot = mixed_landscape();
    let totals: Vec<f64> = [0.0, 50.0, 200.0, 800.0]
        .into_iter()
        .map(|buffer| total_suitable_area(&snapshot, &config(buffer, true, 0.5, 5_000.0)))
        .collect();

    for pair in totals.windows(2) {
        assert!(pair[1] <= pair[0] + 1e-9, "total area went up: {totals:?}");
    }
    assert!(totals[0] > totals[3]);
}

#[test]
fn test_buffer_reaches_exclusions_beyond_parcel_envelope() {
    // The exclusion square sits 100 m north of a 200x200 m parcel
    for (key, value) in [("landuse", "residential"), ("landuse", "cemetery")] {
        let snapshot = build(&[
            rect("parcel", 0.0, 0.0, 200.0, 200.0).with_tag("landuse", "farmland"),
            rect("neighbour", 0.0, 300.0, 200.0, 400.0).with_tag(key, value),
            grid_line("line", (-500.0, -100.0), (500.0, -100.0)),
        ]);

        let short = analyze(&snapshot, &config(50.0, true, 0.1, 2_000.0)).unwrap();
        assert_eq!(short.len(), 1, "{key}={value}");
        assert!((short[0].suitable_area_ha - 4.0).abs() < 1e-6, "{key}={value}");

        let long = analyze(&snapshot, &config(150.0, true, 0.1, 2_000.0)).unwrap();
        assert_eq!(long.len(), 1, "{key}={value}");
        assert!(
            (long[0].suitable_area_ha - 3.0).abs() < 1e-6,
            "{key}={value}: {}",
            long[0].suitable_area_ha
        );
        assert!((long[0].original_area_ha - 4.0).abs() < 1e-6);
        assert!((long[0].grid_distance_m - 100.0).abs() < 1e-6);
    }
}

#[test]
fn test_disabling_nature_exclusion_never_loses_sites() {
    let snapshot = mixed_landscape();
    for buffer in [0.0, 100.0, 500.0] {
        let strict = analyze(&snapshot, &config(buffer, true, 2.0, 5_000.0)).unwrap();
        let relaxed = analyze(&snapshot, &config(buffer, false, 2.0, 5_000.0)).unwrap();
        assert!(relaxed.len() >= strict.len(), "buffer {buffer}");
    }

    // Parcel 4 lies mostly inside the reserve
    let strict = analyze(&snapshot, &config(0.0, true, 2.0, 5_000.0)).unwrap();
    let relaxed = analyze(&snapshot, &config(0.0, false, 2.0, 5_000.0)).unwrap();
    assert!(!strict.iter().any(|site| site.parcel_id == 4));
    assert!(relaxed.iter().any(|site| site.parcel_id == 4));
}

#[test]
fn test_repeated_analysis_is_byte_identical() {
    let snapshot = mixed_landscape();
    let config = config(150.0, true, 0.5, 5_000.0);
    let encoder = ResultEncoder::identity(25832);

    let first = encoder.encode(&analyze(&snapshot, &config).unwrap()).unwrap();
    let second = encoder.encode(&analyze(&snapshot, &config).unwrap()).unwrap();

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_zero_constraint_baseline_keeps_parcel_areas() {
    // The only exclusion touching a parcel is a nature reserve
    let snapshot = build(&[
        rect("a", 0.0, 0.0, 200.0, 200.0).with_tag("landuse", "farmland"),
        rect("b", 300.0, 0.0, 400.0, 100.0).with_tag("landuse", "meadow"),
        rect("c", 500.0, 0.0, 520.0, 20.0).with_tag("landuse", "farm"),
        rect("reserve", 100.0, 50.0, 350.0, 300.0).with_tag("boundary", "protected_area"),
        rect("town", 9_000.0, 9_000.0, 9_500.0, 9_500.0).with_tag("landuse", "residential"),
        grid_line("line", (0.0, 400.0), (600.0, 400.0)),
    ]);

    let sites = analyze(&snapshot, &config(0.0, false, 0.5, 1_000.0)).unwrap();

    // Parcel c (0.04 ha) is below the area floor
    let mut ids: Vec<u64> = sites.iter().map(|site| site.parcel_id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2]);
    for site in &sites {
        let parcel = &snapshot.parcels[(site.parcel_id - 1) as usize];
        assert_eq!(site.suitable_area_ha, parcel.area_ha);
        assert_eq!(site.original_area_ha, parcel.area_ha);
        assert_eq!(site.geometry, parcel.geometry);
    }

    // With the reserve applied both parcels lose area
    let constrained = analyze(&snapshot, &config(0.0, true, 0.5, 1_000.0)).unwrap();
    for site in &constrained {
        assert!(site.suitable_area_ha < site.original_area_ha);
    }
}

#[test]
fn test_empty_candidate_set_is_not_an_error() {
    let snapshot = build(&[
        rect("houses", 0.0, 0.0, 100.0, 100.0).with_tag("landuse", "residential"),
        grid_line("line", (0.0, 200.0), (100.0, 200.0)),
    ]);
    assert!(analyze(&snapshot, &AnalysisConfig::default()).unwrap().is_empty());
}

#[test]
fn test_fully_excluded_parcels_yield_empty_result() {
    let snapshot = build(&[
        rect("p", 0.0, 0.0, 100.0, 100.0).with_tag("landuse", "farmland"),
        rect("lake", -10.0, -10.0, 110.0, 110.0).with_tag("natural", "water"),
        grid_line("line", (0.0, 200.0), (100.0, 200.0)),
    ]);
    let sites = analyze(&snapshot, &config(0.0, true, 0.1, 2_000.0)).unwrap();
    assert!(sites.is_empty());
}

#[test]
fn test_results_are_ranked_by_score() {
    let snapshot = mixed_landscape();
    let sites = analyze(&snapshot, &config(0.0, false, 0.1, 10_000.0)).unwrap();

    assert!(sites.len() >= 3);
    for pair in sites.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }

    let collection = ResultEncoder::identity(25832).encode(&sites).unwrap();
    let encoded_ids: Vec<_> = collection
        .features
        .iter()
        .map(|feature| feature.id.clone())
        .collect();
    let ranked_ids: Vec<_> = sites
        .iter()
        .map(|site| Some(geojson::feature::Id::Number(site.parcel_id.into())))
        .collect();
    assert_eq!(encoded_ids, ranked_ids);
}
