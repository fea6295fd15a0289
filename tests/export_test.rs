mod common;

use common::scenario_table;
use pgtadash::export::{to_csv_bytes, write_exports, FILTERED_DATA_FILE, STATISTICS_FILE};
use pgtadash::statistics::{describe_frame, NUMERIC_COLUMNS};
use pgtadash::{Dashboard, COL_EMBRYO_COUNT};
use polars::prelude::*;

fn reparse(bytes: &[u8]) -> DataFrame {
    CsvReader::new(std::io::Cursor::new(bytes.to_vec()))
        .with_options(CsvReadOptions::default())
        .finish()
        .unwrap()
}

#[test]
fn filtered_export_round_trips() {
    let mut dashboard = Dashboard::from_table(scenario_table()).unwrap();
    dashboard
        .set_locations(Some(vec!["LocX".to_string()]))
        .unwrap();
    let snapshot = dashboard.snapshot().unwrap();

    let bytes = to_csv_bytes(&snapshot.filtered).unwrap();
    let back = reparse(&bytes);
    assert!(back.equals(&snapshot.filtered));
}

#[test]
fn statistics_export_round_trips_values() {
    let df = scenario_table();
    let stats = describe_frame(&df, &NUMERIC_COLUMNS).unwrap();
    let back = reparse(&to_csv_bytes(&stats).unwrap());
    assert_eq!(back.height(), stats.height());
    assert_eq!(back.width(), stats.width());
    // Spot-check the mean row of embryo_count: (10 + 20 + 5) / 3.
    let means: Vec<f64> = back
        .column(COL_EMBRYO_COUNT)
        .unwrap()
        .f64()
        .unwrap()
        .iter()
        .flatten()
        .collect();
    assert!((means[1] - 35.0 / 3.0).abs() < 1e-9);
}

#[test]
fn exports_written_under_fixed_names() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = Dashboard::from_table(scenario_table())
        .unwrap()
        .snapshot()
        .unwrap();
    let written = write_exports(&snapshot.filtered, &snapshot.statistics, dir.path()).unwrap();
    assert_eq!(
        written,
        vec![
            dir.path().join(FILTERED_DATA_FILE),
            dir.path().join(STATISTICS_FILE),
        ]
    );
    for path in written {
        assert!(path.exists());
    }
}

#[test]
fn empty_filter_exports_header_only() {
    let mut dashboard = Dashboard::from_table(scenario_table()).unwrap();
    dashboard.set_hospitals(Some(vec![])).unwrap();
    let snapshot = dashboard.snapshot().unwrap();
    let bytes = to_csv_bytes(&snapshot.filtered).unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert_eq!(text.lines().count(), 1);
    assert!(text.starts_with("hospital_location"));
}
