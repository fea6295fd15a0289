mod common;

use common::scenario_table;
use pgtadash::{Dashboard, RateColumn, COL_EMBRYO_COUNT, COL_HOSPITAL};
use polars::prelude::*;

#[test]
fn default_dashboard_selects_everything() {
    let dashboard = Dashboard::from_table(scenario_table()).unwrap();
    let snapshot = dashboard.snapshot().unwrap();
    assert!(snapshot.filtered.equals(dashboard.table()));
    assert!(snapshot.display.equals(dashboard.table()));
    assert_eq!(snapshot.metrics.hospital_count, 2);
    assert_eq!(snapshot.metrics.embryo_total, 35.0);
}

#[test]
fn filter_scenario_loc_x_hospital_a() {
    let mut dashboard = Dashboard::from_table(scenario_table()).unwrap();
    dashboard
        .set_locations(Some(vec!["LocX".to_string()]))
        .unwrap();
    dashboard
        .set_hospitals(Some(vec!["A".to_string()]))
        .unwrap();
    let snapshot = dashboard.snapshot().unwrap();

    assert_eq!(snapshot.filtered.height(), 2);
    let counts: Vec<i64> = snapshot
        .filtered
        .column(COL_EMBRYO_COUNT)
        .unwrap()
        .i64()
        .unwrap()
        .iter()
        .flatten()
        .collect();
    assert_eq!(counts, vec![10, 5]);

    assert_eq!(snapshot.metrics.hospital_count, 1);
    assert_eq!(snapshot.metrics.embryo_total, 15.0);
    assert!((snapshot.metrics.ch_rate_avg - 55.0).abs() < 1e-12);
}

#[test]
fn search_restricts_the_display_table_only() {
    let mut dashboard = Dashboard::from_table(scenario_table()).unwrap();
    dashboard.search = "locy".to_string();
    let snapshot = dashboard.snapshot().unwrap();
    assert_eq!(snapshot.filtered.height(), 3);
    assert_eq!(snapshot.display.height(), 1);
    let hospitals: Vec<&str> = snapshot
        .display
        .column(COL_HOSPITAL)
        .unwrap()
        .str()
        .unwrap()
        .iter()
        .flatten()
        .collect();
    assert_eq!(hospitals, vec!["B"]);
    // Metrics still describe the filtered table, not the searched view.
    assert_eq!(snapshot.metrics.hospital_count, 2);
}

#[test]
fn empty_selection_degrades_gracefully() {
    let mut dashboard = Dashboard::from_table(scenario_table()).unwrap();
    dashboard.set_locations(Some(vec![])).unwrap();
    let snapshot = dashboard.snapshot().unwrap();

    assert_eq!(snapshot.filtered.height(), 0);
    assert_eq!(snapshot.metrics.hospital_count, 0);
    assert_eq!(snapshot.metrics.embryo_total, 0.0);
    assert!(snapshot.metrics.ch_rate_avg.is_nan());
    assert!(snapshot.scatter.is_empty());
    assert!(snapshot.bars.is_empty());
    assert_eq!(snapshot.location_summary.height(), 0);
    // The describe table keeps its shape, with NaN statistics.
    assert_eq!(snapshot.statistics.height(), 8);
}

#[test]
fn snapshot_chart_data_follows_the_metric() {
    let mut dashboard = Dashboard::from_table(scenario_table()).unwrap();
    dashboard.rate = RateColumn::AfRate;
    let snapshot = dashboard.snapshot().unwrap();
    // Hospital A rows have AF-RATE 10 and 30.
    let a = &snapshot.scatter[0];
    assert_eq!(a.hospital, "A");
    assert_eq!(a.points[0].rate, 10.0);
    assert_eq!(a.points[1].rate, 30.0);
    let bar_a = snapshot.bars.iter().find(|(h, _)| h == "A").unwrap();
    assert!((bar_a.1 - 20.0).abs() < 1e-12);
}

#[test]
fn location_summary_scenario() {
    let dashboard = Dashboard::from_table(scenario_table()).unwrap();
    let snapshot = dashboard.snapshot().unwrap();
    let summary = &snapshot.location_summary;
    assert_eq!(summary.height(), 2);
    let sums: Vec<i64> = summary
        .column("embryo_count_sum")
        .unwrap()
        .i64()
        .unwrap()
        .iter()
        .flatten()
        .collect();
    assert_eq!(sums, vec![15, 20]);
}

#[test]
fn correlation_output_is_symmetric() {
    let dashboard = Dashboard::from_table(scenario_table()).unwrap();
    let snapshot = dashboard.snapshot().unwrap();
    let matrix = &snapshot.correlation;
    let n = matrix.columns.len();
    assert_eq!(n, 4);
    for i in 0..n {
        for j in 0..n {
            let a = matrix.get(i, j);
            let b = matrix.get(j, i);
            assert!(a == b || (a.is_nan() && b.is_nan()));
        }
        assert!((matrix.get(i, i) - 1.0).abs() < 1e-12);
    }
    assert_eq!(snapshot.heatmap.len(), n * n);
}
