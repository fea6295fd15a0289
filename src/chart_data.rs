//! Chart-ready reshaping of the filtered table. Pure data transformation; the
//! renderers (terminal report, PNG writer) consume these shapes.

use color_eyre::Result;
use polars::prelude::*;
use std::collections::BTreeMap;

use crate::statistics::{self, Aggregate, CorrelationMatrix};
use crate::{COL_AF_RATE, COL_CH_RATE, COL_EMBRYO_COUNT, COL_HOSPITAL, COL_IC_RATE, COL_LOCATION};

/// The selectable chart metric. CH-RATE is the dashboard default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RateColumn {
    #[default]
    ChRate,
    AfRate,
    IcRate,
}

impl RateColumn {
    pub const ALL: [Self; 3] = [Self::ChRate, Self::AfRate, Self::IcRate];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ChRate => COL_CH_RATE,
            Self::AfRate => COL_AF_RATE,
            Self::IcRate => COL_IC_RATE,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == name)
    }
}

impl std::fmt::Display for RateColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One scatter point: embryo count on x, the chosen rate on y, point size from
/// the embryo count, location kept for hover labels.
#[derive(Clone, Debug, PartialEq)]
pub struct ScatterPoint {
    pub embryo_count: f64,
    pub rate: f64,
    pub size: f64,
    pub location: String,
}

/// Scatter points for one hospital (the color grouping).
#[derive(Clone, Debug)]
pub struct ScatterSeries {
    pub hospital: String,
    pub points: Vec<ScatterPoint>,
}

/// Five-number summary behind one box in the rate-distribution plot.
#[derive(Clone, Debug)]
pub struct RateSpread {
    pub column: String,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// One cell of the correlation heatmap.
#[derive(Clone, Debug, PartialEq)]
pub struct HeatmapCell {
    pub row: String,
    pub col: String,
    pub value: f64,
}

/// Scatter series grouped by hospital, points in row order within each series.
/// Rows with a null hospital or non-finite coordinates are skipped; an empty
/// table yields an empty vec.
pub fn scatter_series(df: &DataFrame, rate: RateColumn) -> Result<Vec<ScatterSeries>> {
    let hospitals = df.column(COL_HOSPITAL)?.as_materialized_series().clone();
    let locations = df.column(COL_LOCATION)?.as_materialized_series().clone();
    let embryos = df
        .column(COL_EMBRYO_COUNT)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    let rates = df
        .column(rate.as_str())?
        .as_materialized_series()
        .cast(&DataType::Float64)?;

    let hospitals = hospitals.str()?;
    let locations = locations.str()?;
    let embryos = embryos.f64()?;
    let rates = rates.f64()?;

    let mut grouped: BTreeMap<String, Vec<ScatterPoint>> = BTreeMap::new();
    for i in 0..df.height() {
        let (Some(hospital), Some(x), Some(y)) = (hospitals.get(i), embryos.get(i), rates.get(i))
        else {
            continue;
        };
        if !x.is_finite() || !y.is_finite() {
            continue;
        }
        grouped.entry(hospital.to_string()).or_default().push(ScatterPoint {
            embryo_count: x,
            rate: y,
            size: x,
            location: locations.get(i).unwrap_or_default().to_string(),
        });
    }
    Ok(grouped
        .into_iter()
        .map(|(hospital, points)| ScatterSeries { hospital, points })
        .collect())
}

/// (hospital, mean rate) pairs for the grouped bar chart, sorted by hospital.
pub fn rate_by_hospital(df: &DataFrame, rate: RateColumn) -> Result<Vec<(String, f64)>> {
    let summary = statistics::grouped(df, COL_HOSPITAL, &[(rate.as_str(), Aggregate::Mean)])?;
    let hospitals = summary.column(COL_HOSPITAL)?.as_materialized_series().clone();
    let means = summary
        .column(&format!("{}_mean", rate.as_str()))?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    let hospitals = hospitals.str()?;
    let means = means.f64()?;
    let mut bars = Vec::with_capacity(summary.height());
    for i in 0..summary.height() {
        if let (Some(hospital), Some(mean)) = (hospitals.get(i), means.get(i)) {
            bars.push((hospital.to_string(), mean));
        }
    }
    Ok(bars)
}

/// Five-number summaries of the three rate columns for the box plot.
pub fn rate_distributions(df: &DataFrame) -> Result<Vec<RateSpread>> {
    let summaries = statistics::describe(df, &[COL_CH_RATE, COL_AF_RATE, COL_IC_RATE])?;
    Ok(summaries
        .into_iter()
        .map(|s| RateSpread {
            column: s.name,
            min: s.min,
            q25: s.q25,
            median: s.median,
            q75: s.q75,
            max: s.max,
        })
        .collect())
}

/// Flat (row, col, value) cells of a correlation matrix for heatmap rendering.
pub fn correlation_cells(matrix: &CorrelationMatrix) -> Vec<HeatmapCell> {
    let mut cells = Vec::with_capacity(matrix.columns.len() * matrix.columns.len());
    for (i, row) in matrix.columns.iter().enumerate() {
        for (j, col) in matrix.columns.iter().enumerate() {
            cells.push(HeatmapCell {
                row: row.clone(),
                col: col.clone(),
                value: matrix.get(i, j),
            });
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        df!(
            COL_LOCATION => &["LocX", "LocY", "LocX"],
            COL_HOSPITAL => &["A", "B", "A"],
            COL_EMBRYO_COUNT => &[10i64, 20, 5],
            COL_CH_RATE => &[50.0f64, 70.0, 60.0],
            COL_AF_RATE => &[10.0f64, 20.0, 30.0],
            COL_IC_RATE => &[5.0f64, 15.0, 10.0],
        )
        .unwrap()
    }

    #[test]
    fn rate_column_selector() {
        assert_eq!(RateColumn::default(), RateColumn::ChRate);
        assert_eq!(RateColumn::from_name("AF-RATE"), Some(RateColumn::AfRate));
        assert_eq!(RateColumn::from_name("nope"), None);
        assert_eq!(RateColumn::IcRate.to_string(), "IC-RATE");
    }

    #[test]
    fn scatter_grouped_by_hospital() {
        let series = scatter_series(&sample(), RateColumn::ChRate).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].hospital, "A");
        assert_eq!(series[0].points.len(), 2);
        assert_eq!(series[0].points[0].embryo_count, 10.0);
        assert_eq!(series[0].points[0].rate, 50.0);
        assert_eq!(series[0].points[0].location, "LocX");
        assert_eq!(series[1].hospital, "B");
        assert_eq!(series[1].points.len(), 1);
    }

    #[test]
    fn scatter_empty_table() {
        let empty = sample().head(Some(0));
        assert!(scatter_series(&empty, RateColumn::ChRate).unwrap().is_empty());
    }

    #[test]
    fn bars_average_per_hospital() {
        let bars = rate_by_hospital(&sample(), RateColumn::ChRate).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].0, "A");
        assert!((bars[0].1 - 55.0).abs() < 1e-12);
        assert_eq!(bars[1].0, "B");
        assert!((bars[1].1 - 70.0).abs() < 1e-12);
    }

    #[test]
    fn bars_empty_table() {
        let empty = sample().head(Some(0));
        assert!(rate_by_hospital(&empty, RateColumn::AfRate).unwrap().is_empty());
    }

    #[test]
    fn spreads_cover_all_rate_columns() {
        let spreads = rate_distributions(&sample()).unwrap();
        assert_eq!(spreads.len(), 3);
        assert_eq!(spreads[0].column, COL_CH_RATE);
        assert_eq!(spreads[0].min, 50.0);
        assert_eq!(spreads[0].max, 70.0);
        assert!((spreads[0].median - 60.0).abs() < 1e-12);
    }

    #[test]
    fn spreads_empty_table_are_nan() {
        let empty = sample().head(Some(0));
        let spreads = rate_distributions(&empty).unwrap();
        assert_eq!(spreads.len(), 3);
        assert!(spreads[0].median.is_nan());
    }

    #[test]
    fn heatmap_cells_cover_matrix() {
        let matrix = statistics::correlation_matrix(
            &sample(),
            &[COL_EMBRYO_COUNT, COL_CH_RATE],
        )
        .unwrap();
        let cells = correlation_cells(&matrix);
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[0].row, COL_EMBRYO_COUNT);
        assert_eq!(cells[0].col, COL_EMBRYO_COUNT);
        assert!((cells[0].value - 1.0).abs() < 1e-12);
    }
}
