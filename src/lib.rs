//! Dashboard core for PGT-A screening workbooks.
//!
//! The reactive dashboard this replaces re-ran one script per interaction.
//! Here that is an explicit pipeline: load the workbook once (cached for the
//! process), apply the categorical selection and text search, then derive
//! metrics, statistics, chart data, and exports from the filtered table. Every
//! stage is a pure function of its inputs; `DashboardSnapshot` is the result
//! of one full pass.

pub mod chart_data;
pub mod chart_render;
pub mod config;
pub mod error_display;
pub mod export;
pub mod loader;
pub mod metrics;
pub mod report;
pub mod selection;
pub mod statistics;

use color_eyre::Result;
use polars::prelude::DataFrame;
use std::path::Path;

pub use chart_data::{HeatmapCell, RateColumn, RateSpread, ScatterSeries};
pub use config::{ConfigManager, DashboardConfig};
pub use metrics::Metrics;
pub use selection::FilterSelection;
pub use statistics::{CorrelationMatrix, NumericSummary};

pub const APP_NAME: &str = "pgtadash";

/// Workbook read when no path is configured.
pub const DATA_FILE: &str = "pre_analysis_last.xlsx";

pub const COL_LOCATION: &str = "hospital_location";
pub const COL_HOSPITAL: &str = "Hospital";
pub const COL_EMBRYO_COUNT: &str = "embryo_count";
pub const COL_PATIENT_COUNT: &str = "patient_count";
pub const COL_CH_RATE: &str = "CH-RATE";
pub const COL_AF_RATE: &str = "AF-RATE";
pub const COL_IC_RATE: &str = "IC-RATE";

/// The loaded table plus the user's current selections. The table itself is
/// immutable; changing a selection only changes what the next snapshot sees.
pub struct Dashboard {
    table: DataFrame,
    pub selection: FilterSelection,
    pub search: String,
    pub rate: RateColumn,
}

/// Everything one pipeline pass computes from the filtered table.
pub struct DashboardSnapshot {
    /// Selection-filtered records (the unit all other fields derive from).
    pub filtered: DataFrame,
    /// `filtered` further restricted by the search query (the table view).
    pub display: DataFrame,
    pub metrics: Metrics,
    pub scatter: Vec<ScatterSeries>,
    pub bars: Vec<(String, f64)>,
    pub spreads: Vec<RateSpread>,
    pub correlation: CorrelationMatrix,
    pub heatmap: Vec<HeatmapCell>,
    /// Pandas-style describe table (also the statistics export).
    pub statistics: DataFrame,
    /// Per-location aggregate table, rounded for display.
    pub location_summary: DataFrame,
}

impl Dashboard {
    /// Load the workbook (memoized per process) and start with everything
    /// selected, no search, and the default rate metric.
    pub fn open(path: &Path, sheet: Option<&str>) -> Result<Self> {
        Self::from_table(loader::load(path, sheet)?)
    }

    /// Build a dashboard over an already-loaded table.
    pub fn from_table(table: DataFrame) -> Result<Self> {
        let selection = FilterSelection::all(&table)?;
        Ok(Self {
            table,
            selection,
            search: String::new(),
            rate: RateColumn::default(),
        })
    }

    pub fn table(&self) -> &DataFrame {
        &self.table
    }

    /// Restrict the location selection; `None` restores "all".
    pub fn set_locations(&mut self, locations: Option<Vec<String>>) -> Result<()> {
        self.selection.locations = match locations {
            Some(values) => values.into_iter().collect(),
            None => FilterSelection::all(&self.table)?.locations,
        };
        Ok(())
    }

    /// Restrict the hospital selection; `None` restores "all".
    pub fn set_hospitals(&mut self, hospitals: Option<Vec<String>>) -> Result<()> {
        self.selection.hospitals = match hospitals {
            Some(values) => values.into_iter().collect(),
            None => FilterSelection::all(&self.table)?.hospitals,
        };
        Ok(())
    }

    /// The selection-filtered table.
    pub fn filtered(&self) -> Result<DataFrame> {
        self.selection.apply(&self.table)
    }

    /// Run one full pipeline pass: filter, search, and derive every output.
    pub fn snapshot(&self) -> Result<DashboardSnapshot> {
        let filtered = self.filtered()?;
        let display = selection::search(&filtered, &self.search)?;
        let metrics = metrics::summarize(&filtered)?;
        let scatter = chart_data::scatter_series(&filtered, self.rate)?;
        let bars = chart_data::rate_by_hospital(&filtered, self.rate)?;
        let spreads = chart_data::rate_distributions(&filtered)?;
        let correlation = statistics::correlation_matrix(&filtered, &statistics::NUMERIC_COLUMNS)?;
        let heatmap = chart_data::correlation_cells(&correlation);
        let statistics_frame = statistics::describe_frame(&filtered, &statistics::NUMERIC_COLUMNS)?;
        let location_summary = statistics::location_summary(&filtered)?;
        Ok(DashboardSnapshot {
            filtered,
            display,
            metrics,
            scatter,
            bars,
            spreads,
            correlation,
            heatmap,
            statistics: statistics_frame,
            location_summary,
        })
    }
}
