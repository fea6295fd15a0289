//! Headline metrics for the filtered table.

use color_eyre::Result;
use polars::prelude::*;
use serde::Serialize;

use crate::{COL_AF_RATE, COL_CH_RATE, COL_EMBRYO_COUNT, COL_HOSPITAL, COL_IC_RATE, COL_PATIENT_COUNT};

/// The six scalar values shown at the top of the dashboard. Sums are 0 and
/// averages are NaN on an empty table; nothing here raises on empty input.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Metrics {
    pub hospital_count: usize,
    pub embryo_total: f64,
    pub patient_total: f64,
    pub ch_rate_avg: f64,
    pub af_rate_avg: f64,
    pub ic_rate_avg: f64,
}

pub fn summarize(df: &DataFrame) -> Result<Metrics> {
    Ok(Metrics {
        hospital_count: df
            .column(COL_HOSPITAL)?
            .as_materialized_series()
            .n_unique()?,
        embryo_total: column_sum(df, COL_EMBRYO_COUNT)?,
        patient_total: column_sum(df, COL_PATIENT_COUNT)?,
        ch_rate_avg: column_mean(df, COL_CH_RATE)?,
        af_rate_avg: column_mean(df, COL_AF_RATE)?,
        ic_rate_avg: column_mean(df, COL_IC_RATE)?,
    })
}

fn column_sum(df: &DataFrame, name: &str) -> Result<f64> {
    let series = df.column(name)?.as_materialized_series();
    Ok(series.sum::<f64>().unwrap_or(0.0))
}

fn column_mean(df: &DataFrame, name: &str) -> Result<f64> {
    let series = df.column(name)?.as_materialized_series();
    Ok(series.mean().unwrap_or(f64::NAN))
}
