//! Descriptive statistics, Pearson correlation, and grouped aggregates over
//! the filtered table.

use color_eyre::Result;
use polars::prelude::*;

use crate::{COL_AF_RATE, COL_CH_RATE, COL_EMBRYO_COUNT, COL_IC_RATE, COL_LOCATION};

/// Numeric columns covered by the statistics tab.
pub const NUMERIC_COLUMNS: [&str; 4] = [COL_EMBRYO_COUNT, COL_CH_RATE, COL_AF_RATE, COL_IC_RATE];

/// Per-column descriptive statistics. Std is the sample standard deviation
/// (ddof = 1); quantiles interpolate linearly between closest ranks. Fields
/// are NaN when the column has no non-null values.
#[derive(Clone, Debug)]
pub struct NumericSummary {
    pub name: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Square matrix of pairwise Pearson coefficients over `columns`.
#[derive(Clone, Debug)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row][col]
    }
}

/// Aggregate applied per target column by `grouped`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Aggregate {
    Sum,
    Mean,
}

impl Aggregate {
    fn suffix(self) -> &'static str {
        match self {
            Aggregate::Sum => "sum",
            Aggregate::Mean => "mean",
        }
    }
}

pub fn describe(df: &DataFrame, columns: &[&str]) -> Result<Vec<NumericSummary>> {
    let mut summaries = Vec::with_capacity(columns.len());
    for name in columns {
        let series = df.column(name)?.as_materialized_series();
        let mut values = numeric_values(series);
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let count = values.len();
        let mean = series.mean().unwrap_or(f64::NAN);
        let std = series.std(1).unwrap_or(f64::NAN);
        let (min, max) = match (values.first(), values.last()) {
            (Some(&lo), Some(&hi)) => (lo, hi),
            _ => (f64::NAN, f64::NAN),
        };
        summaries.push(NumericSummary {
            name: name.to_string(),
            count,
            mean,
            std,
            min,
            q25: quantile_sorted(&values, 0.25),
            median: quantile_sorted(&values, 0.50),
            q75: quantile_sorted(&values, 0.75),
            max,
        });
    }
    Ok(summaries)
}

/// The describe output shaped as a table: one `statistic` label column and one
/// value column per input column, eight rows (count, mean, std, min, 25%, 50%,
/// 75%, max). This is the frame behind the statistics view and its export.
pub fn describe_frame(df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
    const LABELS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];
    let summaries = describe(df, columns)?;
    let mut out: Vec<Column> = Vec::with_capacity(columns.len() + 1);
    out.push(Series::new("statistic".into(), LABELS.as_slice()).into());
    for summary in &summaries {
        let values = vec![
            summary.count as f64,
            summary.mean,
            summary.std,
            summary.min,
            summary.q25,
            summary.median,
            summary.q75,
            summary.max,
        ];
        out.push(Series::new(summary.name.as_str().into(), values).into());
    }
    Ok(DataFrame::new(out)?)
}

/// Pairwise Pearson correlation over null-complete pairs. Symmetric; the
/// diagonal is 1.0 for columns with non-zero variance. Any pair with fewer
/// than 2 rows or a zero-variance side is NaN.
pub fn correlation_matrix(df: &DataFrame, columns: &[&str]) -> Result<CorrelationMatrix> {
    let n = columns.len();
    let mut values = vec![vec![f64::NAN; n]; n];
    for i in 0..n {
        for j in i..n {
            let xs = df.column(columns[i])?;
            let ys = df.column(columns[j])?;
            let mask = xs.is_not_null() & ys.is_not_null();
            let xs = numeric_values(xs.filter(&mask)?.as_materialized_series());
            let ys = numeric_values(ys.filter(&mask)?.as_materialized_series());
            let r = pearson(&xs, &ys);
            values[i][j] = r;
            values[j][i] = r;
        }
    }
    Ok(CorrelationMatrix {
        columns: columns.iter().map(|c| c.to_string()).collect(),
        values,
    })
}

/// Group rows by the distinct values of `key`, applying each aggregate to its
/// target column. One output row per key, sorted by key; aggregate columns are
/// named `{column}_{agg}`.
pub fn grouped(df: &DataFrame, key: &str, specs: &[(&str, Aggregate)]) -> Result<DataFrame> {
    let aggs: Vec<Expr> = specs
        .iter()
        .map(|(column, agg)| {
            let expr = match agg {
                Aggregate::Sum => col(*column).sum(),
                Aggregate::Mean => col(*column).mean(),
            };
            expr.alias(format!("{}_{}", column, agg.suffix()))
        })
        .collect();
    let out = df
        .clone()
        .lazy()
        .group_by([col(key)])
        .agg(aggs)
        .sort_by_exprs([col(key)], Default::default())
        .collect()?;
    Ok(out)
}

/// The dashboard's per-location summary: embryo count sum and mean plus the
/// three rate means, rounded to 2 decimals. Display table only; exports stay
/// unrounded.
pub fn location_summary(df: &DataFrame) -> Result<DataFrame> {
    let summary = grouped(
        df,
        COL_LOCATION,
        &[
            (COL_EMBRYO_COUNT, Aggregate::Sum),
            (COL_EMBRYO_COUNT, Aggregate::Mean),
            (COL_CH_RATE, Aggregate::Mean),
            (COL_AF_RATE, Aggregate::Mean),
            (COL_IC_RATE, Aggregate::Mean),
        ],
    )?;
    round_float_columns(&summary, 2)
}

/// Rebuilds every Float64 column rounded to `decimals` places. Other columns
/// pass through untouched.
pub fn round_float_columns(df: &DataFrame, decimals: u32) -> Result<DataFrame> {
    let factor = 10f64.powi(decimals as i32);
    let columns: Vec<Column> = df
        .get_columns()
        .iter()
        .map(|column| {
            let series = column.as_materialized_series();
            if let Ok(ca) = series.f64() {
                let rounded: Vec<Option<f64>> = ca
                    .iter()
                    .map(|v| v.map(|x| (x * factor).round() / factor))
                    .collect();
                Series::new(series.name().clone(), rounded).into()
            } else {
                column.clone()
            }
        })
        .collect();
    Ok(DataFrame::new(columns)?)
}

/// Non-null values of a numeric series as f64, in row order.
fn numeric_values(series: &Series) -> Vec<f64> {
    if let Ok(f64_series) = series.f64() {
        f64_series.iter().flatten().filter(|v| v.is_finite()).collect()
    } else if let Ok(i64_series) = series.i64() {
        i64_series.iter().flatten().map(|v| v as f64).collect()
    } else if let Ok(i32_series) = series.i32() {
        i32_series.iter().flatten().map(|v| v as f64).collect()
    } else {
        match series.cast(&DataType::Float64) {
            Ok(cast) => match cast.f64() {
                Ok(f64_series) => f64_series.iter().flatten().filter(|v| v.is_finite()).collect(),
                Err(_) => Vec::new(),
            },
            Err(_) => Vec::new(),
        }
    }
}

/// Quantile with linear interpolation between closest ranks (the convention of
/// the spreadsheet's own describe output). Input must be sorted ascending.
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = q * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            if lo == hi {
                sorted[lo]
            } else {
                let frac = pos - lo as f64;
                sorted[lo] * (1.0 - frac) + sorted[hi] * frac
            }
        }
    }
}

/// Pearson coefficient of two equally long samples. NaN when fewer than 2
/// pairs or either side has zero variance.
fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len();
    if n != ys.len() || n < 2 {
        return f64::NAN;
    }
    let mean_x: f64 = xs.iter().sum::<f64>() / n as f64;
    let mean_y: f64 = ys.iter().sum::<f64>() / n as f64;
    let mut numerator = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys.iter()) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        numerator += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }
    numerator / (var_x.sqrt() * var_y.sqrt())
}
