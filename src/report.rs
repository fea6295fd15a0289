//! Plain-text rendering of metrics and tables for stdout. Display rounding
//! (2 decimals, thousands separators, "N/A" for undefined means) lives here
//! and nowhere else.

use color_eyre::Result;
use polars::prelude::*;

use crate::chart_data::RateSpread;
use crate::metrics::Metrics;
use crate::statistics::CorrelationMatrix;

/// Thousands-separated integer rendering of a non-negative total.
pub fn group_separated(value: f64) -> String {
    if !value.is_finite() {
        return "N/A".to_string();
    }
    let digits = format!("{:.0}", value.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if value < 0.0 {
        format!("-{}", out)
    } else {
        out
    }
}

/// A percentage with 2 decimals, or "N/A" when undefined.
pub fn percentage(value: f64) -> String {
    if value.is_finite() {
        format!("{:.2}%", value)
    } else {
        "N/A".to_string()
    }
}

/// The six-metric header block.
pub fn metrics_block(metrics: &Metrics) -> String {
    let rows = [
        ("Total Hospitals", metrics.hospital_count.to_string()),
        ("Total Embryos", group_separated(metrics.embryo_total)),
        ("Total Patients", group_separated(metrics.patient_total)),
        ("Avg CH-RATE", percentage(metrics.ch_rate_avg)),
        ("Avg AF-RATE", percentage(metrics.af_rate_avg)),
        ("Avg IC-RATE", percentage(metrics.ic_rate_avg)),
    ];
    let label_width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    let mut out = String::new();
    for (label, value) in rows {
        out.push_str(&format!("{:<label_width$}  {}\n", label, value));
    }
    out
}

fn format_cell(value: &AnyValue) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Float64(v) => {
            if v.is_finite() {
                format!("{:.2}", v)
            } else {
                "N/A".to_string()
            }
        }
        AnyValue::Float32(v) => {
            if v.is_finite() {
                format!("{:.2}", v)
            } else {
                "N/A".to_string()
            }
        }
        other => other.str_value().to_string(),
    }
}

/// Render a frame as an aligned text table, header row first. At most
/// `max_rows` data rows are shown; a trailing note reports any truncation.
pub fn render_frame(df: &DataFrame, max_rows: usize) -> Result<String> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    if names.is_empty() {
        return Ok("(no columns)\n".to_string());
    }
    let shown = df.height().min(max_rows);
    let mut rows: Vec<Vec<String>> = Vec::with_capacity(shown + 1);
    rows.push(names.clone());
    for i in 0..shown {
        let mut row = Vec::with_capacity(names.len());
        for column in df.get_columns() {
            let value = column.as_materialized_series().get(i)?;
            row.push(format_cell(&value));
        }
        rows.push(row);
    }

    let mut widths = vec![0usize; names.len()];
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let mut out = String::new();
    for (row_idx, row) in rows.iter().enumerate() {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
        if row_idx == 0 {
            let underline: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
            out.push_str(&underline.join("  "));
            out.push('\n');
        }
    }
    if df.height() > shown {
        out.push_str(&format!("... {} more rows\n", df.height() - shown));
    }
    Ok(out)
}

/// Render the correlation matrix as an aligned grid, NaN cells as "N/A".
pub fn render_correlation(matrix: &CorrelationMatrix) -> String {
    let cells: Vec<Vec<String>> = matrix
        .values
        .iter()
        .map(|row| {
            row.iter()
                .map(|v| {
                    if v.is_finite() {
                        format!("{:.2}", v)
                    } else {
                        "N/A".to_string()
                    }
                })
                .collect()
        })
        .collect();
    let label_width = matrix
        .columns
        .iter()
        .map(|c| c.len())
        .max()
        .unwrap_or(0);
    let cell_width = matrix
        .columns
        .iter()
        .map(|c| c.len())
        .chain(cells.iter().flatten().map(|c| c.len()))
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    out.push_str(&" ".repeat(label_width));
    for name in &matrix.columns {
        out.push_str(&format!("  {:>cell_width$}", name));
    }
    out.push('\n');
    for (i, name) in matrix.columns.iter().enumerate() {
        out.push_str(&format!("{:<label_width$}", name));
        for cell in &cells[i] {
            out.push_str(&format!("  {:>cell_width$}", cell));
        }
        out.push('\n');
    }
    out
}

/// Render the five-number rate summaries as one table row per rate column.
pub fn render_spreads(spreads: &[RateSpread]) -> String {
    let mut rows: Vec<Vec<String>> = Vec::with_capacity(spreads.len() + 1);
    rows.push(
        ["", "min", "25%", "50%", "75%", "max"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    );
    for spread in spreads {
        let mut row = vec![spread.column.clone()];
        for v in [spread.min, spread.q25, spread.median, spread.q75, spread.max] {
            row.push(if v.is_finite() {
                format!("{:.2}", v)
            } else {
                "N/A".to_string()
            });
        }
        rows.push(row);
    }

    let width = rows
        .iter()
        .flatten()
        .map(|c| c.len())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for row in rows {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                if i == 0 {
                    format!("{:<width$}", cell)
                } else {
                    format!("{:>width$}", cell)
                }
            })
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out
}
