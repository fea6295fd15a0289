//! Workbook loading: calamine Excel read into a Polars DataFrame, memoized per process.

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Inferred Polars type for one workbook column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ColumnType {
    Int64,
    Float64,
    Boolean,
    Utf8,
    Date,
    Datetime,
}

struct CachedWorkbook {
    path: PathBuf,
    table: DataFrame,
}

/// Process-wide cache: filled on the first successful load, cleared only by `reset`.
static CACHE: Mutex<Option<CachedWorkbook>> = Mutex::new(None);

/// Load the dashboard workbook. The first call reads the file; every later call
/// returns the cached table without touching the filesystem, even if the file
/// has since changed or disappeared.
pub fn load(path: &Path, sheet: Option<&str>) -> Result<DataFrame> {
    load_cached(path, || read_workbook(path, sheet))
}

fn load_cached<F>(path: &Path, read: F) -> Result<DataFrame>
where
    F: FnOnce() -> Result<DataFrame>,
{
    let mut guard = CACHE
        .lock()
        .map_err(|_| eyre!("workbook cache lock poisoned"))?;
    if let Some(cached) = guard.as_ref() {
        log::debug!(
            "returning cached table for {} ({} rows)",
            cached.path.display(),
            cached.table.height()
        );
        return Ok(cached.table.clone());
    }
    let table = read()?;
    log::info!(
        "loaded {} ({} rows, {} columns)",
        path.display(),
        table.height(),
        table.width()
    );
    *guard = Some(CachedWorkbook {
        path: path.to_path_buf(),
        table: table.clone(),
    });
    Ok(table)
}

/// Drop the cached table so the next `load` re-reads the file. Test hook; the
/// running process otherwise keeps the first load for its lifetime.
pub fn reset() {
    if let Ok(mut guard) = CACHE.lock() {
        *guard = None;
    }
}

/// Read a workbook eagerly. `sheet` selects a worksheet by name or 0-based
/// index; the default is the first worksheet.
pub fn read_workbook(path: &Path, sheet: Option<&str>) -> Result<DataFrame> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| eyre!("Excel: {}", e))?;
    if workbook.sheet_names().is_empty() {
        return Err(eyre!("Excel file has no worksheets"));
    }
    let range = if let Some(selector) = sheet {
        if let Ok(idx) = selector.parse::<usize>() {
            workbook
                .worksheet_range_at(idx)
                .ok_or_else(|| eyre!("Excel: no sheet at index {}", idx))?
                .map_err(|e| eyre!("Excel: {}", e))?
        } else {
            workbook
                .worksheet_range(selector)
                .map_err(|e| eyre!("Excel: {}", e))?
        }
    } else {
        workbook
            .worksheet_range_at(0)
            .ok_or_else(|| eyre!("Excel: no first sheet"))?
            .map_err(|e| eyre!("Excel: {}", e))?
    };
    let rows: Vec<Vec<Data>> = range.rows().map(|r| r.to_vec()).collect();
    frame_from_rows(rows)
}

/// Build a DataFrame from raw worksheet rows. The first row supplies headers;
/// empty header cells become `column_N`.
fn frame_from_rows(rows: Vec<Vec<Data>>) -> Result<DataFrame> {
    if rows.is_empty() {
        return Ok(DataFrame::new(vec![])?);
    }
    let headers: Vec<String> = rows[0]
        .iter()
        .map(|c| calamine::DataType::as_string(c).unwrap_or_else(|| c.to_string()))
        .collect();
    let mut columns = Vec::with_capacity(headers.len());
    for (col_idx, header) in headers.iter().enumerate() {
        let cells: Vec<Option<&Data>> = rows[1..].iter().map(|row| row.get(col_idx)).collect();
        let name = if header.is_empty() {
            format!("column_{}", col_idx + 1)
        } else {
            header.clone()
        };
        let series = column_to_series(name.as_str(), &cells, infer_column_type(&cells))?;
        columns.push(series.into());
    }
    Ok(DataFrame::new(columns)?)
}

/// Infers a column type from its cells. Whole-number float columns come back
/// as Int64 (counts in the source workbook are stored as floats); string
/// columns where every non-empty cell parses as an ISO date/datetime become
/// temporal columns.
fn infer_column_type(cells: &[Option<&Data>]) -> ColumnType {
    use calamine::DataType as CellType;
    let mut has_string = false;
    let mut has_float = false;
    let mut has_int = false;
    let mut has_bool = false;
    let mut has_datetime = false;
    for cell in cells.iter().flatten() {
        if CellType::is_string(*cell) {
            has_string = true;
            break;
        }
        if CellType::is_float(*cell)
            || CellType::is_datetime(*cell)
            || CellType::is_datetime_iso(*cell)
        {
            has_float = true;
        }
        if CellType::is_int(*cell) {
            has_int = true;
        }
        if CellType::is_bool(*cell) {
            has_bool = true;
        }
        if CellType::is_datetime(*cell) || CellType::is_datetime_iso(*cell) {
            has_datetime = true;
        }
    }
    if has_string {
        let any_parsed = cells
            .iter()
            .flatten()
            .any(|c| cell_to_naive_datetime(c).is_some());
        let all_non_empty_parse = cells
            .iter()
            .flatten()
            .all(|c| CellType::is_empty(*c) || cell_to_naive_datetime(c).is_some());
        if any_parsed && all_non_empty_parse {
            if parsed_cells_all_midnight(cells) {
                ColumnType::Date
            } else {
                ColumnType::Datetime
            }
        } else {
            ColumnType::Utf8
        }
    } else if has_int {
        ColumnType::Int64
    } else if has_datetime {
        if parsed_cells_all_midnight(cells) {
            ColumnType::Date
        } else {
            ColumnType::Datetime
        }
    } else if has_float {
        let all_whole = cells.iter().flatten().all(|cell| {
            calamine::DataType::as_f64(*cell)
                .is_none_or(|f| f.is_finite() && (f - f.trunc()).abs() < 1e-10)
        });
        if all_whole {
            ColumnType::Int64
        } else {
            ColumnType::Float64
        }
    } else if has_bool {
        ColumnType::Boolean
    } else {
        ColumnType::Utf8
    }
}

/// True if every cell that parses as a datetime has time 00:00:00.
fn parsed_cells_all_midnight(cells: &[Option<&Data>]) -> bool {
    let midnight = NaiveTime::from_hms_opt(0, 0, 0).expect("valid time");
    cells
        .iter()
        .flatten()
        .filter_map(|c| cell_to_naive_datetime(c))
        .all(|dt| dt.time() == midnight)
}

/// Converts a cell to NaiveDateTime (Excel serial, DateTimeIso, or parseable string).
fn cell_to_naive_datetime(cell: &Data) -> Option<NaiveDateTime> {
    use calamine::DataType;
    if let Some(dt) = cell.as_datetime() {
        return Some(dt);
    }
    let s = cell.get_datetime_iso().or_else(|| cell.get_string())?;
    parse_naive_datetime_str(s)
}

/// Parses an ISO-style date/datetime string; tries FORMATS in order.
fn parse_naive_datetime_str(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    const FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d",
    ];
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d.and_hms_opt(0, 0, 0).expect("midnight"));
    }
    None
}

/// Build a Polars Series from one column of cells using the inferred type.
fn column_to_series(name: &str, cells: &[Option<&Data>], col_type: ColumnType) -> Result<Series> {
    use calamine::DataType as CellType;
    use polars::datatypes::TimeUnit;
    let series = match col_type {
        ColumnType::Int64 => {
            let v: Vec<Option<i64>> = cells
                .iter()
                .map(|c| c.and_then(|cell| CellType::as_i64(cell)))
                .collect();
            Series::new(name.into(), v)
        }
        ColumnType::Float64 => {
            let v: Vec<Option<f64>> = cells
                .iter()
                .map(|c| c.and_then(|cell| CellType::as_f64(cell)))
                .collect();
            Series::new(name.into(), v)
        }
        ColumnType::Boolean => {
            let v: Vec<Option<bool>> = cells
                .iter()
                .map(|c| c.and_then(|cell| cell.get_bool()))
                .collect();
            Series::new(name.into(), v)
        }
        ColumnType::Utf8 => {
            let v: Vec<Option<String>> = cells
                .iter()
                .map(|c| c.and_then(|cell| CellType::as_string(cell)))
                .collect();
            Series::new(name.into(), v)
        }
        ColumnType::Date => {
            let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).expect("valid date");
            let v: Vec<Option<i32>> = cells
                .iter()
                .map(|c| {
                    c.and_then(|cell| cell_to_naive_datetime(cell))
                        .map(|dt| (dt.date() - epoch).num_days() as i32)
                })
                .collect();
            Series::new(name.into(), v).cast(&DataType::Date)?
        }
        ColumnType::Datetime => {
            let v: Vec<Option<i64>> = cells
                .iter()
                .map(|c| {
                    c.and_then(|cell| cell_to_naive_datetime(cell))
                        .map(|dt| dt.and_utc().timestamp_micros())
                })
                .collect();
            Series::new(name.into(), v).cast(&DataType::Datetime(TimeUnit::Microseconds, None))?
        }
    };
    Ok(series)
}
