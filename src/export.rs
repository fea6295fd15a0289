//! CSV serialization for the download buttons: the filtered table and its
//! descriptive statistics, written under fixed file names.

use color_eyre::Result;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Fixed download name for the filtered records.
pub const FILTERED_DATA_FILE: &str = "filtered_pgt_data.csv";
/// Fixed download name for the descriptive-statistics table.
pub const STATISTICS_FILE: &str = "statistics.csv";

/// Serialize a frame to comma-separated bytes with a header row. Column order
/// follows the frame; values are written unrounded, so reparsing reproduces
/// the table up to float formatting precision.
pub fn to_csv_bytes(df: &DataFrame) -> Result<Vec<u8>> {
    let mut out = df.clone();
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .finish(&mut out)?;
    Ok(buf)
}

/// Write both downloads into `dir` and return the paths written.
pub fn write_exports(
    filtered: &DataFrame,
    statistics: &DataFrame,
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(2);
    for (name, frame) in [(FILTERED_DATA_FILE, filtered), (STATISTICS_FILE, statistics)] {
        let path = dir.join(name);
        let file = File::create(&path)?;
        CsvWriter::new(file)
            .include_header(true)
            .finish(&mut frame.clone())?;
        log::info!("wrote {} ({} rows)", path.display(), frame.height());
        written.push(path);
    }
    Ok(written)
}
