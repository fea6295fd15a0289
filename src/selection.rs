//! Categorical filter selections and free-text search over the record table.
//!
//! Both operations return fresh frames and keep row order; the loaded table is
//! never mutated.

use color_eyre::Result;
use polars::prelude::*;
use std::collections::BTreeSet;

use crate::{COL_HOSPITAL, COL_LOCATION};

/// The sidebar selection: which locations and which hospitals stay visible.
/// An empty set on either side selects nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub locations: BTreeSet<String>,
    pub hospitals: BTreeSet<String>,
}

impl FilterSelection {
    /// The default selection: every distinct location and hospital in the table.
    pub fn all(df: &DataFrame) -> Result<Self> {
        Ok(Self {
            locations: distinct_values(df, COL_LOCATION)?.into_iter().collect(),
            hospitals: distinct_values(df, COL_HOSPITAL)?.into_iter().collect(),
        })
    }

    pub fn with_locations<I, S>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locations = locations.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_hospitals<I, S>(mut self, hospitals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hospitals = hospitals.into_iter().map(Into::into).collect();
        self
    }

    /// Keep rows whose location AND hospital are both selected. Single pass
    /// over the two key columns; row order is preserved.
    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        let locations = df.column(COL_LOCATION)?.as_materialized_series().clone();
        let hospitals = df.column(COL_HOSPITAL)?.as_materialized_series().clone();
        let locations = locations.str()?;
        let hospitals = hospitals.str()?;
        let mask: Vec<bool> = locations
            .iter()
            .zip(hospitals.iter())
            .map(|(loc, hosp)| {
                loc.is_some_and(|l| self.locations.contains(l))
                    && hosp.is_some_and(|h| self.hospitals.contains(h))
            })
            .collect();
        Ok(df.filter(&BooleanChunked::new("selection".into(), mask))?)
    }
}

/// Sorted distinct values of a string column (the option list for one
/// multi-select control).
pub fn distinct_values(df: &DataFrame, column: &str) -> Result<Vec<String>> {
    let series = df.column(column)?.as_materialized_series().clone();
    let mut values: Vec<String> = series
        .str()?
        .iter()
        .flatten()
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    values.sort();
    Ok(values)
}

/// Keep rows where any cell's display text contains `query`, case-insensitively.
/// Literal substring match, no regex. An empty or whitespace query is the
/// identity. Stringification policy: each cell renders via `AnyValue::str_value`
/// (integers without a decimal point, floats in their shortest display form,
/// strings verbatim); null cells never match.
pub fn search(df: &DataFrame, query: &str) -> Result<DataFrame> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Ok(df.clone());
    }
    let mut hits = vec![false; df.height()];
    for column in df.get_columns() {
        let series = column.as_materialized_series();
        for (idx, value) in series.iter().enumerate() {
            if hits[idx] || matches!(value, AnyValue::Null) {
                continue;
            }
            if value.str_value().to_lowercase().contains(&needle) {
                hits[idx] = true;
            }
        }
    }
    Ok(df.filter(&BooleanChunked::new("search".into(), hits))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        df!(
            COL_LOCATION => &["LocX", "LocY", "LocX"],
            COL_HOSPITAL => &["A", "B", "A"],
            "embryo_count" => &[10i64, 20, 5],
            "CH-RATE" => &[50.0f64, 70.0, 60.0],
        )
        .unwrap()
    }

    #[test]
    fn full_selection_is_identity() {
        let df = sample();
        let selection = FilterSelection::all(&df).unwrap();
        let filtered = selection.apply(&df).unwrap();
        assert!(filtered.equals(&df));
    }

    #[test]
    fn empty_selection_yields_empty_table() {
        let df = sample();
        let selection = FilterSelection::default();
        assert_eq!(selection.apply(&df).unwrap().height(), 0);

        let only_locations = FilterSelection::default().with_locations(["LocX"]);
        assert_eq!(only_locations.apply(&df).unwrap().height(), 0);
    }

    #[test]
    fn selection_keeps_matching_rows_in_order() {
        let df = sample();
        let selection = FilterSelection::default()
            .with_locations(["LocX"])
            .with_hospitals(["A"]);
        let filtered = selection.apply(&df).unwrap();
        assert_eq!(filtered.height(), 2);
        let counts: Vec<i64> = filtered
            .column("embryo_count")
            .unwrap()
            .i64()
            .unwrap()
            .iter()
            .flatten()
            .collect();
        assert_eq!(counts, vec![10, 5]);
    }

    #[test]
    fn selection_missing_column_errors() {
        let df = df!("other" => &["x"]).unwrap();
        let selection = FilterSelection::default().with_locations(["LocX"]);
        assert!(selection.apply(&df).is_err());
    }

    #[test]
    fn distinct_values_sorted_and_deduped() {
        let df = sample();
        assert_eq!(
            distinct_values(&df, COL_LOCATION).unwrap(),
            vec!["LocX".to_string(), "LocY".to_string()]
        );
        assert_eq!(
            distinct_values(&df, COL_HOSPITAL).unwrap(),
            vec!["A".to_string(), "B".to_string()]
        );
    }

    #[test]
    fn empty_query_is_identity() {
        let df = sample();
        assert!(search(&df, "").unwrap().equals(&df));
        assert!(search(&df, "   ").unwrap().equals(&df));
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let df = sample();
        let result = search(&df, "locy").unwrap();
        assert_eq!(result.height(), 1);
        let result = search(&df, "LOC").unwrap();
        assert_eq!(result.height(), 3);
    }

    #[test]
    fn search_matches_numeric_cells() {
        let df = sample();
        // "20" appears only in the second row's embryo_count.
        let result = search(&df, "20").unwrap();
        assert_eq!(result.height(), 1);
        let hospitals: Vec<&str> = result
            .column(COL_HOSPITAL)
            .unwrap()
            .str()
            .unwrap()
            .iter()
            .flatten()
            .collect();
        assert_eq!(hospitals, vec!["B"]);
    }

    #[test]
    fn search_no_match_yields_empty() {
        let df = sample();
        assert_eq!(search(&df, "zzz").unwrap().height(), 0);
    }

    #[test]
    fn search_skips_null_cells() {
        let df = df!(
            COL_LOCATION => &[Some("LocX"), None],
            COL_HOSPITAL => &[Some("A"), Some("B")],
        )
        .unwrap();
        // "null" must not match the null cell's placeholder text.
        assert_eq!(search(&df, "null").unwrap().height(), 0);
    }
}
