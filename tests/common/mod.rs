use pgtadash::{
    COL_AF_RATE, COL_CH_RATE, COL_EMBRYO_COUNT, COL_HOSPITAL, COL_IC_RATE, COL_LOCATION,
    COL_PATIENT_COUNT,
};
use polars::prelude::*;

/// The three-row scenario table used across the integration tests.
pub fn scenario_table() -> DataFrame {
    df!(
        COL_LOCATION => &["LocX", "LocY", "LocX"],
        COL_HOSPITAL => &["A", "B", "A"],
        COL_EMBRYO_COUNT => &[10i64, 20, 5],
        COL_PATIENT_COUNT => &[4i64, 7, 2],
        COL_CH_RATE => &[50.0f64, 70.0, 60.0],
        COL_AF_RATE => &[10.0f64, 20.0, 30.0],
        COL_IC_RATE => &[5.0f64, 15.0, 10.0],
    )
    .unwrap()
}
