//! Converts result-set scalars into values a worksheet cell can hold.

use crate::model::{CellScalar, ResultSet};

/// A value ready to be written into a cell. `Empty` leaves the cell blank.
#[derive(Debug, Clone, PartialEq)]
pub enum WritableCell {
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

/// Display format for dates; round-trips to the same calendar date.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn to_writable(scalar: &CellScalar) -> WritableCell {
    match scalar {
        CellScalar::Null => WritableCell::Empty,
        CellScalar::Bool(b) => WritableCell::Bool(*b),
        CellScalar::Number(n) => WritableCell::Number(*n),
        CellScalar::Text(s) => WritableCell::Text(s.clone()),
        CellScalar::Date(d) => WritableCell::Text(d.format(DATE_FORMAT).to_string()),
        CellScalar::DateTime(dt) => WritableCell::Text(dt.date().format(DATE_FORMAT).to_string()),
    }
}

/// Pure transformation: output has exactly one row per input row and one
/// value per column in every row.
pub fn to_writable_rows(result_set: &ResultSet) -> Vec<Vec<WritableCell>> {
    result_set
        .rows()
        .iter()
        .map(|row| row.iter().map(to_writable).collect())
        .collect()
}
