//! Row serializer
//!
//! Renders a [`Row`] as the connector's JSON response document.
//!
//! Byte fields are copied by their exact length and decoded as UTF-8, with
//! invalid sequences replaced by U+FFFD. serde_json escapes quotes,
//! backslashes and control characters, and writes array separators before
//! every element but the first, so an empty row renders as `"columns":[]`.

use std::borrow::Cow;

use serde::Serialize;

use crate::error::Result;
use crate::store::{Cell, Row};

/// The response document for one row
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct RowDocument<'a> {
    pub rowkey: Cow<'a, str>,
    pub columns: Vec<ColumnDocument<'a>>,
}

/// One cell, named `family:qualifier`
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ColumnDocument<'a> {
    pub name: String,
    pub value: Cow<'a, str>,
}

impl<'a> RowDocument<'a> {
    pub fn from_row(row: &'a Row) -> Self {
        Self {
            rowkey: String::from_utf8_lossy(row.key()),
            columns: row.cells().iter().map(ColumnDocument::from_cell).collect(),
        }
    }
}

impl<'a> ColumnDocument<'a> {
    pub fn from_cell(cell: &'a Cell) -> Self {
        let family = String::from_utf8_lossy(cell.family());
        let qualifier = String::from_utf8_lossy(cell.qualifier());

        Self {
            name: format!("{}:{}", family, qualifier),
            value: String::from_utf8_lossy(cell.value()),
        }
    }
}

/// Serialize a row to compact JSON text
pub fn row_to_json(row: &Row) -> Result<String> {
    Ok(serde_json::to_string(&RowDocument::from_row(row))?)
}

/// Serialize a row to a JSON value
pub fn row_to_value(row: &Row) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(RowDocument::from_row(row))?)
}

/// Serialize scan results as a JSON array of row documents
pub fn rows_to_json(rows: &[Row]) -> Result<String> {
    let documents: Vec<RowDocument<'_>> = rows.iter().map(RowDocument::from_row).collect();
    Ok(serde_json::to_string(&documents)?)
}
