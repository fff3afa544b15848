//! Row, cell and request types exchanged with the store

use bytes::Bytes;

/// A single versioned value, keyed by (family, qualifier, timestamp)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    family: Bytes,
    qualifier: Bytes,
    value: Bytes,
    timestamp: i64,
}

impl Cell {
    pub fn new(
        family: impl Into<Bytes>,
        qualifier: impl Into<Bytes>,
        value: impl Into<Bytes>,
        timestamp: i64,
    ) -> Self {
        Self {
            family: family.into(),
            qualifier: qualifier.into(),
            value: value.into(),
            timestamp,
        }
    }

    pub fn family(&self) -> &[u8] {
        &self.family
    }

    pub fn qualifier(&self) -> &[u8] {
        &self.qualifier
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

/// A row key and its cells, in store order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    key: Bytes,
    cells: Vec<Cell>,
}

impl Row {
    pub fn new(key: impl Into<Bytes>, cells: Vec<Cell>) -> Self {
        Self {
            key: key.into(),
            cells,
        }
    }

    /// A row that exists in no table
    pub fn empty(key: impl Into<Bytes>) -> Self {
        Self::new(key, Vec::new())
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Point read of one row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetRequest {
    pub table: String,
    pub row: Bytes,
    pub family: Option<Bytes>,
    /// Only meaningful together with `family`
    pub qualifier: Option<Bytes>,
    pub max_versions: u32,
}

/// Write of one or more cells into a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutRequest {
    pub table: String,
    pub row: Bytes,
    /// (family, qualifier, value)
    pub cells: Vec<(Bytes, Bytes, Bytes)>,
    /// Store-assigned when `None`
    pub timestamp: Option<i64>,
}

/// Removal of a row, a family, or one column (all versions)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub table: String,
    pub row: Bytes,
    pub family: Option<Bytes>,
    pub qualifier: Option<Bytes>,
}

/// Range read over `[start_row, stop_row)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub table: String,
    pub start_row: Option<Bytes>,
    pub stop_row: Option<Bytes>,
    pub family: Option<Bytes>,
    pub max_versions: u32,
    pub limit: Option<usize>,
}
