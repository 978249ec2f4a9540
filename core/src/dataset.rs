//! In-memory tabular dataset — the parsed upload.
//!
//! RULE: A Dataset is immutable once built.
//! A new upload replaces it wholesale; nothing edits rows in place.
//!
//! Parsing spreadsheets into this shape is the upload layer's job.
//! The core only accepts the JSON form `{"columns": [...], "rows": [[...]]}`.

use crate::{
    error::{DashError, DashResult},
    types::ColumnName,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single cell. Mixed types are allowed per column, as in a spreadsheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Integer(i64),
    Number(f64),
    Text(String),
    Empty,
}

impl CellValue {
    /// Numeric view of the cell. Text and Empty have none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Number(n)  => Some(*n),
            CellValue::Text(_) | CellValue::Empty => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render the cell as a grouping key. Empty cells group under "".
    pub fn key_text(&self) -> String {
        match self {
            CellValue::Text(s)    => s.clone(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Number(n)  => n.to_string(),
            CellValue::Empty      => String::new(),
        }
    }

    /// Typed grouping key: the key text plus a type rank, so `1` and
    /// `"1"` stay in separate groups.
    pub fn group_key(&self) -> (String, u8) {
        let rank = match self {
            CellValue::Text(_)    => 0,
            CellValue::Integer(_) => 1,
            CellValue::Number(_)  => 2,
            CellValue::Empty      => 3,
        };
        (self.key_text(), rank)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self { CellValue::Text(s.to_string()) }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self { CellValue::Text(s) }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self { CellValue::Integer(i) }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self { CellValue::Number(n) }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    columns: Vec<ColumnName>,
    rows:    Vec<Vec<CellValue>>,
}

#[derive(Debug, Deserialize)]
struct DatasetFile {
    columns: Vec<ColumnName>,
    #[serde(default)]
    rows:    Vec<Vec<CellValue>>,
}

impl Dataset {
    /// Build a dataset, checking the header is unique and every row
    /// has one cell per column.
    pub fn new(columns: Vec<ColumnName>, rows: Vec<Vec<CellValue>>) -> DashResult<Self> {
        let mut seen = HashSet::new();
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(DashError::DuplicateColumn { name: name.clone() });
            }
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(DashError::RaggedRow {
                    row:      i,
                    expected: columns.len(),
                    actual:   row.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    pub fn from_json_str(json: &str) -> DashResult<Self> {
        let file: DatasetFile = serde_json::from_str(json)?;
        Self::new(file.columns, file.rows)
    }

    pub fn from_json_value(value: serde_json::Value) -> DashResult<Self> {
        let file: DatasetFile = serde_json::from_value(value)?;
        Self::new(file.columns, file.rows)
    }

    pub fn columns(&self) -> &[ColumnName] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Required columns not present in the header, in the order asked.
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|name| self.column_index(name).is_none())
            .map(|name| name.to_string())
            .collect()
    }

    /// Resolve every required column to its index, or report all missing ones.
    pub fn require_columns<const N: usize>(&self, required: [&str; N]) -> DashResult<[usize; N]> {
        let missing = self.missing_columns(&required);
        if !missing.is_empty() {
            return Err(DashError::MissingColumns { missing });
        }
        let mut out = [0usize; N];
        for (slot, name) in out.iter_mut().zip(required) {
            // Presence checked above.
            *slot = self.column_index(name).unwrap_or_default();
        }
        Ok(out)
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }
}

/// Read a numeric measure cell. Empty counts as zero, Text is rejected.
pub(crate) fn measure_value(cell: &CellValue, row: usize, column: &str) -> DashResult<f64> {
    match cell {
        CellValue::Empty => Ok(0.0),
        other => other.as_f64().ok_or_else(|| DashError::NonNumericCell {
            row,
            column: column.to_string(),
        }),
    }
}
