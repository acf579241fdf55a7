//! Conversion functions for gateway responses.
//!
//! Spreadsheet data is loosely typed: headers vary in case, cells may be
//! strings, numbers or booleans, and whole responses may be missing fields.
//! Every conversion here is total; malformed input degrades to defaults.

pub mod access;
pub mod products;
pub mod stats;

use std::collections::HashMap;

use serde_json::Value;

use super::types::RawRow;

pub use access::convert_access;
pub use products::{convert_row, convert_rows};
pub use stats::{DashboardSummary, LeadCount, LeadRow, convert_stats};

/// A row whose keys have been trimmed and lowercased.
///
/// When two raw headers fold to the same key, the first one wins.
#[derive(Debug, Default)]
pub(crate) struct FoldedRow<'a> {
    cells: HashMap<String, &'a Value>,
}

impl<'a> FoldedRow<'a> {
    pub(crate) fn new(row: &'a RawRow) -> Self {
        let mut cells = HashMap::with_capacity(row.len());
        for (key, value) in row {
            cells.entry(key.trim().to_lowercase()).or_insert(value);
        }
        Self { cells }
    }

    /// First non-null cell among `keys` (folded names, in priority order).
    pub(crate) fn value(&self, keys: &[&str]) -> Option<&'a Value> {
        keys.iter()
            .filter_map(|key| self.cells.get(*key).copied())
            .find(|value| !value.is_null())
    }

    /// Cell rendered as text, untrimmed. Missing cells are empty.
    pub(crate) fn raw_text(&self, keys: &[&str]) -> String {
        self.value(keys).map(cell_text).unwrap_or_default()
    }

    /// Cell rendered as trimmed text. Missing cells are empty.
    pub(crate) fn text(&self, keys: &[&str]) -> String {
        self.raw_text(keys).trim().to_string()
    }
}

/// Render a scalar cell as text; arrays and objects become their JSON.
pub(crate) fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
