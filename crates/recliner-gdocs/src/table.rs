//! Normalized table model handed to data-grid consumers.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A column identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    /// Column id, the provider key without its `gsx$` prefix
    pub id: String,
}

impl Field {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// A normalized cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Coerced numeric value (percentages become fractions)
    Number(f64),
    /// Raw cell text
    Text(String),
}

impl CellValue {
    /// Get the text, if this value was not coerced
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            CellValue::Number(_) => None,
        }
    }

    /// Get the number, if this value was coerced
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(_) => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

/// One row, keyed by field id in field order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(IndexMap<String, CellValue>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, keeping first-insertion order
    pub fn insert(&mut self, field: impl Into<String>, value: CellValue) {
        self.0.insert(field.into(), value);
    }

    /// Get the value for a field
    pub fn get(&self, field: &str) -> Option<&CellValue> {
        self.0.get(field)
    }

    /// Check whether the record holds a value for a field
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Iterate over `(field id, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, CellValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, CellValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Output of the feed parser
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedTable {
    /// Columns in discovery order
    pub fields: Vec<Field>,
    /// Rows in feed order
    pub records: Vec<Record>,
}

impl ParsedTable {
    /// Field ids in order
    pub fn field_ids(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.id.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Result delivered to the data-grid consumer after a fetch
///
/// `use_memory_store` is always `true`: the whole sheet is resident and no
/// further paged requests are needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResult {
    pub records: Vec<Record>,
    pub fields: Vec<Field>,
    #[serde(rename = "useMemoryStore")]
    pub use_memory_store: bool,
}

impl From<ParsedTable> for FetchResult {
    fn from(table: ParsedTable) -> Self {
        Self {
            records: table.records,
            fields: table.fields,
            use_memory_store: true,
        }
    }
}
