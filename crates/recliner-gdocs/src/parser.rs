//! Feed parser - turns a decoded list feed into a normalized table.
//!
//! The provider returns rows as `feed.entry[]`, each entry mapping a column
//! key such as `gsx$price` to a wrapper `{"$t": "10%"}`. Column order inside
//! an entry is not guaranteed to be stable across entries, so the field list
//! is taken from the **first entry only**: its `gsx$` keys, in document order,
//! define the columns of the whole table. A column that first appears in a
//! later entry is never discovered.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{GDocsError, Result};
use crate::table::{CellValue, Field, ParsedTable, Record};

/// Prefix of provider column keys
pub const COLUMN_PREFIX: &str = "gsx$";

/// Sub-key of a value wrapper holding the cell text
pub const TEXT_KEY: &str = "$t";

/// Type tag enabling percentage coercion
pub const PERCENT_TAG: &str = "percent";

fn percent_re() -> &'static Regex {
    static PERCENT_RE: OnceLock<Regex> = OnceLock::new();
    PERCENT_RE.get_or_init(|| Regex::new(r"^([0-9.\-]+)%$").unwrap())
}

fn leading_number_re() -> &'static Regex {
    static NUMBER_RE: OnceLock<Regex> = OnceLock::new();
    NUMBER_RE.get_or_init(|| Regex::new(r"^-?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)").unwrap())
}

/// Column types understood by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// `"23.3%"` becomes `0.233`
    Percent,
}

impl ColumnType {
    /// Interpret a type tag; unknown tags carry no coercion
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            PERCENT_TAG => Some(ColumnType::Percent),
            _ => None,
        }
    }
}

/// What to do when an entry lacks a column found in the first entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingFieldPolicy {
    /// Fail with [`GDocsError::SchemaInconsistency`]
    #[default]
    Reject,
    /// Leave the field out of that record
    Omit,
}

/// Options for feed parsing
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Field id -> type tag (only `"percent"` has an effect)
    pub col_types: HashMap<String, String>,

    /// Restrict output to these fields (discovery order is kept)
    pub columns_to_use: Option<Vec<String>>,

    /// Handling of entries missing a discovered field
    pub missing_fields: MissingFieldPolicy,
}

impl ParseOptions {
    /// Tag a field with a type
    pub fn with_col_type(mut self, field: impl Into<String>, tag: impl Into<String>) -> Self {
        self.col_types.insert(field.into(), tag.into());
        self
    }

    /// Tag a field as a percentage column
    pub fn with_percent(self, field: impl Into<String>) -> Self {
        self.with_col_type(field, PERCENT_TAG)
    }

    /// Keep only the given fields
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns_to_use = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the missing-field policy
    pub fn with_missing_fields(mut self, policy: MissingFieldPolicy) -> Self {
        self.missing_fields = policy;
        self
    }

    fn column_type(&self, field: &str) -> Option<ColumnType> {
        self.col_types
            .get(field)
            .and_then(|tag| ColumnType::from_tag(tag))
    }
}

/// Parse a decoded feed document
///
/// # Arguments
/// * `doc` - JSON shaped as `{ "feed": { "entry": [ ... ] } }`
/// * `options` - Column types, column filter and missing-field policy
///
/// # Returns
/// Fields discovered from the first entry and one record per entry.
/// An absent or empty `entry` list yields an empty table.
pub fn parse(doc: &Value, options: &ParseOptions) -> Result<ParsedTable> {
    let entries = feed_entries(doc)?;

    let Some(first) = entries.first() else {
        return Ok(ParsedTable::default());
    };

    let fields = discover_fields(entry_object(first, 0)?, options);

    let records = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| build_record(entry_object(entry, index)?, index, &fields, options))
        .collect::<Result<Vec<_>>>()?;

    Ok(ParsedTable { fields, records })
}

/// Decode and parse a feed from a JSON string
pub fn parse_str(json: &str, options: &ParseOptions) -> Result<ParsedTable> {
    let doc: Value = serde_json::from_str(json)?;
    parse(&doc, options)
}

/// Decode and parse a feed from raw bytes
pub fn parse_slice(bytes: &[u8], options: &ParseOptions) -> Result<ParsedTable> {
    let doc: Value = serde_json::from_slice(bytes)?;
    parse(&doc, options)
}

/// Locate `feed.entry`, validating the surrounding shape
fn feed_entries(doc: &Value) -> Result<&[Value]> {
    let root = doc
        .as_object()
        .ok_or_else(|| GDocsError::UnexpectedShape("top-level value is not an object".to_string()))?;

    let feed = root
        .get("feed")
        .ok_or_else(|| GDocsError::UnexpectedShape("missing 'feed' object".to_string()))?
        .as_object()
        .ok_or_else(|| GDocsError::UnexpectedShape("'feed' is not an object".to_string()))?;

    match feed.get("entry") {
        // Sheets without data rows omit the list entirely
        None | Some(Value::Null) => Ok(&[][..]),
        Some(Value::Array(entries)) => Ok(entries.as_slice()),
        Some(_) => Err(GDocsError::UnexpectedShape(
            "'feed.entry' is not an array".to_string(),
        )),
    }
}

fn entry_object(entry: &Value, index: usize) -> Result<&Map<String, Value>> {
    entry
        .as_object()
        .ok_or_else(|| GDocsError::UnexpectedShape(format!("entry {} is not an object", index)))
}

fn discover_fields(first: &Map<String, Value>, options: &ParseOptions) -> Vec<Field> {
    first
        .keys()
        .filter_map(|key| key.strip_prefix(COLUMN_PREFIX))
        .filter(|id| match &options.columns_to_use {
            Some(columns) => columns.iter().any(|c| c == id),
            None => true,
        })
        .map(Field::new)
        .collect()
}

fn build_record(
    entry: &Map<String, Value>,
    index: usize,
    fields: &[Field],
    options: &ParseOptions,
) -> Result<Record> {
    let mut record = Record::new();

    for field in fields {
        let key = format!("{}{}", COLUMN_PREFIX, field.id);

        let Some(wrapper) = entry.get(&key) else {
            match options.missing_fields {
                MissingFieldPolicy::Omit => continue,
                MissingFieldPolicy::Reject => {
                    return Err(GDocsError::SchemaInconsistency {
                        field: field.id.clone(),
                        entry_index: index,
                    });
                }
            }
        };

        let text = wrapper
            .get(TEXT_KEY)
            .and_then(Value::as_str)
            .ok_or_else(|| GDocsError::MalformedCell {
                field: field.id.clone(),
                entry_index: index,
            })?;

        record.insert(field.id.clone(), coerce(text, options.column_type(&field.id)));
    }

    Ok(record)
}

/// Apply the column's type rule to a cell's text
pub fn coerce(text: &str, column_type: Option<ColumnType>) -> CellValue {
    match column_type {
        Some(ColumnType::Percent) => match parse_percent(text) {
            Some(fraction) => CellValue::Number(fraction),
            None => CellValue::Text(text.to_string()),
        },
        None => CellValue::Text(text.to_string()),
    }
}

/// Convert `"23.3%"` into `0.233`
///
/// Only text made of digits, dots and minus signs followed by a single `%`
/// qualifies. The longest leading decimal number is used (`"1.2.3%"` gives
/// `0.012`); if there is none (`"-%"`) the text is not a percentage.
pub fn parse_percent(text: &str) -> Option<f64> {
    let caps = percent_re().captures(text)?;
    let number = leading_number_re().find(caps.get(1)?.as_str())?.as_str();
    let number = number.strip_suffix('.').unwrap_or(number);
    number
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(|n| n / 100.0)
}
