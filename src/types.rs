//! Core data model types for report payloads.
//!
//! A report is an ordered sequence of [`Row`]s ([`ReportDataset`]). Each row is an
//! insertion-ordered list of named [`Value`]s; a field that is not present in the row is
//! "absent", which is distinct from an explicit [`Value::Null`].

use std::collections::HashSet;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// A single scalar value in a [`Row`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Explicit null.
    Null,
    /// Boolean.
    Bool(bool),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// UTF-8 string.
    Utf8(String),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value, used by ratio rules.
    ///
    /// Numbers are returned as-is, booleans as `1`/`0`, and strings are parsed after trimming.
    /// `Null`, empty strings and unparseable strings have no numeric view.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Int64(v) => Some(*v as f64),
            Value::Float64(v) => Some(*v),
            Value::Utf8(s) => {
                let s = s.trim();
                if s.is_empty() {
                    None
                } else {
                    s.parse::<f64>().ok()
                }
            }
        }
    }

    /// String form used to match a value against lookup table keys.
    ///
    /// Returns `None` for [`Value::Null`]. Integral floats render without a fraction so that
    /// `123.0` and `123` hit the same key.
    pub fn lookup_key(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Float64(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => {
                Some((*v as i64).to_string())
            }
            Value::Utf8(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Convert a scalar JSON value. Objects and arrays are rendered as JSON text.
    pub fn from_json(v: &serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int64(i),
                None => n.as_f64().map(Value::Float64).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::Utf8(s.clone()),
            other => Value::Utf8(other.to_string()),
        }
    }
}

/// Renders the value the way it appears in a CSV cell (`Null` is empty).
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Utf8(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Utf8(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Utf8(s)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// One report line item (e.g. one campaign-day), as an insertion-ordered field list.
///
/// Inserting a name that already exists replaces its value without moving it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty row with room for `capacity` fields.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Value of `name`, or `None` if the field is absent.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == name)
    }

    /// Set `name` to `value`, returning the previous value if the field existed.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        let name = name.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((name, value));
                None
            }
        }
    }

    /// Remove `name` from the row, returning its value if it was present.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let idx = self.fields.iter().position(|(k, _)| k == name)?;
        Some(self.fields.remove(idx).1)
    }

    /// Number of fields present.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in row order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// `(name, value)` pairs in row order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Ordered sequence of rows that all belong to the same report type.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct ReportDataset {
    /// Rows in report order.
    pub rows: Vec<Row>,
}

impl ReportDataset {
    /// Create a dataset from rows.
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Number of rows in the dataset.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Union of field names across all rows, in first-seen order.
    ///
    /// Output writers use this as the header row.
    pub fn column_names(&self) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut out = Vec::new();
        for row in &self.rows {
            for key in row.keys() {
                if seen.insert(key) {
                    out.push(key.to_string());
                }
            }
        }
        out
    }

    /// Consume the dataset, applying `mapper` to every row. Row order is preserved.
    pub fn map_rows<F>(self, mapper: F) -> Self
    where
        F: FnMut(Row) -> Row,
    {
        Self {
            rows: self.rows.into_iter().map(mapper).collect(),
        }
    }
}

impl FromIterator<Row> for ReportDataset {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
