//! Column projection: rename API fields to report columns and fix their order.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::{ReportDataset, Row, Value};

/// One `source -> destination` entry of a [`RenameSchema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    /// Field name in the (derived) row.
    pub source: String,
    /// Column name in the output report.
    pub destination: String,
}

/// Ordered mapping from source field name to output column name.
///
/// Entry order is output column order. Serializes as a JSON object,
/// e.g. `{"date": "Date", "clicks": "Clicks"}`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenameSchema {
    entries: Vec<ColumnMapping>,
}

impl RenameSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `source -> destination`.
    ///
    /// Re-adding an existing source keeps its position and takes the new destination.
    pub fn push(&mut self, source: impl Into<String>, destination: impl Into<String>) {
        let source = source.into();
        let destination = destination.into();
        match self.entries.iter_mut().find(|m| m.source == source) {
            Some(existing) => existing.destination = destination,
            None => self.entries.push(ColumnMapping {
                source,
                destination,
            }),
        }
    }

    /// Builder-style [`Self::push`].
    pub fn with(mut self, source: impl Into<String>, destination: impl Into<String>) -> Self {
        self.push(source, destination);
        self
    }

    pub fn entries(&self) -> &[ColumnMapping] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Output column names, in order.
    pub fn destinations(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|m| m.destination.as_str())
    }

    /// Build the output row for `row`.
    ///
    /// Contains exactly the destination columns; sources missing from `row` become
    /// [`Value::Null`].
    pub fn project_row(&self, row: &Row) -> Row {
        let mut out = Row::with_capacity(self.entries.len());
        for m in &self.entries {
            let value = row.get(&m.source).cloned().unwrap_or(Value::Null);
            out.insert(m.destination.as_str(), value);
        }
        out
    }
}

impl<S: Into<String>, D: Into<String>> FromIterator<(S, D)> for RenameSchema {
    fn from_iter<I: IntoIterator<Item = (S, D)>>(iter: I) -> Self {
        let mut schema = RenameSchema::new();
        for (s, d) in iter {
            schema.push(s, d);
        }
        schema
    }
}

impl Serialize for RenameSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for m in &self.entries {
            map.serialize_entry(&m.source, &m.destination)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RenameSchema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SchemaVisitor;

        impl<'de> Visitor<'de> for SchemaVisitor {
            type Value = RenameSchema;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping source field names to column names")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RenameSchema, A::Error> {
                let mut schema = RenameSchema::new();
                while let Some((source, destination)) = access.next_entry::<String, String>()? {
                    schema.push(source, destination);
                }
                Ok(schema)
            }
        }

        deserializer.deserialize_map(SchemaVisitor)
    }
}

/// Returns a new dataset where every row holds exactly `schema`'s destination columns.
///
/// Fields not named in the schema are dropped. Row order is preserved.
pub fn project_columns(dataset: &ReportDataset, schema: &RenameSchema) -> ReportDataset {
    dataset.rows.iter().map(|row| schema.project_row(row)).collect()
}
