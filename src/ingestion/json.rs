//! JSON report ingestion.
//!
//! Supported inputs:
//! - A JSON array of objects: `[{"a":1}, {"a":2}]`
//! - A single object (one row, or an envelope when a records path is given)
//! - Newline-delimited JSON (NDJSON): `{"a":1}\n{"a":2}\n`
//!
//! Nested objects and arrays are flattened into dot-path field names (`salesByAsin.unitsOrdered`,
//! `tags.0`), so every row holds only scalar [`Value`]s. Key order from the payload is kept.

use std::fs;
use std::path::Path;

use crate::error::{ReportError, ReportResult};
use crate::types::{ReportDataset, Row, Value};

/// Ingest a JSON report file.
pub fn ingest_json_from_path(
    path: impl AsRef<Path>,
    records_path: Option<&str>,
) -> ReportResult<ReportDataset> {
    let text = fs::read_to_string(path)?;
    ingest_json_from_str(&text, records_path)
}

/// Ingest JSON from an in-memory string.
///
/// If `records_path` is set (dot notation, e.g. `salesAndTrafficByAsin`), the rows are read
/// from the array found at that path inside the top-level object.
pub fn ingest_json_from_str(input: &str, records_path: Option<&str>) -> ReportResult<ReportDataset> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ReportError::InvalidPayload {
            message: "json input is empty".to_string(),
        });
    }

    // First try parsing as a single JSON value (array or object).
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(v) => ingest_json_value(&v, records_path),
        Err(_) if records_path.is_none() => {
            // Fall back to NDJSON.
            let mut values = Vec::new();
            for (i, line) in trimmed.lines().enumerate() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let v = serde_json::from_str::<serde_json::Value>(line).map_err(|e| {
                    ReportError::InvalidPayload {
                        message: format!("invalid ndjson at line {}: {}", i + 1, e),
                    }
                })?;
                values.push(v);
            }
            rows_from_values(&values)
        }
        Err(e) => Err(e.into()),
    }
}

/// Ingest an already-parsed JSON document.
pub fn ingest_json_value(
    v: &serde_json::Value,
    records_path: Option<&str>,
) -> ReportResult<ReportDataset> {
    let target = match records_path {
        Some(path) => get_by_dot_path(v, path).ok_or_else(|| ReportError::InvalidPayload {
            message: format!("records path '{path}' not found in json document"),
        })?,
        None => v,
    };

    match target {
        serde_json::Value::Array(items) => rows_from_values(items),
        serde_json::Value::Object(_) => rows_from_values(std::slice::from_ref(target)),
        _ => Err(ReportError::InvalidPayload {
            message: "json must be an object, an array of objects, or NDJSON".to_string(),
        }),
    }
}

fn rows_from_values(values: &[serde_json::Value]) -> ReportResult<ReportDataset> {
    let mut rows = Vec::with_capacity(values.len());
    for (idx0, v) in values.iter().enumerate() {
        let obj = v.as_object().ok_or_else(|| ReportError::InvalidPayload {
            message: format!("row {} is not a json object", idx0 + 1),
        })?;
        let mut row = Row::with_capacity(obj.len());
        for (key, value) in obj {
            flatten_into(&mut row, key.clone(), value);
        }
        rows.push(row);
    }
    Ok(ReportDataset::new(rows))
}

fn flatten_into(row: &mut Row, prefix: String, v: &serde_json::Value) {
    match v {
        serde_json::Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                flatten_into(row, format!("{prefix}.{key}"), child);
            }
        }
        serde_json::Value::Array(items) if !items.is_empty() => {
            for (i, child) in items.iter().enumerate() {
                flatten_into(row, format!("{prefix}.{i}"), child);
            }
        }
        other => {
            row.insert(prefix, Value::from_json(other));
        }
    }
}

fn get_by_dot_path<'a>(root: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    path.split('.').try_fold(root, |current, segment| match current {
        serde_json::Value::Object(map) => map.get(segment),
        _ => None,
    })
}
