//! Delimited (TSV/CSV) report ingestion.
//!
//! Rules:
//!
//! - The first record is the header row.
//! - Empty cells become [`Value::Null`]; every other cell is kept as a string. Numeric
//!   coercion happens later, in the ratio rules.
//! - Short rows are tolerated; trailing columns are simply absent from that row.

use std::io::Read;
use std::path::Path;

use crate::error::{ReportError, ReportResult};
use crate::types::{ReportDataset, Row, Value};

/// Ingest a tab-separated file (SP-API flat-file reports).
pub fn ingest_tsv_from_path(path: impl AsRef<Path>) -> ReportResult<ReportDataset> {
    let mut rdr = reader_builder(b'\t').from_path(path)?;
    ingest_delimited_from_reader(&mut rdr)
}

/// Ingest delimited data from any byte source.
pub fn ingest_delimited_from_bytes(bytes: &[u8], delimiter: u8) -> ReportResult<ReportDataset> {
    let mut rdr = reader_builder(delimiter).from_reader(bytes);
    ingest_delimited_from_reader(&mut rdr)
}

/// Ingest delimited data from an existing CSV reader.
///
/// The reader must be configured with `has_headers(true)`.
pub fn ingest_delimited_from_reader<R: Read>(rdr: &mut csv::Reader<R>) -> ReportResult<ReportDataset> {
    let headers = rdr.headers()?.clone();
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(ReportError::InvalidPayload {
            message: "delimited input has no header row".to_string(),
        });
    }

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        let mut row = Row::with_capacity(headers.len());
        for (name, cell) in headers.iter().zip(record.iter()) {
            let value = if cell.is_empty() {
                Value::Null
            } else {
                Value::Utf8(cell.to_string())
            };
            row.insert(name, value);
        }
        rows.push(row);
    }

    Ok(ReportDataset::new(rows))
}

fn reader_builder(delimiter: u8) -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true)
        // Flat-file reports contain unescaped quotes in titles.
        .quoting(delimiter != b'\t');
    builder
}
