//! CSV output.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::{ReportError, ReportResult};
use crate::types::ReportDataset;

/// Write `dataset` as CSV: a header row, then one record per row.
///
/// `Null` and absent cells are written as empty fields.
pub fn write_csv<W: Write>(dataset: &ReportDataset, writer: W) -> ReportResult<()> {
    let columns = dataset.column_names();
    if columns.is_empty() {
        return Ok(());
    }
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(&columns)?;

    for row in &dataset.rows {
        let record = columns
            .iter()
            .map(|c| row.get(c).map(|v| v.to_string()).unwrap_or_default());
        wtr.write_record(record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Render `dataset` as a CSV string.
pub fn to_csv_string(dataset: &ReportDataset) -> ReportResult<String> {
    let mut buf = Vec::new();
    write_csv(dataset, &mut buf)?;
    String::from_utf8(buf).map_err(|e| ReportError::InvalidPayload {
        message: format!("csv output is not valid UTF-8: {e}"),
    })
}

/// Write `dataset` as CSV to `path`, replacing any existing file.
pub fn write_csv_to_path(dataset: &ReportDataset, path: impl AsRef<Path>) -> ReportResult<()> {
    let file = File::create(path.as_ref())?;
    write_csv(dataset, file)
}
