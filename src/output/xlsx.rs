//! XLSX output (requires Cargo feature `xlsx`).

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::error::{ReportError, ReportResult};
use crate::types::{ReportDataset, Value};

use super::dates::excel_serial_date;

/// Number format applied to date cells.
pub const DATE_FORMAT: &str = "mmm dd, yyyy";

/// Options for [`write_xlsx_with_options`].
#[derive(Debug, Clone)]
pub struct XlsxOptions {
    /// Column whose ISO date strings are written as Excel dates. `None` writes them as text.
    pub date_column: Option<String>,
}

impl Default for XlsxOptions {
    fn default() -> Self {
        Self {
            date_column: Some("Date".to_string()),
        }
    }
}

/// Write `dataset` to a single-sheet workbook at `path`, using default [`XlsxOptions`].
pub fn write_xlsx(dataset: &ReportDataset, tab_name: &str, path: impl AsRef<Path>) -> ReportResult<()> {
    write_xlsx_with_options(dataset, tab_name, path, &XlsxOptions::default())
}

pub fn write_xlsx_with_options(
    dataset: &ReportDataset,
    tab_name: &str,
    path: impl AsRef<Path>,
    options: &XlsxOptions,
) -> ReportResult<()> {
    let mut wb = build_workbook(dataset, tab_name, options)?;
    wb.save(path.as_ref())?;
    Ok(())
}

/// Render the workbook in memory (e.g. for upload).
pub fn to_xlsx_buffer(dataset: &ReportDataset, tab_name: &str, options: &XlsxOptions) -> ReportResult<Vec<u8>> {
    let mut wb = build_workbook(dataset, tab_name, options)?;
    Ok(wb.save_to_buffer()?)
}

fn build_workbook(dataset: &ReportDataset, tab_name: &str, options: &XlsxOptions) -> ReportResult<Workbook> {
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.set_name(tab_name)?;

    let date_format = Format::new().set_num_format(DATE_FORMAT);
    let columns = dataset.column_names();

    for (c, name) in columns.iter().enumerate() {
        ws.write_string(0, col_index(c)?, name)?;
    }

    for (r, row) in dataset.rows.iter().enumerate() {
        let r = row_index(r + 1)?;
        for (c, name) in columns.iter().enumerate() {
            let Some(value) = row.get(name) else {
                continue;
            };
            let is_date_column = options.date_column.as_deref() == Some(name.as_str());
            write_cell(ws, r, col_index(c)?, value, is_date_column.then_some(&date_format))?;
        }
    }

    Ok(wb)
}

fn write_cell(
    ws: &mut Worksheet,
    row: u32,
    col: u16,
    value: &Value,
    date_format: Option<&Format>,
) -> ReportResult<()> {
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            ws.write_boolean(row, col, *b)?;
        }
        Value::Int64(v) => {
            ws.write_number(row, col, *v as f64)?;
        }
        Value::Float64(v) => {
            ws.write_number(row, col, *v)?;
        }
        Value::Utf8(s) => match date_format.and_then(|fmt| Some((excel_serial_date(s)?, fmt))) {
            Some((serial, fmt)) => {
                ws.write_number_with_format(row, col, serial, fmt)?;
            }
            None => {
                ws.write_string(row, col, s)?;
            }
        },
    }
    Ok(())
}

fn col_index(c: usize) -> ReportResult<u16> {
    u16::try_from(c).map_err(|_| ReportError::InvalidPayload {
        message: format!("too many columns for a worksheet ({})", c + 1),
    })
}

fn row_index(r: usize) -> ReportResult<u32> {
    u32::try_from(r).map_err(|_| ReportError::InvalidPayload {
        message: format!("too many rows for a worksheet ({})", r + 1),
    })
}
