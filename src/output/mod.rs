//! Writers for processed reports.
//!
//! - CSV via the `csv` crate ([`write_csv`], [`write_csv_to_path`])
//! - XLSX via `rust_xlsxwriter` ([`write_xlsx`], requires Cargo feature `xlsx`)
//!
//! Both writers use [`crate::types::ReportDataset::column_names`] as the header, so a
//! projected dataset is written in schema order.

pub mod csv;
pub mod dates;
#[cfg(feature = "xlsx")]
pub mod xlsx;

pub use csv::{to_csv_string, write_csv, write_csv_to_path};
pub use dates::excel_serial_date;
#[cfg(feature = "xlsx")]
pub use xlsx::{to_xlsx_buffer, write_xlsx, write_xlsx_with_options, XlsxOptions};
