//! `ads-report-processing` reshapes Amazon Ads and Selling Partner API report payloads into
//! the fixed column layouts of the legacy console spreadsheets.
//!
//! The core is a two-stage, row-wise transformation:
//!
//! 1. **Derive**: [`processing::derive_columns`] applies declarative
//!    [`processing::ColumnRule`]s (constants, ratios, scaled ratios, aliases, lookups) to every
//!    row.
//! 2. **Project**: [`processing::project_columns`] renames fields through a
//!    [`processing::RenameSchema`], drops everything else, and fixes column order.
//!
//! [`processing::process_data`] runs both stages for a product type from the built-in
//! [`catalog::ProductCatalog`].
//!
//! ## Quick example
//!
//! ```rust
//! use ads_report_processing::processing::process_data;
//! use ads_report_processing::types::{ReportDataset, Row, Value};
//!
//! # fn main() -> Result<(), ads_report_processing::ReportError> {
//! let row: Row = [
//!     ("date", Value::from("2024-06-01")),
//!     ("clicks", Value::Int64(10)),
//!     ("impressions", Value::Int64(200)),
//!     ("cost", Value::Float64(5.0)),
//! ]
//! .into_iter()
//! .collect();
//!
//! let out = process_data(ReportDataset::new(vec![row]), "SPONSORED_BRANDS")?;
//! let first = &out.rows[0];
//! assert_eq!(first.get("Click-Thru Rate (CTR)"), Some(&Value::Float64(0.05)));
//! assert_eq!(first.get("Cost Per Click (CPC)"), Some(&Value::Float64(0.5)));
//! assert_eq!(first.get("Portfolio name"), Some(&Value::from("Not grouped")));
//! // Sales were not reported, so the sales ratios are null rather than errors.
//! assert_eq!(first.get("Total Return on Advertising Spend (ROAS)"), Some(&Value::Null));
//! # Ok(())
//! # }
//! ```
//!
//! ## End to end
//!
//! ```no_run
//! use ads_report_processing::catalog::ProductType;
//! use ads_report_processing::job::ReportJob;
//! use ads_report_processing::output::write_xlsx;
//!
//! # fn main() -> Result<(), ads_report_processing::ReportError> {
//! let job = ReportJob::new(ProductType::SponsoredDisplay);
//! let body = std::fs::read("sd-advertised-product.json.gz")?;
//! let report = job.run_payload(&body)?;
//! write_xlsx(&report, job.tab_name(), job.file_name())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`types`]: [`types::Value`], [`types::Row`], [`types::ReportDataset`]
//! - [`processing`]: the derive and project stages and the orchestrator
//! - [`catalog`]: product types and their rule/schema tables (built-in or JSON)
//! - [`ingestion`]: gzip/JSON/NDJSON/TSV payload decoding with observer hooks
//! - [`execution`]: rayon-backed parallel transforms that keep row order
//! - [`output`]: CSV and XLSX writers
//! - [`job`]: per-run configuration (report date, file and tab names)
//! - [`error`]: error types used across the crate
//!
//! ## Numeric edge cases
//!
//! Ratio rules never fail. A missing or non-numeric operand, or a non-finite result
//! (division by zero included), yields [`types::Value::Null`]. A null operand counts as zero.

pub mod catalog;
pub mod error;
pub mod execution;
pub mod ingestion;
pub mod job;
pub mod output;
pub mod processing;
pub mod types;

pub use error::{ConfigError, ReportError, ReportResult};
