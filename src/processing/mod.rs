//! The column transformation engine.
//!
//! Reports are reshaped in two stages:
//!
//! - [`derive_columns`]: applies [`ColumnRule`]s to every row, adding computed metrics,
//!   static fills, aliases, and portfolio lookups
//! - [`project_columns`]: keeps only the fields named by a [`RenameSchema`], renamed and in
//!   schema order
//!
//! [`process_data`] composes both for a product type from the builtin catalog.
//!
//! ## Example
//!
//! ```rust
//! use ads_report_processing::processing::{derive_columns, project_columns, ColumnRule, RenameSchema};
//! use ads_report_processing::types::{ReportDataset, Row, Value};
//!
//! let row: Row = [
//!     ("date", Value::from("2024-06-01")),
//!     ("clicks", Value::Int64(10)),
//!     ("purchases7d", Value::Int64(2)),
//! ]
//! .into_iter()
//! .collect();
//! let ds = ReportDataset::new(vec![row]);
//!
//! let rules = vec![ColumnRule::ratio("7 Day Conversion Rate", "purchases7d", "clicks")];
//! let schema = RenameSchema::new()
//!     .with("date", "Date")
//!     .with("7 Day Conversion Rate", "7 Day Conversion Rate");
//!
//! let out = project_columns(&derive_columns(ds, &rules), &schema);
//! assert_eq!(out.rows[0].get("7 Day Conversion Rate"), Some(&Value::Float64(0.2)));
//! assert_eq!(out.rows[0].keys().collect::<Vec<_>>(), vec!["Date", "7 Day Conversion Rate"]);
//! ```

pub mod derive;
pub mod pipeline;
pub mod project;

pub use derive::{derive_columns, derive_row, ColumnRule, LookupTable, RuleKind, LOOKUP_KEY_FIELD};
pub use pipeline::{process_data, process_with_config};
pub use project::{project_columns, ColumnMapping, RenameSchema};
