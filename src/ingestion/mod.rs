//! Report payload decoding.
//!
//! Most callers should use [`ingest_from_bytes`] or [`ingest_from_path`] (from [`unified`]),
//! which:
//!
//! - detect the payload format (gzip, JSON/NDJSON, TSV, CSV) or take it from
//!   [`IngestionOptions`]
//! - decode it into an in-memory [`crate::types::ReportDataset`], flattening nested JSON
//! - optionally report success/failure/alerts to an [`IngestionObserver`]
//!
//! Format-specific functions are also available under [`gzip`], [`json`] and [`delimited`].

pub mod delimited;
pub mod gzip;
pub mod json;
pub mod observability;
pub mod unified;

pub use observability::{
    CompositeObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats, StdErrObserver,
    TracingObserver,
};
pub use unified::{ingest_from_bytes, ingest_from_path, IngestionOptions, PayloadFormat};
