use thiserror::Error;

use crate::catalog::ProductType;

/// Convenience result type used across the crate.
pub type ReportResult<T> = Result<T, ReportError>;

/// Error type returned by ingestion, processing, and output functions.
///
/// Arithmetic degeneracy (division by zero, missing operands) and missing fields are never
/// errors; they resolve to [`crate::types::Value::Null`] or an absent field.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Underlying I/O error (e.g. file not found, truncated gzip stream).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON decoding or encoding error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Delimited (TSV/CSV) read or write error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "xlsx")]
    /// Workbook serialization error (feature-gated behind `xlsx`).
    #[error("xlsx error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// The execution thread pool could not be created.
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Product type / catalog configuration problem. Always fatal, never retried.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The payload does not have the shape of a report (not objects, no header row, ...).
    #[error("invalid payload: {message}")]
    InvalidPayload { message: String },
}

/// Configuration errors raised while resolving or validating product type configs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The product type name is not one of the known report types.
    #[error("unknown product type '{name}'")]
    UnknownProductType { name: String },

    /// The catalog has no config for a (known) product type.
    #[error("no config registered for product type {0}")]
    MissingProduct(ProductType),

    /// The same product type appears more than once in a catalog.
    #[error("product type {0} is configured more than once")]
    DuplicateProduct(ProductType),

    /// Two rules of one product write the same destination name.
    #[error("{product}: rule '{name}' is defined more than once")]
    DuplicateRule { product: ProductType, name: String },

    /// Two schema entries of one product map onto the same destination column.
    #[error("{product}: destination column '{name}' is mapped more than once")]
    DuplicateDestination { product: ProductType, name: String },

    /// A rule reads a field that another rule of the same product writes.
    #[error("{product}: rule '{rule}' reads '{input}', which is produced by another rule")]
    ChainedRule {
        product: ProductType,
        rule: String,
        input: String,
    },

    /// Options struct holds a value the engine cannot run with.
    #[error("invalid option: {message}")]
    InvalidOption { message: String },
}
