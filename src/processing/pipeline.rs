//! `derive -> project` orchestration for one report.

use crate::catalog::{ProductCatalog, ProductTypeConfig};
use crate::error::ReportResult;
use crate::types::ReportDataset;

use super::derive::derive_columns;
use super::project::project_columns;

/// Derive then project `dataset` using `config`. Infallible once a config is in hand.
pub fn process_with_config(dataset: ReportDataset, config: &ProductTypeConfig) -> ReportDataset {
    let derived = derive_columns(dataset, &config.rules);
    project_columns(&derived, &config.schema)
}

/// Reshape a raw report into the console layout for `product_type`.
///
/// `product_type` is an API name (`SPONSORED_BRANDS`) or short code (`SB`), resolved against
/// [`ProductCatalog::builtin`].
///
/// # Errors
///
/// [`crate::ConfigError::UnknownProductType`] if the name is not a known product type.
pub fn process_data(dataset: ReportDataset, product_type: &str) -> ReportResult<ReportDataset> {
    let config = ProductCatalog::builtin().get_by_name(product_type)?;
    Ok(process_with_config(dataset, config))
}
