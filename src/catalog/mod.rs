//! Product types and their derivation/projection configs.
//!
//! Each [`ProductType`] is bound to one [`ProductTypeConfig`]: the [`ColumnRule`]s that add
//! derived columns and the [`RenameSchema`] that produces the final column layout.
//! [`ProductCatalog::builtin`] holds the canonical tables; alternative catalogs can be loaded
//! from JSON and are validated the same way.
//!
//! ```rust
//! use ads_report_processing::catalog::{ProductCatalog, ProductType};
//!
//! let catalog = ProductCatalog::builtin();
//! let sb = catalog.get(ProductType::SponsoredBrands).unwrap();
//! assert_eq!(sb.schema.destinations().next(), Some("Date"));
//! assert_eq!("SB".parse::<ProductType>().unwrap(), ProductType::SponsoredBrands);
//! ```

mod builtin;

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ReportResult};
use crate::processing::{process_with_config, ColumnRule, RenameSchema};
use crate::types::ReportDataset;

/// Report families handled by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductType {
    /// Sponsored Products advertised product report (`spAdvertisedProduct`).
    SponsoredProducts,
    /// Sponsored Display advertised product report (`sdAdvertisedProduct`).
    SponsoredDisplay,
    /// Sponsored Brands search term report (`sbSearchTerm`).
    SponsoredBrands,
    /// SP-API sales and traffic report by child ASIN.
    SalesAndTraffic,
}

/// File format a product's report is delivered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Xlsx,
    Csv,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Csv => "csv",
        }
    }
}

impl ProductType {
    /// All product types, in catalog order.
    pub const ALL: [ProductType; 4] = [
        ProductType::SponsoredProducts,
        ProductType::SponsoredDisplay,
        ProductType::SponsoredBrands,
        ProductType::SalesAndTraffic,
    ];

    /// Identifier used by the reporting APIs (`adProduct`).
    pub fn api_name(self) -> &'static str {
        match self {
            ProductType::SponsoredProducts => "SPONSORED_PRODUCTS",
            ProductType::SponsoredDisplay => "SPONSORED_DISPLAY",
            ProductType::SponsoredBrands => "SPONSORED_BRANDS",
            ProductType::SalesAndTraffic => "SALES_AND_TRAFFIC",
        }
    }

    /// Short code used in file names and job configs.
    pub fn code(self) -> &'static str {
        match self {
            ProductType::SponsoredProducts => "SP",
            ProductType::SponsoredDisplay => "SD",
            ProductType::SponsoredBrands => "SB",
            ProductType::SalesAndTraffic => "ST",
        }
    }

    pub fn output_format(self) -> OutputFormat {
        match self {
            ProductType::SalesAndTraffic => OutputFormat::Csv,
            _ => OutputFormat::Xlsx,
        }
    }

    /// Worksheet name used in the workbook (Excel caps these at 31 characters).
    pub fn tab_name(self) -> &'static str {
        match self {
            ProductType::SponsoredProducts => "Sponsored Product Advertised Pr",
            ProductType::SponsoredDisplay => "Sponsored Display Advertised Pr",
            ProductType::SponsoredBrands => "Sponsored Brands Search Term Re",
            ProductType::SalesAndTraffic => "Detail Page Sales and Traffic",
        }
    }

    /// Days between the run date and the newest complete report date.
    ///
    /// Ads reports are final the next day; SP-API sales and traffic data settles after three.
    pub fn report_lag_days(self) -> u32 {
        match self {
            ProductType::SalesAndTraffic => 3,
            _ => 1,
        }
    }

    /// Dot path of the record array in this product's JSON payload, if it is wrapped.
    pub fn records_path(self) -> Option<&'static str> {
        match self {
            ProductType::SalesAndTraffic => Some("salesAndTrafficByAsin"),
            _ => None,
        }
    }

    /// Output file name for the report covering `date`, e.g. `SP 2024-06-01.xlsx`.
    pub fn file_name(self, date: chrono::NaiveDate) -> String {
        let ext = self.output_format().extension();
        match self {
            ProductType::SalesAndTraffic => format!("{date}.{ext}"),
            _ => format!("{} {date}.{ext}", self.code()),
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

impl FromStr for ProductType {
    type Err = ConfigError;

    /// Accepts API names and short codes, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_uppercase();
        ProductType::ALL
            .into_iter()
            .find(|p| p.api_name() == needle || p.code() == needle)
            .ok_or_else(|| ConfigError::UnknownProductType {
                name: s.to_string(),
            })
    }
}

/// Rules and column layout for one product type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductTypeConfig {
    pub product_type: ProductType,
    /// Derived columns, applied before projection.
    #[serde(default)]
    pub rules: Vec<ColumnRule>,
    /// Output column layout.
    pub schema: RenameSchema,
}

impl ProductTypeConfig {
    pub fn new(product_type: ProductType, rules: Vec<ColumnRule>, schema: RenameSchema) -> Self {
        Self {
            product_type,
            rules,
            schema,
        }
    }

    /// Check rule-name and destination uniqueness, and that no rule reads another rule's
    /// output.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let product = self.product_type;

        let mut rule_names: HashSet<&str> = HashSet::new();
        for rule in &self.rules {
            if !rule_names.insert(rule.name.as_str()) {
                return Err(ConfigError::DuplicateRule {
                    product,
                    name: rule.name.clone(),
                });
            }
        }

        for rule in &self.rules {
            if let Some(input) = rule.inputs().into_iter().find(|i| rule_names.contains(i)) {
                return Err(ConfigError::ChainedRule {
                    product,
                    rule: rule.name.clone(),
                    input: input.to_string(),
                });
            }
        }

        let mut destinations: HashSet<&str> = HashSet::new();
        for dest in self.schema.destinations() {
            if !destinations.insert(dest) {
                return Err(ConfigError::DuplicateDestination {
                    product,
                    name: dest.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Immutable set of product configs, keyed by product type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductCatalog {
    configs: BTreeMap<ProductType, ProductTypeConfig>,
}

impl ProductCatalog {
    /// Build a catalog, validating every config.
    pub fn new(configs: Vec<ProductTypeConfig>) -> Result<Self, ConfigError> {
        let mut map = BTreeMap::new();
        for config in configs {
            config.validate()?;
            let product = config.product_type;
            if map.insert(product, config).is_some() {
                return Err(ConfigError::DuplicateProduct(product));
            }
        }
        Ok(Self { configs: map })
    }

    /// The canonical catalog, built once per process.
    pub fn builtin() -> &'static ProductCatalog {
        static BUILTIN: OnceLock<ProductCatalog> = OnceLock::new();
        BUILTIN.get_or_init(|| ProductCatalog {
            configs: builtin::all()
                .into_iter()
                .map(|c| (c.product_type, c))
                .collect(),
        })
    }

    /// Load a catalog from a JSON array of [`ProductTypeConfig`]s.
    pub fn from_json_str(input: &str) -> ReportResult<Self> {
        let configs: Vec<ProductTypeConfig> = serde_json::from_str(input)?;
        Ok(Self::new(configs)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> ReportResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serialize the catalog as a JSON array (the format [`Self::from_json_str`] reads).
    pub fn to_json_string_pretty(&self) -> ReportResult<String> {
        let configs: Vec<&ProductTypeConfig> = self.configs.values().collect();
        Ok(serde_json::to_string_pretty(&configs)?)
    }

    pub fn get(&self, product_type: ProductType) -> Result<&ProductTypeConfig, ConfigError> {
        self.configs
            .get(&product_type)
            .ok_or(ConfigError::MissingProduct(product_type))
    }

    /// Look up a config by API name or short code.
    pub fn get_by_name(&self, name: &str) -> Result<&ProductTypeConfig, ConfigError> {
        self.get(name.parse()?)
    }

    pub fn product_types(&self) -> impl Iterator<Item = ProductType> + '_ {
        self.configs.keys().copied()
    }

    /// Derive then project `dataset` using this catalog's config for `product_type`.
    pub fn process(
        &self,
        dataset: ReportDataset,
        product_type: ProductType,
    ) -> ReportResult<ReportDataset> {
        let config = self.get(product_type)?;
        Ok(process_with_config(dataset, config))
    }
}
