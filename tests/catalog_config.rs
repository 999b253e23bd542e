use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use ads_report_processing::catalog::{ProductCatalog, ProductType};
use ads_report_processing::types::{ReportDataset, Row, Value};
use ads_report_processing::{ConfigError, ReportError};

fn tmp_file(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("ads-report-processing-{nanos}-{name}"))
}

const PORTFOLIO_CATALOG: &str = r#"[
  {
    "product_type": "SPONSORED_PRODUCTS",
    "rules": [
      {
        "name": "Portfolio name",
        "kind": "lookup",
        "table": {"entries": {"111": "Shoes", "222": "Socks"}, "fallback": "No Portfolio"}
      },
      {"name": "7 Day Conversion Rate", "kind": "ratio", "numerator": "purchases7d", "denominator": "clicks"}
    ],
    "schema": {
      "date": "Date",
      "Portfolio name": "Portfolio name",
      "7 Day Conversion Rate": "7 Day Conversion Rate"
    }
  }
]"#;

fn sp_row(portfolio: Value) -> Row {
    [
        ("date", Value::from("2024-06-01")),
        ("portfolioId", portfolio),
        ("clicks", Value::Int64(4)),
        ("purchases7d", Value::Int64(1)),
    ]
    .into_iter()
    .collect()
}

#[test]
fn json_catalog_drives_lookup_rules() {
    let path = tmp_file("catalog.json");
    std::fs::write(&path, PORTFOLIO_CATALOG).unwrap();
    let catalog = ProductCatalog::from_path(&path).unwrap();

    let ds = ReportDataset::new(vec![
        sp_row(Value::Int64(111)),
        sp_row(Value::from("222")),
        sp_row(Value::Null),
        sp_row(Value::Int64(999)),
    ]);
    let out = catalog.process(ds, ProductType::SponsoredProducts).unwrap();

    let names: Vec<Option<&Value>> = out.rows.iter().map(|r| r.get("Portfolio name")).collect();
    assert_eq!(
        names,
        vec![
            Some(&Value::from("Shoes")),
            Some(&Value::from("Socks")),
            Some(&Value::from("No Portfolio")),
            Some(&Value::from("No Portfolio")),
        ]
    );
    assert_eq!(out.rows[0].get("7 Day Conversion Rate"), Some(&Value::Float64(0.25)));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn products_missing_from_a_custom_catalog_are_errors() {
    let catalog = ProductCatalog::from_json_str(PORTFOLIO_CATALOG).unwrap();
    let err = catalog
        .process(ReportDataset::default(), ProductType::SponsoredDisplay)
        .unwrap_err();
    assert!(matches!(
        err,
        ReportError::Config(ConfigError::MissingProduct(ProductType::SponsoredDisplay))
    ));
}

#[test]
fn builtin_catalog_round_trips_through_json() {
    let builtin = ProductCatalog::builtin();
    let json = builtin.to_json_string_pretty().unwrap();
    let reloaded = ProductCatalog::from_json_str(&json).unwrap();
    assert_eq!(&reloaded, builtin);
    assert_eq!(reloaded.product_types().collect::<Vec<_>>(), ProductType::ALL.to_vec());
}

#[test]
fn chained_rules_are_rejected_on_load() {
    let input = r#"[{
      "product_type": "SPONSORED_BRANDS",
      "rules": [
        {"name": "CTR", "kind": "ratio", "numerator": "clicks", "denominator": "impressions"},
        {"name": "CTR copy", "kind": "alias", "source": "CTR"}
      ],
      "schema": {"CTR": "CTR"}
    }]"#;
    let err = ProductCatalog::from_json_str(input).unwrap_err();
    assert!(matches!(err, ReportError::Config(ConfigError::ChainedRule { .. })));
}

#[test]
fn malformed_rule_kind_is_a_json_error() {
    let input = r#"[{"product_type": "SPONSORED_BRANDS", "rules": [{"name": "x", "kind": "median"}], "schema": {}}]"#;
    assert!(matches!(
        ProductCatalog::from_json_str(input),
        Err(ReportError::Json(_))
    ));
}
