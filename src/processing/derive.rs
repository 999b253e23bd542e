//! Column derivation: computed metrics, static fills, and lookups.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{ReportDataset, Row, Value};

/// Row field used as the key for [`RuleKind::Lookup`].
pub const LOOKUP_KEY_FIELD: &str = "portfolioId";

/// One derived column: a destination name plus how to compute it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRule {
    /// Destination field name. Unique within a rule set.
    pub name: String,
    /// How the value is computed.
    #[serde(flatten)]
    pub kind: RuleKind,
}

/// The closed set of rule kinds.
///
/// Serialized with an internal `"kind"` tag, e.g.
/// `{"name": "Cost Type", "kind": "constant", "value": "CPC"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleKind {
    /// Every row gets this literal value.
    Constant { value: Value },
    /// `row[numerator] / row[denominator]`.
    Ratio {
        numerator: String,
        denominator: String,
    },
    /// `row[source]`, copied under a new name.
    Alias { source: String },
    /// `scale / row[numerator] * row[denominator]` ("per 1,000" metrics).
    ScaledRatio {
        scale: f64,
        numerator: String,
        denominator: String,
    },
    /// `table[row["portfolioId"]]`.
    Lookup { table: LookupTable },
}

/// Value table keyed by portfolio ID, with a fallback for null/unknown keys.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LookupTable {
    /// Entries keyed by the string form of the portfolio ID.
    #[serde(default)]
    pub entries: BTreeMap<String, Value>,
    /// Entry used when the key is null, absent, or not in `entries`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<Value>,
}

impl LookupTable {
    /// Create a table from `(key, value)` entries with an optional fallback.
    pub fn new<K, I>(entries: I, fallback: Option<Value>) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            fallback,
        }
    }

    /// Resolve `key`; `None` means the result is absent.
    pub fn resolve(&self, key: Option<&Value>) -> Option<Value> {
        key.and_then(Value::lookup_key)
            .and_then(|k| self.entries.get(&k))
            .or(self.fallback.as_ref())
            .cloned()
    }
}

impl ColumnRule {
    pub fn constant(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            kind: RuleKind::Constant {
                value: value.into(),
            },
        }
    }

    pub fn ratio(
        name: impl Into<String>,
        numerator: impl Into<String>,
        denominator: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: RuleKind::Ratio {
                numerator: numerator.into(),
                denominator: denominator.into(),
            },
        }
    }

    pub fn alias(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: RuleKind::Alias {
                source: source.into(),
            },
        }
    }

    pub fn scaled_ratio(
        name: impl Into<String>,
        scale: f64,
        numerator: impl Into<String>,
        denominator: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: RuleKind::ScaledRatio {
                scale,
                numerator: numerator.into(),
                denominator: denominator.into(),
            },
        }
    }

    pub fn lookup(name: impl Into<String>, table: LookupTable) -> Self {
        Self {
            name: name.into(),
            kind: RuleKind::Lookup { table },
        }
    }

    /// Row fields this rule reads.
    pub fn inputs(&self) -> Vec<&str> {
        match &self.kind {
            RuleKind::Constant { .. } => Vec::new(),
            RuleKind::Ratio {
                numerator,
                denominator,
            }
            | RuleKind::ScaledRatio {
                numerator,
                denominator,
                ..
            } => vec![numerator.as_str(), denominator.as_str()],
            RuleKind::Alias { source } => vec![source.as_str()],
            RuleKind::Lookup { .. } => vec![LOOKUP_KEY_FIELD],
        }
    }

    /// Evaluate the rule against `row`.
    ///
    /// Returns `None` when the result is absent. Never fails: missing operands and non-finite
    /// arithmetic produce `Some(Value::Null)`. A null operand is zero.
    pub fn evaluate(&self, row: &Row) -> Option<Value> {
        match &self.kind {
            RuleKind::Constant { value } => Some(value.clone()),
            RuleKind::Ratio {
                numerator,
                denominator,
            } => Some(finite_or_null(
                operand(row, numerator).zip(operand(row, denominator)).map(|(n, d)| n / d),
            )),
            RuleKind::Alias { source } => row.get(source).cloned(),
            RuleKind::ScaledRatio {
                scale,
                numerator,
                denominator,
            } => Some(finite_or_null(
                operand(row, numerator)
                    .zip(operand(row, denominator))
                    .map(|(n, d)| scale / n * d),
            )),
            RuleKind::Lookup { table } => table.resolve(row.get(LOOKUP_KEY_FIELD)),
        }
    }
}

/// Numeric value of `field`. An explicit null counts as zero; an absent or non-numeric field
/// is missing.
fn operand(row: &Row, field: &str) -> Option<f64> {
    match row.get(field)? {
        Value::Null => Some(0.0),
        value => value.as_f64(),
    }
}

fn finite_or_null(result: Option<f64>) -> Value {
    match result {
        Some(v) if v.is_finite() => Value::Float64(v),
        _ => Value::Null,
    }
}

/// Apply `rules` to a single row.
///
/// Every rule sees the row as it was before any rule in `rules` ran, so rules never observe
/// each other's output regardless of order.
pub fn derive_row(mut row: Row, rules: &[ColumnRule]) -> Row {
    let derived: Vec<(&str, Option<Value>)> = rules
        .iter()
        .map(|rule| (rule.name.as_str(), rule.evaluate(&row)))
        .collect();

    for (name, value) in derived {
        match value {
            Some(v) => {
                row.insert(name, v);
            }
            None => {
                row.remove(name);
            }
        }
    }
    row
}

/// Returns the dataset with every rule applied to every row, in row order.
pub fn derive_columns(dataset: ReportDataset, rules: &[ColumnRule]) -> ReportDataset {
    dataset.map_rows(|row| derive_row(row, rules))
}

#[cfg(test)]
mod tests {
    use super::{derive_columns, derive_row, ColumnRule, LookupTable};
    use crate::types::{ReportDataset, Row, Value};

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs.iter().cloned().collect()
    }

    #[test]
    fn ratio_divides_numerator_by_denominator() {
        let r = row(&[("clicks", Value::Int64(10)), ("purchases7d", Value::Int64(2))]);
        let rule = ColumnRule::ratio("7 Day Conversion Rate", "purchases7d", "clicks");
        assert_eq!(rule.evaluate(&r), Some(Value::Float64(0.2)));
    }

    #[test]
    fn ratio_with_zero_numerator_is_zero() {
        let r = row(&[("clicks", Value::Int64(0)), ("impressions", Value::Int64(100))]);
        let rule = ColumnRule::ratio("CTR", "clicks", "impressions");
        assert_eq!(rule.evaluate(&r), Some(Value::Float64(0.0)));
    }

    #[test]
    fn ratio_degenerate_cases_are_null() {
        let rule = ColumnRule::ratio("CTR", "clicks", "impressions");

        let div_zero = row(&[("clicks", Value::Int64(5)), ("impressions", Value::Int64(0))]);
        let neg_div_zero = row(&[("clicks", Value::Int64(-5)), ("impressions", Value::Int64(0))]);
        let zero_zero = row(&[("clicks", Value::Int64(0)), ("impressions", Value::Int64(0))]);
        let missing = row(&[("clicks", Value::Int64(5))]);
        let null_denominator = row(&[("clicks", Value::Int64(3)), ("impressions", Value::Null)]);
        let both_null = row(&[("clicks", Value::Null), ("impressions", Value::Null)]);
        let junk = row(&[("clicks", Value::Utf8("-".to_string())), ("impressions", Value::Int64(3))]);

        for r in [div_zero, neg_div_zero, zero_zero, missing, null_denominator, both_null, junk] {
            assert_eq!(rule.evaluate(&r), Some(Value::Null), "row: {r:?}");
        }
    }

    #[test]
    fn null_operand_counts_as_zero() {
        let roas = ColumnRule::ratio("ROAS", "sales", "cost");
        let r = row(&[("sales", Value::Null), ("cost", Value::Int64(3))]);
        assert_eq!(roas.evaluate(&r), Some(Value::Float64(0.0)));

        // Absent is not null.
        let r = row(&[("cost", Value::Int64(3))]);
        assert_eq!(roas.evaluate(&r), Some(Value::Null));

        let vcpm = ColumnRule::scaled_ratio("VCPM", 1000.0, "viewableImpressions", "cost");
        let r = row(&[("viewableImpressions", Value::Int64(500)), ("cost", Value::Null)]);
        assert_eq!(vcpm.evaluate(&r), Some(Value::Float64(0.0)));
        let r = row(&[("viewableImpressions", Value::Null), ("cost", Value::Int64(2))]);
        assert_eq!(vcpm.evaluate(&r), Some(Value::Null));
    }

    #[test]
    fn scaled_ratio_computes_per_thousand_metric() {
        let r = row(&[("viewableImpressions", Value::Int64(500)), ("cost", Value::Int64(2))]);
        let rule = ColumnRule::scaled_ratio("VCPM", 1000.0, "viewableImpressions", "cost");
        assert_eq!(rule.evaluate(&r), Some(Value::Float64(4.0)));

        let none_viewable = row(&[("viewableImpressions", Value::Int64(0)), ("cost", Value::Int64(2))]);
        assert_eq!(rule.evaluate(&none_viewable), Some(Value::Null));
    }

    #[test]
    fn constant_and_alias() {
        let r = row(&[("unitsSold", Value::Int64(7))]);
        assert_eq!(
            ColumnRule::constant("Cost Type", "CPC").evaluate(&r),
            Some(Value::Utf8("CPC".to_string()))
        );
        assert_eq!(
            ColumnRule::alias("Units", "unitsSold").evaluate(&r),
            Some(Value::Int64(7))
        );
        assert_eq!(ColumnRule::alias("Units", "missing").evaluate(&r), None);
    }

    #[test]
    fn lookup_uses_fallback_for_null_and_unknown_keys() {
        let table = LookupTable::new(
            [("106981549316271", Value::from("Double Spend"))],
            Some(Value::from("No Portfolio")),
        );
        let rule = ColumnRule::lookup("Portfolio name", table);

        let known = row(&[("portfolioId", Value::Int64(106981549316271))]);
        let unknown = row(&[("portfolioId", Value::Int64(1))]);
        let null = row(&[("portfolioId", Value::Null)]);
        let absent = row(&[]);

        assert_eq!(rule.evaluate(&known), Some(Value::from("Double Spend")));
        assert_eq!(rule.evaluate(&unknown), Some(Value::from("No Portfolio")));
        assert_eq!(rule.evaluate(&null), Some(Value::from("No Portfolio")));
        assert_eq!(rule.evaluate(&absent), Some(Value::from("No Portfolio")));
    }

    #[test]
    fn lookup_without_fallback_is_absent() {
        let rule = ColumnRule::lookup("Portfolio name", LookupTable::new([("1", Value::from("A"))], None));
        let r = row(&[("portfolioId", Value::Utf8("2".to_string()))]);
        assert_eq!(rule.evaluate(&r), None);

        let out = derive_row(r, &[rule]);
        assert!(!out.contains_key("Portfolio name"));
    }

    #[test]
    fn rules_never_see_each_others_output() {
        // "clicks" is both a rule destination and another rule's input.
        let rules = vec![
            ColumnRule::constant("clicks", Value::Int64(0)),
            ColumnRule::ratio("CPC", "cost", "clicks"),
        ];
        let r = row(&[("cost", Value::Int64(10)), ("clicks", Value::Int64(5))]);
        let out = derive_row(r, &rules);
        assert_eq!(out.get("CPC"), Some(&Value::Float64(2.0)));
        assert_eq!(out.get("clicks"), Some(&Value::Int64(0)));
    }

    #[test]
    fn derive_columns_preserves_row_order_and_existing_fields() {
        let ds = ReportDataset::new(
            (0..5)
                .map(|i| row(&[("id", Value::Int64(i)), ("clicks", Value::Int64(i))]))
                .collect(),
        );
        let out = derive_columns(ds, &[ColumnRule::constant("Cost Type", "CPC")]);
        assert_eq!(out.row_count(), 5);
        for (i, r) in out.rows.iter().enumerate() {
            assert_eq!(r.get("id"), Some(&Value::Int64(i as i64)));
            assert_eq!(r.keys().collect::<Vec<_>>(), vec!["id", "clicks", "Cost Type"]);
        }
    }

    #[test]
    fn rules_round_trip_through_tagged_json() {
        let json = r#"[
            {"name": "Cost Type", "kind": "constant", "value": "CPC"},
            {"name": "CTR", "kind": "ratio", "numerator": "clicks", "denominator": "impressions"},
            {"name": "Units", "kind": "alias", "source": "unitsSold"},
            {"name": "VCPM", "kind": "scaled_ratio", "scale": 1000, "numerator": "viewableImpressions", "denominator": "cost"},
            {"name": "Portfolio name", "kind": "lookup", "table": {"entries": {"1": "A"}, "fallback": "None"}}
        ]"#;
        let rules: Vec<ColumnRule> = serde_json::from_str(json).unwrap();
        assert_eq!(rules[0], ColumnRule::constant("Cost Type", "CPC"));
        assert_eq!(rules[1], ColumnRule::ratio("CTR", "clicks", "impressions"));
        assert_eq!(rules[2], ColumnRule::alias("Units", "unitsSold"));
        assert_eq!(
            rules[3],
            ColumnRule::scaled_ratio("VCPM", 1000.0, "viewableImpressions", "cost")
        );
        assert_eq!(
            rules[4],
            ColumnRule::lookup(
                "Portfolio name",
                LookupTable::new([("1", Value::from("A"))], Some(Value::from("None")))
            )
        );
    }
}
