//! Column role inference.
//!
//! Roles depend only on a column's name and the types of its values, never
//! on row order, so classifying the same dataset twice gives the same map.

use indexmap::IndexMap;
use serde::Serialize;

use crate::data::{Column, Dataset, Value};
use crate::error::ShapeResult;

/// Name fragments that mark a numeric column as a percentage.
const PERCENT_TOKENS: &[&str] = &["percent", "pct", "%", "margin"];

/// Name fragments that mark a measure as profit/margin-like (sign matters).
const PROFIT_TOKENS: &[&str] = &["profit", "margin", "loss", "income", "earning", "ebit"];

/// Inclusive value range a percentage column must stay within.
const PERCENT_RANGE: (f64, f64) = (-100.0, 100.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnRole {
    Dimension,
    Measure,
    PercentageMeasure,
}

impl ColumnRole {
    /// True for both plain and percentage measures
    pub fn is_numeric(self) -> bool {
        !matches!(self, ColumnRole::Dimension)
    }
}

/// Column name → role, in column declaration order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ColumnRoles(IndexMap<String, ColumnRole>);

impl ColumnRoles {
    pub fn get(&self, column: &str) -> Option<ColumnRole> {
        self.0.get(column).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ColumnRole)> {
        self.0.iter().map(|(name, role)| (name.as_str(), *role))
    }

    fn with_role(&self, wanted: ColumnRole) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(move |(_, role)| *role == wanted)
            .map(|(name, _)| name)
    }

    pub fn dimensions(&self) -> Vec<&str> {
        self.with_role(ColumnRole::Dimension).collect()
    }

    /// Plain measures only; percentage measures are listed by [`Self::percentages`]
    pub fn measures(&self) -> Vec<&str> {
        self.with_role(ColumnRole::Measure).collect()
    }

    pub fn percentages(&self) -> Vec<&str> {
        self.with_role(ColumnRole::PercentageMeasure).collect()
    }
}

/// Classify every column of `dataset`.
///
/// Fails only when the dataset itself is malformed (empty, ragged or with
/// duplicate names).
pub fn classify(dataset: &Dataset) -> ShapeResult<ColumnRoles> {
    dataset.validate()?;

    let roles = dataset
        .columns()
        .iter()
        .map(|column| {
            let is_label = dataset.label_column() == Some(column.name.as_str());
            (column.name.clone(), classify_column(column, is_label))
        })
        .collect();

    Ok(ColumnRoles(roles))
}

fn classify_column(column: &Column, is_label: bool) -> ColumnRole {
    if is_label || !is_numeric(&column.values) {
        return ColumnRole::Dimension;
    }

    if is_percentage_name(&column.name) && within_percent_range(&column.values) {
        ColumnRole::PercentageMeasure
    } else {
        ColumnRole::Measure
    }
}

/// At least one number, and nothing but numbers among the present values
fn is_numeric(values: &[Value]) -> bool {
    let mut any_number = false;
    for value in values {
        match value {
            Value::Number(_) => any_number = true,
            Value::Missing => {}
            Value::Text(_) => return false,
        }
    }
    any_number
}

fn within_percent_range(values: &[Value]) -> bool {
    values
        .iter()
        .filter_map(Value::as_number)
        .all(|v| v >= PERCENT_RANGE.0 && v <= PERCENT_RANGE.1)
}

fn contains_token(name: &str, tokens: &[&str]) -> bool {
    let lower = name.to_lowercase();
    tokens.iter().any(|t| lower.contains(t))
}

pub fn is_percentage_name(name: &str) -> bool {
    contains_token(name, PERCENT_TOKENS)
}

/// Profit/margin-like measures get sign-based coloring.
pub fn is_profit_like(name: &str) -> bool {
    contains_token(name, PROFIT_TOKENS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;
    use crate::error::ShapeError;

    fn financials() -> Dataset {
        Dataset::new(
            "financial_data",
            vec![
                Column::text("Year", &["FY 2022", "FY 2023", "FY 2024", "FY 2025 (P)"]),
                Column::numbers("Revenue", &[694673.0, 876396.0, 899041.0, 962820.0]),
                Column::numbers("Net_Profit", &[67845.0, 74088.0, 79020.0, 81309.0]),
            ],
        )
    }

    #[test]
    fn test_classify_dimension_and_measures() {
        let roles = classify(&financials()).unwrap();
        assert_eq!(roles.get("Year"), Some(ColumnRole::Dimension));
        assert_eq!(roles.get("Revenue"), Some(ColumnRole::Measure));
        assert_eq!(roles.get("Net_Profit"), Some(ColumnRole::Measure));
        assert_eq!(roles.dimensions(), vec!["Year"]);
        assert_eq!(roles.measures(), vec!["Revenue", "Net_Profit"]);
    }

    #[test]
    fn test_classify_percentage() {
        let ds = Dataset::new(
            "holding",
            vec![
                Column::text("Shareholder", &["Promoters", "FIIs", "DIIs", "Public"]),
                Column::numbers("Percentage", &[50.13, 19.16, 19.02, 11.52]),
            ],
        );
        let roles = classify(&ds).unwrap();
        assert_eq!(roles.get("Percentage"), Some(ColumnRole::PercentageMeasure));
        assert_eq!(roles.percentages(), vec!["Percentage"]);
        assert!(roles.measures().is_empty());
    }

    #[test]
    fn test_percentage_name_out_of_range_falls_back() {
        let ds = Dataset::new(
            "odd",
            vec![
                Column::text("Metric", &["a", "b"]),
                Column::numbers("Growth_Percent", &[120.0, 40.0]),
            ],
        );
        let roles = classify(&ds).unwrap();
        assert_eq!(roles.get("Growth_Percent"), Some(ColumnRole::Measure));
    }

    #[test]
    fn test_margin_is_percentage_qualifier() {
        let ds = Dataset::new(
            "margins",
            vec![
                Column::text("Year", &["Mar 2022", "Mar 2023", "Mar 2024", "Mar 2025 (P)"]),
                Column::numbers("Operating_Margin", &[-44.0, -17.0, 0.0, 3.0]),
            ],
        );
        let roles = classify(&ds).unwrap();
        assert_eq!(roles.get("Operating_Margin"), Some(ColumnRole::PercentageMeasure));
    }

    #[test]
    fn test_mixed_column_is_dimension() {
        let ds = Dataset::new(
            "mixed",
            vec![Column::new(
                "Period",
                vec![Value::Number(1.0), Value::Text("TTM".into()), Value::Missing],
            )],
        );
        let roles = classify(&ds).unwrap();
        assert_eq!(roles.get("Period"), Some(ColumnRole::Dimension));
    }

    #[test]
    fn test_missing_values_do_not_block_measure() {
        let ds = Dataset::new(
            "gaps",
            vec![Column::new("Revenue", vec![Value::Missing, Value::Number(3.0)])],
        );
        assert_eq!(classify(&ds).unwrap().get("Revenue"), Some(ColumnRole::Measure));
    }

    #[test]
    fn test_explicit_label_column() {
        let ds = Dataset::new(
            "years",
            vec![
                Column::numbers("Year", &[2022.0, 2023.0]),
                Column::numbers("Revenue", &[1.0, 2.0]),
            ],
        )
        .with_label_column("Year");
        let roles = classify(&ds).unwrap();
        assert_eq!(roles.get("Year"), Some(ColumnRole::Dimension));
    }

    #[test]
    fn test_classify_is_idempotent() {
        let ds = financials();
        assert_eq!(classify(&ds).unwrap(), classify(&ds).unwrap());
    }

    #[test]
    fn test_classify_empty_fails() {
        let ds = Dataset::new("empty", vec![]);
        assert!(matches!(classify(&ds), Err(ShapeError::EmptyDataset { .. })));
    }

    #[test]
    fn test_profit_like_names() {
        assert!(is_profit_like("Net_Profit"));
        assert!(is_profit_like("Operating Margin (%)"));
        assert!(is_profit_like("EBITDA"));
        assert!(!is_profit_like("Revenue"));
        assert!(is_percentage_name("ROCE (%)"));
        assert!(!is_percentage_name("Revenue"));
    }
}
