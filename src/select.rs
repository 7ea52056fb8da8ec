//! Chart selection.
//!
//! An ordered rule table: every rule that applies emits one chart, in rule
//! order. Which columns get bound depends only on declaration order, never on
//! the values, so the same schema always yields the same charts.

use crate::classify::{is_profit_like, ColumnRoles};
use crate::data::Dataset;
use crate::ir::{Archetype, ChartSpec, DataQualityWarning, Series};
use crate::trend::fit_linear;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectOptions {
    /// Allowed distance of a pie's total from 100
    pub pie_tolerance: f64,
    /// Peak-magnitude ratio at which two measures get separate axes
    pub dual_axis_ratio: f64,
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self {
            pie_tolerance: 1.0,
            dual_axis_ratio: 10.0,
        }
    }
}

/// Choose the charts for one classified dataset.
///
/// An unchartable dataset yields an empty vector.
pub fn select(dataset: &Dataset, roles: &ColumnRoles, options: &SelectOptions) -> Vec<ChartSpec> {
    let dimension = roles.dimensions().first().copied();
    let measures = roles.measures();
    let percentages = roles.percentages();
    let name = humanize(dataset.id());

    let mut specs = Vec::new();

    // 1. Bar: first dimension against the left-most measure
    if let (Some(dim), Some(&measure)) = (dimension, measures.first()) {
        specs.extend(bar(dataset, roles, &name, dim, measure));
    }

    // 2. Pie: first dimension against the first percentage measure
    if let (Some(dim), Some(&pct)) = (dimension, percentages.first()) {
        match extract_series(dataset, roles, pct) {
            Some(series) if series.present().any(|v| v < 0.0) => {
                // Negative shares cannot be drawn as slices
                if measures.is_empty() {
                    specs.extend(bar(dataset, roles, &name, dim, pct));
                }
            }
            Some(series) => specs.push(pie(dataset, &name, dim, series, options.pie_tolerance)),
            None => {}
        }
    }

    // 3. Trend over the two leading measures
    if let [first, second, ..] = measures.as_slice() {
        specs.extend(trend(dataset, roles, &name, dimension, first, second, options));
    }

    specs
}

fn bar(
    dataset: &Dataset,
    roles: &ColumnRoles,
    name: &str,
    dimension: &str,
    measure: &str,
) -> Option<ChartSpec> {
    let series = extract_series(dataset, roles, measure)?;
    Some(ChartSpec {
        archetype: Archetype::Bar,
        dataset: dataset.id().to_string(),
        title: name.to_string(),
        dimension: Some(dimension.to_string()),
        categories: categories(dataset, Some(dimension)),
        style_token: series.token(),
        series: vec![series],
        wide: false,
        trend: None,
        warnings: Vec::new(),
    })
}

fn pie(dataset: &Dataset, name: &str, dimension: &str, series: Series, tolerance: f64) -> ChartSpec {
    let sum: f64 = series.present().sum();
    let mut warnings = Vec::new();
    if (sum - 100.0).abs() > tolerance {
        warnings.push(DataQualityWarning::PercentSum { sum, tolerance });
    }

    ChartSpec {
        archetype: Archetype::Pie,
        dataset: dataset.id().to_string(),
        title: format!("{} Breakdown", name),
        dimension: Some(dimension.to_string()),
        categories: categories(dataset, Some(dimension)),
        style_token: series.token(),
        series: vec![series],
        wide: false,
        trend: None,
        warnings,
    }
}

fn trend(
    dataset: &Dataset,
    roles: &ColumnRoles,
    name: &str,
    dimension: Option<&str>,
    first: &str,
    second: &str,
    options: &SelectOptions,
) -> Option<ChartSpec> {
    let lead = extract_series(dataset, roles, first)?;
    let other = extract_series(dataset, roles, second)?;

    let dual = magnitudes_diverge(lead.peak_magnitude(), other.peak_magnitude(), options.dual_axis_ratio);
    let (archetype, title) = if dual {
        (
            Archetype::DualAxisComparison,
            format!("{}: {} vs {}", name, humanize(first), humanize(second)),
        )
    } else {
        (Archetype::Trend, format!("{} Trend", name))
    };

    Some(ChartSpec {
        archetype,
        dataset: dataset.id().to_string(),
        title,
        dimension: dimension.map(str::to_string),
        categories: categories(dataset, dimension),
        style_token: lead.token(),
        trend: fit_linear(&lead.values),
        series: vec![lead, other],
        wide: dual,
        warnings: Vec::new(),
    })
}

fn magnitudes_diverge(a: f64, b: f64, ratio: f64) -> bool {
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    lo > 0.0 && hi / lo >= ratio
}

fn extract_series(dataset: &Dataset, roles: &ColumnRoles, column: &str) -> Option<Series> {
    let role = roles.get(column).filter(|r| r.is_numeric())?;
    let values = dataset
        .column(column)?
        .values
        .iter()
        .map(|v| v.as_number())
        .collect();

    Some(Series {
        name: column.to_string(),
        role,
        signed: is_profit_like(column),
        values,
    })
}

/// Axis labels: the dimension's values, or 1-based row numbers
fn categories(dataset: &Dataset, dimension: Option<&str>) -> Vec<String> {
    match dimension.and_then(|d| dataset.column(d)) {
        Some(column) => column.values.iter().map(|v| v.label()).collect(),
        None => (1..=dataset.row_count()).map(|i| i.to_string()).collect(),
    }
}

/// `financial_data` → `Financial Data`
pub fn humanize(name: &str) -> String {
    name.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
