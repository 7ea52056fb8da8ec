use serde::Serialize;
use std::fmt;

use crate::classify::ColumnRole;
use crate::palette::Color;
use crate::trend::LinearFit;

// =============================================================================
// Phase 1: Selection
// =============================================================================

/// The fixed chart kinds the selector can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Archetype {
    Bar,
    Pie,
    Trend,
    DualAxisComparison,
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Archetype::Bar => "bar",
            Archetype::Pie => "pie",
            Archetype::Trend => "trend",
            Archetype::DualAxisComparison => "dual-axis-comparison",
        };
        f.write_str(name)
    }
}

/// How a series' values are labelled and colored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleToken {
    Plain,
    Percent,
    Signed,
    SignedPercent,
}

impl StyleToken {
    pub fn new(role: ColumnRole, signed: bool) -> Self {
        match (role == ColumnRole::PercentageMeasure, signed) {
            (true, true) => StyleToken::SignedPercent,
            (true, false) => StyleToken::Percent,
            (false, true) => StyleToken::Signed,
            (false, false) => StyleToken::Plain,
        }
    }

    pub fn is_percent(self) -> bool {
        matches!(self, StyleToken::Percent | StyleToken::SignedPercent)
    }

    pub fn is_signed(self) -> bool {
        matches!(self, StyleToken::Signed | StyleToken::SignedPercent)
    }
}

/// One bound measure column, extracted row by row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub role: ColumnRole,
    /// Profit/margin-like: negative values are meaningful
    pub signed: bool,
    pub values: Vec<Option<f64>>,
}

impl Series {
    pub fn token(&self) -> StyleToken {
        StyleToken::new(self.role, self.signed)
    }

    /// Largest absolute value present, 0.0 when all missing
    pub fn peak_magnitude(&self) -> f64 {
        self.values
            .iter()
            .flatten()
            .fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }

    pub fn present(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().flatten().copied()
    }
}

/// Non-blocking data-quality annotation on a chart
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DataQualityWarning {
    /// Pie percentages do not add up to ~100
    PercentSum { sum: f64, tolerance: f64 },
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataQualityWarning::PercentSum { sum, tolerance } => write!(
                f,
                "percentages sum to {:.2}, more than {} away from 100",
                sum, tolerance
            ),
        }
    }
}

/// One chart to draw, as chosen by the selector
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub archetype: Archetype,
    pub dataset: String,
    pub title: String,
    /// Category axis column; `None` means the row index is the x-axis
    pub dimension: Option<String>,
    pub categories: Vec<String>,
    /// One series, or two for trend/comparison charts
    pub series: Vec<Series>,
    pub style_token: StyleToken,
    /// Spans two grid columns on a dashboard
    pub wide: bool,
    pub trend: Option<LinearFit>,
    pub warnings: Vec<DataQualityWarning>,
}

impl ChartSpec {
    pub fn measure_names(&self) -> Vec<&str> {
        self.series.iter().map(|s| s.name.as_str()).collect()
    }
}

// =============================================================================
// Phase 2: Styling
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tone {
    Neutral,
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueLabel {
    pub text: String,
    pub tone: Tone,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartStyle {
    pub position: usize,
    pub total: usize,
    pub color: Color,
    /// Line/legend color per series
    pub series_colors: Vec<Color>,
    /// Fill per element of the primary series (bar, slice, point)
    pub element_colors: Vec<Color>,
    /// Indices that received the emphasis color
    pub emphasized: Vec<usize>,
    /// Value labels per series, `None` for missing values
    pub labels: Vec<Vec<Option<ValueLabel>>>,
    /// Pie slice drawn detached from the center
    pub pull_out: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyledChart {
    pub spec: ChartSpec,
    pub style: ChartStyle,
}

// =============================================================================
// Phase 3: Layout
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridShape {
    pub rows: usize,
    pub cols: usize,
}

/// A rectangle of grid units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
    pub row_span: usize,
    pub col_span: usize,
}

impl GridCell {
    pub fn unit(row: usize, col: usize) -> Self {
        Self { row, col, row_span: 1, col_span: 1 }
    }

    pub fn overlaps(&self, other: &GridCell) -> bool {
        self.row < other.row + other.row_span
            && other.row < self.row + self.row_span
            && self.col < other.col + other.col_span
            && other.col < self.col + self.col_span
    }

    pub fn within(&self, shape: GridShape) -> bool {
        self.row_span > 0
            && self.col_span > 0
            && self.row + self.row_span <= shape.rows
            && self.col + self.col_span <= shape.cols
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedChart {
    pub chart: StyledChart,
    /// `None` for a standalone chart
    pub cell: Option<GridCell>,
}

// =============================================================================
// Phase 4: Plan
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

/// Diagnostics collected while composing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Note {
    DatasetSkipped { dataset: String, reason: String },
    NoCharts { dataset: String },
    DataQuality {
        dataset: String,
        chart: String,
        warning: DataQualityWarning,
    },
    Truncated { requested: usize, kept: usize },
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Note::DatasetSkipped { dataset, reason } => {
                write!(f, "skipped dataset '{}': {}", dataset, reason)
            }
            Note::NoCharts { dataset } => write!(f, "dataset '{}' has nothing to chart", dataset),
            Note::DataQuality { dataset, chart, warning } => {
                write!(f, "{} ({}): {}", chart, dataset, warning)
            }
            Note::Truncated { requested, kept } => {
                write!(f, "{} charts selected, only {} placed", requested, kept)
            }
        }
    }
}

/// Declarative output handed to the rendering backend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderPlan {
    pub title: String,
    pub canvas: CanvasSize,
    /// `None` for a standalone chart
    pub grid: Option<GridShape>,
    pub charts: Vec<PlacedChart>,
    pub notes: Vec<Note>,
}

impl RenderPlan {
    pub fn is_dashboard(&self) -> bool {
        self.grid.is_some()
    }
}
