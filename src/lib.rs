// Library exports for infograph

pub mod csv_reader;
pub mod data;
pub mod error;
pub mod graph;
pub mod logging;
pub mod palette;
pub mod parser;

// Planning pipeline
pub mod classify;
pub mod compose;
pub mod ir;
pub mod layout;
pub mod select;
pub mod style;
pub mod trend;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::select::SelectOptions;

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }
}

/// Pixel sizes for standalone charts and dashboard cells
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CanvasOptions {
    #[serde(default = "default_chart_width")]
    pub chart_width: u32,
    #[serde(default = "default_chart_height")]
    pub chart_height: u32,
    #[serde(default = "default_cell_width")]
    pub cell_width: u32,
    #[serde(default = "default_cell_height")]
    pub cell_height: u32,
    /// Space above the grid for the dashboard title
    #[serde(default = "default_title_band")]
    pub title_band: u32,
}

fn default_chart_width() -> u32 { 1400 }
fn default_chart_height() -> u32 { 1000 }
fn default_cell_width() -> u32 { 1200 }
fn default_cell_height() -> u32 { 800 }
fn default_title_band() -> u32 { 80 }

impl Default for CanvasOptions {
    fn default() -> Self {
        Self {
            chart_width: default_chart_width(),
            chart_height: default_chart_height(),
            cell_width: default_cell_width(),
            cell_height: default_cell_height(),
            title_band: default_title_band(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ComposeOptions {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_max_charts")]
    pub max_charts: usize,
    #[serde(default = "default_pie_tolerance")]
    pub pie_tolerance: f64,
    #[serde(default = "default_dual_axis_ratio")]
    pub dual_axis_ratio: f64,
    #[serde(default)]
    pub canvas: CanvasOptions,
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_title() -> String { "Dashboard".to_string() }
fn default_max_charts() -> usize { layout::DEFAULT_MAX_CHARTS }
fn default_pie_tolerance() -> f64 { 1.0 }
fn default_dual_axis_ratio() -> f64 { 10.0 }

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            title: default_title(),
            max_charts: default_max_charts(),
            pie_tolerance: default_pie_tolerance(),
            dual_axis_ratio: default_dual_axis_ratio(),
            canvas: CanvasOptions::default(),
            format: OutputFormat::Png,
        }
    }
}

impl ComposeOptions {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid options JSON")
    }

    pub fn selection(&self) -> SelectOptions {
        SelectOptions {
            pie_tolerance: self.pie_tolerance,
            dual_axis_ratio: self.dual_axis_ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_defaults_from_empty_json() {
        let options = ComposeOptions::from_json_str("{}").unwrap();
        assert_eq!(options, ComposeOptions::default());
        assert_eq!(options.max_charts, 6);
        assert_eq!(options.canvas.cell_width, 1200);
    }

    #[test]
    fn test_options_partial_override() {
        let options = ComposeOptions::from_json_str(
            r#"{"title": "Reliance", "max_charts": 4, "canvas": {"cell_height": 500}, "format": "svg"}"#,
        )
        .unwrap();
        assert_eq!(options.title, "Reliance");
        assert_eq!(options.max_charts, 4);
        assert_eq!(options.canvas.cell_height, 500);
        assert_eq!(options.canvas.cell_width, 1200);
        assert_eq!(options.format, OutputFormat::Svg);
        assert_eq!(options.selection().pie_tolerance, 1.0);
    }

    #[test]
    fn test_options_reject_bad_json() {
        assert!(ComposeOptions::from_json_str(r#"{"max_charts": "six"}"#).is_err());
    }
}
