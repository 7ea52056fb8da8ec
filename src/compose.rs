//! Dashboard composition: classify → select → style → layout.

use tracing::{debug, warn};

use crate::classify::classify;
use crate::data::Dataset;
use crate::ir::{CanvasSize, ChartSpec, GridShape, Note, PlacedChart, RenderPlan};
use crate::layout::layout;
use crate::select::select;
use crate::style::style;
use crate::ComposeOptions;

pub struct DashboardComposer {
    options: ComposeOptions,
}

/// Charts chosen across all datasets, in input order, plus the notes
/// raised while choosing them
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub specs: Vec<ChartSpec>,
    pub notes: Vec<Note>,
}

impl DashboardComposer {
    pub fn new(options: ComposeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ComposeOptions {
        &self.options
    }

    /// Build one dashboard plan from `datasets`, in the order given.
    ///
    /// Never fails: malformed datasets are skipped and reported in the
    /// plan's notes.
    pub fn compose(&self, datasets: &[Dataset]) -> RenderPlan {
        self.dashboard(&self.select(datasets))
    }

    /// The dashboard plan for an already computed selection
    pub fn dashboard(&self, selection: &Selection) -> RenderPlan {
        let specs = &selection.specs;
        let mut notes = selection.notes.clone();
        let total = specs.len();

        let styled = specs
            .iter()
            .enumerate()
            .map(|(i, spec)| style(spec.clone(), i, total))
            .collect();

        let grid = layout(styled, self.options.max_charts);
        if grid.dropped > 0 {
            warn!(dropped = grid.dropped, max = self.options.max_charts, "Dashboard truncated");
            notes.push(Note::Truncated {
                requested: total,
                kept: total - grid.dropped,
            });
        }

        RenderPlan {
            title: self.options.title.clone(),
            canvas: self.dashboard_canvas(grid.shape),
            grid: Some(grid.shape),
            charts: grid
                .placed
                .into_iter()
                .map(|(chart, cell)| PlacedChart {
                    chart,
                    cell: Some(cell),
                })
                .collect(),
            notes,
        }
    }

    /// One plan per selected chart, without a grid.
    ///
    /// Position indices run across all datasets exactly as in [`Self::compose`],
    /// so a chart keeps its color between its standalone image and the
    /// dashboard.
    pub fn standalone(&self, datasets: &[Dataset]) -> Vec<RenderPlan> {
        self.standalone_plans(&self.select(datasets))
    }

    pub fn standalone_plans(&self, selection: &Selection) -> Vec<RenderPlan> {
        let specs = &selection.specs;
        let total = specs.len();
        let canvas = CanvasSize {
            width: self.options.canvas.chart_width,
            height: self.options.canvas.chart_height,
        };

        specs
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                let notes = quality_notes(spec);
                let chart = style(spec.clone(), i, total);
                RenderPlan {
                    title: chart.spec.title.clone(),
                    canvas,
                    grid: None,
                    charts: vec![PlacedChart { chart, cell: None }],
                    notes,
                }
            })
            .collect()
    }

    /// Classify and select every dataset once; bad datasets become notes
    pub fn select(&self, datasets: &[Dataset]) -> Selection {
        let selection = self.options.selection();
        let mut specs = Vec::new();
        let mut notes = Vec::new();

        for dataset in datasets {
            let roles = match classify(dataset) {
                Ok(roles) => roles,
                Err(e) => {
                    warn!(dataset = dataset.id(), error = %e, "Skipping dataset");
                    notes.push(Note::DatasetSkipped {
                        dataset: dataset.id().to_string(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let chosen = select(dataset, &roles, &selection);
            debug!(dataset = dataset.id(), charts = chosen.len(), "Selected charts");

            if chosen.is_empty() {
                notes.push(Note::NoCharts {
                    dataset: dataset.id().to_string(),
                });
            }
            for spec in &chosen {
                notes.extend(quality_notes(spec));
            }
            specs.extend(chosen);
        }

        Selection { specs, notes }
    }

    fn dashboard_canvas(&self, shape: GridShape) -> CanvasSize {
        let canvas = &self.options.canvas;
        CanvasSize {
            width: canvas.cell_width * shape.cols.max(1) as u32,
            height: canvas.title_band + canvas.cell_height * shape.rows as u32,
        }
    }
}

fn quality_notes(spec: &ChartSpec) -> Vec<Note> {
    spec.warnings
        .iter()
        .map(|w| Note::DataQuality {
            dataset: spec.dataset.clone(),
            chart: spec.title.clone(),
            warning: w.clone(),
        })
        .collect()
}
