//! Dashboard grid layout.
//!
//! The grid shape is a fixed function of the chart count. Wide charts claim
//! their two cells first; everything else fills the remaining cells row-major.
//! Output order always matches input order.

use crate::ir::{GridCell, GridShape, StyledChart};

pub const DEFAULT_MAX_CHARTS: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    pub shape: GridShape,
    pub placed: Vec<(StyledChart, GridCell)>,
    /// Charts cut by the `max_charts` limit
    pub dropped: usize,
}

/// Rows × columns for `n` charts: 2 rows up to four charts, 3 rows beyond
pub fn grid_shape(n: usize) -> GridShape {
    match n {
        0 => GridShape { rows: 0, cols: 0 },
        1..=4 => GridShape { rows: 2, cols: n.div_ceil(2) },
        _ => GridShape { rows: 3, cols: n.div_ceil(3) },
    }
}

pub fn layout(charts: Vec<StyledChart>, max_charts: usize) -> GridLayout {
    let requested = charts.len();
    let kept: Vec<StyledChart> = charts.into_iter().take(max_charts).collect();
    let dropped = requested - kept.len();

    if kept.is_empty() {
        return GridLayout {
            shape: grid_shape(0),
            placed: Vec::new(),
            dropped,
        };
    }

    let mut shape = grid_shape(kept.len());
    if kept.iter().any(|c| c.spec.wide) {
        shape.cols = shape.cols.max(2);
    }

    let mut grid = Occupancy::new(shape);
    let mut cells = vec![GridCell::unit(0, 0); kept.len()];

    for (i, _) in kept.iter().enumerate().filter(|(_, c)| c.spec.wide) {
        cells[i] = grid.claim(2);
    }
    for (i, _) in kept.iter().enumerate().filter(|(_, c)| !c.spec.wide) {
        cells[i] = grid.claim(1);
    }

    GridLayout {
        shape: grid.shape(),
        placed: kept.into_iter().zip(cells).collect(),
        dropped,
    }
}

/// Free/taken map of the grid; grows by whole rows when full
struct Occupancy {
    cols: usize,
    rows: Vec<Vec<bool>>,
}

impl Occupancy {
    fn new(shape: GridShape) -> Self {
        Self {
            cols: shape.cols,
            rows: vec![vec![false; shape.cols]; shape.rows],
        }
    }

    fn shape(&self) -> GridShape {
        GridShape {
            rows: self.rows.len(),
            cols: self.cols,
        }
    }

    /// Take the first row-major run of `span` free cells in one row
    fn claim(&mut self, span: usize) -> GridCell {
        let cols = self.cols;
        let span = span.min(cols).max(1);
        loop {
            for (r, row) in self.rows.iter_mut().enumerate() {
                let free = (0..=cols - span).find(|&c| row[c..c + span].iter().all(|taken| !taken));
                if let Some(c) = free {
                    row[c..c + span].iter_mut().for_each(|taken| *taken = true);
                    return GridCell {
                        row: r,
                        col: c,
                        row_span: 1,
                        col_span: span,
                    };
                }
            }
            self.rows.push(vec![false; cols]);
        }
    }
}
