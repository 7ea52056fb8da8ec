use serde::Serialize;

/// `y = slope * x + intercept`, with x the row index
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Least-squares line through the present values, indexed by row.
///
/// Returns `None` with fewer than two present points.
pub fn fit_linear(values: &[Option<f64>]) -> Option<LinearFit> {
    let points: Vec<(f64, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|y| (i as f64, y)))
        .collect();

    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;

    let (sxy, sxx) = points.iter().fold((0.0, 0.0), |(sxy, sxx), (x, y)| {
        let dx = x - mean_x;
        (sxy + dx * (y - mean_y), sxx + dx * dx)
    });

    // Distinct indices guarantee sxx > 0 once there are two points
    let slope = sxy / sxx;
    Some(LinearFit {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_exact_line() {
        let fit = fit_linear(&[Some(1.0), Some(3.0), Some(5.0)]).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 1.0).abs() < 1e-12);
        assert!((fit.at(3.0) - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_fit_skips_missing() {
        let fit = fit_linear(&[Some(0.0), None, Some(4.0)]).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!(fit.intercept.abs() < 1e-12);
    }

    #[test]
    fn test_fit_needs_two_points() {
        assert!(fit_linear(&[Some(1.0)]).is_none());
        assert!(fit_linear(&[None, None]).is_none());
    }
}
