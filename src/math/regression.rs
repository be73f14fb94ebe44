//! Correlation and straight-line fits over paired samples.
//!
//! Used to relate two score series (e.g. a test's subscores) to each other:
//! Pearson's `r` plus the least-squares line `y = slope * x + intercept`.
//!
//! The line is solved through SVD so a nearly constant `x` column degrades to
//! a clear error instead of a panic.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::GrowthError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

fn check_pairs(x: &[f64], y: &[f64]) -> Result<(), GrowthError> {
    if x.len() != y.len() {
        return Err(GrowthError::InvalidInput(format!(
            "paired samples differ in length ({} vs {})",
            x.len(),
            y.len()
        )));
    }
    if x.len() < 2 {
        return Err(GrowthError::InvalidInput(
            "at least two paired samples are required".to_string(),
        ));
    }
    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return Err(GrowthError::InvalidInput("samples must be finite".to_string()));
    }
    Ok(())
}

fn mean(v: &[f64]) -> f64 {
    v.iter().sum::<f64>() / v.len() as f64
}

/// Pearson correlation coefficient of `x` and `y`.
pub fn pearson(x: &[f64], y: &[f64]) -> Result<f64, GrowthError> {
    check_pairs(x, y)?;
    let (mx, my) = (mean(x), mean(y));

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mx;
        let dy = b - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return Err(GrowthError::InvalidInput(
            "correlation is undefined for a constant series".to_string(),
        ));
    }
    Ok(sxy / (sxx * syy).sqrt())
}

/// Least-squares line through `(x, y)`.
pub fn linear_fit(x: &[f64], y: &[f64]) -> Result<LinearFit, GrowthError> {
    check_pairs(x, y)?;
    if x.iter().all(|v| *v == x[0]) {
        return Err(GrowthError::InvalidInput(
            "a line fit needs at least two distinct x values".to_string(),
        ));
    }

    let n = x.len();
    let mut design = DMatrix::<f64>::zeros(n, 2);
    for (i, v) in x.iter().enumerate() {
        design[(i, 0)] = *v;
        design[(i, 1)] = 1.0;
    }
    let rhs = DVector::from_column_slice(y);

    let beta = solve_least_squares(&design, &rhs).ok_or_else(|| {
        GrowthError::InvalidInput("line fit is too ill-conditioned to solve".to_string())
    })?;

    Ok(LinearFit {
        slope: beta[0],
        intercept: beta[1],
    })
}

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}
