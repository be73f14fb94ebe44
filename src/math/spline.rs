//! Domain-guarded cubic spline.
//!
//! The spline is parameterized by its second derivatives `M_i` at the knots.
//! On `[x_i, x_{i+1}]` with `h = x_{i+1} - x_i`:
//!
//! ```text
//! S(x) = M_i (x_{i+1} - x)^3 / 6h + M_{i+1} (x - x_i)^3 / 6h
//!      + (y_i / h - M_i h / 6) (x_{i+1} - x)
//!      + (y_{i+1} / h - M_{i+1} h / 6) (x - x_i)
//! ```
//!
//! End conditions are not-a-knot: the third derivative is continuous across
//! the second and the second-to-last knot. With exactly four knots this makes
//! the spline the single cubic through all of them.
//!
//! Unlike most spline utilities, evaluation never extrapolates: a query outside
//! `[x_0, x_{n-1}]` is an error.

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

use crate::error::GrowthError;

/// Minimum number of knots for a not-a-knot cubic.
pub const MIN_KNOTS: usize = 4;

/// Why a spline could not be built.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SplineError {
    #[error("cubic interpolation needs at least {} distinct points, found {found}", MIN_KNOTS)]
    TooFewKnots { found: usize },
    #[error("knot {index} is not strictly greater than the previous knot")]
    NotIncreasing { index: usize },
    #[error("knot {index} has a non-finite coordinate")]
    NonFinite { index: usize },
    #[error("spline system is singular")]
    Singular,
}

#[derive(Debug, Clone)]
pub struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    second: Vec<f64>,
}

impl CubicSpline {
    /// Fit a spline through `(xs[i], ys[i])`. `xs` must be strictly increasing.
    pub fn fit(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self, SplineError> {
        let n = xs.len().min(ys.len());
        if n < MIN_KNOTS {
            return Err(SplineError::TooFewKnots { found: n });
        }
        for i in 0..n {
            if !(xs[i].is_finite() && ys[i].is_finite()) {
                return Err(SplineError::NonFinite { index: i });
            }
            if i > 0 && xs[i] <= xs[i - 1] {
                return Err(SplineError::NotIncreasing { index: i });
            }
        }

        let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
        let mut a = DMatrix::<f64>::zeros(n, n);
        let mut b = DVector::<f64>::zeros(n);

        // Not-a-knot at x_1.
        a[(0, 0)] = h[1];
        a[(0, 1)] = -(h[0] + h[1]);
        a[(0, 2)] = h[0];

        for i in 1..n - 1 {
            a[(i, i - 1)] = h[i - 1];
            a[(i, i)] = 2.0 * (h[i - 1] + h[i]);
            a[(i, i + 1)] = h[i];
            b[i] = 6.0 * ((ys[i + 1] - ys[i]) / h[i] - (ys[i] - ys[i - 1]) / h[i - 1]);
        }

        // Not-a-knot at x_{n-2}.
        a[(n - 1, n - 3)] = h[n - 2];
        a[(n - 1, n - 2)] = -(h[n - 3] + h[n - 2]);
        a[(n - 1, n - 1)] = h[n - 3];

        let m = a.lu().solve(&b).ok_or(SplineError::Singular)?;
        if m.iter().any(|v| !v.is_finite()) {
            return Err(SplineError::Singular);
        }

        Ok(Self {
            xs: xs[..n].to_vec(),
            ys: ys[..n].to_vec(),
            second: m.iter().copied().collect(),
        })
    }

    /// Closed interval the spline is defined on.
    pub fn domain(&self) -> (f64, f64) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }

    pub fn contains(&self, x: f64) -> bool {
        let (lo, hi) = self.domain();
        x >= lo && x <= hi
    }

    pub fn knots(&self) -> &[f64] {
        &self.xs
    }

    /// Evaluate at `x`; fails with `GrowthError::Domain` outside the knots.
    pub fn evaluate(&self, x: f64) -> Result<f64, GrowthError> {
        if !self.contains(x) {
            let (min, max) = self.domain();
            return Err(GrowthError::Domain { value: x, min, max });
        }

        let last = self.xs.len() - 2;
        let i = self.xs.partition_point(|&k| k <= x).saturating_sub(1).min(last);

        let (x0, x1) = (self.xs[i], self.xs[i + 1]);
        let (y0, y1) = (self.ys[i], self.ys[i + 1]);
        let (m0, m1) = (self.second[i], self.second[i + 1]);
        let h = x1 - x0;
        let a = x1 - x;
        let b = x - x0;

        Ok(m0 * a * a * a / (6.0 * h)
            + m1 * b * b * b / (6.0 * h)
            + (y0 / h - m0 * h / 6.0) * a
            + (y1 / h - m1 * h / 6.0) * b)
    }
}

/// `count` evenly spaced values from `start` to `end` inclusive.
///
/// `count == 1` yields `[start]`; `count == 0` yields nothing.
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count as f64 - 1.0);
            (0..count)
                .map(|i| if i == count - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}
