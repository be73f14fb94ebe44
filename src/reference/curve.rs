//! A single percentile's reference curve.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::domain::SeriesPoint;
use crate::error::GrowthError;
use crate::math::{CubicSpline, linspace};

/// Samples of one percentile keyed by week, plus their interpolant.
#[derive(Debug, Clone)]
pub struct ReferenceCurve {
    percentile: u8,
    samples: BTreeMap<u32, Decimal>,
    spline: CubicSpline,
}

impl ReferenceCurve {
    /// Fit a curve from its samples. The map's key order is the fit order.
    pub fn fit(percentile: u8, samples: BTreeMap<u32, Decimal>) -> Result<Self, GrowthError> {
        let mut xs = Vec::with_capacity(samples.len());
        let mut ys = Vec::with_capacity(samples.len());
        for (&time, value) in &samples {
            let y = value.to_f64().ok_or_else(|| GrowthError::Data {
                percentile,
                message: format!("value {value} at week {time} is not representable as f64"),
            })?;
            xs.push(f64::from(time));
            ys.push(y);
        }

        let spline = CubicSpline::fit(xs, ys).map_err(|e| GrowthError::Data {
            percentile,
            message: e.to_string(),
        })?;

        tracing::debug!(
            percentile,
            points = samples.len(),
            domain = ?spline.domain(),
            "fitted reference curve"
        );

        Ok(Self {
            percentile,
            samples,
            spline,
        })
    }

    pub fn percentile(&self) -> u8 {
        self.percentile
    }

    /// Original samples in ascending week order.
    pub fn samples(&self) -> &BTreeMap<u32, Decimal> {
        &self.samples
    }

    pub fn domain(&self) -> (f64, f64) {
        self.spline.domain()
    }

    pub fn contains(&self, t: f64) -> bool {
        self.spline.contains(t)
    }

    /// Interpolated value at `t`; `DomainError` outside the sampled weeks.
    pub fn evaluate(&self, t: f64) -> Result<f64, GrowthError> {
        self.spline.evaluate(t)
    }

    /// `count` evenly spaced points across the whole domain.
    pub fn sample(&self, count: usize) -> Result<Vec<SeriesPoint>, GrowthError> {
        let (lo, hi) = self.domain();
        linspace(lo, hi, count)
            .into_iter()
            .map(|t| Ok(SeriesPoint::new(t, self.evaluate(t)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(rows: &[(u32, &str)]) -> BTreeMap<u32, Decimal> {
        rows.iter().map(|(t, v)| (*t, v.parse().unwrap())).collect()
    }

    #[test]
    fn curve_sample_spans_domain() {
        let curve = ReferenceCurve::fit(
            50,
            samples(&[(22, "0.51"), (23, "0.58"), (24, "0.66"), (25, "0.75"), (26, "0.86")]),
        )
        .unwrap();

        let pts = curve.sample(29).unwrap();
        assert_eq!(pts.len(), 29);
        assert_eq!(pts[0].x, 22.0);
        assert_eq!(pts[28].x, 26.0);
        assert!((pts[0].y - 0.51).abs() < 1e-9);
        assert!((pts[28].y - 0.86).abs() < 1e-9);
        assert!(pts.windows(2).all(|w| w[0].x < w[1].x));
    }

    #[test]
    fn three_points_are_a_data_error() {
        let err = ReferenceCurve::fit(10, samples(&[(22, "0.5"), (23, "0.6"), (24, "0.7")])).unwrap_err();
        match err {
            GrowthError::Data { percentile, .. } => assert_eq!(percentile, 10),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
