//! Reporting utilities: the renderer-facing document and terminal output.
//!
//! `GrowthReport` bundles every series a chart renderer needs (reference
//! curves, the trajectory, deltas, projections, deviations) so it can be
//! serialized once and drawn elsewhere.

pub mod format;

use serde::{Deserialize, Serialize};

use crate::domain::{AnalyzerConfig, Delta, Deviation, Projection, SeriesPoint, WeightUnit};
use crate::error::GrowthError;
use crate::reference::ReferenceCurveSet;
use crate::trajectory::Trajectory;

pub use format::*;

/// One sampled reference curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveSeries {
    pub percentile: u8,
    pub domain: (f64, f64),
    pub points: Vec<SeriesPoint>,
}

/// A configured window that produced no projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedWindow {
    pub window: usize,
    pub reason: String,
}

/// Everything derived from one reference table and one subject table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthReport {
    pub first_date: Option<String>,
    pub last_date: Option<String>,
    pub unit: WeightUnit,
    pub terminal_age: f64,
    pub trajectory: Vec<SeriesPoint>,
    pub deltas: Vec<Delta>,
    pub projections: Vec<Projection>,
    pub skipped_windows: Vec<SkippedWindow>,
    pub curves: Vec<CurveSeries>,
    pub deviations: Vec<Deviation>,
}

/// Sample every reference curve.
///
/// `samples = None` samples one point per day across each curve's domain.
pub fn sample_curves(
    reference: &ReferenceCurveSet,
    samples: Option<usize>,
    days_per_unit: u32,
) -> Result<Vec<CurveSeries>, GrowthError> {
    reference
        .curves()
        .map(|curve| {
            let domain = curve.domain();
            let count = samples.unwrap_or_else(|| daily_count(domain, days_per_unit));
            Ok(CurveSeries {
                percentile: curve.percentile(),
                domain,
                points: curve.sample(count)?,
            })
        })
        .collect()
}

fn daily_count((lo, hi): (f64, f64), days_per_unit: u32) -> usize {
    (((hi - lo) * f64::from(days_per_unit)).round() as usize) + 1
}

/// Build the full report.
///
/// Windows without enough history are recorded in `skipped_windows`; any
/// other failure aborts the report.
pub fn build_report(
    reference: &ReferenceCurveSet,
    trajectory: &Trajectory,
    config: &AnalyzerConfig,
    terminal_age: f64,
    samples: Option<usize>,
) -> Result<GrowthReport, GrowthError> {
    if trajectory.is_empty() {
        return Err(GrowthError::InvalidInput("subject table has no rows".to_string()));
    }

    let mut projections = Vec::new();
    let mut skipped_windows = Vec::new();
    for (window, result) in config.windows.iter().zip(trajectory.projections(config, terminal_age)) {
        match result {
            Ok(p) => projections.push(p),
            Err(err @ GrowthError::InsufficientHistory { .. }) => {
                tracing::warn!(window, %err, "skipping projection window");
                skipped_windows.push(SkippedWindow {
                    window: *window,
                    reason: err.to_string(),
                });
            }
            Err(err) => return Err(err),
        }
    }

    let (first_date, last_date) = match trajectory.date_span() {
        Some((a, b)) => (Some(a.to_string()), Some(b.to_string())),
        None => (None, None),
    };

    Ok(GrowthReport {
        first_date,
        last_date,
        unit: config.output_unit,
        terminal_age,
        trajectory: trajectory.series()?,
        deltas: trajectory.deltas()?,
        projections,
        skipped_windows,
        curves: sample_curves(reference, samples, config.age.days_per_unit)?,
        deviations: trajectory.deviations(reference)?,
    })
}
