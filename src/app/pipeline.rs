//! Shared pipeline logic used by the CLI front-end.
//!
//! Keeping this in one place keeps the core workflow in one spot:
//! reference table -> curves, subject table -> trajectory -> report
//!
//! Inputs are any `Read` streams so the whole flow runs on in-memory data in
//! tests.

use std::io::Read;

use crate::domain::{AnalyzerConfig, ReferenceConfig};
use crate::error::GrowthError;
use crate::reference::ReferenceCurveSet;
use crate::report::{CurveSeries, GrowthReport, build_report, sample_curves};
use crate::trajectory::Trajectory;

/// All computed outputs of a single `growth report` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub reference: ReferenceCurveSet,
    pub trajectory: Trajectory,
    pub report: GrowthReport,
}

/// Load both tables and derive the full report.
pub fn run_report<R1: Read, R2: Read>(
    reference: R1,
    subject: R2,
    reference_config: &ReferenceConfig,
    analyzer_config: &AnalyzerConfig,
    to_age: f64,
    samples: Option<usize>,
) -> Result<RunOutput, GrowthError> {
    // 1) Reference curves.
    let reference = ReferenceCurveSet::from_reader(reference, reference_config)?;

    // 2) Subject trajectory.
    let trajectory = Trajectory::from_reader(subject, analyzer_config)?;

    // 3) Derived series.
    let report = build_report(&reference, &trajectory, analyzer_config, to_age, samples)?;

    Ok(RunOutput {
        reference,
        trajectory,
        report,
    })
}

/// Load the reference table and sample every curve.
pub fn run_curves<R: Read>(
    reference: R,
    config: &ReferenceConfig,
    samples: Option<usize>,
    days_per_unit: u32,
) -> Result<Vec<CurveSeries>, GrowthError> {
    let reference = ReferenceCurveSet::from_reader(reference, config)?;
    sample_curves(&reference, samples, days_per_unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FENTON: &str = "\
32,50,1.70\n33,50,1.90\n34,50,2.10\n35,50,2.30\n36,50,2.50\n\
32,90,2.00\n33,90,2.25\n34,90,2.45\n35,90,2.70\n36,90,2.95\n";

    #[test]
    fn report_runs_on_in_memory_tables() {
        let subject = "2011-07-05,3,1275\n2011-07-06,4,1280\n2011-07-07,5,1290\n";
        let run = run_report(
            FENTON.as_bytes(),
            subject.as_bytes(),
            &ReferenceConfig::default(),
            &AnalyzerConfig::default(),
            36.0,
            None,
        )
        .unwrap();

        assert_eq!(run.trajectory.len(), 3);
        assert_eq!(run.reference.percentiles().len(), 2);
        // Observation ages start at 32 5/7 weeks, inside both curves.
        assert!(run.report.deviations.iter().all(|d| d.points.len() == 3));
        // p50 at 33 weeks is 1900g; the subject weighs 1290g.
        let p50 = &run.report.deviations[0];
        assert!((p50.points[2].y - (1900.0 - 1290.0)).abs() < 1e-6);
    }

    #[test]
    fn reference_errors_surface_unchanged() {
        let err = run_report(
            "32,50,1.7\n33,50,1.9\n".as_bytes(),
            "2011-07-05,3,1275\n".as_bytes(),
            &ReferenceConfig::default(),
            &AnalyzerConfig::default(),
            36.0,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, GrowthError::Data { percentile: 50, .. }));
    }

    #[test]
    fn curves_sample_per_day_by_default() {
        let curves = run_curves(FENTON.as_bytes(), &ReferenceConfig::default(), None, 7).unwrap();
        assert_eq!(curves.len(), 2);
        assert_eq!(curves[0].points.len(), 4 * 7 + 1);
    }
}
