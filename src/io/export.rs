//! Export derived series for an external chart renderer.
//!
//! - the full report as pretty JSON
//! - sampled reference curves as long-format CSV (`percentile,week,value`)

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::AppError;
use crate::report::{CurveSeries, GrowthReport};

/// Write the full report as JSON.
pub fn write_report_json(path: &Path, report: &GrowthReport) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create report JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, report)
        .map_err(|e| AppError::new(2, format!("Failed to write report JSON: {e}")))?;

    Ok(())
}

/// Write sampled curves as CSV.
pub fn write_curves_csv(path: &Path, curves: &[CurveSeries]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create curve CSV '{}': {e}", path.display())))?;
    write_curves(file, curves).map_err(|e| AppError::new(2, format!("Failed to write curve CSV: {e}")))
}

fn write_curves<W: Write>(mut out: W, curves: &[CurveSeries]) -> std::io::Result<()> {
    writeln!(out, "percentile,week,value")?;
    for c in curves {
        for p in &c.points {
            writeln!(out, "{},{:.6},{:.6}", c.percentile, p.x, p.y)?;
        }
    }
    out.flush()
}
