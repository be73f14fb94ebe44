//! Formatted terminal output.
//!
//! We keep formatting code in one place so the analysis code stays clean and
//! output changes are localized.

use crate::domain::{SeriesPoint, Trend};
use crate::math::LinearFit;
use crate::report::{CurveSeries, GrowthReport};

/// Summary of a full report run.
pub fn format_report_summary(report: &GrowthReport) -> String {
    let mut out = String::new();
    let unit = report.unit.symbol();

    out.push_str("=== growth - Trajectory vs Reference Percentiles ===\n");
    if let (Some(first), Some(last)) = (&report.first_date, &report.last_date) {
        out.push_str(&format!("Dates: {first} .. {last}\n"));
    }
    if let (Some(first), Some(last)) = (report.trajectory.first(), report.trajectory.last()) {
        out.push_str(&format!(
            "Observations: n={} | age=[{:.2}, {:.2}]wk | latest={:.0}{unit}\n",
            report.trajectory.len(),
            first.x,
            last.x,
            last.y,
        ));
    }

    let gains = report.deltas.iter().filter(|d| d.trend == Trend::Gain).count();
    out.push_str(&format!(
        "Deltas: n={} | gains={} | losses={}\n",
        report.deltas.len(),
        gains,
        report.deltas.len() - gains
    ));

    out.push_str(&format!("\nProjections to {:.2}wk:\n", report.terminal_age));
    for p in &report.projections {
        let end = p
            .points
            .last()
            .map(|pt| format!("{:.0}{unit}", pt.y))
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "  {:>3}-interval avg {:>8}{unit}/day -> {end}\n",
            p.window,
            p.rate.round_dp(1).to_string()
        ));
    }
    for s in &report.skipped_windows {
        out.push_str(&format!("  (skipped {:>3}) {}\n", s.window, s.reason));
    }

    out.push_str("\nDifference from reference at latest in-range age:\n");
    for d in &report.deviations {
        match d.points.last() {
            Some(pt) => out.push_str(&format!(
                "  p{:<3} {:>+9.1}{unit} at {:.2}wk{}\n",
                d.percentile,
                pt.y,
                pt.x,
                skipped_note(d.skipped)
            )),
            None => out.push_str(&format!(
                "  p{:<3} no observations in range{}\n",
                d.percentile,
                skipped_note(d.skipped)
            )),
        }
    }

    out
}

/// Per-percentile domains and endpoint values.
pub fn format_curves(curves: &[CurveSeries]) -> String {
    let mut out = String::new();
    out.push_str(format!("{:<6} {:>8} {:>8} {:>10} {:>10}", "pct", "from", "to", "start", "end").trim_end());
    out.push('\n');
    for c in curves {
        let (start, end) = endpoints(&c.points);
        out.push_str(&format!(
            "{:<6} {:>8.2} {:>8.2} {:>10} {:>10}\n",
            format!("p{}", c.percentile),
            c.domain.0,
            c.domain.1,
            start,
            end
        ));
    }
    out
}

pub fn format_correlation(r: f64, fit: &LinearFit, n: usize) -> String {
    format!(
        "n = {n}\nr = {r:.4}\ny = {:.3}x + {:.3}\n",
        fit.slope, fit.intercept
    )
}

fn endpoints(points: &[SeriesPoint]) -> (String, String) {
    let fmt = |p: Option<&SeriesPoint>| p.map(|p| format!("{:.1}", p.y)).unwrap_or_else(|| "-".to_string());
    (fmt(points.first()), fmt(points.last()))
}

fn skipped_note(skipped: usize) -> String {
    if skipped == 0 {
        String::new()
    } else {
        format!(" ({skipped} out of range)")
    }
}
