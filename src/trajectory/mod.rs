//! Subject trajectory analysis.
//!
//! A `Trajectory` is the subject's measurements in input order. Everything
//! derived from it (deltas, rate projections, deviations from the reference
//! curves) is recomputed on each call.

pub mod analyzer;

pub use analyzer::*;
