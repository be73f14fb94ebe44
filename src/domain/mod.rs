//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - configuration (`AgeConvention`, `AnalyzerConfig`, `ReferenceConfig`, `WeightUnit`)
//! - parsed rows (`ReferencePoint`, `ObservationPoint`)
//! - derived series (`Delta`, `Projection`, `Deviation`, `SeriesPoint`)

pub mod types;

pub use types::*;
