//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory while fitting curves and analyzing a trajectory
//! - exported to JSON/CSV for an external chart renderer

use std::fmt;

use clap::ValueEnum;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::GrowthError;

/// Weight unit of a table's value column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[value(name = "g")]
    Grams,
    #[value(name = "kg")]
    Kilograms,
}

impl WeightUnit {
    /// Suffix used in tables and terminal output.
    pub fn symbol(self) -> &'static str {
        match self {
            WeightUnit::Grams => "g",
            WeightUnit::Kilograms => "kg",
        }
    }

    fn grams(self) -> Decimal {
        match self {
            WeightUnit::Grams => Decimal::ONE,
            WeightUnit::Kilograms => Decimal::from(1000),
        }
    }

    /// Exact conversion of `value` (in `self`) into `target`.
    ///
    /// Fails when the scaled value no longer fits in a `Decimal`.
    pub fn convert(self, value: Decimal, target: WeightUnit) -> Result<Decimal, GrowthError> {
        if self == target {
            return Ok(value);
        }
        value
            .checked_mul(self.grams())
            .and_then(|v| v.checked_div(target.grams()))
            .ok_or_else(|| GrowthError::InvalidInput(format!("{value}{self} cannot be expressed in {target}")))
    }
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// How a day offset in the subject table maps onto the gestational age axis.
///
/// `age = base_age + (offset_days + day) / days_per_unit`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgeConvention {
    /// Gestational age (weeks) the day count is measured from.
    pub base_age: f64,
    /// Days added to every offset before conversion.
    pub offset_days: i64,
    /// Days per age unit (7 for weeks).
    pub days_per_unit: u32,
}

impl Default for AgeConvention {
    fn default() -> Self {
        Self {
            base_age: 32.0,
            offset_days: 2,
            days_per_unit: 7,
        }
    }
}

impl AgeConvention {
    pub fn age_for_day(&self, day: i64) -> f64 {
        self.base_age + (self.offset_days + day) as f64 / f64::from(self.days_per_unit)
    }

    /// One projected point per day.
    pub fn daily_resolution(&self) -> f64 {
        f64::from(self.days_per_unit)
    }
}

/// Default lookback windows (in observation intervals) for rate projections.
pub const DEFAULT_WINDOWS: [usize; 6] = [1, 2, 3, 7, 14, 28];

/// Subject-side configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    pub age: AgeConvention,
    pub windows: Vec<usize>,
    /// Unit assumed for subject values without an explicit suffix.
    pub subject_unit: WeightUnit,
    /// Unit every subject value is normalized to.
    pub output_unit: WeightUnit,
    pub has_headers: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            age: AgeConvention::default(),
            windows: DEFAULT_WINDOWS.to_vec(),
            subject_unit: WeightUnit::Grams,
            output_unit: WeightUnit::Grams,
            has_headers: false,
        }
    }
}

impl AnalyzerConfig {
    pub fn validate(&self) -> Result<(), GrowthError> {
        if self.age.days_per_unit == 0 {
            return Err(GrowthError::InvalidConfig("days per unit must be > 0".to_string()));
        }
        if !self.age.base_age.is_finite() {
            return Err(GrowthError::InvalidConfig("base age must be finite".to_string()));
        }
        if self.windows.contains(&0) {
            return Err(GrowthError::InvalidConfig(
                "extrapolation windows must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Reference-table configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceConfig {
    /// Unit assumed for reference values without an explicit suffix.
    pub table_unit: WeightUnit,
    /// Unit the curves are expressed in after loading.
    pub output_unit: WeightUnit,
    pub has_headers: bool,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            table_unit: WeightUnit::Kilograms,
            output_unit: WeightUnit::Grams,
            has_headers: false,
        }
    }
}

/// One `(x, y)` pair ready to be plotted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub x: f64,
    pub y: f64,
}

impl SeriesPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A parsed reference row (value already in the output unit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencePoint {
    pub percentile: u8,
    /// Gestational week.
    pub time: u32,
    pub value: Decimal,
}

/// A single subject measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationPoint {
    /// Opaque date label carried through from the input.
    pub date: String,
    pub age: f64,
    pub value: Decimal,
}

impl ObservationPoint {
    pub fn new(date: impl Into<String>, age: f64, value: Decimal) -> Self {
        Self {
            date: date.into(),
            age,
            value,
        }
    }
}

/// Direction of a delta, used by renderers to color bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Gain,
    Loss,
}

impl Trend {
    pub fn of(change: Decimal) -> Self {
        if change < Decimal::ZERO {
            Trend::Loss
        } else {
            Trend::Gain
        }
    }
}

/// Change between two consecutive observations, placed at the later age.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    pub age: f64,
    pub change: Decimal,
    pub trend: Trend,
}

/// Straight-line projection from the last observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub window: usize,
    /// Average change per observation interval.
    pub rate: Decimal,
    pub points: Vec<SeriesPoint>,
}

/// Signed distance of the subject from one reference percentile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deviation {
    pub percentile: u8,
    /// `(age, reference - observed)` pairs.
    pub points: Vec<SeriesPoint>,
    /// Observations whose age fell outside the percentile's domain.
    pub skipped: usize,
}
