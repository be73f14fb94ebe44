//! CSV ingest and normalization.
//!
//! This module turns the two input tables into validated, typed rows:
//!
//! - reference table: `time,percentile,value` → `ReferencePoint`
//! - subject table: `date,day_offset,value` → `ObservationPoint`
//! - paired samples: `x,y` → two `f64` columns
//!
//! Design goals:
//! - **Strict schema**: every malformed row is a `GrowthError::Parse` naming the row
//! - **Exact values**: weights are parsed as `Decimal`, never through `f64`
//! - **One unit per table**: an explicit `g`/`kg` suffix that disagrees with the
//!   rest of the table is rejected, never rescaled
//! - **Separation of concerns**: no fitting logic here

use std::io::Read;
use std::str::FromStr;

use csv::StringRecord;
use rust_decimal::Decimal;

use crate::domain::{AnalyzerConfig, ObservationPoint, ReferenceConfig, ReferencePoint, WeightUnit};
use crate::error::GrowthError;

/// Read and normalize a reference table.
///
/// Values end up in `config.output_unit`.
pub fn read_reference_points<R: Read>(
    reader: R,
    config: &ReferenceConfig,
) -> Result<Vec<ReferencePoint>, GrowthError> {
    let mut units = UnitGuard::new(config.table_unit);
    let mut points = Vec::new();

    for (row, record) in records(reader, config.has_headers) {
        let record = record?;
        let (time, percentile, value) =
            parse_reference_row(&record).map_err(|message| GrowthError::Parse { row, message })?;
        let unit = units.check(row, value.1)?;
        points.push(ReferencePoint {
            percentile,
            time,
            value: scale(row, unit, value.0, config.output_unit)?,
        });
    }

    tracing::debug!(rows = points.len(), unit = %units.resolved(), "read reference table");
    Ok(points)
}

/// Read and normalize a subject table, converting day offsets to ages.
///
/// Row order is preserved as-is.
pub fn read_observations<R: Read>(
    reader: R,
    config: &AnalyzerConfig,
) -> Result<Vec<ObservationPoint>, GrowthError> {
    config.validate()?;
    let mut units = UnitGuard::new(config.subject_unit);
    let mut points = Vec::new();

    for (row, record) in records(reader, config.has_headers) {
        let record = record?;
        let (date, day, value) =
            parse_subject_row(&record).map_err(|message| GrowthError::Parse { row, message })?;
        let unit = units.check(row, value.1)?;
        points.push(ObservationPoint {
            date,
            age: config.age.age_for_day(day),
            value: scale(row, unit, value.0, config.output_unit)?,
        });
    }

    tracing::debug!(rows = points.len(), unit = %units.resolved(), "read subject table");
    Ok(points)
}

/// Read two numeric columns.
pub fn read_pairs<R: Read>(reader: R, has_headers: bool) -> Result<(Vec<f64>, Vec<f64>), GrowthError> {
    let mut xs = Vec::new();
    let mut ys = Vec::new();

    for (row, record) in records(reader, has_headers) {
        let record = record?;
        let parsed = expect_fields(&record, 2)
            .and_then(|f| Ok((parse_f64(f[0], "x")?, parse_f64(f[1], "y")?)));
        let (x, y) = parsed.map_err(|message| GrowthError::Parse { row, message })?;
        xs.push(x);
        ys.push(y);
    }

    Ok((xs, ys))
}

type WeightField = (Decimal, Option<WeightUnit>);

fn scale(row: usize, from: WeightUnit, value: Decimal, to: WeightUnit) -> Result<Decimal, GrowthError> {
    from.convert(value, to).map_err(|err| GrowthError::Parse {
        row,
        message: err.to_string(),
    })
}

fn parse_reference_row(record: &StringRecord) -> Result<(u32, u8, WeightField), String> {
    let f = expect_fields(record, 3)?;
    let time = f[0]
        .parse::<u32>()
        .map_err(|_| format!("time '{}' is not a non-negative integer", f[0]))?;
    let percentile = f[1]
        .parse::<u8>()
        .ok()
        .filter(|p| *p <= 100)
        .ok_or_else(|| format!("percentile '{}' is not an integer in 0..=100", f[1]))?;
    let value = parse_weight(f[2])?;
    Ok((time, percentile, value))
}

fn parse_subject_row(record: &StringRecord) -> Result<(String, i64, WeightField), String> {
    let f = expect_fields(record, 3)?;
    let day = f[1]
        .parse::<i64>()
        .map_err(|_| format!("day offset '{}' is not an integer", f[1]))?;
    let value = parse_weight(f[2])?;
    Ok((f[0].to_string(), day, value))
}

/// Parse `1275`, `1.275kg` or `1275 g` into a decimal and its explicit unit.
fn parse_weight(s: &str) -> Result<WeightField, String> {
    let lower = s.trim().to_ascii_lowercase();
    let (number, unit) = if let Some(n) = lower.strip_suffix("kg") {
        (n, Some(WeightUnit::Kilograms))
    } else if let Some(n) = lower.strip_suffix('g') {
        (n, Some(WeightUnit::Grams))
    } else {
        (lower.as_str(), None)
    };

    let number = number.trim();
    let value = Decimal::from_str(number).map_err(|_| format!("value '{s}' is not a decimal number"))?;
    Ok((value, unit))
}

fn parse_f64(s: &str, name: &str) -> Result<f64, String> {
    s.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("{name} '{s}' is not a finite number"))
}

fn expect_fields(record: &StringRecord, n: usize) -> Result<Vec<&str>, String> {
    let fields: Vec<&str> = record.iter().map(str::trim).collect();
    if fields.len() < n {
        return Err(format!("expected {n} fields, found {}", fields.len()));
    }
    if let Some(i) = fields[..n].iter().position(|f| f.is_empty()) {
        return Err(format!("field {} is empty", i + 1));
    }
    Ok(fields)
}

/// Iterate CSV records together with their 1-based line number.
fn records<R: Read>(
    reader: R,
    has_headers: bool,
) -> impl Iterator<Item = (usize, Result<StringRecord, GrowthError>)> {
    let first_line = if has_headers { 2 } else { 1 };
    csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader)
        .into_records()
        .enumerate()
        .map(move |(idx, r)| {
            let position = match &r {
                Ok(rec) => rec.position(),
                Err(e) => e.position(),
            };
            let row = position.map_or(idx + first_line, |p| p.line() as usize);
            (
                row,
                r.map_err(|e| GrowthError::Parse {
                    row,
                    message: format!("CSV parse error: {e}"),
                }),
            )
        })
        .filter(|(_, r)| !matches!(r, Ok(rec) if rec.iter().all(str::is_empty)))
}

/// Tracks the single unit a table is allowed to use.
struct UnitGuard {
    declared: WeightUnit,
    first: Option<WeightUnit>,
}

impl UnitGuard {
    fn new(declared: WeightUnit) -> Self {
        Self { declared, first: None }
    }

    fn check(&mut self, row: usize, explicit: Option<WeightUnit>) -> Result<WeightUnit, GrowthError> {
        let unit = explicit.unwrap_or(self.declared);
        match self.first {
            None => {
                self.first = Some(unit);
                Ok(unit)
            }
            Some(expected) if expected == unit => Ok(unit),
            Some(expected) => Err(GrowthError::UnitMismatch {
                row,
                expected,
                found: unit,
            }),
        }
    }

    fn resolved(&self) -> WeightUnit {
        self.first.unwrap_or(self.declared)
    }
}
