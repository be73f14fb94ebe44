//! The percentile → curve map loaded from one reference table.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;

use rust_decimal::Decimal;

use crate::domain::{ReferenceConfig, ReferencePoint, SeriesPoint};
use crate::error::GrowthError;
use crate::io::ingest::read_reference_points;
use crate::reference::ReferenceCurve;

/// All percentile curves of one reference table. Immutable once built.
#[derive(Debug, Clone)]
pub struct ReferenceCurveSet {
    curves: BTreeMap<u8, ReferenceCurve>,
}

impl ReferenceCurveSet {
    /// Group parsed points by percentile and fit one curve per group.
    ///
    /// A later point with the same `(percentile, time)` replaces an earlier
    /// one. Any percentile with fewer than four distinct weeks fails the whole
    /// set with `GrowthError::Data`.
    pub fn from_points<I>(points: I) -> Result<Self, GrowthError>
    where
        I: IntoIterator<Item = ReferencePoint>,
    {
        let mut grouped: BTreeMap<u8, BTreeMap<u32, Decimal>> = BTreeMap::new();
        for p in points {
            grouped.entry(p.percentile).or_default().insert(p.time, p.value);
        }

        if grouped.is_empty() {
            return Err(GrowthError::InvalidInput("reference table has no rows".to_string()));
        }

        let curves = grouped
            .into_iter()
            .map(|(percentile, samples)| Ok((percentile, ReferenceCurve::fit(percentile, samples)?)))
            .collect::<Result<BTreeMap<_, _>, GrowthError>>()?;

        Ok(Self { curves })
    }

    /// Parse a `time,percentile,value` CSV stream and fit it.
    pub fn from_reader<R: Read>(reader: R, config: &ReferenceConfig) -> Result<Self, GrowthError> {
        let points = read_reference_points(reader, config)?;
        Self::from_points(points)
    }

    /// Known percentiles, ascending.
    pub fn percentiles(&self) -> BTreeSet<u8> {
        self.curves.keys().copied().collect()
    }

    pub fn curve(&self, percentile: u8) -> Result<&ReferenceCurve, GrowthError> {
        self.curves
            .get(&percentile)
            .ok_or(GrowthError::UnknownPercentile(percentile))
    }

    /// Curves in ascending percentile order.
    pub fn curves(&self) -> impl Iterator<Item = &ReferenceCurve> {
        self.curves.values()
    }

    pub fn domain(&self, percentile: u8) -> Result<(f64, f64), GrowthError> {
        Ok(self.curve(percentile)?.domain())
    }

    pub fn evaluate(&self, percentile: u8, t: f64) -> Result<f64, GrowthError> {
        self.curve(percentile)?.evaluate(t)
    }

    pub fn sample(&self, percentile: u8, count: usize) -> Result<Vec<SeriesPoint>, GrowthError> {
        self.curve(percentile)?.sample(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WeightUnit;

    fn in_kg() -> ReferenceConfig {
        ReferenceConfig {
            table_unit: WeightUnit::Kilograms,
            output_unit: WeightUnit::Kilograms,
            has_headers: false,
        }
    }

    fn load(csv: &str) -> Result<ReferenceCurveSet, GrowthError> {
        ReferenceCurveSet::from_reader(csv.as_bytes(), &in_kg())
    }

    #[test]
    fn evaluates_the_worked_example() {
        let set = load("0,50,3.0\n1,50,3.2\n2,50,3.5\n3,50,3.9\n").unwrap();
        assert!((set.evaluate(50, 1.0).unwrap() - 3.2).abs() < 1e-9);
        assert!(matches!(set.evaluate(50, 5.0), Err(GrowthError::Domain { .. })));
        assert!(matches!(set.evaluate(90, 1.0), Err(GrowthError::UnknownPercentile(90))));
    }

    #[test]
    fn interpolation_passes_through_every_sample() {
        let csv = "\
22,10,0.40\n23,10,0.46\n24,10,0.53\n25,10,0.61\n26,10,0.70\n\
22,90,0.62\n23,90,0.71\n24,90,0.81\n25,90,0.92\n26,90,1.05\n";
        let set = load(csv).unwrap();
        assert_eq!(set.percentiles().into_iter().collect::<Vec<_>>(), vec![10, 90]);

        for curve in set.curves() {
            for (week, value) in curve.samples() {
                let expected: f64 = value.to_string().parse().unwrap();
                let got = set.evaluate(curve.percentile(), f64::from(*week)).unwrap();
                assert!((got - expected).abs() < 1e-9, "p{} week {week}", curve.percentile());
            }
        }
    }

    #[test]
    fn later_rows_overwrite_duplicate_weeks() {
        let set = load("0,50,3.0\n1,50,9.9\n2,50,3.5\n3,50,3.9\n1,50,3.2\n").unwrap();
        let curve = set.curve(50).unwrap();
        assert_eq!(curve.samples().len(), 4);
        assert!((set.evaluate(50, 1.0).unwrap() - 3.2).abs() < 1e-9);
    }

    #[test]
    fn short_percentile_fails_the_set() {
        // Duplicates do not count as distinct points.
        let err = load("0,50,3.0\n1,50,3.2\n2,50,3.5\n3,50,3.9\n0,3,2.0\n1,3,2.1\n1,3,2.2\n2,3,2.4\n")
            .unwrap_err();
        assert!(matches!(err, GrowthError::Data { percentile: 3, .. }));
    }

    #[test]
    fn empty_table_is_rejected() {
        assert!(matches!(load(""), Err(GrowthError::InvalidInput(_))));
    }

    #[test]
    fn rendered_series_round_trips() {
        let set = load("30,50,1.4\n31,50,1.6\n32,50,1.75\n33,50,1.95\n34,50,2.15\n").unwrap();

        // Render the curve at its integer weeks, then re-read that output as a
        // fresh table.
        let mut rendered = String::new();
        for week in 30..=34 {
            let v = set.evaluate(50, f64::from(week)).unwrap();
            rendered.push_str(&format!("{week},50,{v:.6}\n"));
        }
        let again = load(&rendered).unwrap();

        for week in 30..=34 {
            let t = f64::from(week);
            let a = set.evaluate(50, t).unwrap();
            let b = again.evaluate(50, t).unwrap();
            assert!((a - b).abs() < 1e-6, "week {week}: {a} vs {b}");
        }
        for t in [30.5, 31.25, 33.9] {
            let a = set.evaluate(50, t).unwrap();
            let b = again.evaluate(50, t).unwrap();
            assert!((a - b).abs() < 1e-5, "t {t}: {a} vs {b}");
        }
    }

    #[test]
    fn kilogram_table_loads_in_grams_by_default() {
        let set = ReferenceCurveSet::from_reader(
            "0,50,3.0\n1,50,3.2\n2,50,3.5\n3,50,3.9\n".as_bytes(),
            &ReferenceConfig::default(),
        )
        .unwrap();
        assert!((set.evaluate(50, 2.0).unwrap() - 3500.0).abs() < 1e-6);
    }
}
