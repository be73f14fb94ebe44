use std::io::Read;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::domain::{AnalyzerConfig, Delta, Deviation, ObservationPoint, Projection, SeriesPoint, Trend};
use crate::error::GrowthError;
use crate::io::ingest::read_observations;
use crate::reference::ReferenceCurveSet;

/// Longest projection `extrapolate` will build, in steps past the last
/// observation.
pub const MAX_PROJECTION_STEPS: usize = 100_000;

/// A subject's measurements, in the order they were read.
///
/// The order is never changed. Deltas and projections are computed
/// positionally and are only meaningful when the input is chronological;
/// an out-of-order table still produces well-defined (but misleading)
/// numbers.
#[derive(Debug, Clone, Default)]
pub struct Trajectory {
    points: Vec<ObservationPoint>,
}

impl Trajectory {
    pub fn from_points(points: Vec<ObservationPoint>) -> Self {
        Self { points }
    }

    /// Parse a `date,day_offset,value` CSV stream.
    pub fn from_reader<R: Read>(reader: R, config: &AnalyzerConfig) -> Result<Self, GrowthError> {
        Ok(Self::from_points(read_observations(reader, config)?))
    }

    pub fn points(&self) -> &[ObservationPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<&ObservationPoint> {
        self.points.last()
    }

    /// First and last date labels.
    pub fn date_span(&self) -> Option<(&str, &str)> {
        Some((self.points.first()?.date.as_str(), self.points.last()?.date.as_str()))
    }

    /// `(age, value)` pairs for plotting.
    pub fn series(&self) -> Result<Vec<SeriesPoint>, GrowthError> {
        self.points
            .iter()
            .map(|p| Ok(SeriesPoint::new(p.age, to_f64(p.value)?)))
            .collect()
    }

    /// Change between consecutive observations, placed at the later age.
    pub fn deltas(&self) -> Result<Vec<Delta>, GrowthError> {
        self.points
            .windows(2)
            .map(|w| {
                let change = w[1]
                    .value
                    .checked_sub(w[0].value)
                    .ok_or_else(|| overflow("change", w[0].value, w[1].value))?;
                Ok(Delta {
                    age: w[1].age,
                    change,
                    trend: Trend::of(change),
                })
            })
            .collect()
    }

    /// Average change per interval over the last `window` intervals.
    ///
    /// `rate = (value[len-1] - value[len-1-window]) / window`
    ///
    /// The historical plotting scripts indexed `value[len-window]` here, which
    /// spans one interval fewer than the divisor assumes. This formula uses
    /// the full `window` intervals.
    pub fn rate(&self, window: usize) -> Result<Decimal, GrowthError> {
        let n = self.points.len();
        if window == 0 {
            return Err(GrowthError::InvalidConfig(
                "extrapolation window must be >= 1".to_string(),
            ));
        }
        if n <= window {
            return Err(GrowthError::InsufficientHistory { window, available: n });
        }
        let last = self.points[n - 1].value;
        let base = self.points[n - 1 - window].value;
        last.checked_sub(base)
            .and_then(|d| d.checked_div(Decimal::from(window as u64)))
            .ok_or_else(|| overflow("rate", base, last))
    }

    /// Project the last observation forward at the window's average rate.
    ///
    /// Point `i` sits at `last_age + i / steps_per_unit` with value
    /// `last_value + rate * i`, for `i = 0..=floor((to_age - last_age) *
    /// steps_per_unit)`. Point 0 is the last observation itself.
    pub fn extrapolate(&self, window: usize, to_age: f64, steps_per_unit: f64) -> Result<Projection, GrowthError> {
        if !(steps_per_unit.is_finite() && steps_per_unit > 0.0) {
            return Err(GrowthError::InvalidConfig(format!(
                "projection resolution must be positive, got {steps_per_unit}"
            )));
        }
        let rate = self.rate(window)?;
        let last = &self.points[self.points.len() - 1];

        if !(to_age.is_finite() && to_age >= last.age) {
            return Err(GrowthError::Domain {
                value: to_age,
                min: last.age,
                max: f64::INFINITY,
            });
        }

        // Ages are sums of sevenths; absorb the rounding so whole days are not lost.
        let steps = ((to_age - last.age) * steps_per_unit + 1e-9).floor();
        if steps > MAX_PROJECTION_STEPS as f64 {
            return Err(GrowthError::InvalidConfig(format!(
                "projecting to {to_age} takes {steps} steps, more than {MAX_PROJECTION_STEPS}"
            )));
        }
        let points = (0..=steps as usize)
            .map(|i| {
                let value = rate
                    .checked_mul(Decimal::from(i as u64))
                    .and_then(|d| last.value.checked_add(d))
                    .ok_or_else(|| overflow("projection", last.value, rate))?;
                Ok(SeriesPoint::new(last.age + i as f64 / steps_per_unit, to_f64(value)?))
            })
            .collect::<Result<Vec<_>, GrowthError>>()?;

        Ok(Projection { window, rate, points })
    }

    /// One projection attempt per configured window, at one point per day.
    ///
    /// Failures are returned per window so the caller can decide which to
    /// skip.
    pub fn projections(&self, config: &AnalyzerConfig, to_age: f64) -> Vec<Result<Projection, GrowthError>> {
        let resolution = config.age.daily_resolution();
        config
            .windows
            .iter()
            .map(|&w| self.extrapolate(w, to_age, resolution))
            .collect()
    }

    /// `(age, reference(age) - observed)` for every observation inside the
    /// percentile's domain. Other observations are counted in `skipped`.
    pub fn deviation(&self, reference: &ReferenceCurveSet, percentile: u8) -> Result<Deviation, GrowthError> {
        let curve = reference.curve(percentile)?;
        let mut points = Vec::with_capacity(self.points.len());
        let mut skipped = 0;

        for p in &self.points {
            if !curve.contains(p.age) {
                skipped += 1;
                continue;
            }
            let expected = curve.evaluate(p.age)?;
            points.push(SeriesPoint::new(p.age, expected - to_f64(p.value)?));
        }

        if skipped > 0 {
            tracing::warn!(
                percentile,
                skipped,
                domain = ?curve.domain(),
                "observations outside the reference domain were skipped"
            );
        }

        Ok(Deviation {
            percentile,
            points,
            skipped,
        })
    }

    /// Deviations from every percentile, ascending.
    pub fn deviations(&self, reference: &ReferenceCurveSet) -> Result<Vec<Deviation>, GrowthError> {
        reference
            .percentiles()
            .into_iter()
            .map(|p| self.deviation(reference, p))
            .collect()
    }
}

fn overflow(what: &str, a: Decimal, b: Decimal) -> GrowthError {
    GrowthError::InvalidInput(format!("{what} from {a} and {b} overflows a decimal"))
}

fn to_f64(value: Decimal) -> Result<f64, GrowthError> {
    value
        .to_f64()
        .ok_or_else(|| GrowthError::InvalidInput(format!("{value} is not representable as f64")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ReferenceConfig, WeightUnit};

    fn trajectory(points: &[(f64, i64)]) -> Trajectory {
        Trajectory::from_points(
            points
                .iter()
                .enumerate()
                .map(|(i, (age, v))| ObservationPoint::new(format!("day-{i}"), *age, Decimal::from(*v)))
                .collect(),
        )
    }

    fn reference() -> ReferenceCurveSet {
        let config = ReferenceConfig {
            table_unit: WeightUnit::Grams,
            output_unit: WeightUnit::Grams,
            has_headers: false,
        };
        ReferenceCurveSet::from_reader(
            "32,50,1700\n33,50,1900\n34,50,2100\n35,50,2300\n\
             30,10,1100\n31,10,1250\n32,10,1400\n33,10,1550\n"
                .as_bytes(),
            &config,
        )
        .unwrap()
    }

    #[test]
    fn deltas_match_the_worked_example() {
        let t = trajectory(&[(32.0, 1000), (32.14, 1020), (32.29, 1015)]);
        let d = t.deltas().unwrap();
        assert_eq!(d.len(), 2);
        assert_eq!((d[0].age, d[0].change, d[0].trend), (32.14, Decimal::from(20), Trend::Gain));
        assert_eq!((d[1].age, d[1].change, d[1].trend), (32.29, Decimal::from(-5), Trend::Loss));
    }

    #[test]
    fn deltas_telescope() {
        let values = [1275, 1260, 1290, 1290, 1330, 1318, 1365, 1401];
        let points: Vec<(f64, i64)> = values
            .iter()
            .enumerate()
            .map(|(i, v)| (32.0 + i as f64 / 7.0, *v))
            .collect();
        let t = trajectory(&points);
        let d = t.deltas().unwrap();
        assert_eq!(d.len(), values.len() - 1);
        let sum: Decimal = d.iter().map(|x| x.change).sum();
        assert_eq!(sum, Decimal::from(1401 - 1275));

        assert!(trajectory(&[(32.0, 1000)]).deltas().unwrap().is_empty());
        assert!(Trajectory::default().deltas().unwrap().is_empty());
    }

    #[test]
    fn extreme_values_fail_instead_of_overflowing() {
        let t = Trajectory::from_points(vec![
            ObservationPoint::new("a", 32.0, Decimal::MIN),
            ObservationPoint::new("b", 32.1, Decimal::MAX),
        ]);
        assert!(matches!(t.deltas(), Err(GrowthError::InvalidInput(_))));
        assert!(matches!(t.rate(1), Err(GrowthError::InvalidInput(_))));

        let t = Trajectory::from_points(vec![
            ObservationPoint::new("a", 32.0, Decimal::ZERO),
            ObservationPoint::new("b", 32.1, Decimal::MAX),
        ]);
        assert_eq!(t.rate(1).unwrap(), Decimal::MAX);
        assert!(matches!(t.extrapolate(1, 33.0, 7.0), Err(GrowthError::InvalidInput(_))));
    }

    #[test]
    fn window_longer_than_history_fails() {
        let t = trajectory(&[(32.0, 1000), (32.14, 1020), (32.29, 1015)]);
        assert!(matches!(
            t.extrapolate(7, 40.0, 7.0),
            Err(GrowthError::InsufficientHistory { window: 7, available: 3 })
        ));
        assert!(matches!(
            t.extrapolate(3, 40.0, 7.0),
            Err(GrowthError::InsufficientHistory { window: 3, available: 3 })
        ));
        assert!(t.extrapolate(2, 40.0, 7.0).is_ok());
    }

    #[test]
    fn extrapolation_steps_from_last_point() {
        let last_age = 33.0 + 2.0 / 7.0;
        let t = trajectory(&[(33.0, 1500), (33.0 + 1.0 / 7.0, 1530), (last_age, 1540)]);
        let p = t.extrapolate(2, last_age + 1.0, 7.0).unwrap();
        assert_eq!(p.rate, Decimal::from(20));
        // One week at one point per day, plus the starting observation.
        assert_eq!(p.points.len(), 8);
        for (i, pt) in p.points.iter().enumerate() {
            assert!((pt.x - (last_age + i as f64 / 7.0)).abs() < 1e-12, "age of point {i}");
            assert_eq!(pt.y, 1540.0 + 20.0 * i as f64);
        }
        assert!((p.points[7].x - (last_age + 1.0)).abs() < 1e-12);
        assert_eq!(p.points[7].y, 1540.0 + 7.0 * 20.0);

        let start = t.extrapolate(1, last_age, 7.0).unwrap();
        assert_eq!(start.points, vec![SeriesPoint::new(last_age, 1540.0)]);
    }

    #[test]
    fn one_step_ahead_reaches_the_terminal_age() {
        let t = trajectory(&[(33.0, 1500), (33.0 + 1.0 / 7.0, 1520)]);
        let to_age = 33.0 + 2.0 / 7.0;
        let p = t.extrapolate(1, to_age, 7.0).unwrap();
        assert_eq!(p.points.len(), 2);
        assert!((p.points[1].x - to_age).abs() < 1e-12);
        assert_eq!(p.points[1].y, 1540.0);

        // A partial step is not taken.
        let p = t.extrapolate(1, to_age + 0.5 / 7.0, 7.0).unwrap();
        assert_eq!(p.points.len(), 2);
    }

    #[test]
    fn distant_terminal_age_is_rejected() {
        let t = trajectory(&[(33.0, 1500), (33.5, 1530)]);
        assert!(matches!(t.extrapolate(1, 1e12, 7.0), Err(GrowthError::InvalidConfig(_))));
        let limit = 33.5 + MAX_PROJECTION_STEPS as f64 / 7.0;
        assert_eq!(t.extrapolate(1, limit, 7.0).unwrap().points.len(), MAX_PROJECTION_STEPS + 1);
    }

    #[test]
    fn extrapolation_rejects_past_ages_and_bad_resolution() {
        let t = trajectory(&[(33.0, 1500), (33.5, 1530)]);
        assert!(matches!(t.extrapolate(1, 32.0, 7.0), Err(GrowthError::Domain { .. })));
        assert!(matches!(t.extrapolate(1, 40.0, 0.0), Err(GrowthError::InvalidConfig(_))));
    }

    #[test]
    fn rate_uses_full_window() {
        let t = trajectory(&[(32.0, 1000), (32.1, 1010), (32.2, 1030), (32.3, 1060)]);
        assert_eq!(t.rate(1).unwrap(), Decimal::from(30));
        assert_eq!(t.rate(3).unwrap(), Decimal::from(20));
    }

    #[test]
    fn projections_report_each_window() {
        let t = trajectory(&[(32.0, 1000), (32.1, 1010), (32.2, 1030), (32.3, 1060)]);
        let config = AnalyzerConfig::default();
        let results = t.projections(&config, 33.0);
        assert_eq!(results.len(), config.windows.len());
        assert!(results[0].is_ok());
        assert!(results[2].is_ok());
        assert!(matches!(results[3], Err(GrowthError::InsufficientHistory { window: 7, .. })));
    }

    #[test]
    fn deviation_skips_ages_outside_domain() {
        let t = trajectory(&[(31.5, 1500), (32.0, 1600), (33.5, 1900), (35.0, 2250), (35.5, 2300)]);
        let d = t.deviation(&reference(), 50).unwrap();
        assert_eq!(d.skipped, 2);
        assert_eq!(d.points.len(), 3);
        assert_eq!(d.points[0].x, 32.0);
        assert!((d.points[0].y - 100.0).abs() < 1e-9);
        assert!((d.points[2].y - 50.0).abs() < 1e-9);
        // Linear data: the spline is exact between knots as well.
        assert!((d.points[1].y - 100.0).abs() < 1e-9);
    }

    #[test]
    fn deviations_cover_every_percentile() {
        let t = trajectory(&[(32.0, 1600), (33.0, 1800)]);
        let all = t.deviations(&reference()).unwrap();
        let percentiles: Vec<u8> = all.iter().map(|d| d.percentile).collect();
        assert_eq!(percentiles, vec![10, 50]);
        assert!((all[0].points[0].y - (1400.0 - 1600.0)).abs() < 1e-9);
        assert!(matches!(t.deviation(&reference(), 97), Err(GrowthError::UnknownPercentile(97))));
    }

    #[test]
    fn date_span_and_series_follow_input_order() {
        let t = Trajectory::from_reader(
            "2011-07-05,3,1275\n2011-07-06,4,1260\n2011-07-07,5,1290\n".as_bytes(),
            &AnalyzerConfig::default(),
        )
        .unwrap();
        assert_eq!(t.date_span(), Some(("2011-07-05", "2011-07-07")));
        let s = t.series().unwrap();
        assert_eq!(s.len(), 3);
        assert!((s[2].x - 33.0).abs() < 1e-12);
        assert_eq!(s[1].y, 1260.0);
        assert_eq!(Trajectory::default().date_span(), None);
    }
}
