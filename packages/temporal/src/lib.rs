#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Temporal comparisons between projection periods.
//!
//! Two kinds of comparison are supported:
//!
//! - [`TemporalComparator::change`] differences the nearest climate sample
//!   values of two periods at a location.
//! - [`AnomalySet`] exposes the upstream-precomputed anomaly grid, where
//!   each cell already carries its difference from the baseline period.
//!
//! A missing value is always `None`, never `0.0`, so "no warming" and "no
//! data" stay distinguishable downstream.

use climate_risk_models::{Coordinate, Period, TemperatureAnomalyPoint};
use climate_risk_spatial::ClimateIndex;
use serde::{Deserialize, Serialize};

/// Period-to-period differencing over a [`ClimateIndex`].
///
/// Holds no cache; every call re-queries the index.
#[derive(Clone, Copy)]
pub struct TemporalComparator<'a> {
    index: &'a ClimateIndex,
}

impl<'a> TemporalComparator<'a> {
    #[must_use]
    pub const fn new(index: &'a ClimateIndex) -> Self {
        Self { index }
    }

    /// `nearest_value(point, to) - nearest_value(point, from)`, or `None` if
    /// either lookup misses.
    #[must_use]
    pub fn change(&self, point: &Coordinate, from: Period, to: Period) -> Option<f64> {
        let from_value = self.index.nearest_value(point, from)?;
        let to_value = self.index.nearest_value(point, to)?;
        Some(to_value - from_value)
    }

    /// Change from `from` to every projection period, in order.
    #[must_use]
    pub fn change_series(&self, point: &Coordinate, from: Period) -> Vec<(Period, Option<f64>)> {
        Period::PROJECTIONS
            .iter()
            .map(|&to| (to, self.change(point, from, to)))
            .collect()
    }
}

/// The precomputed baseline difference of an anomaly cell for `period`.
///
/// `None` means the data is not available for that cell and period.
#[must_use]
pub fn anomaly_diff(point: &TemperatureAnomalyPoint, period: Period) -> Option<f64> {
    point.periods.get(&period)?.diff
}

/// `avg(to) - avg(from)` for a single anomaly cell.
#[must_use]
pub fn anomaly_between(point: &TemperatureAnomalyPoint, from: Period, to: Period) -> Option<f64> {
    let from_avg = point.periods.get(&from)?.avg?;
    let to_avg = point.periods.get(&to)?.avg?;
    Some(to_avg - from_avg)
}

/// One cell of a rendered anomaly grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyCell {
    pub coordinate: Coordinate,
    /// Difference from the baseline period; `None` if unavailable.
    pub diff: Option<f64>,
}

/// The temperature anomaly grid, read-only after load.
#[derive(Debug, Clone, Default)]
pub struct AnomalySet {
    points: Vec<TemperatureAnomalyPoint>,
}

impl AnomalySet {
    #[must_use]
    pub fn new(points: Vec<TemperatureAnomalyPoint>) -> Self {
        log::info!("Loaded {} temperature anomaly cells", points.len());
        Self { points }
    }

    #[must_use]
    pub fn points(&self) -> &[TemperatureAnomalyPoint] {
        &self.points
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Every cell paired with its diff for `period`.
    #[must_use]
    pub fn grid(&self, period: Period) -> Vec<AnomalyCell> {
        self.points
            .iter()
            .map(|point| AnomalyCell {
                coordinate: point.coordinate,
                diff: anomaly_diff(point, period),
            })
            .collect()
    }

    /// The cell nearest to `coordinate` by planar (lat, lng) distance. The
    /// first cell wins ties.
    #[must_use]
    pub fn nearest(&self, coordinate: &Coordinate) -> Option<&TemperatureAnomalyPoint> {
        let mut best: Option<(&TemperatureAnomalyPoint, f64)> = None;

        for point in &self.points {
            let distance = point.coordinate.planar_distance_2(coordinate);
            match best {
                Some((_, current)) if distance >= current => {}
                _ if distance.is_nan() => {}
                _ => best = Some((point, distance)),
            }
        }

        best.map(|(point, _)| point)
    }

    /// Diff of the nearest cell for `period`.
    #[must_use]
    pub fn diff_at(&self, coordinate: &Coordinate, period: Period) -> Option<f64> {
        anomaly_diff(self.nearest(coordinate)?, period)
    }

    /// Mean diff over every cell that has one for `period`.
    #[must_use]
    pub fn mean_diff(&self, period: Period) -> Option<f64> {
        let (sum, count) = self
            .points
            .iter()
            .filter_map(|point| anomaly_diff(point, period))
            .fold((0.0, 0_u32), |(sum, count), diff| (sum + diff, count + 1));

        (count > 0).then(|| sum / f64::from(count))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use climate_risk_models::{AnomalyValues, ClimateSamplePoint};

    use super::*;

    fn index() -> ClimateIndex {
        ClimateIndex::new(vec![
            ClimateSamplePoint {
                coordinate: Coordinate::new(0.0, 0.0),
                values: BTreeMap::from([
                    (Period::NearTerm, 14.0),
                    (Period::MidCentury, 15.5),
                    (Period::EndOfCentury, 18.25),
                ]),
            },
            ClimateSamplePoint {
                coordinate: Coordinate::new(50.0, 50.0),
                values: BTreeMap::from([(Period::NearTerm, 2.0)]),
            },
        ])
    }

    fn anomaly(lat: f64, lon: f64, periods: &[(Period, Option<f64>, Option<f64>)]) -> TemperatureAnomalyPoint {
        TemperatureAnomalyPoint {
            coordinate: Coordinate::new(lat, lon),
            periods: periods
                .iter()
                .map(|&(period, avg, diff)| (period, AnomalyValues { avg, diff }))
                .collect(),
        }
    }

    #[test]
    fn change_is_difference_of_nearest_values() {
        let index = index();
        let comparator = TemporalComparator::new(&index);
        let point = Coordinate::new(1.0, 1.0);

        let expected = index.nearest_value(&point, Period::MidCentury).unwrap()
            - index.nearest_value(&point, Period::NearTerm).unwrap();
        let actual = comparator
            .change(&point, Period::NearTerm, Period::MidCentury)
            .unwrap();
        assert!((actual - expected).abs() < f64::EPSILON);
        assert!((actual - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn change_is_none_when_either_side_missing() {
        let index = index();
        let comparator = TemporalComparator::new(&index);
        let far = Coordinate::new(49.0, 49.0);

        assert_eq!(comparator.change(&far, Period::NearTerm, Period::MidCentury), None);
        assert_eq!(comparator.change(&far, Period::LateCentury, Period::NearTerm), None);
    }

    #[test]
    fn change_against_empty_index_is_none() {
        let index = ClimateIndex::new(Vec::new());
        let comparator = TemporalComparator::new(&index);
        assert_eq!(
            comparator.change(&Coordinate::new(0.0, 0.0), Period::NearTerm, Period::EndOfCentury),
            None
        );
    }

    #[test]
    fn change_series_covers_projections() {
        let index = index();
        let comparator = TemporalComparator::new(&index);
        let series = comparator.change_series(&Coordinate::new(0.0, 0.0), Period::NearTerm);

        assert_eq!(series.len(), 4);
        assert_eq!(series[0], (Period::NearTerm, Some(0.0)));
        assert_eq!(series[2], (Period::LateCentury, None));
        assert_eq!(series[3], (Period::EndOfCentury, Some(4.25)));
    }

    #[test]
    fn anomaly_diff_distinguishes_zero_from_missing() {
        let point = anomaly(
            10.0,
            10.0,
            &[
                (Period::NearTerm, Some(15.0), Some(0.0)),
                (Period::MidCentury, Some(16.0), None),
            ],
        );

        assert_eq!(anomaly_diff(&point, Period::NearTerm), Some(0.0));
        assert_eq!(anomaly_diff(&point, Period::MidCentury), None);
        assert_eq!(anomaly_diff(&point, Period::EndOfCentury), None);
    }

    #[test]
    fn anomaly_between_uses_averages() {
        let point = anomaly(
            0.0,
            0.0,
            &[
                (Period::NearTerm, Some(15.0), Some(1.0)),
                (Period::EndOfCentury, Some(19.5), Some(5.5)),
                (Period::MidCentury, None, Some(2.0)),
            ],
        );

        assert_eq!(
            anomaly_between(&point, Period::NearTerm, Period::EndOfCentury),
            Some(4.5)
        );
        assert_eq!(anomaly_between(&point, Period::NearTerm, Period::MidCentury), None);
    }

    #[test]
    fn grid_and_nearest_lookups() {
        let set = AnomalySet::new(vec![
            anomaly(0.0, 0.0, &[(Period::NearTerm, Some(10.0), Some(1.0))]),
            anomaly(10.0, 10.0, &[(Period::NearTerm, Some(12.0), Some(3.0))]),
            anomaly(20.0, 20.0, &[]),
        ]);

        let grid = set.grid(Period::NearTerm);
        assert_eq!(grid.len(), 3);
        assert_eq!(grid[1].diff, Some(3.0));
        assert_eq!(grid[2].diff, None);

        assert_eq!(set.diff_at(&Coordinate::new(9.0, 9.0), Period::NearTerm), Some(3.0));
        assert_eq!(set.diff_at(&Coordinate::new(19.0, 19.0), Period::NearTerm), None);
        assert_eq!(set.mean_diff(Period::NearTerm), Some(2.0));
        assert_eq!(set.mean_diff(Period::EndOfCentury), None);
    }

    #[test]
    fn nearest_prefers_first_on_ties() {
        let set = AnomalySet::new(vec![
            anomaly(0.0, 1.0, &[(Period::NearTerm, None, Some(1.0))]),
            anomaly(0.0, -1.0, &[(Period::NearTerm, None, Some(2.0))]),
        ]);
        assert_eq!(set.diff_at(&Coordinate::new(0.0, 0.0), Period::NearTerm), Some(1.0));
        assert!(AnomalySet::default().nearest(&Coordinate::new(0.0, 0.0)).is_none());
    }
}
