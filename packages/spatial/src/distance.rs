//! Great-circle distance and coastline proximity.
//!
//! Coastline proximity is measured to the nearest polyline *vertex*, not
//! to the nearest point on a segment. Long, sparsely sampled segments can
//! therefore report a larger distance than the true geometric one.

use climate_risk_models::{CoastlineFeature, Coordinate, RiskCategory};

/// Mean Earth radius in miles used by the haversine formula.
pub const EARTH_RADIUS_MILES: f64 = 3959.0;

/// Distance reported by [`min_distance_to_coastline`] when there is no
/// coastline data to measure against.
pub const NO_COASTLINE_DISTANCE: f64 = 0.0;

/// Haversine distance in miles between two coordinates.
///
/// NaN inputs propagate to a NaN result.
#[must_use]
pub fn great_circle_distance(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlng = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    // Rounding can push `h` a hair above 1 for antipodal points.
    let h = if h > 1.0 { 1.0 } else { h };

    2.0 * EARTH_RADIUS_MILES * h.sqrt().asin()
}

/// Minimum distance in miles from `point` to any coastline vertex, or `None`
/// when the collection has no usable vertices.
///
/// Vertices with a NaN coordinate are ignored. A NaN `point` yields
/// `Some(NaN)` when any vertex exists.
#[must_use]
pub fn nearest_coastline_distance(
    point: &Coordinate,
    coastlines: &[CoastlineFeature],
) -> Option<f64> {
    let mut vertices = coastlines.iter().flat_map(CoastlineFeature::vertices).peekable();

    if point.latitude.is_nan() || point.longitude.is_nan() {
        return vertices.peek().map(|_| f64::NAN);
    }

    let mut best: Option<f64> = None;

    for vertex in vertices {
        let distance = great_circle_distance(point, &vertex);
        match best {
            _ if distance.is_nan() => {}
            Some(current) if distance >= current => {}
            _ => best = Some(distance),
        }
    }

    best
}

/// Minimum distance in miles from `point` to any coastline vertex.
///
/// Returns [`NO_COASTLINE_DISTANCE`] (0) rather than infinity when there is
/// no coastline data. Callers that must tell "no data" apart from "on the
/// coast" should use [`nearest_coastline_distance`] instead.
#[must_use]
pub fn min_distance_to_coastline(point: &Coordinate, coastlines: &[CoastlineFeature]) -> f64 {
    nearest_coastline_distance(point, coastlines).unwrap_or(NO_COASTLINE_DISTANCE)
}

/// Classifies a coastline distance against a user threshold (both miles).
///
/// Within the threshold is submerged, within twice the threshold is at
/// risk, anything further is low risk.
#[must_use]
pub fn classify_risk(distance_to_coast: f64, threshold: f64) -> RiskCategory {
    if distance_to_coast <= threshold {
        RiskCategory::Submerged
    } else if distance_to_coast <= threshold * 2.0 {
        RiskCategory::AtRisk
    } else {
        RiskCategory::LowRisk
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_points() -> Vec<Coordinate> {
        vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(40.7128, -74.0060),
            Coordinate::new(51.5074, -0.1278),
            Coordinate::new(-33.8688, 151.2093),
            Coordinate::new(35.6762, 139.6503),
            Coordinate::new(89.9, 179.9),
            Coordinate::new(-89.9, -179.9),
        ]
    }

    #[test]
    fn distance_is_symmetric() {
        let points = sample_points();
        for a in &points {
            for b in &points {
                let ab = great_circle_distance(a, b);
                let ba = great_circle_distance(b, a);
                assert!((ab - ba).abs() < 1e-9, "asymmetric for {a:?} / {b:?}");
            }
        }
    }

    #[test]
    fn distance_to_self_is_zero() {
        for a in sample_points() {
            assert!(great_circle_distance(&a, &a).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn new_york_to_london() {
        let d = great_circle_distance(
            &Coordinate::new(40.7128, -74.0060),
            &Coordinate::new(51.5074, -0.1278),
        );
        assert!((d - 3461.0).abs() < 10.0, "got {d}");
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = great_circle_distance(&Coordinate::new(0.0, 0.0), &Coordinate::new(1.0, 0.0));
        let expected = EARTH_RADIUS_MILES * 1.0_f64.to_radians();
        assert!((d - expected).abs() < 1e-9);
    }

    #[test]
    fn nan_propagates() {
        let d = great_circle_distance(&Coordinate::new(f64::NAN, 0.0), &Coordinate::new(1.0, 1.0));
        assert!(d.is_nan());
    }

    #[test]
    fn empty_coastlines_report_zero() {
        let point = Coordinate::new(10.0, 10.0);
        assert!(min_distance_to_coastline(&point, &[]).abs() < f64::EPSILON);
        assert!(nearest_coastline_distance(&point, &[]).is_none());
    }

    #[test]
    fn matches_brute_force_over_every_vertex() {
        let coastlines = vec![
            CoastlineFeature::from_coordinates(&[
                Coordinate::new(10.0, -20.0),
                Coordinate::new(12.0, -18.0),
                Coordinate::new(15.0, -17.5),
            ]),
            CoastlineFeature::from_coordinates(&[
                Coordinate::new(-5.0, 30.0),
                Coordinate::new(-4.0, 31.0),
            ]),
        ];

        for point in sample_points() {
            let expected = coastlines
                .iter()
                .flat_map(CoastlineFeature::vertices)
                .map(|v| great_circle_distance(&point, &v))
                .fold(f64::INFINITY, f64::min);
            let actual = min_distance_to_coastline(&point, &coastlines);
            assert!(
                (actual - expected).abs() < 1e-9,
                "{point:?}: {actual} != {expected}"
            );
        }
    }

    #[test]
    fn nan_vertices_are_ignored() {
        let coastlines = vec![CoastlineFeature::from_coordinates(&[
            Coordinate::new(0.0, 0.01),
            Coordinate::new(f64::NAN, 0.0),
            Coordinate::new(10.0, 10.0),
        ])];
        let point = Coordinate::new(0.0, 0.0);

        let expected = great_circle_distance(&point, &Coordinate::new(0.0, 0.01));
        let actual = min_distance_to_coastline(&point, &coastlines);
        assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");

        let only_nan = vec![CoastlineFeature::from_coordinates(&[Coordinate::new(
            f64::NAN,
            f64::NAN,
        )])];
        assert!(nearest_coastline_distance(&point, &only_nan).is_none());
    }

    #[test]
    fn nan_point_propagates_to_coastline_distance() {
        let coastlines = vec![CoastlineFeature::from_coordinates(&[Coordinate::new(1.0, 1.0)])];
        let point = Coordinate::new(f64::NAN, 0.0);

        assert!(min_distance_to_coastline(&point, &coastlines).is_nan());
        assert!(nearest_coastline_distance(&point, &[]).is_none());
    }

    #[test]
    fn uses_vertices_not_segments() {
        let coastline = vec![CoastlineFeature::from_coordinates(&[
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 10.0),
        ])];
        let city = Coordinate::new(5.0, 1.0);

        let to_first = great_circle_distance(&city, &Coordinate::new(0.0, 0.0));
        let to_second = great_circle_distance(&city, &Coordinate::new(0.0, 10.0));
        let actual = min_distance_to_coastline(&city, &coastline);

        assert!((actual - to_first.min(to_second)).abs() < 1e-9);
        // Distance to the segment itself would be roughly 5 degrees of
        // latitude; the vertex distance is larger.
        assert!(actual > EARTH_RADIUS_MILES * 5.0_f64.to_radians());
    }

    #[test]
    fn classifies_against_threshold() {
        assert_eq!(classify_risk(0.0, 10.0), RiskCategory::Submerged);
        assert_eq!(classify_risk(10.0, 10.0), RiskCategory::Submerged);
        assert_eq!(classify_risk(15.0, 10.0), RiskCategory::AtRisk);
        assert_eq!(classify_risk(20.0, 10.0), RiskCategory::AtRisk);
        assert_eq!(classify_risk(20.1, 10.0), RiskCategory::LowRisk);
    }
}
