//! Nearest-neighbor lookup over scattered climate samples.
//!
//! Samples are indexed in an R-tree keyed by `[lat, lng]` and compared by
//! squared planar distance in degree space. The closest sample always wins,
//! even when it has no value for the requested period. Ties go to the
//! sample that appeared first in the source dataset.

use climate_risk_models::{ClimateSamplePoint, Coordinate, Period};
use rstar::{AABB, PointDistance, RTree, RTreeObject};

/// A sample position stored in the R-tree, pointing back into the sample
/// list by source order.
struct SampleEntry {
    position: usize,
    coordinate: Coordinate,
}

impl RTreeObject for SampleEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.coordinate.as_lat_lng())
    }
}

impl PointDistance for SampleEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        self.coordinate
            .planar_distance_2(&Coordinate::new(point[0], point[1]))
    }
}

/// Immutable index of climate samples.
pub struct ClimateIndex {
    samples: Vec<ClimateSamplePoint>,
    tree: RTree<SampleEntry>,
}

impl ClimateIndex {
    /// Builds the index. Sample order is significant for tie-breaking.
    ///
    /// Samples with a NaN coordinate are kept in the sample list but never
    /// returned by a lookup.
    #[must_use]
    pub fn new(samples: Vec<ClimateSamplePoint>) -> Self {
        let entries: Vec<SampleEntry> = samples
            .iter()
            .enumerate()
            .filter(|(_, sample)| {
                !sample.coordinate.latitude.is_nan() && !sample.coordinate.longitude.is_nan()
            })
            .map(|(position, sample)| SampleEntry {
                position,
                coordinate: sample.coordinate,
            })
            .collect();

        let skipped = samples.len() - entries.len();
        if skipped > 0 {
            log::warn!("Skipped {skipped} climate samples with NaN coordinates");
        }

        let tree = RTree::bulk_load(entries);
        log::info!("Loaded {} climate samples into nearest-neighbor index", tree.size());

        Self { samples, tree }
    }

    /// Number of samples held (including any that are not indexable).
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the index holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// All samples in source order.
    #[must_use]
    pub fn samples(&self) -> &[ClimateSamplePoint] {
        &self.samples
    }

    /// Periods that at least one sample defines, in chronological order.
    #[must_use]
    pub fn periods(&self) -> Vec<Period> {
        let mut periods: Vec<Period> = self
            .samples
            .iter()
            .flat_map(|sample| sample.values.keys().copied())
            .collect();
        periods.sort_unstable();
        periods.dedup();
        periods
    }

    /// The sample closest to `point`, if any.
    #[must_use]
    pub fn nearest_sample(&self, point: &Coordinate) -> Option<&ClimateSamplePoint> {
        if point.latitude.is_nan() || point.longitude.is_nan() {
            return None;
        }

        let query = point.as_lat_lng();
        let mut candidates = self.tree.nearest_neighbor_iter_with_distance_2(&query);
        let (first, best_distance) = candidates.next()?;

        // The iterator does not order equidistant samples, so drain every
        // candidate at the minimal distance and keep the earliest one.
        let mut winner = first.position;
        for (entry, distance) in candidates {
            if distance > best_distance {
                break;
            }
            winner = winner.min(entry.position);
        }

        self.samples.get(winner)
    }

    /// Value of the nearest sample for `period`.
    ///
    /// Returns `None` when the index is empty or when the nearest sample has
    /// no value for `period`; there is no fallback to the next-nearest.
    #[must_use]
    pub fn nearest_value(&self, point: &Coordinate, period: Period) -> Option<f64> {
        self.nearest_sample(point)?.value(period)
    }
}
