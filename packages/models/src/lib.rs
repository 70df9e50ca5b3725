#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared climate, coastline, city, and emissions data types.
//!
//! Every store in the engine is built from these types once at load time
//! and treated as read-only afterwards. Query results that depend on user
//! parameters (threshold, period, year) are returned as separate derived
//! values such as [`CityAssessment`] rather than written back.

use std::collections::BTreeMap;

use geo::MultiLineString;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

/// Prefix of the per-period temperature fields in the climate point dataset.
pub const TEMP_FIELD_PREFIX: &str = "temp_";

/// A (latitude, longitude) pair in degrees.
///
/// No range validation is performed. Out-of-range values are accepted and
/// simply produce degenerate distances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    /// Latitude in degrees (nominally -90 to 90).
    pub latitude: f64,
    /// Longitude in degrees (nominally -180 to 180).
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate from latitude and longitude in degrees.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns the coordinate as a `[lat, lng]` point for planar indexing.
    #[must_use]
    pub const fn as_lat_lng(&self) -> [f64; 2] {
        [self.latitude, self.longitude]
    }

    /// Squared planar distance in (lat, lng) degree space.
    ///
    /// Only meaningful for ordering candidates, never as a real distance.
    /// Evaluated as `dlat² + dlng²` without fused multiply-add so the result
    /// is bit-identical to the `rstar` envelope metric.
    #[must_use]
    #[allow(clippy::suboptimal_flops)]
    pub fn planar_distance_2(&self, other: &Self) -> f64 {
        let dlat = self.latitude - other.latitude;
        let dlng = self.longitude - other.longitude;
        dlat * dlat + dlng * dlng
    }
}

/// `geo` coordinates are `x = longitude`, `y = latitude`.
impl From<geo::Coord<f64>> for Coordinate {
    fn from(coord: geo::Coord<f64>) -> Self {
        Self::new(coord.y, coord.x)
    }
}

/// A labeled projection period.
///
/// The set of labels is closed: datasets that mention any other period are
/// rejected for that field at parse time.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    IntoStaticStr,
    EnumIter,
)]
pub enum Period {
    /// Historical baseline that anomaly diffs are measured against.
    #[serde(rename = "1970-2000")]
    #[strum(serialize = "1970-2000")]
    Baseline,
    #[serde(rename = "2021-2040")]
    #[strum(serialize = "2021-2040")]
    NearTerm,
    #[serde(rename = "2041-2060")]
    #[strum(serialize = "2041-2060")]
    MidCentury,
    #[serde(rename = "2061-2080")]
    #[strum(serialize = "2061-2080")]
    LateCentury,
    #[serde(rename = "2081-2100")]
    #[strum(serialize = "2081-2100")]
    EndOfCentury,
}

impl Period {
    /// Projection periods in chronological order.
    pub const PROJECTIONS: [Self; 4] = [
        Self::NearTerm,
        Self::MidCentury,
        Self::LateCentury,
        Self::EndOfCentury,
    ];

    /// The first projection period, used as the reference for city
    /// temperature change.
    pub const FIRST_PROJECTION: Self = Self::NearTerm;

    /// Returns the period label (e.g. `"2021-2040"`).
    #[must_use]
    pub fn label(self) -> &'static str {
        self.into()
    }

    /// Parses a period label.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownPeriodError`] if the label is not a known period.
    pub fn from_label(label: &str) -> Result<Self, UnknownPeriodError> {
        label.parse().map_err(|_| UnknownPeriodError {
            label: label.to_string(),
        })
    }

    /// Interprets a climate dataset field name of the form `temp_<label>`.
    ///
    /// Returns `None` for fields that are not temperature fields at all, and
    /// `Some(Err(..))` for temperature fields naming an unknown period.
    #[must_use]
    pub fn from_temp_field(field: &str) -> Option<Result<Self, UnknownPeriodError>> {
        field
            .strip_prefix(TEMP_FIELD_PREFIX)
            .map(Self::from_label)
    }
}

/// Error returned when a period label is outside the known set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPeriodError {
    /// The label that failed to parse.
    pub label: String,
}

impl std::fmt::Display for UnknownPeriodError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown period label '{}'", self.label)
    }
}

impl std::error::Error for UnknownPeriodError {}

/// A scattered climate projection sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClimateSamplePoint {
    /// Sample location.
    pub coordinate: Coordinate,
    /// Temperature per period. Periods missing or `null` in the source are
    /// absent from the map.
    pub values: BTreeMap<Period, f64>,
}

impl ClimateSamplePoint {
    /// Returns the value for `period`, if the sample defines one.
    #[must_use]
    pub fn value(&self, period: Period) -> Option<f64> {
        self.values.get(&period).copied()
    }
}

/// A coastline made of one or more polylines.
///
/// `LineString` and `MultiLineString` source geometries both collapse to a
/// [`MultiLineString`].
#[derive(Debug, Clone, PartialEq)]
pub struct CoastlineFeature {
    lines: MultiLineString<f64>,
}

impl CoastlineFeature {
    /// Wraps a set of polylines (coordinates are `x = lon`, `y = lat`).
    #[must_use]
    pub const fn new(lines: MultiLineString<f64>) -> Self {
        Self { lines }
    }

    /// Builds a single-polyline feature from `(lat, lng)` coordinates.
    #[must_use]
    pub fn from_coordinates(points: &[Coordinate]) -> Self {
        let line: geo::LineString<f64> = points
            .iter()
            .map(|c| geo::Coord {
                x: c.longitude,
                y: c.latitude,
            })
            .collect();
        Self::new(MultiLineString::new(vec![line]))
    }

    /// The underlying polylines.
    #[must_use]
    pub const fn lines(&self) -> &MultiLineString<f64> {
        &self.lines
    }

    /// Iterates over every vertex of every polyline in order.
    pub fn vertices(&self) -> impl Iterator<Item = Coordinate> + '_ {
        self.lines
            .iter()
            .flat_map(|line| line.coords().copied().map(Coordinate::from))
    }

    /// Total number of vertices across all polylines.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.lines.iter().map(|line| line.0.len()).sum()
    }
}

/// A city from the static roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
    /// Roster identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// City location.
    pub coordinate: Coordinate,
    /// Minimum haversine distance in miles to any coastline vertex.
    ///
    /// Computed once after coastlines load. Zero when no coastline data was
    /// available (see `climate_risk_spatial::distance`).
    pub distance_to_coast: f64,
}

impl City {
    /// Creates a city whose coastline distance has not been computed yet.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            coordinate,
            distance_to_coast: 0.0,
        }
    }

    /// Returns the city with its coastline distance attached.
    #[must_use]
    pub const fn with_distance_to_coast(mut self, miles: f64) -> Self {
        self.distance_to_coast = miles;
        self
    }
}

/// Sea-level risk classification for a city.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RiskCategory {
    /// Within the threshold distance of the coast.
    Submerged,
    /// Within twice the threshold distance.
    AtRisk,
    /// Further inland.
    LowRisk,
}

/// Derived, parameter-dependent view of a [`City`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityAssessment {
    /// Roster identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// City location.
    pub coordinate: Coordinate,
    /// Distance to the nearest coastline vertex in miles.
    pub distance_to_coast: f64,
    /// Classification against the requested threshold.
    pub risk: RiskCategory,
    /// Projected temperature for the requested period.
    pub real_temp: Option<f64>,
    /// Change from the first projection period to the requested period.
    pub temp_change: Option<f64>,
}

/// Emissions for one country in one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyEmissions {
    /// ISO 3166-1 alpha-3 country code.
    pub country_code: String,
    /// Country display name.
    pub country_name: String,
    /// Reporting year.
    pub year: u16,
    /// Sum of every sector value.
    pub total: f64,
    /// Per-sector totals.
    pub sectors: BTreeMap<String, f64>,
}

impl YearlyEmissions {
    /// Creates an empty record.
    #[must_use]
    pub fn new(country_code: impl Into<String>, country_name: impl Into<String>, year: u16) -> Self {
        Self {
            country_code: country_code.into(),
            country_name: country_name.into(),
            year,
            total: 0.0,
            sectors: BTreeMap::new(),
        }
    }

    /// Adds `value` to `sector` and to the total.
    pub fn add(&mut self, sector: &str, value: f64) {
        *self.sectors.entry(sector.to_string()).or_insert(0.0) += value;
        self.total += value;
    }
}

/// Precomputed average and baseline difference for one period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AnomalyValues {
    /// Average temperature over the period.
    pub avg: Option<f64>,
    /// Difference from the baseline period's average.
    pub diff: Option<f64>,
}

/// A temperature anomaly grid cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureAnomalyPoint {
    /// Cell location.
    pub coordinate: Coordinate,
    /// Values per period.
    pub periods: BTreeMap<Period, AnomalyValues>,
}
