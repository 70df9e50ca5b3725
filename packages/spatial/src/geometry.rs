//! Coastline and city geometry parsed from `GeoJSON`.
//!
//! Coastlines arrive as `LineString` / `MultiLineString` features with
//! `[lon, lat]` coordinates; cities arrive as `Point` features carrying a
//! `name` property. Each city's distance to the coast is computed once when
//! the store is built.

use climate_risk_models::{City, CoastlineFeature, Coordinate};
use geo::MultiLineString;
use geojson::{Feature, GeoJson, feature::Id};

use crate::GeometryError;
use crate::distance::{self, NO_COASTLINE_DISTANCE};

/// Coastline polylines plus the city roster with coastline distances
/// attached.
pub struct GeometryStore {
    coastlines: Vec<CoastlineFeature>,
    cities: Vec<City>,
}

impl GeometryStore {
    /// Builds the store, attaching `distance_to_coast` to every city.
    ///
    /// Runs in O(cities × coastline vertices).
    #[must_use]
    pub fn new(coastlines: Vec<CoastlineFeature>, roster: Vec<City>) -> Self {
        let vertex_count: usize = coastlines.iter().map(CoastlineFeature::vertex_count).sum();

        if vertex_count == 0 && !roster.is_empty() {
            log::warn!(
                "No coastline vertices loaded; all {} cities get the no-data distance {NO_COASTLINE_DISTANCE}",
                roster.len()
            );
        }

        let cities: Vec<City> = roster
            .into_iter()
            .map(|city| {
                let miles = distance::min_distance_to_coastline(&city.coordinate, &coastlines);
                city.with_distance_to_coast(miles)
            })
            .collect();

        log::info!(
            "Loaded {} coastline features ({vertex_count} vertices) and {} cities",
            coastlines.len(),
            cities.len()
        );

        Self { coastlines, cities }
    }

    /// All coastline features.
    #[must_use]
    pub fn coastlines(&self) -> &[CoastlineFeature] {
        &self.coastlines
    }

    /// All cities in roster order.
    #[must_use]
    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    /// Looks up a city by roster id.
    #[must_use]
    pub fn city(&self, id: &str) -> Option<&City> {
        self.cities.iter().find(|city| city.id == id)
    }

    /// Whether any coastline vertex is loaded.
    #[must_use]
    pub fn has_coastline_data(&self) -> bool {
        self.coastlines.iter().any(|c| c.vertex_count() > 0)
    }

    /// Minimum distance in miles from an arbitrary point to the coastline.
    #[must_use]
    pub fn distance_to_coast(&self, point: &Coordinate) -> f64 {
        distance::min_distance_to_coastline(point, &self.coastlines)
    }
}

/// Parses a coastline `GeoJSON` document.
///
/// Features whose geometry is neither `LineString` nor `MultiLineString` are
/// skipped.
///
/// # Errors
///
/// Returns [`GeometryError`] if the payload is not UTF-8 or not valid
/// `GeoJSON`.
pub fn parse_coastlines(bytes: &[u8]) -> Result<Vec<CoastlineFeature>, GeometryError> {
    let features = parse_features(bytes)?;
    let mut coastlines = Vec::with_capacity(features.len());

    for (i, feature) in features.into_iter().enumerate() {
        let Some(geometry) = feature.geometry else {
            log::debug!("Coastline feature {i} has no geometry, skipping");
            continue;
        };

        let geo_geom: geo::Geometry<f64> = geometry.try_into()?;
        match geo_geom {
            geo::Geometry::LineString(line) => {
                coastlines.push(CoastlineFeature::new(MultiLineString::new(vec![line])));
            }
            geo::Geometry::MultiLineString(lines) => {
                coastlines.push(CoastlineFeature::new(lines));
            }
            other => {
                log::debug!(
                    "Coastline feature {i} has unsupported geometry {}, skipping",
                    geometry_name(&other)
                );
            }
        }
    }

    Ok(coastlines)
}

/// Parses a city roster `GeoJSON` document of `Point` features.
///
/// The city id is the feature `id` when present, otherwise the feature's
/// position in the collection. Features without a point geometry or a
/// `name` property are skipped.
///
/// # Errors
///
/// Returns [`GeometryError`] if the payload is not UTF-8 or not valid
/// `GeoJSON`.
pub fn parse_cities(bytes: &[u8]) -> Result<Vec<City>, GeometryError> {
    let features = parse_features(bytes)?;
    let mut cities = Vec::with_capacity(features.len());

    for (i, feature) in features.into_iter().enumerate() {
        let Some(name) = feature
            .property("name")
            .and_then(|v| v.as_str())
            .map(str::to_string)
        else {
            log::debug!("City feature {i} has no name, skipping");
            continue;
        };

        let id = match &feature.id {
            Some(Id::String(s)) => s.clone(),
            Some(Id::Number(n)) => n.to_string(),
            None => i.to_string(),
        };

        let Some(geometry) = feature.geometry else {
            log::debug!("City {name} has no geometry, skipping");
            continue;
        };

        let geo_geom: geo::Geometry<f64> = geometry.try_into()?;
        let geo::Geometry::Point(point) = geo_geom else {
            log::debug!("City {name} is not a point, skipping");
            continue;
        };

        cities.push(City::new(id, name, Coordinate::from(point.0)));
    }

    Ok(cities)
}

/// Flattens a `FeatureCollection`, a lone `Feature`, or a bare geometry into
/// a list of features.
fn parse_features(bytes: &[u8]) -> Result<Vec<Feature>, GeometryError> {
    let text = std::str::from_utf8(bytes)?;
    let geojson: GeoJson = text.parse()?;

    Ok(match geojson {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(geometry) => vec![Feature::from(geometry)],
    })
}

const fn geometry_name(geometry: &geo::Geometry<f64>) -> &'static str {
    match geometry {
        geo::Geometry::Point(_) => "Point",
        geo::Geometry::Line(_) => "Line",
        geo::Geometry::LineString(_) => "LineString",
        geo::Geometry::Polygon(_) => "Polygon",
        geo::Geometry::MultiPoint(_) => "MultiPoint",
        geo::Geometry::MultiLineString(_) => "MultiLineString",
        geo::Geometry::MultiPolygon(_) => "MultiPolygon",
        geo::Geometry::GeometryCollection(_) => "GeometryCollection",
        geo::Geometry::Rect(_) => "Rect",
        geo::Geometry::Triangle(_) => "Triangle",
    }
}
