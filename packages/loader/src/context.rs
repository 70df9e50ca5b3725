//! The populated engine state every query runs against.

use std::collections::BTreeMap;

use climate_risk_emissions::EmissionsAggregator;
use climate_risk_models::{
    City, CityAssessment, ClimateSamplePoint, CoastlineFeature, Coordinate, Period, RiskCategory,
    TemperatureAnomalyPoint,
};
use climate_risk_spatial::{ClimateIndex, GeometryStore, distance};
use climate_risk_temporal::{AnomalySet, TemporalComparator};

use crate::LoadError;
use crate::decode::DecodedDataset;

/// Immutable stores produced by a successful load.
pub struct EngineContext {
    geometry: GeometryStore,
    climate: ClimateIndex,
    anomalies: AnomalySet,
    emissions: EmissionsAggregator,
}

impl EngineContext {
    #[must_use]
    pub const fn new(
        geometry: GeometryStore,
        climate: ClimateIndex,
        anomalies: AnomalySet,
        emissions: EmissionsAggregator,
    ) -> Self {
        Self {
            geometry,
            climate,
            anomalies,
            emissions,
        }
    }

    #[must_use]
    pub const fn geometry(&self) -> &GeometryStore {
        &self.geometry
    }

    #[must_use]
    pub const fn climate(&self) -> &ClimateIndex {
        &self.climate
    }

    #[must_use]
    pub const fn anomalies(&self) -> &AnomalySet {
        &self.anomalies
    }

    #[must_use]
    pub const fn emissions(&self) -> &EmissionsAggregator {
        &self.emissions
    }

    #[must_use]
    pub const fn comparator(&self) -> TemporalComparator<'_> {
        TemporalComparator::new(&self.climate)
    }

    /// Climate value of the nearest sample for `period`.
    #[must_use]
    pub fn nearest_value(&self, point: &Coordinate, period: Period) -> Option<f64> {
        self.climate.nearest_value(point, period)
    }

    /// Change between two periods at `point`.
    #[must_use]
    pub fn change(&self, point: &Coordinate, from: Period, to: Period) -> Option<f64> {
        self.comparator().change(point, from, to)
    }

    /// Precomputed anomaly diff of the anomaly cell nearest to `point`.
    #[must_use]
    pub fn anomaly_diff(&self, point: &Coordinate, period: Period) -> Option<f64> {
        self.anomalies.diff_at(point, period)
    }

    /// Minimum distance in miles from `point` to any coastline vertex, or
    /// the no-data sentinel `0`.
    #[must_use]
    pub fn min_distance_to_coastline(&self, point: &Coordinate) -> f64 {
        self.geometry.distance_to_coast(point)
    }

    /// Classifies and annotates a single city.
    #[must_use]
    pub fn assess_city(&self, city: &City, threshold: f64, period: Period) -> CityAssessment {
        CityAssessment {
            id: city.id.clone(),
            name: city.name.clone(),
            coordinate: city.coordinate,
            distance_to_coast: city.distance_to_coast,
            risk: distance::classify_risk(city.distance_to_coast, threshold),
            real_temp: self.nearest_value(&city.coordinate, period),
            temp_change: self.change(&city.coordinate, Period::FIRST_PROJECTION, period),
        }
    }

    /// Assesses every city in roster order.
    #[must_use]
    pub fn assess_cities(&self, threshold: f64, period: Period) -> Vec<CityAssessment> {
        self.geometry
            .cities()
            .iter()
            .map(|city| self.assess_city(city, threshold, period))
            .collect()
    }

    /// Number of cities in each risk category for `threshold`.
    #[must_use]
    pub fn risk_counts(&self, threshold: f64) -> BTreeMap<RiskCategory, usize> {
        let mut counts = BTreeMap::new();
        for city in self.geometry.cities() {
            *counts
                .entry(distance::classify_risk(city.distance_to_coast, threshold))
                .or_insert(0) += 1;
        }
        counts
    }
}

/// Collects decoded datasets until every required kind has arrived.
#[derive(Default)]
pub(crate) struct ContextBuilder {
    climate: Option<Vec<ClimateSamplePoint>>,
    coastlines: Option<Vec<CoastlineFeature>>,
    cities: Option<Vec<City>>,
    anomalies: Vec<TemperatureAnomalyPoint>,
    emissions: EmissionsAggregator,
}

impl ContextBuilder {
    pub(crate) fn add(&mut self, dataset: DecodedDataset) {
        match dataset {
            DecodedDataset::Climate(points) => self.climate = Some(points),
            DecodedDataset::Coastlines(features) => self.coastlines = Some(features),
            DecodedDataset::Cities(cities) => self.cities = Some(cities),
            DecodedDataset::Anomalies(points) => self.anomalies = points,
            DecodedDataset::Emissions(aggregator) => self.emissions = aggregator,
        }
    }

    pub(crate) fn build(self) -> Result<EngineContext, LoadError> {
        let missing = |kind: &str| LoadError::InvalidManifest {
            message: format!("no {kind} dataset was loaded"),
        };

        let climate = self.climate.ok_or_else(|| missing("climate"))?;
        let coastlines = self.coastlines.ok_or_else(|| missing("coastlines"))?;
        let cities = self.cities.ok_or_else(|| missing("cities"))?;

        Ok(EngineContext::new(
            GeometryStore::new(coastlines, cities),
            ClimateIndex::new(climate),
            AnomalySet::new(self.anomalies),
            self.emissions,
        ))
    }
}
