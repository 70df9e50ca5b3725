//! Decoders from fetched bytes to in-memory dataset structures.

use std::collections::{BTreeMap, BTreeSet};

use climate_risk_emissions::{EmissionsAggregator, EmissionsParser};
use climate_risk_models::{
    AnomalyValues, City, ClimateSamplePoint, CoastlineFeature, Coordinate, Period,
    TemperatureAnomalyPoint,
};
use climate_risk_spatial::geometry;
use serde::Deserialize;

use crate::{DatasetKind, DatasetSource, LoadError};

/// A decoded dataset, tagged by kind.
#[derive(Debug)]
pub enum DecodedDataset {
    Climate(Vec<ClimateSamplePoint>),
    Coastlines(Vec<CoastlineFeature>),
    Anomalies(Vec<TemperatureAnomalyPoint>),
    Emissions(EmissionsAggregator),
    Cities(Vec<City>),
}

/// Decodes `bytes` according to `source.kind`.
///
/// # Errors
///
/// Returns [`LoadError::Decode`] naming the source if the payload is not in
/// the expected format, or [`LoadError::InvalidManifest`] if the source's
/// options are unusable.
pub fn decode(source: &DatasetSource, bytes: &[u8]) -> Result<DecodedDataset, LoadError> {
    let fail = |message: String| LoadError::Decode {
        kind: source.kind,
        format: source.kind.format(),
        url: source.url.clone(),
        message,
    };

    Ok(match source.kind {
        DatasetKind::Climate => {
            DecodedDataset::Climate(decode_climate(bytes).map_err(|e| fail(e.to_string()))?)
        }
        DatasetKind::Anomalies => {
            DecodedDataset::Anomalies(decode_anomalies(bytes).map_err(|e| fail(e.to_string()))?)
        }
        DatasetKind::Coastlines => DecodedDataset::Coastlines(
            geometry::parse_coastlines(bytes).map_err(|e| fail(e.to_string()))?,
        ),
        DatasetKind::Cities => {
            DecodedDataset::Cities(geometry::parse_cities(bytes).map_err(|e| fail(e.to_string()))?)
        }
        DatasetKind::Emissions => {
            let mut parser = EmissionsParser::new();
            if let Some(delimiter) = source.delimiter_byte()? {
                parser = parser.with_delimiter(delimiter);
            }
            if let Some(column) = &source.sector_column {
                parser = parser.with_sector_column(column);
            }
            DecodedDataset::Emissions(parser.parse(bytes).map_err(|e| fail(e.to_string()))?)
        }
    })
}

#[derive(Deserialize)]
struct RawClimatePoint {
    lat: Option<f64>,
    lng: Option<f64>,
    #[serde(flatten)]
    fields: BTreeMap<String, serde_json::Value>,
}

/// Decodes a JSON array of `{lat, lng, temp_<period>: number|null}`.
///
/// `null` and non-numeric temperatures are absent. Fields naming an unknown
/// period are skipped with a warning, once per label. Points without a
/// coordinate are skipped.
///
/// # Errors
///
/// Returns [`serde_json::Error`] if the payload is not a JSON array of
/// objects.
pub fn decode_climate(bytes: &[u8]) -> Result<Vec<ClimateSamplePoint>, serde_json::Error> {
    let raw: Vec<RawClimatePoint> = serde_json::from_slice(bytes)?;
    let mut unknown = BTreeSet::new();
    let mut skipped = 0_usize;
    let mut points = Vec::with_capacity(raw.len());

    for point in raw {
        let (Some(lat), Some(lng)) = (point.lat, point.lng) else {
            skipped += 1;
            continue;
        };

        let mut values = BTreeMap::new();
        for (field, value) in &point.fields {
            match Period::from_temp_field(field) {
                None => {}
                Some(Err(e)) => {
                    if unknown.insert(e.label.clone()) {
                        log::warn!("Skipping climate field '{field}': {e}");
                    }
                }
                Some(Ok(period)) => {
                    if let Some(v) = value.as_f64() {
                        values.insert(period, v);
                    } else if !value.is_null() {
                        log::trace!("Non-numeric {field} at ({lat}, {lng}): {value}");
                    }
                }
            }
        }

        points.push(ClimateSamplePoint {
            coordinate: Coordinate::new(lat, lng),
            values,
        });
    }

    if skipped > 0 {
        log::debug!("Skipped {skipped} climate points without coordinates");
    }

    Ok(points)
}

#[derive(Deserialize)]
struct RawAnomalyPoint {
    lat: Option<f64>,
    lon: Option<f64>,
    #[serde(default)]
    periods: BTreeMap<String, AnomalyValues>,
}

/// Decodes a JSON array of `{lat, lon, periods: {<label>: {avg, diff}}}`.
///
/// Unknown period labels are skipped with a warning, once per label. Points
/// without a coordinate are skipped.
///
/// # Errors
///
/// Returns [`serde_json::Error`] if the payload does not match that shape.
pub fn decode_anomalies(bytes: &[u8]) -> Result<Vec<TemperatureAnomalyPoint>, serde_json::Error> {
    let raw: Vec<RawAnomalyPoint> = serde_json::from_slice(bytes)?;
    let total = raw.len();
    let mut unknown = BTreeSet::new();

    let points: Vec<_> = raw
        .into_iter()
        .filter_map(|point| {
            let (Some(lat), Some(lon)) = (point.lat, point.lon) else {
                return None;
            };

            let periods = point
                .periods
                .into_iter()
                .filter_map(|(label, values)| match Period::from_label(&label) {
                    Ok(period) => Some((period, values)),
                    Err(e) => {
                        if unknown.insert(label) {
                            log::warn!("Skipping anomaly period: {e}");
                        }
                        None
                    }
                })
                .collect();

            Some(TemperatureAnomalyPoint {
                coordinate: Coordinate::new(lat, lon),
                periods,
            })
        })
        .collect();

    let skipped = total - points.len();
    if skipped > 0 {
        log::debug!("Skipped {skipped} anomaly points without coordinates");
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DatasetFormat;

    #[test]
    fn decodes_climate_points() {
        let json = br#"[
            {"lat": 0.0, "lng": 0.0, "temp_2021-2040": 14.2, "temp_2041-2060": null, "id": 7},
            {"lat": 1.0, "lng": 1.0, "temp_2021-2040": 0.0, "temp_1850-1900": 11.0},
            {"lat": null, "lng": 2.0, "temp_2021-2040": 3.0}
        ]"#;
        let points = decode_climate(json).unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].value(Period::NearTerm), Some(14.2));
        assert_eq!(points[0].value(Period::MidCentury), None);
        assert_eq!(points[1].value(Period::NearTerm), Some(0.0));
        assert_eq!(points[1].values.len(), 1);
        assert_eq!(points[1].coordinate, Coordinate::new(1.0, 1.0));
    }

    #[test]
    fn climate_rejects_non_array() {
        assert!(decode_climate(br#"{"lat": 0}"#).is_err());
    }

    #[test]
    fn decodes_anomaly_points() {
        let json = br#"[
            {"lat": 10.0, "lon": 20.0, "periods": {
                "2021-2040": {"avg": 15.0, "diff": 0.0},
                "2081-2100": {"avg": 19.0, "diff": null},
                "2200-2220": {"avg": 30.0, "diff": 9.0}
            }},
            {"lat": 11.0, "lon": 21.0}
        ]"#;
        let points = decode_anomalies(json).unwrap();

        assert_eq!(points.len(), 2);
        let first = &points[0];
        assert_eq!(first.coordinate, Coordinate::new(10.0, 20.0));
        assert_eq!(first.periods.len(), 2);
        assert_eq!(first.periods[&Period::NearTerm].diff, Some(0.0));
        assert_eq!(first.periods[&Period::EndOfCentury].diff, None);
        assert_eq!(first.periods[&Period::EndOfCentury].avg, Some(19.0));
        assert!(points[1].periods.is_empty());
    }

    #[test]
    fn anomaly_points_without_coordinates_are_skipped() {
        let json = br#"[
            {"lat": null, "lon": 1.0, "periods": {"2021-2040": {"avg": 15.0, "diff": 1.0}}},
            {"lon": 2.0},
            {"lat": 3.0, "lon": 4.0, "periods": {"2021-2040": {"avg": 16.0, "diff": 2.0}}}
        ]"#;
        let points = decode_anomalies(json).unwrap();

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].coordinate, Coordinate::new(3.0, 4.0));
        assert_eq!(points[0].periods[&Period::NearTerm].diff, Some(2.0));
    }

    #[test]
    fn decode_dispatches_on_kind() {
        let source = DatasetSource::new(DatasetKind::Climate, "mem://climate");
        let decoded = decode(&source, br#"[{"lat": 1.0, "lng": 2.0}]"#).unwrap();
        assert!(matches!(decoded, DecodedDataset::Climate(points) if points.len() == 1));

        let mut source = DatasetSource::new(DatasetKind::Emissions, "mem://edgar");
        source.delimiter = Some(";".to_string());
        let decoded = decode(&source, b"Country_code_A3;Name;Y_2000\nFRA;France;2.5\n").unwrap();
        let DecodedDataset::Emissions(agg) = decoded else {
            panic!("expected emissions");
        };
        assert!((agg.global_total_for_year(2000) - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn decode_errors_name_the_source() {
        let source = DatasetSource::new(DatasetKind::Coastlines, "https://example.org/coast.geojson");
        let err = decode(&source, b"not geojson").unwrap_err();
        let message = err.to_string();
        assert!(matches!(
            err,
            LoadError::Decode {
                kind: DatasetKind::Coastlines,
                format: DatasetFormat::GeoJson,
                ..
            }
        ));
        assert!(message.contains("coastlines"), "{message}");
        assert!(message.contains("as geojson"), "{message}");
        assert!(message.contains("https://example.org/coast.geojson"), "{message}");
    }
}
