#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory spatial queries for the climate risk engine.
//!
//! - [`distance`]: haversine distance, coastline proximity, and risk
//!   classification.
//! - [`climate_index`]: R-tree backed nearest-sample climate lookups.
//! - [`geometry`]: coastline and city stores parsed from `GeoJSON`.
//!
//! Everything here is built once at load time and then only read.

pub mod climate_index;
pub mod distance;
pub mod geometry;

pub use climate_index::ClimateIndex;
pub use geometry::GeometryStore;

use thiserror::Error;

/// Errors that can occur while parsing geometry payloads.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// The payload was not valid UTF-8.
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// The payload was not valid `GeoJSON`, or a geometry could not be
    /// converted.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
}
