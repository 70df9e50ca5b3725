#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Yearly emissions by country and sector.
//!
//! [`parse::EmissionsParser`] reads the row-oriented source table and
//! builds an [`EmissionsAggregator`]: a two-level country → year map of
//! [`YearlyEmissions`] records. Country-wide and global totals are summed
//! on demand rather than maintained incrementally.

pub mod parse;

use std::collections::BTreeMap;

use climate_risk_models::YearlyEmissions;
use thiserror::Error;

pub use parse::EmissionsParser;

/// Errors that can occur while parsing emissions tables.
#[derive(Debug, Error)]
pub enum EmissionsError {
    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required header is absent.
    #[error("Missing column: {column}")]
    MissingColumn {
        /// Header that was expected.
        column: String,
    },
}

/// Country → year → emissions aggregate.
#[derive(Debug, Clone, Default)]
pub struct EmissionsAggregator {
    countries: BTreeMap<String, BTreeMap<u16, YearlyEmissions>>,
}

impl EmissionsAggregator {
    fn insert(&mut self, code: &str, name: &str, sector: &str, year: u16, value: f64) {
        self.countries
            .entry(code.to_owned())
            .or_default()
            .entry(year)
            .or_insert_with(|| YearlyEmissions::new(code, name, year))
            .add(sector, value);
    }

    /// Number of countries with at least one record.
    #[must_use]
    pub fn country_count(&self) -> usize {
        self.countries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    /// Country code → total for `year`. Countries without a record for the
    /// year are omitted.
    #[must_use]
    pub fn emissions_for_year(&self, year: u16) -> BTreeMap<String, f64> {
        self.countries
            .iter()
            .filter_map(|(code, years)| Some((code.clone(), years.get(&year)?.total)))
            .collect()
    }

    /// Total and sector breakdown for a country-year.
    #[must_use]
    pub fn country_detail(&self, country: &str, year: u16) -> Option<&YearlyEmissions> {
        self.countries.get(country)?.get(&year)
    }

    /// Sum of every country's total for `year`. Zero when nothing was
    /// reported.
    #[must_use]
    pub fn global_total_for_year(&self, year: u16) -> f64 {
        self.countries
            .values()
            .filter_map(|years| years.get(&year))
            .map(|record| record.total)
            .sum()
    }

    /// Every year with at least one record, ascending.
    #[must_use]
    pub fn years(&self) -> Vec<u16> {
        let mut years: Vec<u16> = self
            .countries
            .values()
            .flat_map(|years| years.keys().copied())
            .collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    /// `(code, name)` for every country, ordered by code.
    #[must_use]
    pub fn countries(&self) -> Vec<(&str, &str)> {
        self.countries
            .iter()
            .filter_map(|(code, years)| {
                let name = years.values().next()?.country_name.as_str();
                Some((code.as_str(), name))
            })
            .collect()
    }

    /// `(year, total)` for a country, ascending by year.
    #[must_use]
    pub fn country_series(&self, country: &str) -> Vec<(u16, f64)> {
        self.countries
            .get(country)
            .map(|years| years.iter().map(|(&year, r)| (year, r.total)).collect())
            .unwrap_or_default()
    }

    /// The `n` largest emitters for `year`, largest first. Equal totals are
    /// ordered by country code.
    #[must_use]
    pub fn top_emitters(&self, year: u16, n: usize) -> Vec<&YearlyEmissions> {
        let mut records: Vec<&YearlyEmissions> = self
            .countries
            .values()
            .filter_map(|years| years.get(&year))
            .collect();
        records.sort_by(|a, b| {
            b.total
                .total_cmp(&a.total)
                .then_with(|| a.country_code.cmp(&b.country_code))
        });
        records.truncate(n);
        records
    }
}
