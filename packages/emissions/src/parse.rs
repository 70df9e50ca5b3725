//! Emissions table parser.
//!
//! Reads a delimited table whose header row contains `Country_code_A3`,
//! `Name`, a sector column, and one `Y_<year>` column per reporting year.
//! Every non-empty numeric year cell becomes one sector contribution to
//! the country's record for that year.

use crate::{EmissionsAggregator, EmissionsError};

/// Header of the ISO alpha-3 country code column.
pub const COUNTRY_CODE_COLUMN: &str = "Country_code_A3";

/// Header of the country name column.
pub const COUNTRY_NAME_COLUMN: &str = "Name";

/// Prefix of the per-year value columns.
pub const YEAR_COLUMN_PREFIX: &str = "Y_";

/// Sector headers tried in order when no explicit sector column is set.
pub const DEFAULT_SECTOR_COLUMNS: &[&str] = &[
    "Sector",
    "sector",
    "ipcc_code_2006_for_standard_report_name",
];

/// Sector label used when the table has no sector column or the cell is
/// empty.
pub const UNSPECIFIED_SECTOR: &str = "Unspecified";

/// Parser for emissions tables.
#[derive(Debug, Clone)]
pub struct EmissionsParser {
    /// Field delimiter byte (defaults to `,`).
    delimiter: u8,
    /// Explicit sector column header, overriding [`DEFAULT_SECTOR_COLUMNS`].
    sector_column: Option<String>,
}

impl Default for EmissionsParser {
    fn default() -> Self {
        Self::new()
    }
}

impl EmissionsParser {
    /// Creates a comma-delimited parser that auto-detects the sector column.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            delimiter: b',',
            sector_column: None,
        }
    }

    /// Sets the field delimiter (e.g. `b'\t'` for TSV files).
    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Uses `header` as the sector column.
    #[must_use]
    pub fn with_sector_column(mut self, header: &str) -> Self {
        self.sector_column = Some(header.to_owned());
        self
    }

    /// Parses a whole table into an aggregate.
    ///
    /// Rows without a country code or name are skipped, as are empty or
    /// non-numeric year cells.
    ///
    /// # Errors
    ///
    /// Returns [`EmissionsError`] if the CSV is malformed, a required
    /// column is missing, or an explicitly configured sector column does
    /// not exist.
    pub fn parse(&self, bytes: &[u8]) -> Result<EmissionsAggregator, EmissionsError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_owned())
            .collect();

        let column = |name: &str| headers.iter().position(|h| h == name);

        let code_idx = column(COUNTRY_CODE_COLUMN).ok_or_else(|| EmissionsError::MissingColumn {
            column: COUNTRY_CODE_COLUMN.to_owned(),
        })?;
        let name_idx = column(COUNTRY_NAME_COLUMN).ok_or_else(|| EmissionsError::MissingColumn {
            column: COUNTRY_NAME_COLUMN.to_owned(),
        })?;

        let sector_idx = match &self.sector_column {
            Some(header) => Some(column(header.as_str()).ok_or_else(|| EmissionsError::MissingColumn {
                column: header.clone(),
            })?),
            None => DEFAULT_SECTOR_COLUMNS.iter().find_map(|&h| column(h)),
        };
        if sector_idx.is_none() {
            log::warn!("No sector column found; attributing all values to '{UNSPECIFIED_SECTOR}'");
        }

        let year_columns: Vec<(usize, u16)> = headers
            .iter()
            .enumerate()
            .filter_map(|(i, h)| {
                let year = h.strip_prefix(YEAR_COLUMN_PREFIX)?.parse().ok()?;
                Some((i, year))
            })
            .collect();

        if year_columns.is_empty() {
            return Err(EmissionsError::MissingColumn {
                column: format!("{YEAR_COLUMN_PREFIX}<year>"),
            });
        }

        let mut aggregator = EmissionsAggregator::default();
        let mut rows: u64 = 0;
        let mut skipped: u64 = 0;

        for result in reader.records() {
            let record = result?;
            rows += 1;

            let code = record.get(code_idx).unwrap_or("").trim();
            let name = record.get(name_idx).unwrap_or("").trim();
            if code.is_empty() || name.is_empty() {
                skipped += 1;
                log::trace!("Skipping emissions row {rows}: missing country code or name");
                continue;
            }

            let sector = sector_idx
                .and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(UNSPECIFIED_SECTOR);

            for &(i, year) in &year_columns {
                let cell = record.get(i).unwrap_or("").trim();
                if cell.is_empty() {
                    continue;
                }
                match cell.parse::<f64>() {
                    Ok(value) if value.is_finite() => {
                        aggregator.insert(code, name, sector, year, value);
                    }
                    _ => log::trace!("Skipping non-numeric cell '{cell}' for {code} in {year}"),
                }
            }
        }

        log::info!(
            "Parsed {rows} emissions rows ({skipped} skipped) into {} countries across {} years",
            aggregator.country_count(),
            aggregator.years().len()
        );

        Ok(aggregator)
    }
}
