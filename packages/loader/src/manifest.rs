//! Dataset manifest.
//!
//! The manifest is a TOML document listing every dataset to load:
//!
//! ```toml
//! [[datasets]]
//! kind = "climate"
//! url = "https://example.org/data/climate_points.json"
//!
//! [[datasets]]
//! kind = "emissions"
//! url = "data/edgar.tsv"
//! delimiter = "\t"
//! sector_column = "ipcc_code_2006_for_standard_report_name"
//! ```
//!
//! `climate`, `coastlines`, and `cities` are required exactly once.
//! `anomalies` and `emissions` are optional but may appear at most once.
//! Datasets load in the order they are listed.

use std::path::Path;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::LoadError;

/// Which in-memory structure a dataset decodes into.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DatasetKind {
    /// Gridded projected temperatures.
    Climate,
    /// Coastline line strings.
    Coastlines,
    /// Precomputed temperature anomaly grid.
    Anomalies,
    /// Country/sector/year emissions table.
    Emissions,
    /// City roster points.
    Cities,
}

impl DatasetKind {
    /// The wire format this kind is decoded from.
    #[must_use]
    pub const fn format(self) -> DatasetFormat {
        match self {
            Self::Climate | Self::Anomalies => DatasetFormat::Json,
            Self::Coastlines | Self::Cities => DatasetFormat::GeoJson,
            Self::Emissions => DatasetFormat::Csv,
        }
    }

    /// Whether a manifest must list this kind.
    #[must_use]
    pub const fn is_required(self) -> bool {
        matches!(self, Self::Climate | Self::Coastlines | Self::Cities)
    }
}

/// On-the-wire encoding of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum DatasetFormat {
    Json,
    GeoJson,
    /// Delimited text (comma by default).
    Csv,
}

/// One entry of the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSource {
    pub kind: DatasetKind,
    /// `http(s)://` URL, `file://` URL, or filesystem path.
    pub url: String,
    /// Field delimiter for emissions tables. Must be a single byte.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
    /// Explicit sector column header for emissions tables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector_column: Option<String>,
}

impl DatasetSource {
    #[must_use]
    pub fn new(kind: DatasetKind, url: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            delimiter: None,
            sector_column: None,
        }
    }

    /// Whether `url` points at the network rather than the filesystem.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        self.url.starts_with("http://") || self.url.starts_with("https://")
    }

    /// The single delimiter byte, if one is configured.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::InvalidManifest`] if the delimiter is not
    /// exactly one byte long.
    pub fn delimiter_byte(&self) -> Result<Option<u8>, LoadError> {
        let Some(delimiter) = &self.delimiter else {
            return Ok(None);
        };
        match delimiter.as_bytes() {
            [byte] => Ok(Some(*byte)),
            _ => Err(LoadError::InvalidManifest {
                message: format!(
                    "{} delimiter must be a single byte, got {delimiter:?}",
                    self.kind
                ),
            }),
        }
    }
}

/// The full list of datasets to load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetManifest {
    /// User-Agent header for remote requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub datasets: Vec<DatasetSource>,
}

impl DatasetManifest {
    /// Parses and validates a manifest.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Toml`] if the TOML is malformed, or
    /// [`LoadError::InvalidManifest`] if it fails validation.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, LoadError> {
        let manifest: Self = toml::de::from_str(toml_str)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Reads a manifest from disk. Relative local dataset paths are
    /// resolved against the manifest's directory.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Io`] if the file cannot be read, otherwise the
    /// same errors as [`DatasetManifest::from_toml_str`].
    pub async fn load(path: &Path) -> Result<Self, LoadError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| LoadError::Io {
                path: path.display().to_string(),
                source: e,
            })?;

        let mut manifest = Self::from_toml_str(&contents)?;

        if let Some(base) = path.parent() {
            for source in &mut manifest.datasets {
                if source.is_remote() || source.url.starts_with("file://") {
                    continue;
                }
                let local = Path::new(&source.url);
                if local.is_relative() {
                    source.url = base.join(local).display().to_string();
                }
            }
        }

        Ok(manifest)
    }

    /// Checks dataset cardinality and per-source options.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::InvalidManifest`] describing the first problem.
    pub fn validate(&self) -> Result<(), LoadError> {
        use strum::IntoEnumIterator as _;

        for kind in DatasetKind::iter() {
            let count = self.datasets.iter().filter(|d| d.kind == kind).count();
            if count > 1 {
                return Err(LoadError::InvalidManifest {
                    message: format!("{kind} is listed {count} times"),
                });
            }
            if count == 0 && kind.is_required() {
                return Err(LoadError::InvalidManifest {
                    message: format!("missing required {kind} dataset"),
                });
            }
        }

        for source in &self.datasets {
            if source.url.trim().is_empty() {
                return Err(LoadError::InvalidManifest {
                    message: format!("{} dataset has an empty url", source.kind),
                });
            }
            source.delimiter_byte()?;
        }

        Ok(())
    }

    /// The source for `kind`, if listed.
    #[must_use]
    pub fn source(&self, kind: DatasetKind) -> Option<&DatasetSource> {
        self.datasets.iter().find(|d| d.kind == kind)
    }
}
