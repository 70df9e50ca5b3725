#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Progressive dataset loading.
//!
//! A [`DatasetManifest`] names one URL or local path per dataset. The
//! [`DatasetLoader`] fetches them in order, reports byte-level progress,
//! decodes each into its in-memory form, and finally assembles an
//! [`EngineContext`] that every query runs against.
//!
//! Loading is all-or-nothing: a single failed file fails the whole load and
//! no partially populated context is ever returned.

pub mod context;
pub mod decode;
pub mod fetch;
pub mod loader;
pub mod manifest;
pub mod progress;

pub use context::EngineContext;
pub use loader::DatasetLoader;
pub use manifest::{DatasetFormat, DatasetKind, DatasetManifest, DatasetSource};
pub use progress::{LoadStatus, NullProgress, ProgressCallback, ProgressTracker, null_progress};

/// Errors that can occur while loading datasets.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(reqwest::Error),

    /// HTTP request error.
    #[error("HTTP error fetching {url}: {source}")]
    Http {
        /// Request URL.
        url: String,
        /// Underlying transport error.
        source: reqwest::Error,
    },

    /// Non-success HTTP status.
    #[error("HTTP {status} for {url}")]
    HttpStatus {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// I/O error reading a local dataset or manifest.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A fetched file could not be decoded.
    #[error("Failed to decode {kind} dataset from {url} as {format}: {message}")]
    Decode {
        /// Which dataset was being decoded.
        kind: DatasetKind,
        /// Encoding the payload was expected to be in.
        format: DatasetFormat,
        /// Where it was fetched from.
        url: String,
        /// Decoder error description.
        message: String,
    },

    /// The manifest TOML is malformed.
    #[error("Manifest parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The manifest parsed but is not usable.
    #[error("Invalid manifest: {message}")]
    InvalidManifest {
        /// What is wrong with it.
        message: String,
    },

    /// [`DatasetLoader::load`] was called more than once.
    #[error("Dataset load already started")]
    AlreadyStarted,
}
