//! Error types for zone resolution and GRIB downloads.

use std::path::PathBuf;

use thiserror::Error;

use crate::template::TemplateError;

/// Result type alias using GribError.
pub type GribResult<T> = Result<T, GribError>;

/// Boxed transport error, so this crate does not depend on an HTTP client.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Primary error type for resolve and download operations.
///
/// Every variant is terminal for the call that produced it.
#[derive(Debug, Error)]
pub enum GribError {
    // === Resolution Errors ===
    #[error("Unknown zone: {0}")]
    UnknownZone(String),

    #[error("Incomplete coordinates, missing: {}", .missing.join(", "))]
    IncompleteCoordinates { missing: Vec<&'static str> },

    #[error("No coordinates: set a zone or pass long_min, long_max, lat_min and lat_max")]
    MissingCoordinates,

    #[error("Invalid URL template for model '{model}': {source}")]
    Template {
        model: String,
        #[source]
        source: TemplateError,
    },

    // === Transfer Errors ===
    #[error("Request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Download of {url} cancelled")]
    Cancelled { url: String },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_yaml::Error> for GribError {
    fn from(err: serde_yaml::Error) -> Self {
        GribError::Config(format!("YAML error: {}", err))
    }
}
