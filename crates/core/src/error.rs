//! Error types for fragmesh

use thiserror::Error;

/// Main error type for fragmesh operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(String),

    #[error("CRS mismatch: {0} vs {1}")]
    CrsMismatch(String, String),

    #[error("Missing CRS on {0}")]
    MissingCrs(&'static str),

    #[error("Geographic CRS {0} cannot be used for area calculations; project to a cartesian CRS first")]
    GeographicCrs(String),

    #[error("Empty input: {0}")]
    EmptyInput(&'static str),

    #[error("Unsupported geometry in {layer} feature {index}: expected {expected}, got {found}")]
    UnsupportedGeometry {
        layer: &'static str,
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Region {index} has zero area")]
    DegenerateRegion { index: usize },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("{0}")]
    Other(String),
}

impl From<geojson::Error> for Error {
    fn from(e: geojson::Error) -> Self {
        Error::GeoJson(e.to_string())
    }
}

/// Result type alias for fragmesh operations
pub type Result<T> = std::result::Result<T, Error>;
