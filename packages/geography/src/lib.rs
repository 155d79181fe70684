#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Loading of the two geographic layers the pipeline consumes: district
//! boundary polygons and the populated-centers point gazetteer.
//!
//! Both arrive as GeoJSON (the gazetteer inside a zip archive). Layers
//! are normalized to WGS84 on load; a legacy `crs` member naming one of
//! Peru's UTM zones triggers reprojection, anything else unsupported is
//! an error rather than a silent assumption.

pub mod centers;
pub mod districts;
mod layer;

use thiserror::Error;

/// Errors that can occur while loading geographic layers.
#[derive(Debug, Error)]
pub enum GeoError {
    /// The input file does not exist.
    #[error("File not found: {0}")]
    MissingFile(String),

    /// I/O failure reading the input.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The archive could not be opened or read.
    #[error("Zip error at {path}: {source}")]
    Zip {
        /// Path to the archive.
        path: String,
        /// Underlying zip error.
        source: zip::result::ZipError,
    },

    /// GeoJSON parsing failed.
    #[error("GeoJSON error: {0}")]
    Json(#[from] geojson::Error),

    /// A required identifying column is absent.
    #[error("Missing required column: {column}")]
    Schema {
        /// Name of the missing column.
        column: String,
    },

    /// The layer declares a coordinate reference system this pipeline
    /// cannot reproject from.
    #[error("Unsupported coordinate reference system: {0}")]
    UnsupportedCrs(String),

    /// The input is structurally not the expected kind of layer.
    #[error("Layer format error: {message}")]
    Format {
        /// Description of what was wrong.
        message: String,
    },
}
