#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Ingestion of the IPRESS health-facility registry.
//!
//! The registry is published as a delimited text export whose byte
//! encoding has varied across vintages, so loading goes through an
//! encoding-sniffing reader before the CSV layer sees any bytes. The
//! cleaned output contains only operational facilities with plausible
//! coordinates, renamed into the canonical [`FacilityRecord`] schema.
//!
//! [`FacilityRecord`]: salud_map_models::FacilityRecord

pub mod encoding;
pub mod facility;

use std::path::Path;

use salud_map_models::FacilityRecord;
use thiserror::Error;

/// Errors that can occur while ingesting the facility registry.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The input file does not exist.
    #[error("File not found: {0}")]
    MissingFile(String),

    /// I/O failure reading the input file.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Every candidate encoding produced malformed sequences.
    #[error("Could not decode {path}: tried {tried}")]
    Encoding {
        /// Path that caused the error.
        path: String,
        /// Comma-separated list of encodings attempted.
        tried: String,
    },

    /// A required column is absent from the header row.
    #[error("Missing required column: {column}")]
    Schema {
        /// Folded name of the missing column.
        column: String,
    },

    /// CSV parsing failed structurally (e.g. unreadable header row).
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Loads, decodes, filters, and normalizes the facility registry file.
///
/// An empty output is valid: a file where no row passes the filters
/// yields `Ok(vec![])`, not an error.
///
/// # Errors
///
/// Returns [`IngestError`] if the file is missing, cannot be decoded by
/// any candidate encoding, or lacks a required column.
pub fn load_and_clean_facilities(path: &Path) -> Result<Vec<FacilityRecord>, IngestError> {
    if !path.exists() {
        return Err(IngestError::MissingFile(path.display().to_string()));
    }

    let decoded = encoding::read_to_string(path)?;
    log::info!(
        "Decoded {} as {} ({} bytes)",
        path.display(),
        decoded.encoding,
        decoded.text.len()
    );

    facility::clean_facilities(&decoded.text)
}
