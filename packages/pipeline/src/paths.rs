//! Input-file configuration.
//!
//! Paths are an explicit value passed into the pipeline, not module
//! state, so tests and alternative hosts can point the pipeline at any
//! directory without touching globals.

use std::path::{Path, PathBuf};

/// Default file name of the facility registry export.
pub const FACILITY_FILE: &str = "IPRESS.csv";

/// Default file name of the district boundary layer.
pub const BOUNDARY_FILE: &str = "DISTRITOS.geojson";

/// Default file name of the population-center archive.
pub const CENTERS_FILE: &str = "CCPP_0.zip";

/// Resolved input paths for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    /// Facility registry CSV (required).
    pub facilities: PathBuf,
    /// District boundary GeoJSON (required).
    pub boundaries: PathBuf,
    /// Population-center zip archive (optional input).
    pub population_centers: PathBuf,
}

impl DataPaths {
    /// Resolves the three upstream file names against a data directory.
    #[must_use]
    pub fn from_data_dir(dir: &Path) -> Self {
        Self {
            facilities: dir.join(FACILITY_FILE),
            boundaries: dir.join(BOUNDARY_FILE),
            population_centers: dir.join(CENTERS_FILE),
        }
    }
}
