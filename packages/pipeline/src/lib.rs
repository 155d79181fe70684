#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Pipeline orchestration.
//!
//! Sequences the ingestion, boundary, join, aggregation, and proximity
//! stages in a fixed order and applies the failure policy: required
//! stages abort the run with a typed error and no partial result, the
//! population-center stage and the per-department proximity analyses
//! degrade to `None` without aborting.

pub mod cache;
pub mod paths;

use std::time::Instant;

use salud_map_analytics::counts;
use salud_map_analytics::proximity::analyze_proximity;
use salud_map_geography::{GeoError, centers, districts};
use salud_map_ingest::IngestError;
use salud_map_models::{
    DepartmentTotal, DistrictHospitalCount, DistrictPolygon, FacilityRecord, JoinedFacility,
    PopulationCenter, ProximityAnalysis,
};
use salud_map_spatial::FacilityIndex;
use thiserror::Error;

pub use paths::DataPaths;

/// Departments the proximity analysis always runs for: the densest
/// coastal department and the most dispersed Amazonian one.
pub const PROXIMITY_DEPARTMENTS: [&str; 2] = ["LIMA", "LORETO"];

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required input file is absent.
    #[error("Required file not found: {0}")]
    MissingFile(String),

    /// The facility ingestion stage failed.
    #[error("Facility ingestion failed: {0}")]
    Ingest(#[from] IngestError),

    /// The district boundary stage failed.
    #[error("Boundary loading failed: {0}")]
    Boundaries(#[from] GeoError),

    /// The facility-district join matched nothing; no meaningful
    /// output can be produced from disjoint inputs.
    #[error("Facility-district join produced no rows; check that both files cover the same UBIGEO codes")]
    EmptyJoin,
}

/// Everything one pipeline run produces, handed as-is to presentation
/// collaborators. Optional members are `None` when their stage was
/// unavailable; required members are always populated (a failed
/// required stage means no bundle at all).
#[derive(Debug, Clone, PartialEq)]
pub struct DataBundle {
    /// Cleaned facility records.
    pub facilities: Vec<FacilityRecord>,
    /// District boundary table.
    pub districts: Vec<DistrictPolygon>,
    /// Facility-district join.
    pub joined: Vec<JoinedFacility>,
    /// Per-district facility counts, zero-filled.
    pub district_counts: Vec<DistrictHospitalCount>,
    /// Per-department totals, sorted descending.
    pub department_totals: Vec<DepartmentTotal>,
    /// Population centers, when the gazetteer was available.
    pub centers: Option<Vec<PopulationCenter>>,
    /// Proximity analysis for Lima, when computable.
    pub lima: Option<ProximityAnalysis>,
    /// Proximity analysis for Loreto, when computable.
    pub loreto: Option<ProximityAnalysis>,
}

/// Runs the full pipeline over the given inputs.
///
/// Stage order: path validation, facility ingestion, boundary loading,
/// UBIGEO join, per-district counts, per-department totals, optional
/// gazetteer load, facility indexing, proximity per fixed department.
///
/// # Errors
///
/// Returns [`PipelineError`] when a required file is missing, a
/// required stage fails, or the join comes back empty. Optional-stage
/// failures are logged and degrade to `None` members in the bundle.
pub fn load_all_data(data_paths: &DataPaths) -> Result<DataBundle, PipelineError> {
    let start = Instant::now();

    for required in [&data_paths.facilities, &data_paths.boundaries] {
        if !required.exists() {
            return Err(PipelineError::MissingFile(required.display().to_string()));
        }
    }

    log::info!("Loading facility registry...");
    let facilities = salud_map_ingest::load_and_clean_facilities(&data_paths.facilities)?;

    log::info!("Loading district boundaries...");
    let district_table = districts::load_districts(&data_paths.boundaries)?;

    log::info!("Joining facilities to districts...");
    let joined = counts::join_facilities(&facilities, &district_table);
    if joined.is_empty() {
        return Err(PipelineError::EmptyJoin);
    }

    let district_counts = counts::district_counts(&joined, &district_table);
    let department_totals = counts::department_totals(&joined);

    log::info!("Loading population centers...");
    let center_table = match centers::load_population_centers(&data_paths.population_centers) {
        Ok(c) => c,
        Err(e) => {
            log::warn!("Population-center stage unavailable: {e}");
            None
        }
    };

    let index = FacilityIndex::from_points(joined.iter().map(|row| row.facility.location()));

    let run_proximity = |department: &str| {
        center_table
            .as_deref()
            .and_then(|c| analyze_proximity(c, &index, department))
    };
    let lima = run_proximity(PROXIMITY_DEPARTMENTS[0]);
    let loreto = run_proximity(PROXIMITY_DEPARTMENTS[1]);

    log::info!(
        "Pipeline complete: {} facilities, {} districts, {} joined, took {:.1}s",
        facilities.len(),
        district_table.len(),
        joined.len(),
        start.elapsed().as_secs_f64()
    );

    Ok(DataBundle {
        facilities,
        districts: district_table,
        joined,
        district_counts,
        department_totals,
        centers: center_table,
        lima,
        loreto,
    })
}
