#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Canonical record types shared across the hospital accessibility
//! pipeline.
//!
//! Every stage produces one of these immutable value tables: cleaned
//! facility records, district boundary polygons, the facility-district
//! join, per-district and per-department aggregates, population centers,
//! and the per-center proximity results. Nothing here is mutated after
//! construction.

use std::collections::BTreeMap;

use geo::{MultiPolygon, Point, Polygon};
use serde::{Deserialize, Serialize};

/// Geographic bounding box in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    /// Western edge (minimum longitude).
    pub min_lon: f64,
    /// Eastern edge (maximum longitude).
    pub max_lon: f64,
    /// Southern edge (minimum latitude).
    pub min_lat: f64,
    /// Northern edge (maximum latitude).
    pub max_lat: f64,
}

impl GeoBounds {
    /// Returns `true` if the coordinate pair is finite and inside the box
    /// (edges inclusive).
    #[must_use]
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon.is_finite()
            && lat.is_finite()
            && lon >= self.min_lon
            && lon <= self.max_lon
            && lat >= self.min_lat
            && lat <= self.max_lat
    }
}

/// Approximate bounding box of Peru. Facility coordinates outside this
/// box are treated as data entry errors and dropped during cleaning.
pub const PERU_BOUNDS: GeoBounds = GeoBounds {
    min_lon: -81.5,
    max_lon: -68.0,
    min_lat: -18.5,
    max_lat: 0.0,
};

/// One cleaned health facility from the IPRESS registry.
///
/// Only facilities with state `ACTIVADO`, condition `EN FUNCIONAMIENTO`,
/// and coordinates inside [`PERU_BOUNDS`] survive cleaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityRecord {
    /// Unique IPRESS establishment code.
    pub code: String,
    /// Establishment name.
    pub name: String,
    /// Six-digit district UBIGEO code (the join key to boundaries).
    pub district_code: u32,
    /// Longitude in WGS84 degrees.
    pub longitude: f64,
    /// Latitude in WGS84 degrees.
    pub latitude: f64,
    /// Department name, as reported by the registry (uppercase).
    pub department: String,
    /// Registry state; always `ACTIVADO` after cleaning.
    pub status: String,
}

impl FacilityRecord {
    /// The facility's location as a WGS84 point.
    #[must_use]
    pub fn location(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

/// One administrative district with its boundary geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictPolygon {
    /// Six-digit district UBIGEO code, unique within the table.
    pub district_code: u32,
    /// District name.
    pub district_name: String,
    /// Boundary in WGS84; repaired if the source geometry was invalid.
    pub boundary: MultiPolygon<f64>,
}

/// A facility paired with its district's attributes via the UBIGEO
/// equality join. Facilities whose district code is absent from the
/// boundary table do not appear here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinedFacility {
    /// The cleaned facility record.
    pub facility: FacilityRecord,
    /// Name of the enclosing district from the boundary table.
    pub district_name: String,
}

/// Per-district facility count. Every district from the boundary table
/// appears exactly once; districts with no matched facilities carry a
/// count of zero.
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictHospitalCount {
    /// District UBIGEO code.
    pub district_code: u32,
    /// District name.
    pub district_name: String,
    /// District boundary in WGS84.
    pub boundary: MultiPolygon<f64>,
    /// Number of joined facilities inside this district.
    pub hospital_count: u64,
}

/// Per-department facility total, sorted descending by count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentTotal {
    /// Department name.
    pub department: String,
    /// Number of joined facilities in the department.
    pub total_hospitals: u64,
}

/// One populated center from the national gazetteer.
///
/// The source schema is only known heuristically, so every attribute is
/// optional; properties the column classifier could not map are kept
/// verbatim in [`extra`](Self::extra).
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationCenter {
    /// Center name.
    pub name: Option<String>,
    /// Department name.
    pub department: Option<String>,
    /// Province name.
    pub province: Option<String>,
    /// District name.
    pub district: Option<String>,
    /// Source code, used for deduplication when present.
    pub id: Option<String>,
    /// Location in WGS84.
    pub location: Point<f64>,
    /// Source properties left unmapped by the column classifier.
    pub extra: BTreeMap<String, String>,
}

/// One row of the proximity table: a population center, its 10 km
/// service area, and the number of facilities inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct CenterAccess {
    /// The population center.
    pub center: PopulationCenter,
    /// 10 km circular service area around the center, in WGS84.
    pub buffer: Polygon<f64>,
    /// Facilities strictly within the service area.
    pub facilities_within: u64,
}

/// Proximity analysis for one department: the least- and best-served
/// centers plus the full per-center table.
///
/// When every center ties, `isolated` and `concentrated` reference the
/// same record; that is a legitimate result, not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct ProximityAnalysis {
    /// Department the analysis was run for (uppercase).
    pub department: String,
    /// Center with the fewest facilities within 10 km.
    pub isolated: CenterAccess,
    /// Center with the most facilities within 10 km.
    pub concentrated: CenterAccess,
    /// All centers in the department with their counts.
    pub per_center: Vec<CenterAccess>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peru_bounds_accept_lima() {
        assert!(PERU_BOUNDS.contains(-77.04, -12.05));
    }

    #[test]
    fn peru_bounds_reject_outside() {
        // Bogota is north of the box
        assert!(!PERU_BOUNDS.contains(-74.07, 4.71));
        assert!(!PERU_BOUNDS.contains(0.0, 0.0));
    }

    #[test]
    fn peru_bounds_reject_non_finite() {
        assert!(!PERU_BOUNDS.contains(f64::NAN, -12.0));
        assert!(!PERU_BOUNDS.contains(-77.0, f64::INFINITY));
    }

    #[test]
    fn facility_location_is_lon_lat() {
        let facility = FacilityRecord {
            code: "00001".to_string(),
            name: "HOSPITAL NACIONAL".to_string(),
            district_code: 150_101,
            longitude: -77.03,
            latitude: -12.04,
            department: "LIMA".to_string(),
            status: "ACTIVADO".to_string(),
        };
        let point = facility.location();
        assert!((point.x() - -77.03).abs() < f64::EPSILON);
        assert!((point.y() - -12.04).abs() < f64::EPSILON);
    }
}
