//! Administrative aggregation: the UBIGEO join and its count tables.
//!
//! The join is a pure equality join on the district code; boundary
//! geometry is carried as an attribute, never used as a predicate.
//! Facilities are trusted to report their own district correctly.

use std::collections::BTreeMap;

use salud_map_models::{
    DepartmentTotal, DistrictHospitalCount, DistrictPolygon, FacilityRecord, JoinedFacility,
};

/// Inner-joins facilities to districts by UBIGEO code.
///
/// Facilities whose code is absent from the boundary table are silently
/// dropped, and districts without facilities simply contribute no rows.
/// An empty result is valid and must be interpreted by the caller.
#[must_use]
pub fn join_facilities(
    facilities: &[FacilityRecord],
    districts: &[DistrictPolygon],
) -> Vec<JoinedFacility> {
    let names: BTreeMap<u32, &str> = districts
        .iter()
        .map(|d| (d.district_code, d.district_name.as_str()))
        .collect();

    let joined: Vec<JoinedFacility> = facilities
        .iter()
        .filter_map(|facility| {
            names.get(&facility.district_code).map(|name| JoinedFacility {
                facility: facility.clone(),
                district_name: (*name).to_string(),
            })
        })
        .collect();

    log::info!(
        "Joined {} of {} facilities to {} districts",
        joined.len(),
        facilities.len(),
        districts.len()
    );

    joined
}

/// Counts joined facilities per district, zero-filling districts with
/// no matches.
///
/// Every district from the boundary table appears exactly once in the
/// output, in the boundary table's order. Districts are never dropped,
/// which is what makes the "districts without hospitals" analysis
/// possible.
#[must_use]
pub fn district_counts(
    joined: &[JoinedFacility],
    districts: &[DistrictPolygon],
) -> Vec<DistrictHospitalCount> {
    let mut per_district: BTreeMap<u32, u64> = BTreeMap::new();
    for row in joined {
        *per_district.entry(row.facility.district_code).or_insert(0) += 1;
    }

    districts
        .iter()
        .map(|district| DistrictHospitalCount {
            district_code: district.district_code,
            district_name: district.district_name.clone(),
            boundary: district.boundary.clone(),
            hospital_count: per_district
                .get(&district.district_code)
                .copied()
                .unwrap_or(0),
        })
        .collect()
}

/// Counts joined facilities per department, sorted by count descending.
///
/// Ties are broken by department name ascending so the ordering is
/// fully deterministic.
#[must_use]
pub fn department_totals(joined: &[JoinedFacility]) -> Vec<DepartmentTotal> {
    let mut per_department: BTreeMap<&str, u64> = BTreeMap::new();
    for row in joined {
        *per_department
            .entry(row.facility.department.as_str())
            .or_insert(0) += 1;
    }

    let mut totals: Vec<DepartmentTotal> = per_department
        .into_iter()
        .map(|(department, total_hospitals)| DepartmentTotal {
            department: department.to_string(),
            total_hospitals,
        })
        .collect();

    totals.sort_by(|a, b| {
        b.total_hospitals
            .cmp(&a.total_hospitals)
            .then_with(|| a.department.cmp(&b.department))
    });

    totals
}
