//! Metric proximity analysis.
//!
//! For every population center of a department, counts the facilities
//! within a 10 km circular service area and extracts the least- and
//! best-served centers. Buffers are built in UTM zone 18S, the zone
//! the national cartography uses for country-wide metric work, then
//! compared against facility points back in WGS84, so both operands of
//! the containment test share one reference system.

use salud_map_models::{CenterAccess, PopulationCenter, ProximityAnalysis};
use salud_map_spatial::FacilityIndex;
use salud_map_spatial::buffer::metric_buffer;
use salud_map_spatial::utm::ZONE_18S;

/// Service-area radius in meters.
pub const BUFFER_RADIUS_M: f64 = 10_000.0;

/// Runs the proximity analysis for one department.
///
/// Department matching is case-insensitive. Returns `None` when no
/// center matches; an absent department is a non-result, not an
/// error. When every center ties on the count, the isolated and
/// concentrated records are the same row; first occurrence wins all
/// ties, keeping the output deterministic.
#[must_use]
pub fn analyze_proximity(
    centers: &[PopulationCenter],
    facilities: &FacilityIndex,
    department: &str,
) -> Option<ProximityAnalysis> {
    let target = department.trim().to_uppercase();

    let in_department: Vec<&PopulationCenter> = centers
        .iter()
        .filter(|center| {
            center
                .department
                .as_deref()
                .is_some_and(|d| d.trim().to_uppercase() == target)
        })
        .collect();

    if in_department.is_empty() {
        log::info!("No population centers found for department {target}");
        return None;
    }

    let per_center: Vec<CenterAccess> = in_department
        .into_iter()
        .map(|center| {
            let buffer = metric_buffer(center.location, BUFFER_RADIUS_M, ZONE_18S);
            let facilities_within = facilities.count_within(&buffer);
            CenterAccess {
                center: center.clone(),
                buffer,
                facilities_within,
            }
        })
        .collect();

    // First occurrence wins both extrema (max_by_key would keep the
    // last maximum on ties).
    let mut isolated = &per_center[0];
    let mut concentrated = &per_center[0];
    for row in &per_center[1..] {
        if row.facilities_within < isolated.facilities_within {
            isolated = row;
        }
        if row.facilities_within > concentrated.facilities_within {
            concentrated = row;
        }
    }
    let isolated = isolated.clone();
    let concentrated = concentrated.clone();

    log::info!(
        "{target}: {} centers, least served has {} facilities in 10 km, best served {}",
        per_center.len(),
        isolated.facilities_within,
        concentrated.facilities_within
    );

    Some(ProximityAnalysis {
        department: target,
        isolated,
        concentrated,
        per_center,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use geo::Point;
    use salud_map_spatial::utm::ZONE_18S;

    use super::*;

    fn center(name: &str, department: &str, lon: f64, lat: f64) -> PopulationCenter {
        PopulationCenter {
            name: Some(name.to_string()),
            department: Some(department.to_string()),
            province: None,
            district: None,
            id: Some(name.to_string()),
            location: Point::new(lon, lat),
            extra: BTreeMap::new(),
        }
    }

    /// Points spread within `radius_m` of the given WGS84 location.
    fn points_near(lon: f64, lat: f64, count: usize, radius_m: f64) -> Vec<Point<f64>> {
        let (e, n) = ZONE_18S.project(lon, lat);
        (0..count)
            .map(|i| {
                let offset = radius_m * (f64::from(u32::try_from(i).unwrap()) + 1.0)
                    / (f64::from(u32::try_from(count).unwrap()) + 1.0);
                let (plon, plat) = ZONE_18S.inverse(e + offset, n);
                Point::new(plon, plat)
            })
            .collect()
    }

    #[test]
    fn extrema_pick_the_least_and_best_served_centers() {
        // One center with 5 facilities close by, one with none: the
        // second sits ~100 km east, far outside any 10 km buffer.
        let served = center("SERVED", "LIMA", -77.0, -12.0);
        let isolated = center("ISOLATED", "LIMA", -76.0, -12.0);
        let index = FacilityIndex::from_points(points_near(-77.0, -12.0, 5, 5_000.0));

        let analysis =
            analyze_proximity(&[served, isolated], &index, "LIMA").unwrap();

        assert_eq!(analysis.isolated.center.name.as_deref(), Some("ISOLATED"));
        assert_eq!(analysis.isolated.facilities_within, 0);
        assert_eq!(analysis.concentrated.center.name.as_deref(), Some("SERVED"));
        assert_eq!(analysis.concentrated.facilities_within, 5);
        assert!(analysis.isolated.facilities_within <= analysis.concentrated.facilities_within);
        assert_eq!(analysis.per_center.len(), 2);
    }

    #[test]
    fn single_center_is_both_isolated_and_concentrated() {
        let only = center("ONLY", "LORETO", -73.25, -3.75);
        let index = FacilityIndex::from_points(points_near(-73.25, -3.75, 2, 4_000.0));

        let analysis = analyze_proximity(&[only], &index, "LORETO").unwrap();

        assert_eq!(analysis.isolated, analysis.concentrated);
        assert_eq!(analysis.isolated.facilities_within, 2);
    }

    #[test]
    fn department_match_is_case_insensitive() {
        let c = center("CP", "Lima", -77.0, -12.0);
        let index = FacilityIndex::from_points(Vec::new());
        let analysis = analyze_proximity(std::slice::from_ref(&c), &index, "lima").unwrap();
        assert_eq!(analysis.department, "LIMA");
    }

    #[test]
    fn unknown_department_yields_no_result() {
        let c = center("CP", "LIMA", -77.0, -12.0);
        let index = FacilityIndex::from_points(Vec::new());
        assert!(analyze_proximity(&[c], &index, "UCAYALI").is_none());
    }

    #[test]
    fn empty_center_table_yields_no_result() {
        let index = FacilityIndex::from_points(Vec::new());
        assert!(analyze_proximity(&[], &index, "LIMA").is_none());
    }

    #[test]
    fn ties_keep_the_first_center() {
        let first = center("FIRST", "LIMA", -77.0, -12.0);
        let second = center("SECOND", "LIMA", -76.0, -12.0);
        let index = FacilityIndex::from_points(Vec::new());

        let analysis = analyze_proximity(&[first, second], &index, "LIMA").unwrap();
        assert_eq!(analysis.isolated.center.name.as_deref(), Some("FIRST"));
        assert_eq!(analysis.concentrated.center.name.as_deref(), Some("FIRST"));
    }
}
