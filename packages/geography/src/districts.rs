//! District boundary loading.
//!
//! Boundaries arrive as a GeoJSON FeatureCollection keyed by the
//! six-digit UBIGEO district code (property `IDDIST` in the national
//! cartography export, `UBIGEO` in some re-publications). Geometry is
//! normalized to WGS84 multipolygons and structurally repaired before
//! use.

use std::collections::BTreeSet;
use std::path::Path;

use geo::orient::{Direction, Orient};
use geo::{Coord, LineString, MultiPolygon, Polygon, Validation};
use salud_map_models::DistrictPolygon;

use crate::GeoError;
use crate::layer;

/// Loads and normalizes the district boundary file.
///
/// # Errors
///
/// Returns [`GeoError`] if the file is missing or unreadable, is not a
/// FeatureCollection, declares an unsupported CRS, or carries neither an
/// `IDDIST` nor a `UBIGEO` property.
pub fn load_districts(path: &Path) -> Result<Vec<DistrictPolygon>, GeoError> {
    if !path.exists() {
        return Err(GeoError::MissingFile(path.display().to_string()));
    }
    let text = std::fs::read_to_string(path).map_err(|e| GeoError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_districts(&text)
}

/// Parses district boundaries from GeoJSON text.
///
/// Features with a non-polygon geometry or a non-numeric code are
/// dropped with a warning; duplicate codes keep the first occurrence.
/// An empty collection is a valid empty result.
///
/// # Errors
///
/// See [`load_districts`].
pub fn parse_districts(text: &str) -> Result<Vec<DistrictPolygon>, GeoError> {
    let fc = layer::parse_feature_collection(text)?;
    let zone = layer::declared_utm_zone(&fc)?;

    let Some(id_key) = district_id_key(&fc) else {
        if fc.features.is_empty() {
            return Ok(Vec::new());
        }
        return Err(GeoError::Schema {
            column: "IDDIST or UBIGEO".to_string(),
        });
    };

    let mut districts = Vec::with_capacity(fc.features.len());
    let mut seen = BTreeSet::new();
    let mut bad_code = 0u64;
    let mut bad_geometry = 0u64;
    let mut repaired = 0u64;

    for feature in &fc.features {
        let Some(code) = layer::property_string(feature, id_key)
            .and_then(|raw| raw.parse::<u32>().ok())
        else {
            bad_code += 1;
            continue;
        };

        let Some(mut boundary) = layer::feature_multipolygon(feature) else {
            log::warn!("District {code}: unsupported geometry, skipping");
            bad_geometry += 1;
            continue;
        };

        if let Some(zone) = zone {
            boundary = layer::reproject_multipolygon(&boundary, zone);
        }

        let (boundary, was_repaired) = repair_multipolygon(boundary);
        if was_repaired {
            repaired += 1;
        }

        if !seen.insert(code) {
            log::warn!("Duplicate district code {code}, keeping first occurrence");
            continue;
        }

        districts.push(DistrictPolygon {
            district_code: code,
            district_name: layer::property_string(feature, "DISTRITO").unwrap_or_default(),
            boundary,
        });
    }

    log::info!(
        "Loaded {} districts via {id_key} ({bad_code} bad codes, {bad_geometry} bad geometries, \
         {repaired} repaired)",
        districts.len()
    );

    Ok(districts)
}

/// Picks the identifying property from the first feature that has any
/// properties at all.
fn district_id_key(fc: &geojson::FeatureCollection) -> Option<&'static str> {
    let props = fc
        .features
        .iter()
        .find_map(|f| f.properties.as_ref())?;
    if props.contains_key("IDDIST") {
        Some("IDDIST")
    } else if props.contains_key("UBIGEO") {
        Some("UBIGEO")
    } else {
        None
    }
}

/// Structurally repairs an invalid multipolygon.
///
/// Drops consecutive duplicate vertices, re-closes rings, and fixes
/// winding order. Geometry still invalid afterwards (e.g. genuinely
/// self-intersecting rings) is kept and logged; dropping districts over
/// cartography defects would silently shrink the count table.
fn repair_multipolygon(mp: MultiPolygon<f64>) -> (MultiPolygon<f64>, bool) {
    if mp.is_valid() {
        return (mp, false);
    }

    let rebuilt = MultiPolygon(
        mp.0
            .iter()
            .map(|polygon| {
                Polygon::new(
                    clean_ring(polygon.exterior()),
                    polygon.interiors().iter().map(clean_ring).collect(),
                )
            })
            .collect(),
    )
    .orient(Direction::Default);

    if !rebuilt.is_valid() {
        log::warn!("Geometry still invalid after repair, keeping as-is");
    }

    (rebuilt, true)
}

/// Removes consecutive duplicate vertices. `Polygon::new` re-closes the
/// ring afterwards.
fn clean_ring(ring: &LineString<f64>) -> LineString<f64> {
    let mut coords: Vec<Coord<f64>> = Vec::with_capacity(ring.0.len());
    for &coord in &ring.0 {
        if coords.last() != Some(&coord) {
            coords.push(coord);
        }
    }
    LineString::from(coords)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_coords(origin: (f64, f64), size: f64) -> String {
        let (x, y) = origin;
        format!(
            "[[[{x}, {y}], [{}, {y}], [{}, {}], [{x}, {}], [{x}, {y}]]]",
            x + size,
            x + size,
            y + size,
            y + size
        )
    }

    fn district_feature(id_key: &str, code: &str, name: &str, origin: (f64, f64)) -> String {
        format!(
            r#"{{"type": "Feature",
                "properties": {{"{id_key}": {code}, "DISTRITO": "{name}"}},
                "geometry": {{"type": "Polygon", "coordinates": {}}}}}"#,
            square_coords(origin, 0.1)
        )
    }

    fn collection(features: &[String]) -> String {
        format!(
            r#"{{"type": "FeatureCollection", "features": [{}]}}"#,
            features.join(",")
        )
    }

    #[test]
    fn loads_districts_keyed_by_iddist() {
        let text = collection(&[
            district_feature("IDDIST", "\"150101\"", "LIMA", (-77.1, -12.1)),
            district_feature("IDDIST", "\"150102\"", "ANCON", (-77.2, -11.8)),
        ]);
        let districts = parse_districts(&text).unwrap();
        assert_eq!(districts.len(), 2);
        assert_eq!(districts[0].district_code, 150_101);
        assert_eq!(districts[0].district_name, "LIMA");
    }

    #[test]
    fn falls_back_to_ubigeo_key_and_numeric_codes() {
        let text = collection(&[district_feature("UBIGEO", "150101", "LIMA", (-77.1, -12.1))]);
        let districts = parse_districts(&text).unwrap();
        assert_eq!(districts.len(), 1);
        assert_eq!(districts[0].district_code, 150_101);
    }

    #[test]
    fn missing_id_property_is_a_schema_error() {
        let text = collection(&[format!(
            r#"{{"type": "Feature",
                "properties": {{"NOMBRE": "LIMA"}},
                "geometry": {{"type": "Polygon", "coordinates": {}}}}}"#,
            square_coords((-77.1, -12.1), 0.1)
        )]);
        let err = parse_districts(&text).unwrap_err();
        assert!(matches!(err, GeoError::Schema { .. }));
    }

    #[test]
    fn empty_collection_is_valid_and_empty() {
        let districts = parse_districts(r#"{"type": "FeatureCollection", "features": []}"#).unwrap();
        assert!(districts.is_empty());
    }

    #[test]
    fn drops_non_coercible_codes() {
        let text = collection(&[
            district_feature("IDDIST", "\"150101\"", "LIMA", (-77.1, -12.1)),
            district_feature("IDDIST", "\"S/C\"", "SIN CODIGO", (-77.2, -11.8)),
        ]);
        let districts = parse_districts(&text).unwrap();
        assert_eq!(districts.len(), 1);
    }

    #[test]
    fn duplicate_codes_keep_first_occurrence() {
        let text = collection(&[
            district_feature("IDDIST", "\"150101\"", "FIRST", (-77.1, -12.1)),
            district_feature("IDDIST", "\"150101\"", "SECOND", (-77.2, -11.8)),
        ]);
        let districts = parse_districts(&text).unwrap();
        assert_eq!(districts.len(), 1);
        assert_eq!(districts[0].district_name, "FIRST");
    }

    #[test]
    fn reprojects_utm_declared_layers() {
        use salud_map_spatial::utm::ZONE_18S;

        // A 1 km square around Lima, in projected meters
        let (e, n) = ZONE_18S.project(-77.0428, -12.0464);
        let feature = format!(
            r#"{{"type": "Feature",
                "properties": {{"IDDIST": "150101", "DISTRITO": "LIMA"}},
                "geometry": {{"type": "Polygon", "coordinates":
                    [[[{e}, {n}], [{}, {n}], [{}, {}], [{e}, {}], [{e}, {n}]]]}}}}"#,
            e + 1000.0,
            e + 1000.0,
            n + 1000.0,
            n + 1000.0
        );
        let text = format!(
            r#"{{"type": "FeatureCollection",
                "crs": {{"type": "name", "properties": {{"name": "urn:ogc:def:crs:EPSG::32718"}}}},
                "features": [{feature}]}}"#
        );

        let districts = parse_districts(&text).unwrap();
        assert_eq!(districts.len(), 1);
        let ring = districts[0].boundary.0[0].exterior();
        for coord in &ring.0 {
            assert!((-77.1..-76.9).contains(&coord.x), "lon {}", coord.x);
            assert!((-12.1..-11.9).contains(&coord.y), "lat {}", coord.y);
        }
    }

    #[test]
    fn repair_leaves_valid_geometry_untouched() {
        let polygon = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]),
            Vec::new(),
        );
        let mp = MultiPolygon(vec![polygon]);
        let (repaired, was_repaired) = repair_multipolygon(mp.clone());
        assert!(!was_repaired);
        assert_eq!(repaired, mp);
    }

    #[test]
    fn clean_ring_drops_consecutive_duplicates() {
        let ring = LineString::from(vec![
            (0.0, 0.0),
            (1.0, 0.0),
            (1.0, 0.0),
            (1.0, 1.0),
            (0.0, 0.0),
        ]);
        let cleaned = clean_ring(&ring);
        assert_eq!(cleaned.0.len(), 4);
    }
}
