//! Population-center gazetteer loading.
//!
//! The gazetteer ships as a zip archive containing a point layer whose
//! column names drift between vintages, so the schema is recovered by a
//! best-effort keyword classifier rather than fixed names. The
//! classifier is deliberately quarantined here: it is one small
//! function, its keyword list is pinned by tests to the known upstream
//! schema, and properties it cannot place are preserved verbatim and
//! reported instead of dropped.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;

use salud_map_models::PopulationCenter;

use crate::GeoError;
use crate::layer;

/// Canonical fields a gazetteer column can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CenterField {
    /// Center name.
    Name,
    /// Department name.
    Department,
    /// Province name.
    Province,
    /// District name.
    District,
    /// Dedup key.
    Id,
}

/// Classifies a source column name by keyword, first match wins.
///
/// The keyword list mirrors the known upstream export: `NOM_POBLAD`-style
/// name columns, `DEP`/`PROV`/`DIST` admin columns, and a `CODIGO` code
/// column.
#[must_use]
pub fn classify_column(column: &str) -> Option<CenterField> {
    let upper = column.to_uppercase();
    let lower = column.to_lowercase();
    if upper.contains("POBLAD") {
        Some(CenterField::Name)
    } else if column == "DEP" || lower.contains("departamento") {
        Some(CenterField::Department)
    } else if column == "PROV" || lower.contains("provincia") {
        Some(CenterField::Province)
    } else if column == "DIST" || lower.contains("distrito") {
        Some(CenterField::District)
    } else if upper.contains("DIGO") || lower.contains("codigo") {
        Some(CenterField::Id)
    } else {
        None
    }
}

/// Maps each canonical field to its first matching column.
///
/// A column feeds at most one field and a field takes at most one
/// column; everything else stays unmapped.
fn map_columns(columns: &[String]) -> BTreeMap<String, CenterField> {
    let mut mapping = BTreeMap::new();
    let mut taken: Vec<CenterField> = Vec::new();
    for column in columns {
        if let Some(field) = classify_column(column)
            && !taken.contains(&field)
        {
            taken.push(field);
            mapping.insert(column.clone(), field);
        }
    }
    mapping
}

/// Loads the population-center archive.
///
/// Returns `Ok(None)` when the file does not exist: the gazetteer is an
/// optional input and its absence only disables the proximity analyses.
///
/// # Errors
///
/// Returns [`GeoError`] if the archive exists but cannot be read, holds
/// no GeoJSON entry, or the entry fails to parse.
pub fn load_population_centers(path: &Path) -> Result<Option<Vec<PopulationCenter>>, GeoError> {
    if !path.exists() {
        log::warn!(
            "Population-center archive not found at {}, proximity analysis disabled",
            path.display()
        );
        return Ok(None);
    }

    let text = read_geojson_entry(path)?;
    parse_centers(&text).map(Some)
}

/// Finds and reads the first GeoJSON entry in the archive.
fn read_geojson_entry(path: &Path) -> Result<String, GeoError> {
    let file = std::fs::File::open(path).map_err(|e| GeoError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| GeoError::Zip {
        path: path.display().to_string(),
        source: e,
    })?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| GeoError::Zip {
            path: path.display().to_string(),
            source: e,
        })?;
        let name = entry.name().to_ascii_lowercase();
        if !(name.ends_with(".geojson") || name.ends_with(".json")) {
            continue;
        }

        let mut text = String::new();
        entry.read_to_string(&mut text).map_err(|e| GeoError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        return Ok(text);
    }

    Err(GeoError::Format {
        message: format!("no GeoJSON entry in archive {}", path.display()),
    })
}

/// Parses the point layer: heuristic column mapping, id dedup, validity
/// filter, WGS84 normalization.
///
/// # Errors
///
/// Returns [`GeoError`] if the text is not a FeatureCollection or
/// declares an unsupported CRS.
pub fn parse_centers(text: &str) -> Result<Vec<PopulationCenter>, GeoError> {
    let fc = layer::parse_feature_collection(text)?;
    let zone = layer::declared_utm_zone(&fc)?;

    let columns: Vec<String> = fc
        .features
        .iter()
        .find_map(|f| f.properties.as_ref())
        .map(|props| props.keys().cloned().collect())
        .unwrap_or_default();

    let mapping = map_columns(&columns);
    let unmapped: Vec<&String> = columns.iter().filter(|c| !mapping.contains_key(*c)).collect();
    if !unmapped.is_empty() {
        log::debug!("Unmapped gazetteer columns kept as extras: {unmapped:?}");
    }

    let mut centers = Vec::with_capacity(fc.features.len());
    let mut seen_ids = BTreeSet::new();
    let mut invalid_geometry = 0u64;
    let mut duplicates = 0u64;

    for feature in &fc.features {
        let Some(mut location) = layer::feature_point(feature) else {
            invalid_geometry += 1;
            continue;
        };
        if let Some(zone) = zone {
            location = layer::reproject_point(location, zone);
        }

        let mut center = PopulationCenter {
            name: None,
            department: None,
            province: None,
            district: None,
            id: None,
            location,
            extra: BTreeMap::new(),
        };

        if let Some(props) = feature.properties.as_ref() {
            for (key, value) in props {
                let Some(text) = layer::json_value_string(value) else {
                    continue;
                };
                match mapping.get(key) {
                    Some(CenterField::Name) => center.name = Some(text),
                    Some(CenterField::Department) => center.department = Some(text),
                    Some(CenterField::Province) => center.province = Some(text),
                    Some(CenterField::District) => center.district = Some(text),
                    Some(CenterField::Id) => center.id = Some(text),
                    None => {
                        center.extra.insert(key.clone(), text);
                    }
                }
            }
        }

        if let Some(id) = center.id.as_ref()
            && !seen_ids.insert(id.clone())
        {
            duplicates += 1;
            continue;
        }

        centers.push(center);
    }

    log::info!(
        "Loaded {} population centers ({invalid_geometry} invalid geometries, \
         {duplicates} duplicate ids)",
        centers.len()
    );

    Ok(centers)
}
