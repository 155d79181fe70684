//! Bundle export for presentation collaborators.
//!
//! Writes the pipeline's output tables as GeoJSON layers plus a JSON
//! ranking, which is the entire contract with the dashboard layer:
//! everything it renders comes from these files.

use std::path::{Path, PathBuf};

use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, JsonValue, Value};
use salud_map_models::ProximityAnalysis;
use salud_map_pipeline::DataBundle;

/// Writes every exportable table in the bundle to `out_dir`.
///
/// Always writes the facility, district-count, and department files;
/// writes one proximity file per analysis that is present. Returns the
/// list of files written.
///
/// # Errors
///
/// Returns an I/O error if the output directory cannot be created or a
/// file cannot be written, and a JSON error if serialization fails.
pub fn export_bundle(
    bundle: &DataBundle,
    out_dir: &Path,
) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(out_dir)?;
    let mut written = Vec::new();

    let facilities = facility_layer(bundle);
    written.push(write_geojson(out_dir, "facilities.geojson", facilities)?);

    let counts = district_count_layer(bundle);
    written.push(write_geojson(out_dir, "district_counts.geojson", counts)?);

    let totals_path = out_dir.join("department_totals.json");
    std::fs::write(
        &totals_path,
        serde_json::to_string_pretty(&bundle.department_totals)?,
    )?;
    written.push(totals_path);

    for (analysis, file_name) in [
        (bundle.lima.as_ref(), "proximity_lima.geojson"),
        (bundle.loreto.as_ref(), "proximity_loreto.geojson"),
    ] {
        if let Some(analysis) = analysis {
            written.push(write_geojson(out_dir, file_name, proximity_layer(analysis))?);
        }
    }

    Ok(written)
}

fn write_geojson(
    out_dir: &Path,
    file_name: &str,
    collection: FeatureCollection,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = out_dir.join(file_name);
    std::fs::write(&path, GeoJson::FeatureCollection(collection).to_string())?;
    log::info!("Wrote {}", path.display());
    Ok(path)
}

fn feature(geometry: Value, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geometry)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn facility_layer(bundle: &DataBundle) -> FeatureCollection {
    let features = bundle
        .joined
        .iter()
        .map(|row| {
            let mut properties = JsonObject::new();
            properties.insert("codigo".into(), JsonValue::from(row.facility.code.clone()));
            properties.insert("nombre".into(), JsonValue::from(row.facility.name.clone()));
            properties.insert("ubigeo".into(), JsonValue::from(row.facility.district_code));
            properties.insert(
                "distrito".into(),
                JsonValue::from(row.district_name.clone()),
            );
            properties.insert(
                "departamento".into(),
                JsonValue::from(row.facility.department.clone()),
            );
            feature(Value::from(&row.facility.location()), properties)
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn district_count_layer(bundle: &DataBundle) -> FeatureCollection {
    let features = bundle
        .district_counts
        .iter()
        .map(|row| {
            let mut properties = JsonObject::new();
            properties.insert("ubigeo".into(), JsonValue::from(row.district_code));
            properties.insert(
                "distrito".into(),
                JsonValue::from(row.district_name.clone()),
            );
            properties.insert(
                "num_hospitales".into(),
                JsonValue::from(row.hospital_count),
            );
            feature(Value::from(&row.boundary), properties)
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn proximity_layer(analysis: &ProximityAnalysis) -> FeatureCollection {
    let features = analysis
        .per_center
        .iter()
        .map(|row| {
            let mut properties = JsonObject::new();
            if let Some(name) = row.center.name.as_ref() {
                properties.insert("nombre".into(), JsonValue::from(name.clone()));
            }
            properties.insert(
                "departamento".into(),
                JsonValue::from(analysis.department.clone()),
            );
            properties.insert(
                "hospitales_10km".into(),
                JsonValue::from(row.facilities_within),
            );
            properties.insert(
                "mas_aislado".into(),
                JsonValue::from(*row == analysis.isolated),
            );
            properties.insert(
                "mas_concentrado".into(),
                JsonValue::from(*row == analysis.concentrated),
            );
            feature(Value::from(&row.buffer), properties)
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
