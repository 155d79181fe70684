//! GeoJSON layer helpers shared by the boundary and gazetteer loaders.

use geo::{MapCoords, MultiPolygon, Point, coord};
use geojson::{Feature, FeatureCollection, GeoJson};
use salud_map_spatial::utm::UtmZone;

use crate::GeoError;

/// Parses text into a `FeatureCollection`, rejecting bare geometries
/// and single features.
pub(crate) fn parse_feature_collection(text: &str) -> Result<FeatureCollection, GeoError> {
    match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(fc) => Ok(fc),
        other => Err(GeoError::Format {
            message: format!(
                "expected a FeatureCollection, got {}",
                match other {
                    GeoJson::Geometry(_) => "a bare geometry",
                    GeoJson::Feature(_) => "a single feature",
                    GeoJson::FeatureCollection(_) => unreachable!(),
                }
            ),
        }),
    }
}

/// Inspects a legacy `crs` foreign member.
///
/// RFC 7946 GeoJSON is always WGS84, but older exporters attach a named
/// CRS. Returns the UTM zone to inverse-project from, `None` for WGS84
/// (declared or implied).
///
/// # Errors
///
/// Returns [`GeoError::UnsupportedCrs`] when a CRS is declared but is
/// neither WGS84 nor a UTM zone this pipeline can handle.
pub(crate) fn declared_utm_zone(fc: &FeatureCollection) -> Result<Option<UtmZone>, GeoError> {
    let Some(name) = fc
        .foreign_members
        .as_ref()
        .and_then(|m| m.get("crs"))
        .and_then(|crs| crs.get("properties"))
        .and_then(|props| props.get("name"))
        .and_then(|name| name.as_str())
    else {
        return Ok(None);
    };

    if name.contains("4326") || name.contains("CRS84") {
        return Ok(None);
    }

    name.rsplit(':')
        .next()
        .and_then(|code| code.parse::<u32>().ok())
        .and_then(UtmZone::from_epsg)
        .map(Some)
        .ok_or_else(|| GeoError::UnsupportedCrs(name.to_string()))
}

/// Extracts a feature's geometry as a `MultiPolygon`, accepting both
/// `Polygon` and `MultiPolygon`.
pub(crate) fn feature_multipolygon(feature: &Feature) -> Option<MultiPolygon<f64>> {
    let geometry = feature.geometry.as_ref()?;
    let geo_geom: geo::Geometry<f64> = geometry.clone().try_into().ok()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}

/// Extracts a feature's geometry as a finite `Point`.
pub(crate) fn feature_point(feature: &Feature) -> Option<Point<f64>> {
    let geometry = feature.geometry.as_ref()?;
    let geo_geom: geo::Geometry<f64> = geometry.clone().try_into().ok()?;
    match geo_geom {
        geo::Geometry::Point(p) if p.x().is_finite() && p.y().is_finite() => Some(p),
        _ => None,
    }
}

/// Reads a property as a plain string. Numbers are rendered without a
/// fractional part when integral (boundary exporters disagree on
/// whether codes are strings or numbers).
pub(crate) fn property_string(feature: &Feature, key: &str) -> Option<String> {
    let value = feature.properties.as_ref()?.get(key)?;
    json_value_string(value)
}

/// Renders a JSON property value as a string, `None` for null.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn json_value_string(value: &geojson::JsonValue) -> Option<String> {
    match value {
        geojson::JsonValue::String(s) => Some(s.trim().to_string()),
        geojson::JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else {
                n.as_f64().map(|f| {
                    if f.fract() == 0.0 {
                        format!("{}", f as i64)
                    } else {
                        f.to_string()
                    }
                })
            }
        }
        geojson::JsonValue::Bool(b) => Some(b.to_string()),
        geojson::JsonValue::Null => None,
        other => Some(other.to_string()),
    }
}

/// Inverse-projects every coordinate of a multipolygon from the given
/// UTM zone to WGS84.
pub(crate) fn reproject_multipolygon(mp: &MultiPolygon<f64>, zone: UtmZone) -> MultiPolygon<f64> {
    mp.map_coords(|c| {
        let (lon, lat) = zone.inverse(c.x, c.y);
        coord! { x: lon, y: lat }
    })
}

/// Inverse-projects a point from the given UTM zone to WGS84.
pub(crate) fn reproject_point(point: Point<f64>, zone: UtmZone) -> Point<f64> {
    let (lon, lat) = zone.inverse(point.x(), point.y());
    Point::new(lon, lat)
}
