//! Metric circular buffers around WGS84 points.
//!
//! A buffer is built in projected space so the radius is a true metric
//! distance: project the point to UTM, trace a circle, inverse-project
//! the ring back to WGS84. The result is an ordinary WGS84 polygon that
//! can be compared against other WGS84 geometry directly, avoiding any
//! mixed-CRS predicate.

use geo::{Coord, LineString, Point, Polygon};

use crate::utm::UtmZone;

/// Number of segments used to approximate the circle.
const CIRCLE_SEGMENTS: usize = 64;

/// Builds a circular buffer of `radius_m` meters around a WGS84 point.
///
/// The circle is exact in the given UTM zone's projected plane and
/// approximated by a 64-gon.
#[must_use]
pub fn metric_buffer(center: Point<f64>, radius_m: f64, zone: UtmZone) -> Polygon<f64> {
    let (cx, cy) = zone.project(center.x(), center.y());

    let mut ring: Vec<Coord<f64>> = Vec::with_capacity(CIRCLE_SEGMENTS + 1);
    #[allow(clippy::cast_precision_loss)]
    for i in 0..CIRCLE_SEGMENTS {
        let theta = std::f64::consts::TAU * (i as f64) / (CIRCLE_SEGMENTS as f64);
        let easting = cx + radius_m * theta.cos();
        let northing = cy + radius_m * theta.sin();
        let (lon, lat) = zone.inverse(easting, northing);
        ring.push(Coord { x: lon, y: lat });
    }
    // close the ring explicitly
    if let Some(first) = ring.first().copied() {
        ring.push(first);
    }

    Polygon::new(LineString::from(ring), Vec::new())
}
