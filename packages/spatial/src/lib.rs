#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared spatial primitives for the accessibility pipeline.
//!
//! Provides the UTM projection used for metric buffering, the buffer
//! construction itself, and an in-memory R-tree index over facility
//! points for fast point-in-polygon counting. The index is a pure
//! optimization: its counts are identical to a linear scan over all
//! facilities.

pub mod buffer;
pub mod utm;

use geo::{BoundingRect, Contains, Point, Polygon};
use rstar::{AABB, RTree, RTreeObject};
use salud_map_models::FacilityRecord;

/// A facility point stored in the R-tree.
struct FacilityPoint {
    point: Point<f64>,
}

impl RTreeObject for FacilityPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.point.x(), self.point.y()])
    }
}

/// Pre-built spatial index over facility locations.
///
/// Constructed once per pipeline run and queried for every population
/// center's buffer. Lookups prune by envelope first, then apply the
/// exact interior containment test, so a facility on the buffer's
/// boundary does not count.
pub struct FacilityIndex {
    tree: RTree<FacilityPoint>,
}

impl FacilityIndex {
    /// Builds the index from WGS84 points.
    #[must_use]
    pub fn from_points(points: impl IntoIterator<Item = Point<f64>>) -> Self {
        let entries: Vec<FacilityPoint> = points
            .into_iter()
            .map(|point| FacilityPoint { point })
            .collect();
        log::debug!("Built facility index with {} points", entries.len());
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Builds the index from facility records.
    #[must_use]
    pub fn from_facilities(facilities: &[FacilityRecord]) -> Self {
        Self::from_points(facilities.iter().map(FacilityRecord::location))
    }

    /// Number of indexed points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Returns `true` if the index holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Counts indexed points strictly within the polygon.
    #[must_use]
    pub fn count_within(&self, polygon: &Polygon<f64>) -> u64 {
        let Some(rect) = polygon.bounding_rect() else {
            return 0;
        };
        let envelope = AABB::from_corners(
            [rect.min().x, rect.min().y],
            [rect.max().x, rect.max().y],
        );

        let mut count = 0u64;
        for entry in self.tree.locate_in_envelope_intersecting(&envelope) {
            if polygon.contains(&entry.point) {
                count += 1;
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use geo::{LineString, coord};

    use super::*;

    fn unit_square() -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                coord! { x: 0.0, y: 0.0 },
                coord! { x: 1.0, y: 0.0 },
                coord! { x: 1.0, y: 1.0 },
                coord! { x: 0.0, y: 1.0 },
                coord! { x: 0.0, y: 0.0 },
            ]),
            Vec::new(),
        )
    }

    #[test]
    fn counts_points_inside_polygon() {
        let index = FacilityIndex::from_points(vec![
            Point::new(0.5, 0.5),
            Point::new(0.25, 0.75),
            Point::new(2.0, 2.0),
            Point::new(-0.5, 0.5),
        ]);
        assert_eq!(index.count_within(&unit_square()), 2);
    }

    #[test]
    fn boundary_points_do_not_count() {
        let index = FacilityIndex::from_points(vec![Point::new(0.0, 0.5), Point::new(1.0, 1.0)]);
        assert_eq!(index.count_within(&unit_square()), 0);
    }

    #[test]
    fn empty_index_counts_zero() {
        let index = FacilityIndex::from_points(Vec::new());
        assert!(index.is_empty());
        assert_eq!(index.count_within(&unit_square()), 0);
    }

    #[test]
    fn matches_linear_scan() {
        let points: Vec<Point<f64>> = (0..100)
            .map(|i| {
                let t = f64::from(i) * 0.037;
                Point::new(t.sin() * 1.5, t.cos() * 1.5)
            })
            .collect();
        let index = FacilityIndex::from_points(points.clone());
        let square = unit_square();

        let linear = points.iter().filter(|p| square.contains(*p)).count() as u64;
        assert_eq!(index.count_within(&square), linear);
    }
}
