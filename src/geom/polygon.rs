//! Read-only polygon predicates used by the spatial index and the ray loop.
//!
//! Polygons are not owned here. A [`PolygonView`] borrows the vertex array,
//! the outline and the triangulation from a flattened building.

pub mod containment;
pub mod distance;

use crate::Point;
use crate::geom::plane::Plane;
use crate::geom::triangles::TriangleIndex;

pub use containment::{is_point_inside_polygon, is_point_inside_projection, segment_crosses_polygon};
pub use distance::distance_point_to_polygon;

/// Borrowed geometry of a single polygon.
#[derive(Debug, Clone, Copy)]
pub struct PolygonView<'a> {
    /// Vertex array which the triangle indices refer to.
    pub points: &'a [Point],
    /// Polygon outline (ordered vertices).
    pub outline: &'a [Point],
    /// Triangulation of the polygon.
    pub triangles: &'a [TriangleIndex],
    /// Plane with the polygon's unit normal.
    pub plane: Plane,
}

impl<'a> PolygonView<'a> {
    /// Iterates over the outline edges `(p_i, p_i+1)`, closing the loop.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.outline.len();
        (0..n).map(move |i| (self.outline[i], self.outline[(i + 1) % n]))
    }
}
