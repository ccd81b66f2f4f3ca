use super::PolygonView;
use super::containment::is_point_inside_polygon;
use crate::Point;
use crate::geom::segment::distance_point_to_segment;

/// Distance between a point and a polygon.
///
/// If the orthogonal projection of `ptest` onto the polygon's plane lands
/// inside the polygon, this is the perpendicular distance to the plane.
/// Otherwise it is the minimum distance to any of the polygon's edges.
pub fn distance_point_to_polygon(ptest: Point, poly: &PolygonView) -> f64 {
    let projected = poly.plane.project(ptest);
    if is_point_inside_polygon(projected, poly, true) {
        return poly.plane.distance(ptest).abs();
    }
    poly.edges()
        .map(|(p1, p2)| distance_point_to_segment(ptest, p1, p2))
        .fold(f64::INFINITY, f64::min)
}
