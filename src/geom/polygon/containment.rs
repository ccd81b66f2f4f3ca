use super::PolygonView;
use crate::geom::EPS;
use crate::geom::bboxes::is_point_inside_bbox;
use crate::geom::segment::line_segment_intersection;
use crate::geom::triangles::is_point_inside_triangle;
use crate::{Point, Vector};

/// Checks if a point lies inside a polygon.
///
/// Bounding box rejection first, then the coplanarity check, then the
/// same-side test on each triangle. If `boundary_in` is true, points on the
/// outline (edges or vertices) are considered inside. Interior triangle
/// diagonals are never treated as boundary.
pub fn is_point_inside_polygon(ptest: Point, poly: &PolygonView, boundary_in: bool) -> bool {
    if !is_point_inside_bbox(ptest, poly.outline) {
        return false;
    }
    if poly.plane.distance(ptest).abs() > EPS {
        return false;
    }

    if poly.edges().any(|(p1, p2)| ptest.is_on_segment(p1, p2)) {
        return boundary_in;
    }

    poly.triangles.iter().any(|t| {
        is_point_inside_triangle(
            ptest,
            poly.points[t.0],
            poly.points[t.1],
            poly.points[t.2],
            true,
        )
    })
}

/// Checks if the line `ptest + t * direction` hits the polygon.
///
/// The line is intersected with the polygon's plane and the intersection point
/// is tested for containment (boundary included). With `forward_only`, hits
/// behind the point (`t < 0`) are rejected. Lines parallel to the plane never hit.
pub fn is_point_inside_projection(
    ptest: Point,
    direction: Vector,
    poly: &PolygonView,
    forward_only: bool,
) -> bool {
    projection_on_polygon(ptest, direction, poly, forward_only).is_some()
}

/// Same as [`is_point_inside_projection`] but returns the hit point and the line parameter.
pub fn projection_on_polygon(
    ptest: Point,
    direction: Vector,
    poly: &PolygonView,
    forward_only: bool,
) -> Option<(Point, f64)> {
    let (pt, t) = poly.plane.intersect_line(ptest, direction)?;
    if forward_only && t < 0.0 {
        return None;
    }
    if is_point_inside_polygon(pt, poly, true) {
        Some((pt, t))
    } else {
        None
    }
}

/// Checks if the segment `seg_start -> seg_end` crosses or touches the polygon.
///
/// A segment lying in the polygon's plane touches it if any end point is inside
/// or if it intersects any of the polygon's edges.
pub fn segment_crosses_polygon(seg_start: Point, seg_end: Point, poly: &PolygonView) -> bool {
    let dist_start = poly.plane.distance(seg_start);
    let dist_end = poly.plane.distance(seg_end);

    // Entirely on one side of the plane
    if (dist_start > EPS && dist_end > EPS) || (dist_start < -EPS && dist_end < -EPS) {
        return false;
    }

    // Segment lies in the plane
    if dist_start.abs() <= EPS && dist_end.abs() <= EPS {
        return is_point_inside_polygon(seg_start, poly, true)
            || is_point_inside_polygon(seg_end, poly, true)
            || poly
                .edges()
                .any(|(p1, p2)| line_segment_intersection(seg_start, seg_end, p1, p2).is_some());
    }

    let t = dist_start / (dist_start - dist_end);
    let crossing = seg_start + (seg_end - seg_start) * t;
    is_point_inside_polygon(crossing, poly, true)
}
