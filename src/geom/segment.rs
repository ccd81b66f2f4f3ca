//! Line segment operations for 3D geometry.

use crate::Point;
use crate::geom::EPS;

/// Checks if two line segments are parallel.
///
/// Two segments are parallel if their direction vectors are parallel
/// (cross product is zero or near-zero). Degenerate segments count as parallel.
pub fn are_segments_parallel(p1: Point, p2: Point, p3: Point, p4: Point) -> bool {
    let d1 = p2 - p1;
    let d2 = p4 - p3;
    d1.cross(d2).length() < EPS * d1.length().max(d2.length()).max(1.0)
}

/// Finds the intersection point of segments `a1 -> b1` and `a2 -> b2`.
///
/// The two lines `a1 + t * (b1 - a1)` and `a2 + s * (b2 - a2)` are solved
/// for `(t, s)` in the least-squares sense (normal equations of the 3x2 system).
/// The solution is accepted only if both lines actually meet there and
/// `t, s` lie within `[0, 1]` (with tolerance).
///
/// Returns `None` for parallel or coincident segments, skew lines,
/// and intersections outside of either segment.
pub fn line_segment_intersection(a1: Point, b1: Point, a2: Point, b2: Point) -> Option<Point> {
    if are_segments_parallel(a1, b1, a2, b2) {
        return None;
    }
    let d1 = b1 - a1;
    let d2 = b2 - a2;
    let r = a2 - a1;

    // [d1 -d2] [t s]^T = r  =>  A^T A x = A^T r
    let m11 = d1.dot(d1);
    let m12 = -d1.dot(d2);
    let m22 = d2.dot(d2);
    let r1 = d1.dot(r);
    let r2 = -d2.dot(r);
    let det = m11 * m22 - m12 * m12;
    if det.abs() < EPS * EPS {
        return None;
    }
    let t = (r1 * m22 - m12 * r2) / det;
    let s = (m11 * r2 - m12 * r1) / det;

    let pt1 = a1 + d1 * t;
    let pt2 = a2 + d2 * s;
    if !pt1.is_close(&pt2) {
        return None; // Skew lines
    }

    let tol_t = EPS / m11.sqrt();
    let tol_s = EPS / m22.sqrt();
    if t < -tol_t || t > 1.0 + tol_t || s < -tol_s || s > 1.0 + tol_s {
        return None;
    }

    Some(pt1)
}

/// Calculates the distance between a point and a line segment.
///
/// Returns the minimum distance from the point to any point on the segment.
pub fn distance_point_to_segment(pt: Point, p1: Point, p2: Point) -> f64 {
    let seg_vec = p2 - p1;
    let pt_vec = pt - p1;

    let seg_len_sq = seg_vec.dot(seg_vec);

    if seg_len_sq < EPS * EPS {
        // Segment is a point
        return pt_vec.length();
    }

    // Project pt onto the line, clamped to segment
    let t = (pt_vec.dot(seg_vec) / seg_len_sq).clamp(0.0, 1.0);
    let closest = p1 + seg_vec * t;

    (pt - closest).length()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crossing_segments() {
        let pt = line_segment_intersection(
            Point::new(0., 0., 0.),
            Point::new(2., 2., 0.),
            Point::new(0., 2., 0.),
            Point::new(2., 0., 0.),
        );
        assert!(pt.unwrap().is_close(&Point::new(1., 1., 0.)));
    }

    #[test]
    fn test_crossing_in_3d() {
        let pt = line_segment_intersection(
            Point::new(0., 0., 0.),
            Point::new(1., 1., 1.),
            Point::new(1., 0., 0.),
            Point::new(0., 1., 1.),
        );
        assert!(pt.unwrap().is_close(&Point::new(0.5, 0.5, 0.5)));
    }

    #[test]
    fn test_touching_at_end_point() {
        let pt = line_segment_intersection(
            Point::new(0., 0., 0.),
            Point::new(1., 0., 0.),
            Point::new(1., 0., 0.),
            Point::new(1., 1., 0.),
        );
        assert!(pt.unwrap().is_close(&Point::new(1., 0., 0.)));
    }

    #[test]
    fn test_no_intersection() {
        // Parallel
        assert!(
            line_segment_intersection(
                Point::new(0., 0., 0.),
                Point::new(1., 0., 0.),
                Point::new(0., 1., 0.),
                Point::new(1., 1., 0.),
            )
            .is_none()
        );
        // Coincident
        assert!(
            line_segment_intersection(
                Point::new(0., 0., 0.),
                Point::new(1., 0., 0.),
                Point::new(0.5, 0., 0.),
                Point::new(2., 0., 0.),
            )
            .is_none()
        );
        // Lines cross outside of the segments
        assert!(
            line_segment_intersection(
                Point::new(0., 0., 0.),
                Point::new(1., 0., 0.),
                Point::new(2., -1., 0.),
                Point::new(2., 1., 0.),
            )
            .is_none()
        );
        // Skew
        assert!(
            line_segment_intersection(
                Point::new(0., 0., 0.),
                Point::new(1., 0., 0.),
                Point::new(0.5, -1., 1.),
                Point::new(0.5, 1., 1.),
            )
            .is_none()
        );
    }

    #[test]
    fn test_distance_point_to_segment() {
        let p1 = Point::new(0., 0., 0.);
        let p2 = Point::new(1., 0., 0.);
        assert!((distance_point_to_segment(Point::new(0.5, 1., 0.), p1, p2) - 1.0).abs() < 1e-12);
        assert!((distance_point_to_segment(Point::new(2., 0., 0.), p1, p2) - 1.0).abs() < 1e-12);
        assert!(distance_point_to_segment(Point::new(0.3, 0., 0.), p1, p2) < 1e-12);
    }
}
