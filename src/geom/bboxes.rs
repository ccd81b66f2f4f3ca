use crate::geom::EPS;
use crate::geom::point::Point;

/// Returns the (min, max) corners of the box holding all points `pts`.
///
/// For an empty slice the corners are (+inf, -inf), i.e. an empty box.
pub fn bounding_box(pts: &[Point]) -> (Point, Point) {
    let inf = f64::INFINITY;
    pts.iter().fold(
        (Point::new(inf, inf, inf), Point::new(-inf, -inf, -inf)),
        |(pmin, pmax), p| {
            (
                Point::new(pmin.x.min(p.x), pmin.y.min(p.y), pmin.z.min(p.z)),
                Point::new(pmax.x.max(p.x), pmax.y.max(p.y), pmax.z.max(p.z)),
            )
        },
    )
}

/// Checks whether a point is inside the box `(pmin, pmax)` padded by `margin`.
pub fn is_point_in_bounds(ptest: Point, pmin: Point, pmax: Point, margin: f64) -> bool {
    ptest.x >= pmin.x - margin
        && ptest.x <= pmax.x + margin
        && ptest.y >= pmin.y - margin
        && ptest.y <= pmax.y + margin
        && ptest.z >= pmin.z - margin
        && ptest.z <= pmax.z + margin
}

/// Checks whether a point is inside the bounding box holding all points `pts`.
pub fn is_point_inside_bbox(ptest: Point, pts: &[Point]) -> bool {
    let (pmin, pmax) = bounding_box(pts);
    is_point_in_bounds(ptest, pmin, pmax, EPS)
}

/// Checks whether two bounding boxes overlap.
///
/// Takes min and max corners of each bbox.
/// Returns true if boxes overlap (including touching).
pub fn are_bboxes_overlapping(min1: Point, max1: Point, min2: Point, max2: Point) -> bool {
    // Boxes don't overlap if separated along any axis
    if max1.x < min2.x - EPS || min1.x > max2.x + EPS {
        return false;
    }
    if max1.y < min2.y - EPS || min1.y > max2.y + EPS {
        return false;
    }
    if max1.z < min2.z - EPS || min1.z > max2.z + EPS {
        return false;
    }
    true
}

/// Checks whether the segment `a -> b` touches the box `(pmin, pmax)`.
///
/// Slab test on the segment parameter range [0, 1].
pub fn does_segment_touch_bbox(a: Point, b: Point, pmin: Point, pmax: Point) -> bool {
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;
    let axes = [
        (a.x, b.x - a.x, pmin.x, pmax.x),
        (a.y, b.y - a.y, pmin.y, pmax.y),
        (a.z, b.z - a.z, pmin.z, pmax.z),
    ];
    for (start, delta, lo, hi) in axes {
        if delta.abs() < EPS {
            if start < lo - EPS || start > hi + EPS {
                return false;
            }
            continue;
        }
        let ta = (lo - EPS - start) / delta;
        let tb = (hi + EPS - start) / delta;
        let (ta, tb) = if ta < tb { (ta, tb) } else { (tb, ta) };
        t0 = t0.max(ta);
        t1 = t1.min(tb);
        if t0 > t1 {
            return false;
        }
    }
    true
}
