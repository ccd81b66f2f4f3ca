use super::*;
use crate::geom::plane::Plane;

/// Checks if (multiple) points are collinear.
pub fn are_points_collinear(pts: &[Point]) -> bool {
    if pts.len() <= 2 {
        return true; // 1 or 2 points are always collinear
    }
    let p0 = pts[0];
    // Direction given by the first point which is not a duplicate of p0
    let dir = match pts
        .iter()
        .skip(1)
        .find_map(|p| (*p - p0).normalize().ok())
    {
        Some(d) => d,
        None => return true, // All points are the same
    };
    pts.iter()
        .skip(1)
        .all(|p| (*p - p0).cross(dir).length() < EPS)
}

/// Checks if all points lie on a common plane.
///
/// Fewer than 4 points are always coplanar. Collinear sets are also coplanar.
pub fn are_points_coplanar(pts: &[Point]) -> bool {
    if pts.len() <= 3 {
        return true;
    }
    let plane = match Plane::from_points(pts) {
        Ok(plane) => plane,
        Err(_) => return are_points_collinear(pts),
    };
    pts.iter().all(|p| plane.distance(*p).abs() < EPS)
}

/// Checks if `ptest` and `pref` are on the same side of the line `p1 -> p2`.
///
/// Returns `None` if `ptest` lies on the line (within tolerance).
pub fn is_point_on_same_side(p1: Point, p2: Point, ptest: Point, pref: Point) -> Option<bool> {
    let edge = p2 - p1;
    let c_test = edge.cross(ptest - p1);
    let c_ref = edge.cross(pref - p1);
    if c_test.length() < EPS {
        return None;
    }
    Some(c_test.dot(c_ref) > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collinear() {
        let pts = [
            Point::new(0., 0., 0.),
            Point::new(1., 1., 1.),
            Point::new(2., 2., 2.),
            Point::new(-3., -3., -3.),
        ];
        assert!(are_points_collinear(&pts));
        let pts = [
            Point::new(0., 0., 0.),
            Point::new(1., 1., 1.),
            Point::new(2., 2., 2.1),
        ];
        assert!(!are_points_collinear(&pts));
    }

    #[test]
    fn test_coplanar() {
        let pts = [
            Point::new(0., 0., 1.),
            Point::new(1., 0., 1.),
            Point::new(1., 1., 1.),
            Point::new(0., 1., 1.),
        ];
        assert!(are_points_coplanar(&pts));
        let pts = [
            Point::new(0., 0., 1.),
            Point::new(1., 0., 1.),
            Point::new(1., 1., 1.),
            Point::new(0., 1., 1.1),
        ];
        assert!(!are_points_coplanar(&pts));
    }

    #[test]
    fn test_same_side() {
        let p1 = Point::new(0., 0., 0.);
        let p2 = Point::new(1., 0., 0.);
        let pref = Point::new(0.5, 1., 0.);
        assert_eq!(
            is_point_on_same_side(p1, p2, Point::new(0.2, 0.3, 0.), pref),
            Some(true)
        );
        assert_eq!(
            is_point_on_same_side(p1, p2, Point::new(0.2, -0.3, 0.), pref),
            Some(false)
        );
        assert_eq!(
            is_point_on_same_side(p1, p2, Point::new(0.2, 0.0, 0.), pref),
            None
        );
    }
}
