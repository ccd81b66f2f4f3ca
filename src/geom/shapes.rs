//! Predefined shapes as flat polygon lists.

use crate::geom::flat::FlatPolygon;
use crate::{Point, Vector};

/// Returns the 6 outward-facing rectangles of an axis-aligned box.
///
/// `size` is `(x, y, z)`, `origin` is the minimum corner.
/// Polygon paths are `{zone}/{solid}/{wall}/{wall}` with walls
/// `floor`, `wall_0`..`wall_3` and `ceiling`.
pub fn box_polygons(
    zone: &str,
    solid: &str,
    size: (f64, f64, f64),
    origin: (f64, f64, f64),
) -> Vec<FlatPolygon> {
    let (x, y, z) = size;
    let origin_vec = Vector::new(origin.0, origin.1, origin.2);

    let p0 = Point::new(0., 0., 0.) + origin_vec;
    let p1 = Point::new(x, 0., 0.) + origin_vec;
    let p2 = Point::new(x, y, 0.) + origin_vec;
    let p3 = Point::new(0., y, 0.) + origin_vec;
    let p4 = Point::new(0., 0., z) + origin_vec;
    let p5 = Point::new(x, 0., z) + origin_vec;
    let p6 = Point::new(x, y, z) + origin_vec;
    let p7 = Point::new(0., y, z) + origin_vec;

    [
        ("floor", vec![p0, p3, p2, p1]),
        ("wall_0", vec![p0, p1, p5, p4]),
        ("wall_1", vec![p1, p2, p6, p5]),
        ("wall_2", vec![p3, p7, p6, p2]),
        ("wall_3", vec![p0, p4, p7, p3]),
        ("ceiling", vec![p4, p5, p6, p7]),
    ]
    .into_iter()
    .map(|(wall, pts)| FlatPolygon::new(&format!("{zone}/{solid}/{wall}/{wall}"), pts))
    .collect()
}
