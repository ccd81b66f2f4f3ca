use crate::Point;
use crate::geom::EPS;
use crate::geom::bboxes::is_point_inside_bbox;
use crate::geom::vector::Vector;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

/// Type for holding vertex indices for a triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriangleIndex(pub usize, pub usize, pub usize);

impl TriangleIndex {
    /// Returns a copy with all indices shifted by `offset`.
    pub fn offset(&self, offset: usize) -> Self {
        Self(self.0 + offset, self.1 + offset, self.2 + offset)
    }
}

/// Triangulates the polygon defined by points `pts` and normal `vn` (ear clipping).
///
/// Returned indices refer to `pts`. Triangles keep the winding of the polygon.
pub fn triangulate(pts: &[Point], vn: Vector) -> Result<Vec<TriangleIndex>> {
    if (vn.length() - 1.0).abs() > EPS {
        return Err(anyhow!("Normal vector must have unit length"));
    }
    if pts.len() < 3 {
        return Err(anyhow!("At least 3 points needed, got {}", pts.len()));
    }

    let mut vertices: Vec<usize> = (0..pts.len()).collect();
    let mut triangles: Vec<TriangleIndex> = Vec::with_capacity(pts.len() - 2);
    let mut pos: usize = 0;
    let mut num_fail: usize = 0;

    while vertices.len() > 2 {
        if num_fail > vertices.len() {
            return Err(anyhow!(
                "Ear-clipping failed with {} vertices left",
                vertices.len()
            ));
        }

        // If last vertex, start from the beginning
        if pos > vertices.len() - 1 {
            pos = 0;
        }

        let prev_pos = if pos > 0 { pos - 1 } else { vertices.len() - 1 };
        let next_pos = if pos < vertices.len() - 1 { pos + 1 } else { 0 };

        let prev_id = vertices[prev_pos];
        let curr_id = vertices[pos];
        let next_id = vertices[next_pos];

        if is_corner_convex(pts[prev_id], pts[curr_id], pts[next_id], vn) {
            // No other point may be within the ear (non-convex polygons)
            let any_point_inside = vertices.iter().any(|&test_id| {
                ![prev_id, curr_id, next_id].contains(&test_id)
                    && is_point_inside_triangle(
                        pts[test_id],
                        pts[prev_id],
                        pts[curr_id],
                        pts[next_id],
                        true,
                    )
            });
            if !any_point_inside {
                triangles.push(TriangleIndex(prev_id, curr_id, next_id));
                vertices.remove(pos);
                num_fail = 0;
                continue;
            }
        }
        num_fail += 1;
        pos += 1;
    }

    Ok(triangles)
}

/// Checks if the angle between p2->p1 and p2->p3 is less than 180 degrees.
///
/// The points p1, p2, p3 should be ordered counter-clockwise
/// with respect to the surface front side (`vn`).
pub fn is_corner_convex(p1: Point, p2: Point, p3: Point, vn: Vector) -> bool {
    let v1 = p2 - p1;
    let v2 = p3 - p2;
    match v1.cross(v2).normalize() {
        Ok(v1v2_n) => v1v2_n.is_close(&vn),
        Err(_) => false, // Collinear points p1, p2, p3
    }
}

/// Tests if point `ptest` is inside the triangle `(p1, p2, p3)`.
///
/// Steps: bounding box rejection, coplanarity check, same-side test for each edge.
/// Points on the edges (within `EPS`) are inside only if `boundary_in` is true.
/// Degenerate (zero-area) triangles contain no points.
pub fn is_point_inside_triangle(
    ptest: Point,
    p1: Point,
    p2: Point,
    p3: Point,
    boundary_in: bool,
) -> bool {
    if !is_point_inside_bbox(ptest, &[p1, p2, p3]) {
        return false;
    }

    let n = (p2 - p1).cross(p3 - p1);
    let n = match n.normalize() {
        Ok(n) => n,
        Err(_) => return false,
    };

    // Coplanarity
    if (ptest - p1).dot(n).abs() > EPS {
        return false;
    }

    // Signed in-plane distance of ptest from each edge line (positive = inner side)
    for (pa, pb) in [(p1, p2), (p2, p3), (p3, p1)] {
        let edge = pb - pa;
        let side = edge.cross(ptest - pa).dot(n) / edge.length();
        if boundary_in {
            if side < -EPS {
                return false;
            }
        } else if side <= EPS {
            return false;
        }
    }

    true
}
