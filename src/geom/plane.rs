//! Plane equation `a*x + b*y + c*z + d = 0` with a unit normal `(a, b, c)`.

use crate::geom::EPS;
use crate::{Point, Vector};
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl Plane {
    /// Creates a plane passing through `pt` with normal `vn`.
    ///
    /// The normal is normalized. Fails for a zero-length normal.
    pub fn from_normal(vn: Vector, pt: Point) -> Result<Self> {
        let n = vn
            .normalize()
            .map_err(|_| anyhow!("Plane normal cannot have zero length"))?;
        Ok(Self {
            a: n.dx,
            b: n.dy,
            c: n.dz,
            d: -(n.dx * pt.x + n.dy * pt.y + n.dz * pt.z),
        })
    }

    /// Creates a plane from the first three non-collinear points of `pts`.
    ///
    /// The first three points are tried first. If they are collinear,
    /// the third point is replaced by the next ones until a valid triple is found.
    pub fn from_points(pts: &[Point]) -> Result<Self> {
        Self::from_normal(polygon_normal(pts)?, pts[0])
    }

    /// Unit normal vector of the plane.
    pub fn normal(&self) -> Vector {
        Vector::new(self.a, self.b, self.c)
    }

    /// Signed distance of a point to the plane.
    pub fn distance(&self, pt: Point) -> f64 {
        self.a * pt.x + self.b * pt.y + self.c * pt.z + self.d
    }

    /// Orthogonal projection of a point onto the plane.
    pub fn project(&self, pt: Point) -> Point {
        pt + self.normal() * (-self.distance(pt))
    }

    /// Intersection of the line `pt + t * dir` with the plane.
    ///
    /// Returns the intersection point and the line parameter `t`,
    /// or `None` if the line is parallel to the plane.
    pub fn intersect_line(&self, pt: Point, dir: Vector) -> Option<(Point, f64)> {
        let denom = self.normal().dot(dir);
        if denom.abs() < EPS * EPS {
            return None;
        }
        let t = -self.distance(pt) / denom;
        Some((pt + dir * t, t))
    }
}

/// Computes the unit normal of a polygon from its first non-collinear vertex triple.
///
/// Vertices are assumed to be ordered counter-clockwise with respect to the front side.
pub fn polygon_normal(pts: &[Point]) -> Result<Vector> {
    if pts.len() < 3 {
        return Err(anyhow!("At least 3 points needed, got {}", pts.len()));
    }
    for i in 1..pts.len() - 1 {
        for k in (i + 1)..pts.len() {
            if let Ok(vn) = Vector::normal(pts[0], pts[i], pts[k]) {
                return Ok(orient_to_winding(vn, pts));
            }
        }
    }
    Err(anyhow!("Normal vector cannot be computed: all points are collinear"))
}

/// Flips `vn` if it disagrees with the polygon winding (Newell's area vector).
///
/// The first vertex triple may lie on a concave corner, in which case its normal
/// points against the polygon orientation.
fn orient_to_winding(vn: Vector, pts: &[Point]) -> Vector {
    let n = pts.len();
    let mut area = Vector::new(0., 0., 0.);
    for i in 0..n {
        let p = pts[i];
        let q = pts[(i + 1) % n];
        area = area
            + Vector::new(
                (p.y - q.y) * (p.z + q.z),
                (p.z - q.z) * (p.x + q.x),
                (p.x - q.x) * (p.y + q.y),
            );
    }
    if area.dot(vn) < 0.0 { -vn } else { vn }
}
