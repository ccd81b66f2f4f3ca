//! Flattened building representation.
//!
//! The building hierarchy (zone/solid/wall/polygon) is reduced to parallel arrays:
//! a global vertex array, global triangle index triples, a triangle -> polygon map
//! and per-polygon metadata. The ray loop only ever reads these arrays.

use std::ops::Range;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::error::SimulationError;
use crate::geom::bboxes::bounding_box;
use crate::geom::plane::{Plane, polygon_normal};
use crate::geom::point::check::are_points_coplanar;
use crate::geom::polygon::PolygonView;
use crate::geom::segment::line_segment_intersection;
use crate::geom::triangles::{TriangleIndex, triangulate};
use crate::{Point, Vector};

/// A single polygon before flattening.
///
/// `path` follows the `zone/solid/wall/polygon` convention.
/// Vertices are ordered counter-clockwise with respect to the front side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatPolygon {
    pub path: String,
    pub vertices: Vec<Point>,
}

impl FlatPolygon {
    pub fn new(path: &str, vertices: Vec<Point>) -> Self {
        Self {
            path: path.to_string(),
            vertices,
        }
    }
}

/// Per-polygon metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonMeta {
    pub path: String,
    /// Range in the global vertex array.
    pub vertices: Range<usize>,
    /// Range in the global triangle array.
    pub triangles: Range<usize>,
    /// Unit normal, consistent with the triangle winding.
    pub normal: Vector,
    pub plane: Plane,
}

impl PolygonMeta {
    /// First path component (zone name).
    pub fn zone(&self) -> &str {
        self.path.split('/').next().unwrap_or("")
    }

    /// Second path component (solid name).
    pub fn solid(&self) -> &str {
        self.path.split('/').nth(1).unwrap_or("")
    }
}

#[derive(Debug, Clone)]
pub struct FlatBuilding {
    pub points: Vec<Point>,
    pub triangles: Vec<TriangleIndex>,
    pub tri_to_poly: Vec<usize>,
    pub polygons: Vec<PolygonMeta>,
}

impl FlatBuilding {
    /// Flattens and validates a list of polygons.
    ///
    /// Fails with [`SimulationError::DegenerateNormal`] if a normal cannot be computed
    /// and with [`SimulationError::InvalidPolygon`] for other broken polygons.
    pub fn new(polygons: Vec<FlatPolygon>) -> Result<Self> {
        let mut points = Vec::new();
        let mut triangles = Vec::new();
        let mut tri_to_poly = Vec::new();
        let mut metas = Vec::with_capacity(polygons.len());

        for (idx, poly) in polygons.into_iter().enumerate() {
            let invalid = |reason: &str| SimulationError::InvalidPolygon {
                path: poly.path.clone(),
                reason: reason.to_string(),
            };
            if poly.vertices.len() < 3 {
                return Err(invalid("fewer than 3 vertices").into());
            }
            let normal =
                polygon_normal(&poly.vertices).map_err(|_| SimulationError::DegenerateNormal {
                    polygon: idx,
                    path: poly.path.clone(),
                })?;
            if !are_points_coplanar(&poly.vertices) {
                return Err(invalid("vertices are not coplanar").into());
            }
            if is_self_intersecting(&poly.vertices) {
                return Err(invalid("edges are self-intersecting").into());
            }
            let plane = Plane::from_normal(normal, poly.vertices[0])?;
            let local_tri =
                triangulate(&poly.vertices, normal).map_err(|e| invalid(&e.to_string()))?;

            let pt_offset = points.len();
            let tri_offset = triangles.len();
            points.extend(poly.vertices.iter().copied());
            triangles.extend(local_tri.iter().map(|t| t.offset(pt_offset)));
            tri_to_poly.extend(std::iter::repeat_n(idx, local_tri.len()));

            metas.push(PolygonMeta {
                path: poly.path,
                vertices: pt_offset..points.len(),
                triangles: tri_offset..triangles.len(),
                normal,
                plane,
            });
        }

        Ok(Self {
            points,
            triangles,
            tri_to_poly,
            polygons: metas,
        })
    }

    /// Number of polygons.
    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Borrowed geometry of polygon `idx`.
    pub fn view(&self, idx: usize) -> PolygonView<'_> {
        let meta = &self.polygons[idx];
        PolygonView {
            points: &self.points,
            outline: &self.points[meta.vertices.clone()],
            triangles: &self.triangles[meta.triangles.clone()],
            plane: meta.plane,
        }
    }

    /// Ordered vertices of polygon `idx`.
    pub fn vertices(&self, idx: usize) -> &[Point] {
        &self.points[self.polygons[idx].vertices.clone()]
    }

    /// Polygon paths in index order.
    pub fn paths(&self) -> Vec<&str> {
        self.polygons.iter().map(|p| p.path.as_str()).collect()
    }

    /// Bounding box of the whole building.
    pub fn bounding_box(&self) -> (Point, Point) {
        bounding_box(&self.points)
    }
}

/// Checks whether any two non-adjacent edges of a closed outline intersect.
fn is_self_intersecting(pts: &[Point]) -> bool {
    let n = pts.len();
    for i in 0..n {
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue; // Adjacent through the closing edge
            }
            let (a1, b1) = (pts[i], pts[(i + 1) % n]);
            let (a2, b2) = (pts[j], pts[(j + 1) % n]);
            if line_segment_intersection(a1, b1, a2, b2).is_some() {
                return true;
            }
        }
    }
    false
}
