use std::collections::HashMap;

use anyhow::Result;

use crate::error::SimulationError;
use crate::geom::EPS;
use crate::geom::bboxes::{
    are_bboxes_overlapping, bounding_box, does_segment_touch_bbox, is_point_in_bounds,
};
use crate::geom::flat::FlatBuilding;
use crate::geom::polygon::{PolygonView, segment_crosses_polygon};
use crate::{Point, Vector};

/// Integer cell coordinate `(i, j, k)`.
pub type Cell = (i32, i32, i32);

/// Uniform grid of cubic cells over the building's bounding box.
///
/// Each cell holds the (ascending) indices of polygons which can intersect it.
/// Cell `(0, 0, 0)` starts at the minimum corner of the bounding box.
#[derive(Debug)]
pub struct VoxelGrid {
    grid: HashMap<Cell, Vec<usize>>,
    step: f64,
    origin: Point,
    dims: Cell,
}

impl VoxelGrid {
    /// Builds the grid with cell size `step`.
    ///
    /// Every polygon must end up in at least one cell, otherwise
    /// [`SimulationError::UnindexedPolygon`] is returned.
    pub fn new(building: &FlatBuilding, step: f64) -> Result<Self> {
        if step <= 0.0 || !step.is_finite() {
            return Err(
                SimulationError::InvalidConfig(format!("voxel size must be positive, got {step}"))
                    .into(),
            );
        }

        let mut grid: HashMap<Cell, Vec<usize>> = HashMap::new();
        if building.is_empty() {
            return Ok(Self {
                grid,
                step,
                origin: Point::new(0., 0., 0.),
                dims: (0, 0, 0),
            });
        }

        let (bbox_min, bbox_max) = building.bounding_box();
        let dim = |lo: f64, hi: f64| (((hi - lo) / step).ceil() as i32).max(1);
        let dims = (
            dim(bbox_min.x, bbox_max.x),
            dim(bbox_min.y, bbox_max.y),
            dim(bbox_min.z, bbox_max.z),
        );

        let mut vg = Self {
            grid: HashMap::new(),
            step,
            origin: bbox_min,
            dims,
        };

        for idx in 0..building.len() {
            let poly = building.view(idx);
            let (pmin, pmax) = bounding_box(poly.outline);
            let (i0, j0, k0) = vg.clamp_cell(vg.raw_cell(pmin + Vector::new(-EPS, -EPS, -EPS)));
            let (i1, j1, k1) = vg.clamp_cell(vg.raw_cell(pmax + Vector::new(EPS, EPS, EPS)));

            let mut registered = false;
            for i in i0..=i1 {
                for j in j0..=j1 {
                    for k in k0..=k1 {
                        let (vmin, vmax) = vg.cell_bounds((i, j, k));
                        if !are_bboxes_overlapping(vmin, vmax, pmin, pmax) {
                            continue;
                        }
                        if polygon_touches_cell(&poly, vmin, vmax) {
                            grid.entry((i, j, k)).or_default().push(idx);
                            registered = true;
                        }
                    }
                }
            }

            if !registered {
                return Err(SimulationError::UnindexedPolygon {
                    polygon: idx,
                    path: building.polygons[idx].path.clone(),
                }
                .into());
            }
        }

        vg.grid = grid;
        Ok(vg)
    }

    /// Cell size.
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Number of cells along each axis.
    pub fn dims(&self) -> Cell {
        self.dims
    }

    /// Number of cells holding at least one polygon.
    pub fn num_nonempty_cells(&self) -> usize {
        self.grid.len()
    }

    /// Cell containing `pos` (may lie outside the grid).
    pub fn cell_index(&self, pos: Point) -> Cell {
        self.raw_cell(pos)
    }

    /// Polygons registered in a single cell.
    pub fn polygons_in_cell(&self, cell: Cell) -> &[usize] {
        self.grid.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterates over all non-empty cells.
    pub fn cells(&self) -> impl Iterator<Item = (&Cell, &Vec<usize>)> {
        self.grid.iter()
    }

    /// Returns polygon indices from cell `(i, j, k)` and its 26 neighbors (sorted, unique).
    pub fn find_nearby(&self, cell: Cell) -> Vec<usize> {
        let (ci, cj, ck) = cell;
        let mut result = Vec::new();

        for di in -1..=1 {
            for dj in -1..=1 {
                for dk in -1..=1 {
                    if let Some(indices) = self.grid.get(&(
                        ci.saturating_add(di),
                        cj.saturating_add(dj),
                        ck.saturating_add(dk),
                    )) {
                        result.extend_from_slice(indices);
                    }
                }
            }
        }

        result.sort_unstable();
        result.dedup();
        result
    }

    /// Same as [`VoxelGrid::find_nearby`] for the cell containing `pos`.
    pub fn find_nearby_point(&self, pos: Point) -> Vec<usize> {
        self.find_nearby(self.cell_index(pos))
    }

    /// (min, max) corners of a cell.
    pub fn cell_bounds(&self, cell: Cell) -> (Point, Point) {
        let (i, j, k) = cell;
        let vmin = self.origin
            + Vector::new(i as f64 * self.step, j as f64 * self.step, k as f64 * self.step);
        let vmax = vmin + Vector::new(self.step, self.step, self.step);
        (vmin, vmax)
    }

    fn raw_cell(&self, pos: Point) -> Cell {
        (
            ((pos.x - self.origin.x) / self.step).floor() as i32,
            ((pos.y - self.origin.y) / self.step).floor() as i32,
            ((pos.z - self.origin.z) / self.step).floor() as i32,
        )
    }

    fn clamp_cell(&self, cell: Cell) -> Cell {
        (
            cell.0.clamp(0, self.dims.0 - 1),
            cell.1.clamp(0, self.dims.1 - 1),
            cell.2.clamp(0, self.dims.2 - 1),
        )
    }
}

/// Checks whether a polygon can intersect the (EPS-padded) cell `(vmin, vmax)`.
///
/// True if any polygon vertex lies in the cell, any polygon edge passes
/// through the cell, or any cell edge crosses the polygon.
fn polygon_touches_cell(poly: &PolygonView, vmin: Point, vmax: Point) -> bool {
    if poly
        .outline
        .iter()
        .any(|p| is_point_in_bounds(*p, vmin, vmax, EPS))
    {
        return true;
    }

    if poly
        .edges()
        .any(|(p1, p2)| does_segment_touch_bbox(p1, p2, vmin, vmax))
    {
        return true;
    }

    cell_edges(vmin, vmax)
        .iter()
        .any(|(a, b)| segment_crosses_polygon(*a, *b, poly))
}

/// The 12 edges of an axis-aligned box.
fn cell_edges(vmin: Point, vmax: Point) -> [(Point, Point); 12] {
    let c = |x: bool, y: bool, z: bool| {
        Point::new(
            if x { vmax.x } else { vmin.x },
            if y { vmax.y } else { vmin.y },
            if z { vmax.z } else { vmin.z },
        )
    };
    [
        // Along x
        (c(false, false, false), c(true, false, false)),
        (c(false, true, false), c(true, true, false)),
        (c(false, false, true), c(true, false, true)),
        (c(false, true, true), c(true, true, true)),
        // Along y
        (c(false, false, false), c(false, true, false)),
        (c(true, false, false), c(true, true, false)),
        (c(false, false, true), c(false, true, true)),
        (c(true, false, true), c(true, true, true)),
        // Along z
        (c(false, false, false), c(false, false, true)),
        (c(true, false, false), c(true, false, true)),
        (c(false, true, false), c(false, true, true)),
        (c(true, true, false), c(true, true, true)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::flat::FlatPolygon;
    use crate::geom::shapes::box_polygons;

    fn unit_cube() -> FlatBuilding {
        FlatBuilding::new(box_polygons("z", "s", (1., 1., 1.), (0., 0., 0.))).unwrap()
    }

    #[test]
    fn test_voxel_grid_basic() {
        let pts = vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(1.0, 1.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
        ];
        let building = FlatBuilding::new(vec![FlatPolygon::new("z/s/w/square", pts)]).unwrap();
        let grid = VoxelGrid::new(&building, 0.5).unwrap();

        let nearby = grid.find_nearby_point(Point::new(0.5, 0.5, 0.0));
        assert!(nearby.contains(&0));
    }

    #[test]
    fn test_voxel_grid_far_point() {
        let grid = VoxelGrid::new(&unit_cube(), 0.25).unwrap();
        let nearby = grid.find_nearby_point(Point::new(100.0, 100.0, 100.0));
        assert!(nearby.is_empty());
    }

    #[test]
    fn test_every_polygon_is_indexed() {
        let building = unit_cube();
        for step in [0.1, 0.3, 0.5, 1.0, 5.0] {
            let grid = VoxelGrid::new(&building, step).unwrap();
            for idx in 0..building.len() {
                assert!(
                    grid.cells().any(|(_, polys)| polys.contains(&idx)),
                    "polygon {idx} not indexed with step {step}"
                );
            }
        }
    }

    #[test]
    fn test_single_cell_for_large_step() {
        let building = unit_cube();
        let grid = VoxelGrid::new(&building, 2.0).unwrap();
        assert_eq!(grid.dims(), (1, 1, 1));
        assert_eq!(grid.num_nonempty_cells(), 1);
        let polys = grid.polygons_in_cell((0, 0, 0));
        assert_eq!(polys, &[0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_interior_cells_are_empty() {
        // 4x4x4 cells over the unit cube, inner 2x2x2 block touches no wall
        let grid = VoxelGrid::new(&unit_cube(), 0.25).unwrap();
        assert_eq!(grid.dims(), (4, 4, 4));
        assert!(grid.polygons_in_cell((1, 1, 1)).is_empty());
        assert!(grid.polygons_in_cell((2, 2, 2)).is_empty());
        assert_eq!(grid.num_nonempty_cells(), 64 - 8);
        // A corner cell sees the three walls meeting there
        assert_eq!(grid.polygons_in_cell((0, 0, 0)).len(), 3);
    }

    #[test]
    fn test_large_polygon_through_small_cells() {
        // A slanted quad whose vertices are far from most of the cells it crosses
        let pts = vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(4.0, 0.0, 0.0),
            Point::new(4.0, 4.0, 4.0),
            Point::new(0.0, 4.0, 4.0),
        ];
        let building = FlatBuilding::new(vec![FlatPolygon::new("z/s/w/ramp", pts)]).unwrap();
        let grid = VoxelGrid::new(&building, 0.5).unwrap();
        // Cell around the middle of the ramp (2, 2, 2)
        let cell = grid.cell_index(Point::new(2.1, 2.1, 2.1));
        assert!(grid.polygons_in_cell(cell).contains(&0));
        // Cell far below the ramp
        let cell = grid.cell_index(Point::new(2.1, 3.9, 0.1));
        assert!(grid.polygons_in_cell(cell).is_empty());
    }

    #[test]
    fn test_find_nearby_is_sorted_and_unique() {
        let grid = VoxelGrid::new(&unit_cube(), 0.25).unwrap();
        let nearby = grid.find_nearby((0, 0, 0));
        let mut expected = nearby.clone();
        expected.sort_unstable();
        expected.dedup();
        assert_eq!(nearby, expected);
        assert_eq!(nearby.len(), 3);
    }

    #[test]
    fn test_find_nearby_far_outside_grid() {
        let grid = VoxelGrid::new(&unit_cube(), 0.25).unwrap();
        assert!(grid.find_nearby((i32::MAX, i32::MAX, i32::MAX)).is_empty());
        assert!(grid.find_nearby((i32::MIN, 0, i32::MIN)).is_empty());
        assert!(grid.find_nearby_point(Point::new(1e300, -1e300, 0.5)).is_empty());
    }

    #[test]
    fn test_invalid_step() {
        assert!(VoxelGrid::new(&unit_cube(), 0.0).is_err());
        assert!(VoxelGrid::new(&unit_cube(), -1.0).is_err());
    }
}
