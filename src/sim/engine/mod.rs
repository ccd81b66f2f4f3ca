pub mod absorption;
pub mod find_transparent;
pub mod propagation;
pub mod reflection;
pub mod ring_buffer;
pub mod voxel_grid;

use anyhow::Result;
use rand::Rng;

use crate::error::SimulationError;
use crate::geom::flat::FlatBuilding;
use crate::geom::polygon::containment::projection_on_polygon;
use crate::geom::polygon::distance_point_to_polygon;
use crate::{Point, Vector};

use self::voxel_grid::VoxelGrid;

/// Read-only inputs of the ray loop.
///
/// Built once per run and shared by all worker threads.
#[derive(Debug)]
pub struct Scene {
    pub building: FlatBuilding,
    /// Absorption coefficient per polygon index.
    pub absorption: Vec<f64>,
    /// Transparency flag per polygon index.
    pub transparent: Vec<bool>,
    /// Spatial acceleration structure.
    pub voxel_grid: VoxelGrid,
    /// Scene bounding box minimum.
    pub bbox_min: Point,
    /// Scene bounding box maximum.
    pub bbox_max: Point,
}

impl Scene {
    pub fn new(
        building: FlatBuilding,
        absorption: Vec<f64>,
        transparent: Vec<bool>,
        voxel_size: f64,
    ) -> Result<Self> {
        if absorption.len() != building.len() || transparent.len() != building.len() {
            return Err(SimulationError::InvalidConfig(format!(
                "expected {} per-polygon values, got {} absorption and {} transparency entries",
                building.len(),
                absorption.len(),
                transparent.len()
            ))
            .into());
        }

        let voxel_grid = VoxelGrid::new(&building, voxel_size)?;
        let (bbox_min, bbox_max) = building.bounding_box();

        Ok(Self {
            building,
            absorption,
            transparent,
            voxel_grid,
            bbox_min,
            bbox_max,
        })
    }

    /// Number of polygons in the scene.
    pub fn num_polygons(&self) -> usize {
        self.building.len()
    }

    /// Number of transparent polygons.
    pub fn num_transparent(&self) -> usize {
        self.transparent.iter().filter(|t| **t).count()
    }

    /// Unit normal of polygon `idx`.
    pub fn normal(&self, idx: usize) -> Vector {
        self.building.polygons[idx].normal
    }

    /// Selects the surface a ray at `position` moving along `velocity` is heading to.
    ///
    /// Candidates are the non-transparent polygons around the ray's voxel cell
    /// whose forward projection along `velocity` lands inside the polygon.
    /// Among those the one with the smallest `distance_point_to_polygon` wins.
    /// `exclude` skips one polygon (the one the ray has just reflected from).
    ///
    /// Returns `(polygon_index, distance)`, `None` means "infinitely far".
    pub fn find_target(
        &self,
        position: Point,
        velocity: Vector,
        exclude: Option<usize>,
    ) -> Option<(usize, f64)> {
        let mut closest: Option<(usize, f64)> = None;

        for idx in self.voxel_grid.find_nearby_point(position) {
            if self.transparent[idx] || exclude == Some(idx) {
                continue;
            }
            let view = self.building.view(idx);
            if projection_on_polygon(position, velocity, &view, true).is_none() {
                continue;
            }
            let dist = distance_point_to_polygon(position, &view);
            match closest {
                Some((_, best)) if dist >= best => {}
                _ => closest = Some((idx, dist)),
            }
        }

        closest
    }

    /// Checks if a point is within the scene bounding box (with margin).
    pub fn is_in_bounds(&self, pos: Point, margin: f64) -> bool {
        pos.x >= self.bbox_min.x - margin
            && pos.x <= self.bbox_max.x + margin
            && pos.y >= self.bbox_min.y - margin
            && pos.y <= self.bbox_max.y + margin
            && pos.z >= self.bbox_min.z - margin
            && pos.z <= self.bbox_max.z + margin
    }
}

/// State of a single ray during simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct RayState {
    pub position: Point,
    pub velocity: Vector,
    /// In `[0, 1]`. Exactly 0 once the ray is captured, absorbed or escaped.
    pub energy: f64,
    /// Surface selected during the last step, if any.
    pub target: Option<usize>,
}

impl RayState {
    pub fn new(position: Point, velocity: Vector) -> Self {
        Self {
            position,
            velocity,
            energy: 1.0,
            target: None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.energy > 0.0
    }
}

/// A batch of rays for simulation.
#[derive(Debug, Clone)]
pub struct RayBatch {
    pub rays: Vec<RayState>,
}

impl RayBatch {
    /// Creates `num_rays` rays at `source` with random directions and the given speed.
    pub fn new(source: Point, speed: f64, num_rays: usize, rng: &mut impl Rng) -> Self {
        let rays = (0..num_rays)
            .map(|_| RayState::new(source, random_unit_vector(rng) * speed))
            .collect();
        Self { rays }
    }

    pub fn from_rays(rays: Vec<RayState>) -> Self {
        Self { rays }
    }

    /// Number of rays in the batch.
    pub fn len(&self) -> usize {
        self.rays.len()
    }

    /// Returns true if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.rays.is_empty()
    }

    /// Rays with non-zero energy.
    pub fn num_alive(&self) -> usize {
        self.rays.iter().filter(|r| r.is_alive()).count()
    }

    /// Sum of ray energies.
    pub fn total_energy(&self) -> f64 {
        self.rays.iter().map(|r| r.energy).sum()
    }
}

/// Generate a random unit vector uniformly distributed on the sphere.
pub fn random_unit_vector(rng: &mut impl Rng) -> Vector {
    loop {
        let x: f64 = rng.gen_range(-1.0..1.0);
        let y: f64 = rng.gen_range(-1.0..1.0);
        let z: f64 = rng.gen_range(-1.0..1.0);
        let len2 = x * x + y * y + z * z;
        if len2 > 1e-6 && len2 <= 1.0 {
            let len = len2.sqrt();
            return Vector::new(x / len, y / len, z / len);
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::geom::shapes::box_polygons;
    use crate::sim::engine::find_transparent::find_transparent_polygons;

    fn cube_scene(size: f64, voxel_size: f64) -> Scene {
        let building = FlatBuilding::new(box_polygons("z", "s", (size, size, size), (0., 0., 0.)))
            .unwrap();
        let n = building.len();
        Scene::new(building, vec![0.0; n], vec![false; n], voxel_size).unwrap()
    }

    #[test]
    fn test_scene_construction() {
        let scene = cube_scene(2.0, 0.5);
        assert_eq!(scene.num_polygons(), 6);
        assert_eq!(scene.num_transparent(), 0);
        assert!(scene.bbox_min.is_close(&Point::new(0., 0., 0.)));
        assert!(scene.bbox_max.is_close(&Point::new(2., 2., 2.)));
    }

    #[test]
    fn test_scene_rejects_mismatched_lengths() {
        let building =
            FlatBuilding::new(box_polygons("z", "s", (1., 1., 1.), (0., 0., 0.))).unwrap();
        let err = Scene::new(building, vec![0.0; 2], vec![false; 6], 0.5).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SimulationError>(),
            Some(SimulationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_find_target_ahead() {
        let scene = cube_scene(2.0, 0.5);
        let (idx, dist) = scene
            .find_target(Point::new(1.8, 1.0, 1.0), Vector::new(1., 0., 0.), None)
            .unwrap();
        assert!(scene.building.polygons[idx].path.contains("wall_1"));
        assert!((dist - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_find_target_ignores_surfaces_behind() {
        let scene = cube_scene(1.0, 1.0);
        // Close to x=0 but moving away from it
        let (idx, dist) = scene
            .find_target(Point::new(0.05, 0.5, 0.5), Vector::new(1., 0., 0.), None)
            .unwrap();
        assert!(scene.building.polygons[idx].path.contains("wall_1"));
        assert!((dist - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_find_target_out_of_range() {
        // Far from every wall the nearby cells are empty
        let scene = cube_scene(2.0, 0.5);
        let target = scene.find_target(Point::new(0.75, 1.0, 1.0), Vector::new(1., 0., 0.), None);
        assert!(target.is_none());
    }

    #[test]
    fn test_find_target_exclude() {
        let scene = cube_scene(1.0, 1.0);
        let pos = Point::new(0.99, 0.5, 0.5);
        let (idx, _) = scene.find_target(pos, Vector::new(1., 0., 0.), None).unwrap();
        let other = scene.find_target(pos, Vector::new(1., 0., 0.), Some(idx));
        assert!(other.is_none());
    }

    #[test]
    fn test_find_target_skips_transparent() {
        let mut polygons = box_polygons("z", "s0", (1., 1., 1.), (0., 0., 0.));
        polygons.extend(box_polygons("z", "s1", (1., 1., 1.), (1., 0., 0.)));
        let building = FlatBuilding::new(polygons).unwrap();
        let transparent = find_transparent_polygons(&building);
        let n = building.len();
        let scene = Scene::new(building, vec![0.0; n], transparent, 1.0).unwrap();
        assert_eq!(scene.num_transparent(), 2);

        let (idx, dist) = scene
            .find_target(Point::new(0.95, 0.5, 0.5), Vector::new(1., 0., 0.), None)
            .unwrap();
        assert!(scene.building.polygons[idx].path.starts_with("z/s1/wall_1"));
        assert!((dist - 1.05).abs() < 1e-9);
    }

    #[test]
    fn test_is_in_bounds() {
        let scene = cube_scene(2.0, 0.5);
        assert!(scene.is_in_bounds(Point::new(1.0, 1.0, 1.0), 0.0));
        assert!(scene.is_in_bounds(Point::new(2.0, 2.0, 2.0), 0.0));
        assert!(!scene.is_in_bounds(Point::new(10.0, 10.0, 10.0), 0.0));
        assert!(!scene.is_in_bounds(Point::new(2.1, 1.0, 1.0), 0.05));
    }

    #[test]
    fn test_ray_batch_creation() {
        let mut rng = StdRng::seed_from_u64(0);
        let batch = RayBatch::new(Point::new(0.0, 0.0, 0.0), 343.0, 10, &mut rng);
        assert_eq!(batch.len(), 10);
        assert_eq!(batch.num_alive(), 10);
        assert!((batch.total_energy() - 10.0).abs() < 1e-12);
        for ray in &batch.rays {
            let speed = ray.velocity.length();
            assert!((speed - 343.0).abs() < 1e-6);
            assert!(ray.target.is_none());
        }
    }

    #[test]
    fn test_ray_batch_is_reproducible() {
        let a = RayBatch::new(Point::new(0., 0., 0.), 1.0, 5, &mut StdRng::seed_from_u64(7));
        let b = RayBatch::new(Point::new(0., 0., 0.), 1.0, 5, &mut StdRng::seed_from_u64(7));
        assert_eq!(a.rays, b.rays);
    }
}
