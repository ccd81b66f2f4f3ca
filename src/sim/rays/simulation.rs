use std::path::Path;

use anyhow::Result;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::geom::flat::FlatBuilding;
use crate::io::snapshots::SnapshotWriter;
use crate::sim::engine::find_transparent::find_transparent_polygons;
use crate::sim::engine::{RayBatch, Scene};
use crate::{Point, Vector};

use super::config::SimulationConfig;
use super::tracer::{Absorbers, BatchSnapshot, RayTracer, StateBuffers};

/// Receives the linearized state of every finished batch.
pub trait BatchSink {
    /// `first_step` is the global index of `snapshot`'s first step.
    fn write_batch(&mut self, first_step: usize, snapshot: &BatchSnapshot) -> Result<()>;
}

/// Keeps the whole run in memory: `field[step][ray_or_absorber]`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHistory {
    pub positions: Vec<Vec<Point>>,
    pub velocities: Vec<Vec<Vector>>,
    pub energies: Vec<Vec<f64>>,
    pub hits: Vec<Vec<f64>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded steps.
    pub fn num_steps(&self) -> usize {
        self.positions.len()
    }
}

impl BatchSink for InMemoryHistory {
    fn write_batch(&mut self, _first_step: usize, snapshot: &BatchSnapshot) -> Result<()> {
        self.positions.extend_from_slice(&snapshot.positions);
        self.velocities.extend_from_slice(&snapshot.velocities);
        self.energies.extend_from_slice(&snapshot.energies);
        self.hits.extend_from_slice(&snapshot.hits);
        Ok(())
    }
}

/// Final state of a run.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// Ray states after the last step.
    pub rays: RayBatch,
    /// Cumulative energy per absorber.
    pub hits: Vec<f64>,
    /// Number of simulated steps.
    pub num_steps: usize,
}

pub struct Simulation {
    config: SimulationConfig,
    scene: Scene,
}

impl Simulation {
    /// Validates the configuration and builds the scene (including the voxel grid).
    pub fn new(building: FlatBuilding, config: SimulationConfig) -> Result<Self> {
        config.validate()?;

        let absorption = config.resolve_absorption(&building.paths());
        let transparent = if config.search_transparent {
            find_transparent_polygons(&building)
        } else {
            vec![false; building.len()]
        };
        let scene = Scene::new(building, absorption, transparent, config.voxel_size)?;

        log::info!(
            "Scene ready: {} polygons ({} transparent), {} non-empty voxel cells of size {}",
            scene.num_polygons(),
            scene.num_transparent(),
            scene.voxel_grid.num_nonempty_cells(),
            config.voxel_size
        );

        Ok(Self { config, scene })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Rays at the source with random directions (seeded if configured).
    pub fn initial_rays(&self) -> RayBatch {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        RayBatch::new(
            self.config.source,
            self.config.ray_speed,
            self.config.num_rays,
            &mut rng,
        )
    }

    /// Runs the configured number of steps, handing every batch to `sink`.
    pub fn run(&self, sink: &mut dyn BatchSink) -> Result<SimulationResult> {
        self.run_from(self.initial_rays(), sink)
    }

    /// Same as [`Simulation::run`] but starting from the given rays.
    pub fn run_from(
        &self,
        mut rays: RayBatch,
        sink: &mut dyn BatchSink,
    ) -> Result<SimulationResult> {
        let batch_size = self.config.batch_size;
        let num_batches = self.config.num_steps / batch_size;

        let tracer = RayTracer::new(
            &self.scene,
            self.config.time_step,
            self.config.ray_speed,
            self.config.max_lag,
        );
        let mut absorbers =
            Absorbers::new(self.config.absorbers.clone(), self.config.absorber_radius);
        let mut buffers = StateBuffers::new(batch_size);

        log::info!(
            "Running {} rays for {} steps in {} batches (reflection distance {:.3e})",
            rays.len(),
            self.config.num_steps,
            num_batches,
            tracer.reflection_distance()
        );

        for batch_idx in 0..num_batches {
            let first_step = batch_idx * batch_size;
            buffers.clear();
            tracer.run_batch(first_step, batch_size, &mut rays, &mut absorbers, &mut buffers)?;
            sink.write_batch(first_step, &buffers.linearize())?;

            log::info!(
                "Batch {}/{}: {} rays alive, ray energy {:.6}, absorber hits {:?}",
                batch_idx + 1,
                num_batches,
                rays.num_alive(),
                rays.total_energy(),
                absorbers.hits
            );
        }

        Ok(SimulationResult {
            rays,
            hits: absorbers.hits,
            num_steps: num_batches * batch_size,
        })
    }

    /// Runs the simulation keeping every step in memory.
    pub fn run_in_memory(&self) -> Result<(SimulationResult, InMemoryHistory)> {
        let mut history = InMemoryHistory::new();
        let result = self.run(&mut history)?;
        Ok((result, history))
    }

    /// Runs the simulation writing per-step snapshots under `dir`.
    ///
    /// `dir` must be missing or empty.
    pub fn run_to_dir(&self, dir: &Path) -> Result<SimulationResult> {
        let mut writer = SnapshotWriter::new(dir)?;
        self.run(&mut writer)
    }
}
