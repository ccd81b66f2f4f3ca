//! Time stepping of a ray batch.
//!
//! One step is: absorber capture (serialized accumulation), then the parallel
//! per-ray update (escape guard, target selection, reflection with lag retry,
//! position update).

use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use crate::error::SimulationError;
use crate::geom::EPS;
use crate::sim::engine::absorption::{AbsorptionModel, ScalarAbsorption};
use crate::sim::engine::propagation::{FixedTimeStep, PropagationModel};
use crate::sim::engine::reflection::{ReflectionModel, Specular};
use crate::sim::engine::ring_buffer::RingBuffer;
use crate::sim::engine::{RayBatch, RayState, Scene};
use crate::{Point, Vector};

/// Per-ray energy below this value is treated as "dead".
pub const ENERGY_EPS: f64 = 1e-10;

/// Spherical receivers sharing one capture radius.
#[derive(Debug, Clone)]
pub struct Absorbers {
    pub centers: Vec<Point>,
    pub radius: f64,
    /// Cumulative captured energy per absorber.
    pub hits: Vec<f64>,
}

impl Absorbers {
    pub fn new(centers: Vec<Point>, radius: f64) -> Self {
        let hits = vec![0.0; centers.len()];
        Self {
            centers,
            radius,
            hits,
        }
    }

    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    /// First absorber whose sphere contains `pos`.
    pub fn capture(&self, pos: Point) -> Option<usize> {
        self.centers
            .iter()
            .position(|c| c.distance(&pos) <= self.radius)
    }

    /// Energy collected by all absorbers.
    pub fn total(&self) -> f64 {
        self.hits.iter().sum()
    }
}

/// Linearized ray states of one batch: `field[step_in_batch][ray_or_absorber]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSnapshot {
    pub positions: Vec<Vec<Point>>,
    pub velocities: Vec<Vec<Vector>>,
    pub energies: Vec<Vec<f64>>,
    /// Cumulative absorber hits after each step.
    pub hits: Vec<Vec<f64>>,
}

impl BatchSnapshot {
    /// Number of recorded steps.
    pub fn num_steps(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// One ring buffer per recorded field.
pub struct StateBuffers {
    positions: RingBuffer<Vec<Point>>,
    velocities: RingBuffer<Vec<Vector>>,
    energies: RingBuffer<Vec<f64>>,
    hits: RingBuffer<Vec<f64>>,
}

impl StateBuffers {
    pub fn new(capacity: usize) -> Self {
        Self {
            positions: RingBuffer::new(capacity),
            velocities: RingBuffer::new(capacity),
            energies: RingBuffer::new(capacity),
            hits: RingBuffer::new(capacity),
        }
    }

    /// Appends the current state of all rays and absorbers.
    pub fn record(&mut self, batch: &RayBatch, absorbers: &Absorbers) {
        self.positions
            .push(batch.rays.iter().map(|r| r.position).collect());
        self.velocities
            .push(batch.rays.iter().map(|r| r.velocity).collect());
        self.energies
            .push(batch.rays.iter().map(|r| r.energy).collect());
        self.hits.push(absorbers.hits.clone());
    }

    /// Number of recorded steps.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn linearize(&self) -> BatchSnapshot {
        BatchSnapshot {
            positions: self.positions.linearize(),
            velocities: self.velocities.linearize(),
            energies: self.energies.linearize(),
            hits: self.hits.linearize(),
        }
    }

    pub fn clear(&mut self) {
        self.positions.clear();
        self.velocities.clear();
        self.energies.clear();
        self.hits.clear();
    }
}

/// What happened to the batch during one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    pub captured: usize,
    pub escaped: usize,
}

/// Advances rays through a [`Scene`].
pub struct RayTracer<'a> {
    scene: &'a Scene,
    time_step: f64,
    reflection_distance: f64,
    max_lag: usize,
    absorption: ScalarAbsorption,
    reflection: Specular,
    propagation: FixedTimeStep,
}

impl<'a> RayTracer<'a> {
    pub fn new(scene: &'a Scene, time_step: f64, speed: f64, max_lag: usize) -> Self {
        let propagation = FixedTimeStep;
        Self {
            scene,
            time_step,
            reflection_distance: propagation.reflection_distance(speed, time_step),
            max_lag,
            absorption: ScalarAbsorption::new(scene.absorption.clone()),
            reflection: Specular,
            propagation,
        }
    }

    pub fn reflection_distance(&self) -> f64 {
        self.reflection_distance
    }

    /// Runs `num_steps` steps starting at global step `first_step`,
    /// recording the state after each step.
    pub fn run_batch(
        &self,
        first_step: usize,
        num_steps: usize,
        batch: &mut RayBatch,
        absorbers: &mut Absorbers,
        buffers: &mut StateBuffers,
    ) -> Result<(), SimulationError> {
        for step in first_step..first_step + num_steps {
            self.run_step(step, batch, absorbers)?;
            buffers.record(batch, absorbers);
        }
        Ok(())
    }

    /// Advances all rays by one time step.
    ///
    /// Fails if any ray needs more than `max_lag` reflections within the step.
    pub fn run_step(
        &self,
        step: usize,
        batch: &mut RayBatch,
        absorbers: &mut Absorbers,
    ) -> Result<StepReport, SimulationError> {
        let mut report = StepReport::default();

        if !absorbers.is_empty() {
            let captures: Vec<Option<usize>> = batch
                .rays
                .par_iter()
                .map(|ray| {
                    if ray.is_alive() {
                        absorbers.capture(ray.position)
                    } else {
                        None
                    }
                })
                .collect();

            for (ray, capture) in batch.rays.iter_mut().zip(captures) {
                if let Some(ai) = capture {
                    absorbers.hits[ai] += ray.energy;
                    ray.energy = 0.0;
                    ray.target = None;
                    report.captured += 1;
                }
            }
        }

        let escaped = AtomicUsize::new(0);
        batch
            .rays
            .par_iter_mut()
            .enumerate()
            .try_for_each(|(ray_idx, ray)| self.step_ray(step, ray_idx, ray, &escaped))?;

        report.escaped = escaped.into_inner();
        if report.escaped > 0 {
            log::warn!(
                "Step {step}: {} rays left the bounding box and were removed",
                report.escaped
            );
        }

        Ok(report)
    }

    fn step_ray(
        &self,
        step: usize,
        ray_idx: usize,
        ray: &mut RayState,
        escaped: &AtomicUsize,
    ) -> Result<(), SimulationError> {
        if !ray.is_alive() {
            return Ok(());
        }

        if !self.scene.is_in_bounds(ray.position, EPS) {
            ray.energy = 0.0;
            ray.target = None;
            escaped.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        }

        let mut lag = 0;
        let mut last_reflection = None;
        loop {
            let target = self
                .scene
                .find_target(ray.position, ray.velocity, last_reflection);
            ray.target = target.map(|(idx, _)| idx);

            let Some((idx, dist)) = target else { break };
            if dist > self.reflection_distance {
                break;
            }

            lag += 1;
            if lag > self.max_lag {
                return Err(SimulationError::LagExceeded {
                    ray: ray_idx,
                    polygon: idx,
                    lag,
                    step,
                });
            }

            ray.velocity = self.reflection.reflect(ray.velocity, self.scene.normal(idx));
            ray.energy = self.absorption.apply(ray.energy, idx);
            if ray.energy <= ENERGY_EPS {
                ray.energy = 0.0;
                ray.target = None;
                return Ok(());
            }
            last_reflection = Some(idx);
        }

        ray.position = self
            .propagation
            .advance(ray.position, ray.velocity, self.time_step);
        Ok(())
    }
}
