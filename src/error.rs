//! Fatal error conditions of a simulation run.
//!
//! Functions return `anyhow::Result` and wrap these variants, so callers can
//! branch on them with `err.downcast_ref::<SimulationError>()`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error(
        "Voxel size {voxel_size} must be larger than the reflection distance {reflection_distance}"
    )]
    VoxelTooSmall {
        voxel_size: f64,
        reflection_distance: f64,
    },

    #[error("Number of steps {num_steps} is not a multiple of batch size {batch_size}")]
    StepsNotMultipleOfBatch { num_steps: usize, batch_size: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Output directory is not empty: {}", .0.display())]
    OutputNotEmpty(PathBuf),

    #[error("Polygon {polygon} ({path}) is not registered in any voxel cell")]
    UnindexedPolygon { polygon: usize, path: String },

    #[error("Polygon {polygon} ({path}) has a degenerate normal vector")]
    DegenerateNormal { polygon: usize, path: String },

    #[error("Invalid polygon {path}: {reason}")]
    InvalidPolygon { path: String, reason: String },

    #[error(
        "Ray {ray} needed {lag} same-step reflections at polygon {polygon} (step {step})"
    )]
    LagExceeded {
        ray: usize,
        polygon: usize,
        lag: usize,
        step: usize,
    },
}
