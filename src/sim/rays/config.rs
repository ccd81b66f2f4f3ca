use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::Point;
use crate::error::SimulationError;
use crate::sim::engine::absorption::resolve_absorption;
use crate::sim::engine::propagation::{FixedTimeStep, PropagationModel};

/// Ray tracing configuration.
///
/// Missing fields in a JSON file fall back to the defaults of [`SimulationConfig::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // Engine
    pub time_step: f64,
    pub num_steps: usize,
    /// Steps held in memory before a batch is flushed.
    pub batch_size: usize,
    pub voxel_size: f64,
    pub search_transparent: bool,
    /// Maximum number of reflections of one ray within a single step.
    pub max_lag: usize,

    // Rays
    pub num_rays: usize,
    pub ray_speed: f64,
    pub source: Point,
    pub absorbers: Vec<Point>,
    pub absorber_radius: f64,
    /// Seed for ray directions. `None` draws from OS entropy.
    pub seed: Option<u64>,

    // Surfaces
    pub default_absorption: f64,
    /// Ordered `(path-prefix, coefficient)` overrides.
    pub absorption: Vec<(String, f64)>,
}

impl SimulationConfig {
    pub fn new() -> Self {
        Self {
            time_step: 2.5e-5,
            num_steps: 1000,
            batch_size: 100,
            voxel_size: 0.1,
            search_transparent: true,
            max_lag: 10,
            num_rays: 1000,
            ray_speed: 343.0,
            source: Point::new(0.0, 0.0, 0.0),
            absorbers: Vec::new(),
            absorber_radius: 0.1,
            seed: None,
            default_absorption: 0.2,
            absorption: Vec::new(),
        }
    }

    /// Sets absorption for surfaces under the given path prefix.
    ///
    /// The prefix is matched on whole `/` components, so `"zone/room"` covers
    /// every polygon of solid `room` in zone `zone`. Later calls take precedence
    /// over earlier ones with an equally long prefix.
    pub fn set_absorption(&mut self, prefix: &str, value: f64) {
        self.absorption.push((prefix.to_string(), value));
    }

    /// Resolves one absorption coefficient per polygon path.
    pub fn resolve_absorption(&self, paths: &[&str]) -> Vec<f64> {
        resolve_absorption(paths, self.default_absorption, &self.absorption)
    }

    /// Distance to a surface below which a ray reflects before moving.
    pub fn reflection_distance(&self) -> f64 {
        FixedTimeStep.reflection_distance(self.ray_speed, self.time_step)
    }

    /// Checks the configuration before anything is built.
    pub fn validate(&self) -> Result<(), SimulationError> {
        let positive = |name: &str, value: f64| {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(SimulationError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )))
            }
        };
        positive("time_step", self.time_step)?;
        positive("ray_speed", self.ray_speed)?;
        positive("voxel_size", self.voxel_size)?;
        positive("absorber_radius", self.absorber_radius)?;

        if self.num_rays == 0 {
            return Err(SimulationError::InvalidConfig("num_rays must be positive".into()));
        }
        if self.num_steps == 0 || self.batch_size == 0 {
            return Err(SimulationError::InvalidConfig(format!(
                "num_steps and batch_size must be positive, got {} and {}",
                self.num_steps, self.batch_size
            )));
        }
        if self.max_lag == 0 {
            return Err(SimulationError::InvalidConfig("max_lag must be positive".into()));
        }
        if !self.source.is_finite() {
            return Err(SimulationError::InvalidConfig(format!(
                "source is not finite: {}",
                self.source
            )));
        }

        let in_unit_range = |name: &str, value: f64| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(SimulationError::InvalidConfig(format!(
                    "absorption of {name} must be in [0, 1], got {value}"
                )))
            }
        };
        in_unit_range("default", self.default_absorption)?;
        for (prefix, value) in &self.absorption {
            in_unit_range(prefix, *value)?;
        }

        if self.num_steps % self.batch_size != 0 {
            return Err(SimulationError::StepsNotMultipleOfBatch {
                num_steps: self.num_steps,
                batch_size: self.batch_size,
            });
        }

        let reflection_distance = self.reflection_distance();
        if self.voxel_size <= reflection_distance {
            return Err(SimulationError::VoxelTooSmall {
                voxel_size: self.voxel_size,
                reflection_distance,
            });
        }

        Ok(())
    }

    /// Reads a configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open file: {}", path.display()))?;
        let config: Self = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse configuration from: {}", path.display()))?;
        Ok(config)
    }

    /// Writes the configuration to a JSON file.
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create file: {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .with_context(|| format!("Failed to serialize configuration to: {}", path.display()))?;
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = SimulationConfig::new();
        assert_eq!(config.num_steps, 1000);
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.num_rays, 1000);
        assert_eq!(config.max_lag, 10);
        assert!((config.ray_speed - 343.0).abs() < 1e-10);
        assert!((config.default_absorption - 0.2).abs() < 1e-10);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_default_trait() {
        let config: SimulationConfig = Default::default();
        assert_eq!(config, SimulationConfig::new());
    }

    #[test]
    fn test_reflection_distance() {
        let mut config = SimulationConfig::new();
        config.ray_speed = 1.0;
        config.time_step = 0.01;
        assert!((config.reflection_distance() - 0.0101).abs() < 1e-12);
    }

    #[test]
    fn test_set_absorption() {
        let mut config = SimulationConfig::new();
        config.default_absorption = 0.1;
        config.set_absorption("z/s", 0.5);
        config.set_absorption("z/s/floor", 0.9);

        let coefs = config.resolve_absorption(&["z/s/floor/floor", "z/s/ceiling/ceiling", "y/s/a/a"]);
        assert_eq!(coefs, vec![0.9, 0.5, 0.1]);
    }

    #[test]
    fn test_steps_not_multiple_of_batch() {
        let mut config = SimulationConfig::new();
        config.num_steps = 250;
        config.batch_size = 100;
        assert_eq!(
            config.validate(),
            Err(SimulationError::StepsNotMultipleOfBatch {
                num_steps: 250,
                batch_size: 100
            })
        );
    }

    #[test]
    fn test_voxel_too_small() {
        let mut config = SimulationConfig::new();
        config.time_step = 1e-3;
        config.voxel_size = 0.1;
        // 343 * 1e-3 * 1.01 > 0.1
        assert!(matches!(
            config.validate(),
            Err(SimulationError::VoxelTooSmall { .. })
        ));
    }

    #[test]
    fn test_invalid_values() {
        let mut config = SimulationConfig::new();
        config.set_absorption("z", 1.5);
        assert!(matches!(
            config.validate(),
            Err(SimulationError::InvalidConfig(_))
        ));

        let mut config = SimulationConfig::new();
        config.max_lag = 0;
        assert!(matches!(
            config.validate(),
            Err(SimulationError::InvalidConfig(_))
        ));

        let mut config = SimulationConfig::new();
        config.time_step = -1.0;
        assert!(matches!(
            config.validate(),
            Err(SimulationError::InvalidConfig(_))
        ));

        let mut config = SimulationConfig::new();
        config.num_rays = 0;
        assert!(matches!(
            config.validate(),
            Err(SimulationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_json_file_roundtrip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.json");

        let mut config = SimulationConfig::new();
        config.num_rays = 42;
        config.seed = Some(3);
        config.absorbers = vec![Point::new(1.0, 2.0, 3.0)];
        config.set_absorption("z/s/floor", 0.7);
        config.to_json_file(&path)?;

        let loaded = SimulationConfig::from_json_file(&path)?;
        assert_eq!(loaded, config);
        Ok(())
    }

    #[test]
    fn test_partial_json_uses_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "num_rays": 7, "max_lag": 3 }"#)?;

        let config = SimulationConfig::from_json_file(&path)?;
        assert_eq!(config.num_rays, 7);
        assert_eq!(config.max_lag, 3);
        assert_eq!(config.num_steps, 1000);
        Ok(())
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = SimulationConfig::from_json_file(Path::new("/nonexistent/config.json"))
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/config.json"));
    }
}
