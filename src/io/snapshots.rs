//! Per-step ray state snapshots on disk.
//!
//! Layout: `<dir>/<step>/<name>.json` where `<name>` is built from a template
//! (default `{field}_{step}`) and `field` is one of `position`, `velocity`,
//! `energy` or `hits`.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::SimulationError;
use crate::sim::rays::{BatchSink, BatchSnapshot};
use crate::{Point, Vector};

/// Default file name template.
pub const DEFAULT_TEMPLATE: &str = "{field}_{step}";

/// Recorded ray/absorber field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Position,
    Velocity,
    Energy,
    Hits,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::Position => "position",
            Field::Velocity => "velocity",
            Field::Energy => "energy",
            Field::Hits => "hits",
        }
    }
}

fn snapshot_path(dir: &Path, template: &str, field: Field, step: usize) -> PathBuf {
    let name = template
        .replace("{field}", field.name())
        .replace("{step}", &step.to_string());
    dir.join(step.to_string()).join(format!("{name}.json"))
}

/// Writes every step of every batch to a directory tree.
pub struct SnapshotWriter {
    dir: PathBuf,
    template: String,
}

impl SnapshotWriter {
    /// Prepares `dir` for writing.
    ///
    /// The directory is created if missing. An existing non-empty directory
    /// is refused with [`SimulationError::OutputNotEmpty`].
    pub fn new(dir: &Path) -> Result<Self> {
        if dir.exists() {
            let mut entries = fs::read_dir(dir)
                .with_context(|| format!("Failed to read directory: {}", dir.display()))?;
            if entries.next().is_some() {
                return Err(SimulationError::OutputNotEmpty(dir.to_path_buf()).into());
            }
        } else {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            template: DEFAULT_TEMPLATE.to_string(),
        })
    }

    /// Replaces the file name template (`{field}` and `{step}` are substituted).
    pub fn with_template(mut self, template: &str) -> Self {
        self.template = template.to_string();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write_field<T: Serialize>(&self, field: Field, step: usize, data: &T) -> Result<()> {
        let path = snapshot_path(&self.dir, &self.template, field, step);
        let file = File::create(&path)
            .with_context(|| format!("Failed to create file: {}", path.display()))?;
        serde_json::to_writer(BufWriter::new(file), data).with_context(|| {
            format!("Failed to serialize {} to: {}", field.name(), path.display())
        })?;
        log::debug!("Wrote {}", path.display());
        Ok(())
    }
}

impl BatchSink for SnapshotWriter {
    fn write_batch(&mut self, first_step: usize, snapshot: &BatchSnapshot) -> Result<()> {
        for i in 0..snapshot.num_steps() {
            let step = first_step + i;
            let step_dir = self.dir.join(step.to_string());
            fs::create_dir_all(&step_dir)
                .with_context(|| format!("Failed to create directory: {}", step_dir.display()))?;

            self.write_field(Field::Position, step, &snapshot.positions[i])?;
            self.write_field(Field::Velocity, step, &snapshot.velocities[i])?;
            self.write_field(Field::Energy, step, &snapshot.energies[i])?;
            self.write_field(Field::Hits, step, &snapshot.hits[i])?;
        }
        Ok(())
    }
}

/// Reads snapshots written by [`SnapshotWriter`].
pub struct SnapshotReader {
    dir: PathBuf,
    template: String,
}

impl SnapshotReader {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }

    pub fn with_template(mut self, template: &str) -> Self {
        self.template = template.to_string();
        self
    }

    /// Recorded step indices in ascending order.
    pub fn steps(&self) -> Result<Vec<usize>> {
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read directory: {}", self.dir.display()))?;
        let mut steps = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(step) = entry.file_name().to_str().and_then(|s| s.parse().ok()) {
                steps.push(step);
            }
        }
        steps.sort_unstable();
        Ok(steps)
    }

    pub fn positions(&self, step: usize) -> Result<Vec<Point>> {
        self.read_field(Field::Position, step)
    }

    pub fn velocities(&self, step: usize) -> Result<Vec<Vector>> {
        self.read_field(Field::Velocity, step)
    }

    pub fn energies(&self, step: usize) -> Result<Vec<f64>> {
        self.read_field(Field::Energy, step)
    }

    /// Cumulative absorber hits after `step`.
    pub fn hits(&self, step: usize) -> Result<Vec<f64>> {
        self.read_field(Field::Hits, step)
    }

    /// Cumulative hits of every recorded step: `series[step][absorber]`.
    pub fn hit_series(&self) -> Result<Vec<Vec<f64>>> {
        self.steps()?.into_iter().map(|s| self.hits(s)).collect()
    }

    fn read_field<T: DeserializeOwned>(&self, field: Field, step: usize) -> Result<T> {
        let path = snapshot_path(&self.dir, &self.template, field, step);
        let file = File::open(&path)
            .with_context(|| format!("Failed to open file: {}", path.display()))?;
        let data = serde_json::from_reader(BufReader::new(file)).with_context(|| {
            format!("Failed to parse {} from: {}", field.name(), path.display())
        })?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(steps: usize) -> BatchSnapshot {
        let mut snap = BatchSnapshot::default();
        for s in 0..steps {
            let x = s as f64;
            snap.positions.push(vec![Point::new(x, 0., 0.), Point::new(0., x, 0.)]);
            snap.velocities.push(vec![Vector::new(1., 0., 0.), Vector::new(0., 1., 0.)]);
            snap.energies.push(vec![1.0, 0.5]);
            snap.hits.push(vec![0.1 * x]);
        }
        snap
    }

    #[test]
    fn test_layout_and_roundtrip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let out = dir.path().join("out");
        let mut writer = SnapshotWriter::new(&out)?;
        writer.write_batch(0, &snapshot(3))?;
        writer.write_batch(3, &snapshot(2))?;

        assert!(out.join("4").join("position_4.json").is_file());
        assert!(out.join("0").join("hits_0.json").is_file());

        let reader = SnapshotReader::new(&out);
        assert_eq!(reader.steps()?, vec![0, 1, 2, 3, 4]);
        assert_eq!(reader.positions(2)?[1], Point::new(0., 2., 0.));
        assert_eq!(reader.velocities(3)?[0], Vector::new(1., 0., 0.));
        assert_eq!(reader.energies(1)?, vec![1.0, 0.5]);
        // Step 4 is the second step of the second batch
        assert_eq!(reader.hits(4)?, vec![0.1]);
        assert_eq!(reader.hit_series()?.len(), 5);
        Ok(())
    }

    #[test]
    fn test_custom_template() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut writer = SnapshotWriter::new(dir.path())?.with_template("{step}-{field}");
        writer.write_batch(10, &snapshot(1))?;
        assert!(dir.path().join("10").join("10-energy.json").is_file());

        let reader = SnapshotReader::new(dir.path()).with_template("{step}-{field}");
        assert_eq!(reader.energies(10)?, vec![1.0, 0.5]);
        Ok(())
    }

    #[test]
    fn test_refuses_non_empty_dir() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("old.json"), "[]")?;
        let err = SnapshotWriter::new(dir.path()).err().unwrap();
        assert_eq!(
            err.downcast_ref::<SimulationError>(),
            Some(&SimulationError::OutputNotEmpty(dir.path().to_path_buf()))
        );
        Ok(())
    }

    #[test]
    fn test_missing_step_has_context() {
        let dir = tempfile::tempdir().unwrap();
        let err = SnapshotReader::new(dir.path()).hits(7).unwrap_err();
        assert!(err.to_string().contains("hits_7.json"));
    }
}
