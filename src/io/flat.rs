//! Flat building JSON format: an array of `{ "path": ..., "vertices": [...] }`.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};

use crate::geom::flat::{FlatBuilding, FlatPolygon};

/// Writes polygons to a JSON file.
pub fn write_polygons(path: &Path, polygons: &[FlatPolygon]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, polygons)
        .with_context(|| format!("Failed to serialize polygons to: {}", path.display()))?;

    Ok(())
}

/// Reads polygons from a JSON file.
pub fn read_polygons(path: &Path) -> Result<Vec<FlatPolygon>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;
    let reader = BufReader::new(file);

    let polygons: Vec<FlatPolygon> = serde_json::from_reader(reader)
        .with_context(|| format!("Failed to deserialize polygons from: {}", path.display()))?;

    Ok(polygons)
}

/// Reads and flattens a building from a JSON file.
pub fn read_building(path: &Path) -> Result<FlatBuilding> {
    let polygons = read_polygons(path)?;
    FlatBuilding::new(polygons)
        .with_context(|| format!("Invalid building geometry in: {}", path.display()))
}
