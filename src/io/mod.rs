//! File I/O: building geometry and per-step simulation snapshots.

pub mod flat;
pub mod snapshots;

pub use flat::{read_building, read_polygons, write_polygons};
pub use snapshots::{SnapshotReader, SnapshotWriter};
