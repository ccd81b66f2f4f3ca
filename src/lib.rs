//! Time-stepped acoustic ray tracing in polygonal rooms.
//!
//! A source emits rays which travel through a flattened building, reflect off
//! its polygons losing energy, and are captured by spherical absorbers.

pub mod error;
pub mod geom;
pub mod io;
pub mod sim;

// Prelude
pub use error::SimulationError;
pub use geom::flat::{FlatBuilding, FlatPolygon};
pub use geom::point::Point;
pub use geom::vector::Vector;
pub use sim::rays::{Simulation, SimulationConfig, SimulationResult};
