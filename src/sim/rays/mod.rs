mod config;
mod simulation;
pub mod tracer;

pub use config::SimulationConfig;
pub use simulation::{BatchSink, InMemoryHistory, Simulation, SimulationResult};
pub use tracer::{BatchSnapshot, ENERGY_EPS};
