use crate::{Point, Vector};

/// Defines how rays propagate through space.
pub trait PropagationModel {
    /// Advance a ray position given its current position, velocity, and time step.
    /// Returns the new position.
    fn advance(&self, position: Point, velocity: Vector, dt: f64) -> Point;

    /// Distance below which a ray must reflect before it is advanced.
    fn reflection_distance(&self, speed: f64, dt: f64) -> f64;
}

/// Safety margin over the distance travelled in one step.
pub const REFLECTION_MARGIN: f64 = 1.01;

/// Fixed time-step propagation: position += velocity * dt.
pub struct FixedTimeStep;

impl PropagationModel for FixedTimeStep {
    fn advance(&self, position: Point, velocity: Vector, dt: f64) -> Point {
        position + velocity * dt
    }

    fn reflection_distance(&self, speed: f64, dt: f64) -> f64 {
        speed * dt * REFLECTION_MARGIN
    }
}
