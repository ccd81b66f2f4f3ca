pub mod bboxes;
pub mod flat;
pub mod plane;
pub mod point;
pub mod polygon;
pub mod segment;
pub mod shapes;
pub mod triangles;
pub mod vector;

/// Geometric precision (meters)
pub const EPS: f64 = 1e-6;

/// Tolerance-based comparison of floating point scalars.
pub trait IsClose {
    fn is_close(&self, other: f64) -> bool;
}

impl IsClose for f64 {
    fn is_close(&self, other: f64) -> bool {
        (self - other).abs() < EPS
    }
}
