use crate::Vector;

/// Defines how rays reflect off surfaces.
pub trait ReflectionModel {
    /// Computes the reflected direction given incident direction and surface normal.
    fn reflect(&self, incident: Vector, normal: Vector) -> Vector;
}

/// Perfect specular (mirror) reflection: `v' = v - 2 (v . n) n`.
///
/// Preserves the length of `incident` for a unit `normal`.
pub struct Specular;

impl ReflectionModel for Specular {
    fn reflect(&self, incident: Vector, normal: Vector) -> Vector {
        let dot = incident.dot(normal);
        incident - 2.0 * dot * normal
    }
}
