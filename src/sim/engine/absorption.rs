/// Defines how ray energy is absorbed upon surface interaction.
pub trait AbsorptionModel {
    /// Apply absorption to ray energy at a given surface.
    /// Returns the remaining energy after absorption.
    fn apply(&self, energy: f64, surface_index: usize) -> f64;
}

/// Scalar absorption: single coefficient per surface.
pub struct ScalarAbsorption {
    /// Absorption coefficient per polygon index.
    pub coefficients: Vec<f64>,
}

impl ScalarAbsorption {
    pub fn new(coefficients: Vec<f64>) -> Self {
        Self { coefficients }
    }
}

impl AbsorptionModel for ScalarAbsorption {
    fn apply(&self, energy: f64, surface_index: usize) -> f64 {
        let alpha = self.coefficients[surface_index];
        energy * (1.0 - alpha)
    }
}

/// Resolves one absorption coefficient per polygon path.
///
/// `overrides` is an ordered list of `(path-prefix, value)`. A prefix matches
/// a path if it is equal to it or to one of its leading `/`-separated components
/// (e.g. `zone/room` matches `zone/room/floor/floor` but not `zone/room2/...`).
/// The longest matching prefix wins; equal lengths resolve to the later entry.
/// Paths without a match get `default`.
pub fn resolve_absorption(paths: &[&str], default: f64, overrides: &[(String, f64)]) -> Vec<f64> {
    paths
        .iter()
        .map(|path| {
            let mut best: Option<(usize, f64)> = None;
            for (prefix, value) in overrides {
                if !is_path_prefix(prefix, path) {
                    continue;
                }
                let len = prefix.trim_end_matches('/').len();
                match best {
                    Some((best_len, _)) if len < best_len => {}
                    _ => best = Some((len, *value)),
                }
            }
            best.map(|(_, v)| v).unwrap_or(default)
        })
        .collect()
}

fn is_path_prefix(prefix: &str, path: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
