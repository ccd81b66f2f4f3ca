use crate::geom::IsClose;
use crate::geom::flat::FlatBuilding;

/// Finds polygons that are transparent (internal interfaces between solids in the same zone).
///
/// Two polygons form an interface if they belong to the same zone but different solids,
/// lie in the same plane with opposite normals, and share the same set of vertices.
/// Returns a flag per polygon index.
pub fn find_transparent_polygons(building: &FlatBuilding) -> Vec<bool> {
    let n = building.len();
    let mut transparent = vec![false; n];

    for i in 0..n {
        for j in (i + 1)..n {
            let (pi, pj) = (&building.polygons[i], &building.polygons[j]);
            if pi.zone() != pj.zone() || pi.solid() == pj.solid() {
                continue;
            }
            if !(-pi.normal).is_close(&pj.normal) {
                continue;
            }
            // Opposite normals: same plane iff d_i = -d_j
            if !pi.plane.d.is_close(-pj.plane.d) {
                continue;
            }
            if have_same_vertices(building, i, j) {
                transparent[i] = true;
                transparent[j] = true;
            }
        }
    }

    transparent
}

fn have_same_vertices(building: &FlatBuilding, i: usize, j: usize) -> bool {
    let vi = building.vertices(i);
    let vj = building.vertices(j);
    vi.len() == vj.len()
        && vi.iter().all(|p| vj.iter().any(|q| p.is_close(q)))
        && vj.iter().all(|q| vi.iter().any(|p| p.is_close(q)))
}
