//! Regular grid tetrahedralisation.

use mimic_math::{Aabb3, LiftedPoint, Point3, Vec3};

use crate::error::{LoadError, Result};
use crate::TetMesh;

/// Fill `bounds` with a Kuhn tetrahedralisation of `cells`³ cubes.
///
/// Each cube is split into six tets along its main diagonal, so the mesh
/// is conforming. Lifted coordinates are produced by `lift`.
pub fn kuhn_grid(
    bounds: &Aabb3,
    cells: usize,
    lift: impl Fn(&Point3) -> LiftedPoint,
) -> Result<TetMesh> {
    if cells == 0 || bounds.is_empty() {
        return Err(LoadError::DegenerateGeometry("empty grid".into()));
    }

    let n = cells + 1;
    let step = (bounds.max - bounds.min) / cells as f64;
    let vertex = |i: usize, j: usize, k: usize| (i + n * (j + n * k)) as u32;

    let mut positions = Vec::with_capacity(n * n * n);
    for k in 0..n {
        for j in 0..n {
            for i in 0..n {
                positions.push(
                    bounds.min + Vec3::new(i as f64 * step.x, j as f64 * step.y, k as f64 * step.z),
                );
            }
        }
    }
    let lifted = positions.iter().map(lift).collect();

    // axis orders of the six monotone paths from corner 000 to 111
    const PATHS: [[usize; 3]; 6] = [
        [0, 1, 2],
        [0, 2, 1],
        [1, 0, 2],
        [1, 2, 0],
        [2, 0, 1],
        [2, 1, 0],
    ];

    let mut tets = Vec::with_capacity(6 * cells * cells * cells);
    for k in 0..cells {
        for j in 0..cells {
            for i in 0..cells {
                for path in PATHS {
                    let mut corner = [i, j, k];
                    let mut tet = [vertex(i, j, k); 4];
                    for (slot, &axis) in path.iter().enumerate() {
                        corner[axis] += 1;
                        tet[slot + 1] = vertex(corner[0], corner[1], corner[2]);
                    }
                    tets.push(tet);
                }
            }
        }
    }

    TetMesh::new(positions, lifted, tets)
}
