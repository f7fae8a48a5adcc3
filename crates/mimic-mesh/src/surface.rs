//! Indexed triangle surface meshes.

use mimic_math::{triangle_normal, Aabb3, Handedness, Point3, Vec3};

use crate::error::{MeshError, Result};

/// Indexed triangle mesh with per-triangle normals.
///
/// Normals of a freshly built mesh follow the triangle winding, so a closed
/// surface wound counter-clockwise when seen from outside has outward
/// normals.
#[derive(Debug, Clone)]
pub struct SurfaceMesh {
    positions: Vec<Point3>,
    triangles: Vec<[u32; 3]>,
    normals: Vec<Vec3>,
}

impl SurfaceMesh {
    /// Build a mesh, validating triangle indices.
    ///
    /// Fails with [`MeshError::EmptyMesh`] when there are no triangles.
    pub fn new(positions: Vec<Point3>, triangles: Vec<[u32; 3]>) -> Result<Self> {
        if triangles.is_empty() {
            return Err(MeshError::EmptyMesh);
        }
        let count = positions.len();
        for (t, tri) in triangles.iter().enumerate() {
            for &i in tri {
                if i as usize >= count {
                    return Err(MeshError::IndexOutOfRange {
                        triangle: t,
                        index: i as usize,
                        count,
                    });
                }
            }
        }
        let normals = face_normals(&positions, &triangles);
        Ok(Self {
            positions,
            triangles,
            normals,
        })
    }

    /// Axis-aligned box centered at `center` with the given half extent,
    /// wound with outward normals.
    pub fn cube(center: Point3, half: f64) -> Self {
        // vertex i sits at the corner selected by bits x=1, y=2, z=4
        let positions = (0..8)
            .map(|i| {
                let sx = if i & 1 == 0 { -half } else { half };
                let sy = if i & 2 == 0 { -half } else { half };
                let sz = if i & 4 == 0 { -half } else { half };
                center + Vec3::new(sx, sy, sz)
            })
            .collect::<Vec<_>>();
        let triangles: Vec<[u32; 3]> = vec![
            [0, 2, 1],
            [1, 2, 3],
            [4, 5, 6],
            [5, 7, 6],
            [0, 1, 4],
            [1, 5, 4],
            [2, 6, 3],
            [3, 6, 7],
            [0, 4, 2],
            [2, 4, 6],
            [1, 3, 5],
            [3, 7, 5],
        ];
        let normals = face_normals(&positions, &triangles);
        Self {
            positions,
            triangles,
            normals,
        }
    }

    /// The same surface in the opposite coordinate handedness.
    ///
    /// Triangle indices are kept, so triangle ids and barycentric weights
    /// mean the same thing on both sides. Normals are mirrored rather than
    /// recomputed, which keeps them outward although the winding now runs
    /// the other way.
    pub fn mirrored(&self) -> Self {
        Self {
            positions: self.positions.iter().map(|p| p.flip_handedness()).collect(),
            triangles: self.triangles.clone(),
            normals: self.normals.iter().map(|n| n.flip_handedness()).collect(),
        }
    }

    /// Vertex positions.
    pub fn positions(&self) -> &[Point3] {
        &self.positions
    }

    /// Triangle vertex indices.
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Corner positions of triangle `t`.
    ///
    /// # Panics
    ///
    /// Panics if `t` is out of range.
    pub fn triangle(&self, t: usize) -> [Point3; 3] {
        let [a, b, c] = self.triangles[t];
        [
            self.positions[a as usize],
            self.positions[b as usize],
            self.positions[c as usize],
        ]
    }

    /// Unit normal of triangle `t` (zero for degenerate triangles).
    pub fn normal(&self, t: usize) -> Vec3 {
        self.normals[t]
    }

    /// Point of triangle `t` with the given barycentric weights.
    pub fn point_from_barycentric(&self, t: usize, weights: &Vec3) -> Point3 {
        let [a, b, c] = self.triangle(t);
        Point3::from(a.coords * weights.x + b.coords * weights.y + c.coords * weights.z)
    }

    /// Bounding box of all triangles of the mesh.
    pub fn bounds(&self) -> Aabb3 {
        Aabb3::from_points(&self.positions)
    }

    /// Bounding box of triangle `t`.
    pub fn triangle_bounds(&self, t: usize) -> Aabb3 {
        Aabb3::from_points(&self.triangle(t))
    }
}

fn face_normals(positions: &[Point3], triangles: &[[u32; 3]]) -> Vec<Vec3> {
    triangles
        .iter()
        .map(|&[a, b, c]| {
            triangle_normal(
                &positions[a as usize],
                &positions[b as usize],
                &positions[c as usize],
            )
        })
        .collect()
}
