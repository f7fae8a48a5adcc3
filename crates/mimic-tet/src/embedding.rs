//! Lifted surface triangulation paired with the rendered surface mesh.

use std::path::Path;

use log::info;
use mimic_math::{LiftedPoint, Point3, Vec3};
use mimic_mesh::SurfaceMesh;

use crate::error::{LoadError, Result};
use crate::text::parse_sections;

/// Surface triangulation carrying lifted vertex coordinates.
///
/// Vertex and triangle indices correspond one to one with the rendered
/// surface mesh of the same target.
#[derive(Debug, Clone)]
pub struct SurfaceEmbedding {
    positions: Vec<Point3>,
    lifted: Vec<LiftedPoint>,
    triangles: Vec<[u32; 3]>,
}

impl SurfaceEmbedding {
    /// Build an embedding from raw arrays.
    pub fn new(
        positions: Vec<Point3>,
        lifted: Vec<LiftedPoint>,
        triangles: Vec<[u32; 3]>,
    ) -> Result<Self> {
        if positions.len() != lifted.len() {
            return Err(LoadError::DegenerateGeometry(format!(
                "{} positions but {} lifted coordinates",
                positions.len(),
                lifted.len()
            )));
        }
        if triangles.is_empty() {
            return Err(LoadError::DegenerateGeometry(
                "embedding has no triangles".into(),
            ));
        }
        let count = positions.len();
        for (t, tri) in triangles.iter().enumerate() {
            if let Some(&bad) = tri.iter().find(|&&i| i as usize >= count) {
                return Err(LoadError::IndexOutOfRange {
                    element: "triangle",
                    index: t,
                    vertex: bad as usize,
                    count,
                });
            }
        }
        Ok(Self {
            positions,
            lifted,
            triangles,
        })
    }

    /// Parse the surface embedding text format.
    pub fn parse(text: &str) -> Result<Self> {
        let s = parse_sections::<3>(text, "triangle")?;
        Self::new(s.positions, s.lifted, s.elements)
    }

    /// Load the surface embedding text format from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let embedding = Self::parse(&std::fs::read_to_string(path)?)?;
        info!(
            "loaded {}: {} vertices, {} triangles",
            path.display(),
            embedding.vertex_count(),
            embedding.triangle_count()
        );
        Ok(embedding)
    }

    /// Lift a surface mesh with a per-vertex function.
    pub fn from_surface(mesh: &SurfaceMesh, lift: impl Fn(&Point3) -> LiftedPoint) -> Self {
        Self {
            positions: mesh.positions().to_vec(),
            lifted: mesh.positions().iter().map(lift).collect(),
            triangles: mesh.triangles().to_vec(),
        }
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// 3D vertex positions.
    pub fn positions(&self) -> &[Point3] {
        &self.positions
    }

    /// Lifted vertex coordinates.
    pub fn lifted(&self) -> &[LiftedPoint] {
        &self.lifted
    }

    /// Triangle vertex indices.
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// 3D point of triangle `t` with barycentric weights `w`.
    pub fn point_from_barycentric(&self, t: usize, w: &Vec3) -> Point3 {
        let [a, b, c] = self.triangles[t].map(|i| self.positions[i as usize]);
        Point3::from(a.coords * w.x + b.coords * w.y + c.coords * w.z)
    }

    /// True if the embedding matches `mesh` index for index.
    pub fn pairs_with(&self, mesh: &SurfaceMesh) -> bool {
        self.positions.len() == mesh.vertex_count() && self.triangles == mesh.triangles()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn lift(p: &Point3) -> LiftedPoint {
        let mut l = LiftedPoint::zeros();
        l.fixed_rows_mut::<3>(0).copy_from(&p.coords);
        l
    }

    #[test]
    fn test_from_surface_pairs() {
        let cube = SurfaceMesh::cube(Point3::origin(), 1.0);
        let embedding = SurfaceEmbedding::from_surface(&cube, lift);
        assert!(embedding.pairs_with(&cube));
        assert!(embedding.pairs_with(&cube.mirrored()));
        let half = SurfaceMesh::new(cube.positions().to_vec(), cube.triangles()[..6].to_vec()).unwrap();
        assert!(!embedding.pairs_with(&half));
        assert_eq!(embedding.lifted()[7][0], 1.0);

        let w = Vec3::new(0.2, 0.3, 0.5);
        assert_relative_eq!(
            embedding.point_from_barycentric(4, &w),
            cube.point_from_barycentric(4, &w),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_parse_embedding() {
        let text = "\
3
1
0 0 0
0 0 0 0 0 0 0 0
1 0 0
1 0 0 0 0 0 0 0
0 1 0
0 1 0 0 0 0 0 0
0 1 2
";
        let embedding = SurfaceEmbedding::parse(text).unwrap();
        assert_eq!(embedding.triangle_count(), 1);
        assert_eq!(embedding.lifted()[2][1], 1.0);

        let empty = "3\n0\n0 0 0\n0 0 0 0 0 0 0 0\n1 0 0\n1 0 0 0 0 0 0 0\n0 1 0\n0 1 0 0 0 0 0 0\n";
        assert!(matches!(
            SurfaceEmbedding::parse(empty),
            Err(LoadError::DegenerateGeometry(_))
        ));
    }
}
