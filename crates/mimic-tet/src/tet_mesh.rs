//! Tetrahedral volume mesh with lifted per-vertex coordinates.

use std::collections::BTreeSet;
use std::path::Path;

use log::info;
use mimic_math::{Aabb3, LiftedPoint, Point3};
use mimic_mesh::Bvh;
use nalgebra::Matrix3;

use crate::error::{LoadError, Result};
use crate::text::parse_sections;

/// Immutable tetrahedral mesh.
///
/// Every tet is positively oriented: indices of tets loaded with negative
/// signed volume have their first two vertices swapped. For each tet the
/// inverse of its barycentric-to-space map is precomputed, along with the
/// tets incident to each vertex and a hierarchy over tet centroids.
#[derive(Debug, Clone)]
pub struct TetMesh {
    positions: Vec<Point3>,
    lifted: Vec<LiftedPoint>,
    tets: Vec<[u32; 4]>,
    inverse: Vec<Matrix3<f64>>,
    vertex_tets: Vec<Vec<u32>>,
    centroids: Vec<Point3>,
    centroid_index: Bvh,
}

impl TetMesh {
    /// Build a mesh from raw arrays, reorienting negative tets.
    ///
    /// Fails on mismatched arrays, out-of-range indices, zero tets or tets
    /// with no volume.
    pub fn new(
        positions: Vec<Point3>,
        lifted: Vec<LiftedPoint>,
        mut tets: Vec<[u32; 4]>,
    ) -> Result<Self> {
        if positions.len() != lifted.len() {
            return Err(LoadError::DegenerateGeometry(format!(
                "{} positions but {} lifted coordinates",
                positions.len(),
                lifted.len()
            )));
        }
        if tets.is_empty() {
            return Err(LoadError::DegenerateGeometry("mesh has no tets".into()));
        }

        let count = positions.len();
        let mut inverse = Vec::with_capacity(tets.len());
        let mut vertex_tets = vec![Vec::new(); count];
        let mut centroids = Vec::with_capacity(tets.len());
        let mut reoriented = 0usize;

        for (t, tet) in tets.iter_mut().enumerate() {
            if let Some(&bad) = tet.iter().find(|&&i| i as usize >= count) {
                return Err(LoadError::IndexOutOfRange {
                    element: "tet",
                    index: t,
                    vertex: bad as usize,
                    count,
                });
            }
            if signed_volume(&positions, tet) < 0.0 {
                tet.swap(0, 1);
                reoriented += 1;
            }

            let [a, b, c, d] = tet.map(|i| positions[i as usize]);
            let m = Matrix3::from_columns(&[a - d, b - d, c - d]);
            let inv = match m.try_inverse() {
                Some(inv) if signed_volume(&positions, tet) > 0.0 => inv,
                _ => {
                    return Err(LoadError::DegenerateGeometry(format!(
                        "tet {t} has zero volume"
                    )))
                }
            };
            inverse.push(inv);

            for &v in tet.iter() {
                vertex_tets[v as usize].push(t as u32);
            }
            centroids.push(Point3::from((a.coords + b.coords + c.coords + d.coords) / 4.0));
        }

        if reoriented > 0 {
            info!("reoriented {reoriented} of {} tets", tets.len());
        }

        let centroid_index = Bvh::from_points(&centroids);

        Ok(Self {
            positions,
            lifted,
            tets,
            inverse,
            vertex_tets,
            centroids,
            centroid_index,
        })
    }

    /// Parse the tet mesh text format.
    pub fn parse(text: &str) -> Result<Self> {
        let sections = parse_sections::<4>(text, "tet")?;
        Self::new(sections.positions, sections.lifted, sections.elements)
    }

    /// Load the tet mesh text format from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mesh = Self::parse(&std::fs::read_to_string(path)?)?;
        info!(
            "loaded {}: {} vertices, {} tets",
            path.display(),
            mesh.vertex_count(),
            mesh.tet_count()
        );
        Ok(mesh)
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of tets.
    pub fn tet_count(&self) -> usize {
        self.tets.len()
    }

    /// Vertex positions.
    pub fn positions(&self) -> &[Point3] {
        &self.positions
    }

    /// Lifted vertex coordinates.
    pub fn lifted(&self) -> &[LiftedPoint] {
        &self.lifted
    }

    /// Tet vertex indices, positively oriented.
    pub fn tets(&self) -> &[[u32; 4]] {
        &self.tets
    }

    /// Tets incident to vertex `v`, in increasing order.
    pub fn vertex_tets(&self, v: usize) -> &[u32] {
        &self.vertex_tets[v]
    }

    /// Centroid of tet `t`.
    pub fn centroid(&self, t: usize) -> Point3 {
        self.centroids[t]
    }

    /// Bounding box of all vertices.
    pub fn bounds(&self) -> Aabb3 {
        Aabb3::from_points(&self.positions)
    }

    /// Signed volume of tet `t` (positive for every loaded tet).
    pub fn volume(&self, t: usize) -> f64 {
        signed_volume(&self.positions, &self.tets[t])
    }

    /// Tet whose centroid is closest to `p`.
    pub fn nearest_tet(&self, p: &Point3) -> Option<usize> {
        self.centroid_index
            .nearest(p, |t| ((self.centroids[t] - p).norm_squared(), t))
            .map(|(_, t)| t)
    }

    /// Tets sharing at least one vertex with tet `t`, excluding `t`.
    pub fn one_ring(&self, t: usize) -> BTreeSet<usize> {
        let mut ring: BTreeSet<usize> = self.tets[t]
            .iter()
            .flat_map(|&v| self.vertex_tets[v as usize].iter().map(|&n| n as usize))
            .collect();
        ring.remove(&t);
        ring
    }

    /// Barycentric weights of `p` with respect to tet `t`.
    ///
    /// The weights always sum to one; they are all non-negative exactly
    /// when `p` lies in the tet.
    pub fn barycentric(&self, t: usize, p: &Point3) -> [f64; 4] {
        let d = self.positions[self.tets[t][3] as usize];
        let l = self.inverse[t] * (p - d);
        [l.x, l.y, l.z, 1.0 - l.x - l.y - l.z]
    }

    /// Lifted coordinate at the point with weights `w` in tet `t`.
    pub fn interpolate_lifted(&self, t: usize, w: &[f64; 4]) -> LiftedPoint {
        self.tets[t]
            .iter()
            .zip(w)
            .fold(LiftedPoint::zeros(), |acc, (&v, &wi)| {
                acc + self.lifted[v as usize] * wi
            })
    }

    /// Position of the point with weights `w` in tet `t`.
    pub fn interpolate_position(&self, t: usize, w: &[f64; 4]) -> Point3 {
        let coords = self.tets[t]
            .iter()
            .zip(w)
            .fold(nalgebra::Vector3::zeros(), |acc, (&v, &wi)| {
                acc + self.positions[v as usize].coords * wi
            });
        Point3::from(coords)
    }
}

/// `(a - d) . ((b - d) x (c - d)) / 6`
fn signed_volume(positions: &[Point3], tet: &[u32; 4]) -> f64 {
    let [a, b, c, d] = tet.map(|i| positions[i as usize]);
    (a - d).dot(&(b - d).cross(&(c - d))) / 6.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn lift(p: &Point3) -> LiftedPoint {
        let mut l = LiftedPoint::zeros();
        l[0] = p.x;
        l[1] = p.y;
        l[2] = p.z;
        l[3] = 1.0;
        l
    }

    fn single(points: [Point3; 4]) -> TetMesh {
        let lifted = points.iter().map(lift).collect();
        TetMesh::new(points.to_vec(), lifted, vec![[0, 1, 2, 3]]).unwrap()
    }

    #[test]
    fn test_reorients_negative_tet() {
        // (0,0,0),(1,0,0),(0,1,0),(0,0,1) has negative volume in this
        // convention and gets its first two indices swapped.
        let mesh = single([
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ]);
        assert_eq!(mesh.tets()[0], [1, 0, 2, 3]);
        assert_relative_eq!(mesh.volume(0), 1.0 / 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_barycentric_and_interpolation() {
        let mesh = single([
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
            Point3::new(0.0, 0.0, 2.0),
        ]);
        let p = Point3::new(0.5, 0.25, 0.75);
        let w = mesh.barycentric(0, &p);
        assert_relative_eq!(w.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert!(w.iter().all(|&x| x >= 0.0));
        assert_relative_eq!(mesh.interpolate_position(0, &w), p, epsilon = 1e-12);

        let l = mesh.interpolate_lifted(0, &w);
        assert_relative_eq!(l[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(l[2], 0.75, epsilon = 1e-12);
        assert_relative_eq!(l[3], 1.0, epsilon = 1e-12);

        let outside = mesh.barycentric(0, &Point3::new(2.0, 2.0, 2.0));
        assert!(outside.iter().any(|&x| x < 0.0));
    }

    #[test]
    fn test_rejects_degenerate() {
        let flat = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        let lifted = flat.iter().map(lift).collect();
        assert!(matches!(
            TetMesh::new(flat.to_vec(), lifted, vec![[0, 1, 2, 3]]),
            Err(LoadError::DegenerateGeometry(_))
        ));
        assert!(matches!(
            TetMesh::new(vec![], vec![], vec![]),
            Err(LoadError::DegenerateGeometry(_))
        ));
        assert!(matches!(
            TetMesh::parse("0\n0\n"),
            Err(LoadError::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn test_one_ring_and_nearest() {
        // Two tets glued along a face plus one far away.
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.3, 0.3, -0.5),
            Point3::new(0.3, 0.3, 0.5),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(11.0, 0.0, 0.0),
            Point3::new(10.0, 1.0, 0.0),
            Point3::new(10.0, 0.0, 1.0),
        ];
        let lifted = positions.iter().map(lift).collect();
        let mesh = TetMesh::new(
            positions,
            lifted,
            vec![[0, 1, 2, 3], [0, 1, 2, 4], [5, 6, 7, 8]],
        )
        .unwrap();

        assert_eq!(mesh.one_ring(0).into_iter().collect::<Vec<_>>(), vec![1]);
        assert!(mesh.one_ring(2).is_empty());
        assert_eq!(mesh.vertex_tets(0), &[0, 1]);
        assert_eq!(mesh.nearest_tet(&Point3::new(9.0, 0.0, 0.0)), Some(2));
        assert_eq!(mesh.nearest_tet(&Point3::new(0.3, 0.3, 0.3)), Some(1));
        for t in 0..mesh.tet_count() {
            assert!(mesh.volume(t) > 0.0);
        }
    }

    #[test]
    fn test_load_from_file() {
        let text = "\
4
1
0 0 0
0 0 0 1 0 0 0 0
1 0 0
1 0 0 1 0 0 0 0
0 1 0
0 1 0 1 0 0 0 0
0 0 1
0 0 1 1 0 0 0 0
0 1 2 3
";
        let path = std::env::temp_dir().join(format!("mimic-tet-{}.txt", std::process::id()));
        std::fs::write(&path, text).unwrap();
        let mesh = TetMesh::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.tet_count(), 1);
        assert!(mesh.volume(0) > 0.0);
        assert!(matches!(
            TetMesh::load(std::env::temp_dir().join("mimic-tet-missing.txt")),
            Err(LoadError::Io(_))
        ));
    }
}
