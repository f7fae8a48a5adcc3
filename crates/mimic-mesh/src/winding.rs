//! Generalized winding numbers and offset-surface containment.
//!
//! The winding number of a point with respect to a closed, outward-wound
//! surface is 1 inside and 0 outside; for imperfect meshes it degrades
//! smoothly, which makes `>= 0.5` a robust inside test.
//!
//! [`winding_number`] sums every triangle. [`OffsetSurface`] answers the
//! same query hierarchically: BVH clusters far enough from the query are
//! replaced by a single dipole, so a query costs roughly logarithmic time
//! in the triangle count.

use std::f64::consts::PI;

use mimic_math::{Aabb3, Point3, Vec3};

use crate::{Bvh, BvhNode, SurfaceMesh};

/// Signed solid angle subtended at `p` by triangle `t` (Van Oosterom and
/// Strackee).
fn solid_angle(mesh: &SurfaceMesh, t: usize, p: &Point3) -> f64 {
    let [a, b, c] = mesh.triangle(t);
    let a = a - p;
    let b = b - p;
    let c = c - p;
    let la = a.norm();
    let lb = b.norm();
    let lc = c.norm();
    let numerator = a.dot(&b.cross(&c));
    let denominator = la * lb * lc + a.dot(&b) * lc + b.dot(&c) * la + c.dot(&a) * lb;
    2.0 * numerator.atan2(denominator)
}

/// Generalized winding number of `p` with respect to `mesh`.
///
/// Exact sum over all triangles, linear in the triangle count.
pub fn winding_number(mesh: &SurfaceMesh, p: &Point3) -> f64 {
    let total: f64 = (0..mesh.triangle_count())
        .map(|t| solid_angle(mesh, t, p))
        .sum();
    total / (4.0 * PI)
}

/// First-order far-field summary of a triangle cluster.
#[derive(Debug, Clone, Copy)]
struct Dipole {
    /// Area-weighted centroid.
    center: Point3,
    /// Sum of the triangles' area-weighted normals.
    area_normal: Vec3,
    area: f64,
    /// Distance from `center` to the farthest vertex of the cluster.
    radius: f64,
}

impl Dipole {
    fn of_triangles(mesh: &SurfaceMesh, items: &[usize], bounds: &Aabb3) -> Self {
        let mut weighted = Vec3::zeros();
        let mut area_normal = Vec3::zeros();
        let mut area = 0.0;
        for &t in items {
            let [a, b, c] = mesh.triangle(t);
            let n = (b - a).cross(&(c - a)) * 0.5;
            let w = n.norm();
            weighted += (a.coords + b.coords + c.coords) * (w / 3.0);
            area_normal += n;
            area += w;
        }
        let center = if area > 0.0 {
            Point3::from(weighted / area)
        } else {
            bounds.center()
        };
        let radius = items
            .iter()
            .flat_map(|&t| mesh.triangle(t))
            .map(|v| (v - center).norm())
            .fold(0.0, f64::max);
        Self {
            center,
            area_normal,
            area,
            radius,
        }
    }

    fn merge(left: &Dipole, right: &Dipole, bounds: &Aabb3) -> Self {
        let area = left.area + right.area;
        let center = if area > 0.0 {
            Point3::from((left.center.coords * left.area + right.center.coords * right.area) / area)
        } else {
            bounds.center()
        };
        let radius = [left, right]
            .iter()
            .map(|d| d.radius + (d.center - center).norm())
            .fold(0.0, f64::max);
        Self {
            center,
            area_normal: left.area_normal + right.area_normal,
            area,
            radius,
        }
    }

    fn is_far(&self, p: &Point3) -> bool {
        (self.center - p).norm() > OffsetSurface::FAR_FIELD * self.radius
    }

    fn solid_angle(&self, p: &Point3) -> f64 {
        let d = self.center - p;
        let r = d.norm();
        self.area_normal.dot(&d) / (r * r * r)
    }
}

#[derive(Debug, Clone)]
enum Cluster {
    Leaf {
        dipole: Dipole,
        items: Vec<usize>,
    },
    Internal {
        dipole: Dipole,
        left: Box<Cluster>,
        right: Box<Cluster>,
    },
}

impl Cluster {
    fn build(mesh: &SurfaceMesh, node: &BvhNode) -> Self {
        match node {
            BvhNode::Leaf { aabb, items } => Cluster::Leaf {
                dipole: Dipole::of_triangles(mesh, items, aabb),
                items: items.clone(),
            },
            BvhNode::Internal { aabb, left, right } => {
                let left = Self::build(mesh, left);
                let right = Self::build(mesh, right);
                Cluster::Internal {
                    dipole: Dipole::merge(left.dipole(), right.dipole(), aabb),
                    left: Box::new(left),
                    right: Box::new(right),
                }
            }
        }
    }

    fn dipole(&self) -> &Dipole {
        match self {
            Cluster::Leaf { dipole, .. } => dipole,
            Cluster::Internal { dipole, .. } => dipole,
        }
    }

    fn solid_angle(&self, mesh: &SurfaceMesh, p: &Point3) -> f64 {
        if self.dipole().is_far(p) {
            return self.dipole().solid_angle(p);
        }
        match self {
            Cluster::Leaf { items, .. } => items.iter().map(|&t| solid_angle(mesh, t, p)).sum(),
            Cluster::Internal { left, right, .. } => {
                left.solid_angle(mesh, p) + right.solid_angle(mesh, p)
            }
        }
    }
}

/// A closed surface used only to test whether points lie inside it.
#[derive(Debug, Clone)]
pub struct OffsetSurface {
    mesh: SurfaceMesh,
    clusters: Option<Cluster>,
}

impl OffsetSurface {
    /// Winding number at which a point counts as inside.
    pub const INSIDE_THRESHOLD: f64 = 0.5;

    /// A cluster is summarized by its dipole when the query is farther
    /// than this many cluster radii from its center.
    pub const FAR_FIELD: f64 = 2.0;

    /// Wrap a closed mesh and build its cluster hierarchy.
    pub fn new(mesh: SurfaceMesh) -> Self {
        let bounds: Vec<Aabb3> = (0..mesh.triangle_count())
            .map(|t| mesh.triangle_bounds(t))
            .collect();
        let clusters = Bvh::build(&bounds)
            .root()
            .map(|root| Cluster::build(&mesh, root));
        Self { mesh, clusters }
    }

    /// The underlying mesh.
    pub fn mesh(&self) -> &SurfaceMesh {
        &self.mesh
    }

    /// Winding number of `p` with respect to this surface.
    ///
    /// Matches [`winding_number`] near the surface and approximates it
    /// in the far field.
    pub fn winding_number(&self, p: &Point3) -> f64 {
        self.clusters
            .as_ref()
            .map_or(0.0, |c| c.solid_angle(&self.mesh, p) / (4.0 * PI))
    }

    /// True if `p` lies inside the surface.
    pub fn contains(&self, p: &Point3) -> bool {
        self.winding_number(p) >= Self::INSIDE_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_inside_outside_cube() {
        let cube = SurfaceMesh::cube(Point3::origin(), 1.0);
        assert_relative_eq!(winding_number(&cube, &Point3::origin()), 1.0, epsilon = 1e-10);
        assert_relative_eq!(
            winding_number(&cube, &Point3::new(0.9, -0.5, 0.3)),
            1.0,
            epsilon = 1e-10
        );
        assert_relative_eq!(
            winding_number(&cube, &Point3::new(3.0, 0.0, 0.0)),
            0.0,
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_mirroring_reverses_orientation() {
        // Mirroring keeps the winding order, which turns the surface inside
        // out as far as the winding number is concerned.
        let cube = SurfaceMesh::cube(Point3::new(1.0, 0.0, 0.0), 1.0).mirrored();
        assert_relative_eq!(
            winding_number(&cube, &Point3::new(-1.0, 0.0, 0.0)),
            -1.0,
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_open_surface_is_fractional() {
        // Only the top face of the cube: a point just below its center sees
        // nearly half of the sphere of directions covered.
        let cube = SurfaceMesh::cube(Point3::origin(), 1.0);
        let top = SurfaceMesh::new(
            cube.positions().to_vec(),
            vec![cube.triangles()[2], cube.triangles()[3]],
        )
        .unwrap();
        let w = winding_number(&top, &Point3::new(0.0, 0.0, 0.999));
        assert!(w > 0.45 && w < 0.5);
    }

    // Cube faces split into an n x n grid of quads each.
    fn tessellated_cube(half: f64, n: usize) -> SurfaceMesh {
        let mut positions = Vec::new();
        let mut triangles = Vec::new();
        for axis in 0..3 {
            for sign in [-1.0, 1.0] {
                let (u, v) = ((axis + 1) % 3, (axis + 2) % 3);
                let base = positions.len() as u32;
                for i in 0..=n {
                    for j in 0..=n {
                        let mut p = Point3::origin();
                        p[axis] = sign * half;
                        p[u] = -half + 2.0 * half * i as f64 / n as f64;
                        p[v] = -half + 2.0 * half * j as f64 / n as f64;
                        positions.push(p);
                    }
                }
                let at = |i: usize, j: usize| base + (i * (n + 1) + j) as u32;
                for i in 0..n {
                    for j in 0..n {
                        let quad = [at(i, j), at(i + 1, j), at(i + 1, j + 1), at(i, j + 1)];
                        // (u, v, axis) is right-handed, so u-then-v faces +axis
                        if sign > 0.0 {
                            triangles.push([quad[0], quad[1], quad[2]]);
                            triangles.push([quad[0], quad[2], quad[3]]);
                        } else {
                            triangles.push([quad[0], quad[2], quad[1]]);
                            triangles.push([quad[0], quad[3], quad[2]]);
                        }
                    }
                }
            }
        }
        SurfaceMesh::new(positions, triangles).unwrap()
    }

    #[test]
    fn test_hierarchy_tracks_exact_sum() {
        let mesh = tessellated_cube(1.0, 8);
        let offset = OffsetSurface::new(mesh.clone());
        let queries = [
            Point3::origin(),
            Point3::new(0.95, 0.1, -0.2),
            Point3::new(1.05, 0.3, 0.3),
            Point3::new(0.0, -1.5, 0.4),
            Point3::new(4.0, 3.0, -2.0),
            Point3::new(-20.0, 0.0, 0.0),
        ];
        for p in &queries {
            let exact = winding_number(&mesh, p);
            let fast = offset.winding_number(p);
            assert!((exact - fast).abs() < 0.1, "{p:?}: {exact} vs {fast}");
            assert_eq!(exact >= 0.5, offset.contains(p), "{p:?}");
        }
    }

    #[test]
    fn test_offset_contains() {
        let outer = OffsetSurface::new(SurfaceMesh::cube(Point3::origin(), 2.0));
        assert!(outer.contains(&Point3::new(1.5, 1.5, -1.5)));
        assert!(!outer.contains(&Point3::new(2.5, 0.0, 0.0)));
        assert!(outer.winding_number(&Point3::new(0.0, 10.0, 0.0)).abs() < 1e-10);
    }
}
