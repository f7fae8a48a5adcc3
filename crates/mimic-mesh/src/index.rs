//! Triangle spatial index: nearest-hit raycasts and closest-point queries.

use std::sync::Arc;

use mimic_math::{closest_point_on_triangle, intersect_ray_triangle, Point3, Ray, Vec3};

use crate::bvh::Bvh;
use crate::SurfaceMesh;

/// A point on a surface mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    /// Point on the surface.
    pub point: Point3,
    /// Normal of the triangle containing the point.
    pub normal: Vec3,
    /// Index of the triangle containing the point.
    pub triangle: usize,
    /// Barycentric weights of `point` within the triangle.
    pub barycentric: Vec3,
    /// Distance from the query (ray parameter for raycasts).
    pub distance: f64,
}

/// BVH over the triangles of a surface mesh.
#[derive(Debug, Clone)]
pub struct SurfaceIndex {
    mesh: Arc<SurfaceMesh>,
    bvh: Bvh,
}

impl SurfaceIndex {
    /// Index all triangles of `mesh`.
    pub fn new(mesh: Arc<SurfaceMesh>) -> Self {
        let bounds: Vec<_> = (0..mesh.triangle_count())
            .map(|t| mesh.triangle_bounds(t))
            .collect();
        let bvh = Bvh::build(&bounds);
        Self { mesh, bvh }
    }

    /// The indexed mesh.
    pub fn mesh(&self) -> &Arc<SurfaceMesh> {
        &self.mesh
    }

    /// Nearest intersection of `ray` with the surface, from either side.
    pub fn raycast(&self, ray: &Ray) -> Option<SurfaceHit> {
        let mesh = &self.mesh;
        self.bvh
            .trace_closest(ray, |t| {
                let [a, b, c] = mesh.triangle(t);
                intersect_ray_triangle(ray, &a, &b, &c).map(|hit| (hit.t, (t, hit.barycentric)))
            })
            .map(|(dist, (t, barycentric))| SurfaceHit {
                point: ray.at(dist),
                normal: mesh.normal(t),
                triangle: t,
                barycentric,
                distance: dist,
            })
    }

    /// Exact closest point of the surface to `p`.
    ///
    /// Only `None` for an index without triangles, which a validated
    /// [`SurfaceMesh`] rules out.
    pub fn closest_point(&self, p: &Point3) -> Option<SurfaceHit> {
        let mesh = &self.mesh;
        self.bvh
            .nearest(p, |t| {
                let [a, b, c] = mesh.triangle(t);
                let proj = closest_point_on_triangle(p, &a, &b, &c);
                (proj.distance * proj.distance, (t, proj))
            })
            .map(|(_, (t, proj))| SurfaceHit {
                point: proj.point,
                normal: mesh.normal(t),
                triangle: t,
                barycentric: proj.barycentric,
                distance: proj.distance,
            })
    }
}
