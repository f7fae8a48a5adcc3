//! Exact closest-point and raycast projection in a target's local frame.

use std::sync::Arc;

use mimic_math::{Point3, Ray};
use mimic_mesh::{SurfaceHit, SurfaceIndex, SurfaceMesh};

/// Closest-point projector over the scene-space surface of a target.
///
/// The triangle index is built on construction, so queries cannot run
/// without it.
#[derive(Debug, Clone)]
pub struct VanillaProjector {
    index: SurfaceIndex,
}

impl VanillaProjector {
    /// Index `mesh` for queries.
    pub fn new(mesh: Arc<SurfaceMesh>) -> Self {
        Self {
            index: SurfaceIndex::new(mesh),
        }
    }

    /// The projected surface.
    pub fn mesh(&self) -> &SurfaceMesh {
        self.index.mesh()
    }

    /// Nearest intersection of a local-frame ray with the surface.
    pub fn raycast(&self, ray: &Ray) -> Option<SurfaceHit> {
        self.index.raycast(ray)
    }

    /// Closest surface point to a local-frame point.
    pub fn closest(&self, p: &Point3) -> Option<SurfaceHit> {
        self.index.closest_point(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mimic_math::Vec3;

    #[test]
    fn test_closest_on_edge_region() {
        let vanilla = VanillaProjector::new(Arc::new(SurfaceMesh::cube(Point3::origin(), 1.0)));
        let hit = vanilla.closest(&Point3::new(2.0, 2.0, 0.3)).unwrap();
        assert_relative_eq!(hit.point, Point3::new(1.0, 1.0, 0.3), epsilon = 1e-12);
        assert_relative_eq!(hit.distance, 2f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(hit.barycentric.sum(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_raycast_hits_near_side() {
        let vanilla = VanillaProjector::new(Arc::new(SurfaceMesh::cube(Point3::origin(), 1.0)));
        let ray = Ray::new(Point3::new(0.2, 5.0, 0.1), Vec3::new(0.0, -1.0, 0.0));
        let hit = vanilla.raycast(&ray).unwrap();
        assert_relative_eq!(hit.point, Point3::new(0.2, 1.0, 0.1), epsilon = 1e-12);
        assert_relative_eq!(hit.normal, Vec3::y(), epsilon = 1e-12);
        assert!(vanilla
            .raycast(&Ray::new(Point3::new(0.0, 5.0, 0.0), Vec3::y()))
            .is_none());
    }
}
