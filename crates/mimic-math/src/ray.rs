//! Ray representation and the ray-box slab test.

use serde::{Deserialize, Serialize};

use crate::{Aabb3, Dir3, Point3, Transform, Vec3};

/// A ray in 3D space defined by origin and direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RayRepr", into = "RayRepr")]
pub struct Ray {
    /// Origin point of the ray.
    pub origin: Point3,
    /// Unit direction of the ray.
    pub direction: Dir3,
    /// Precomputed reciprocal of direction components for fast AABB tests.
    inv_direction: Vec3,
    /// Sign of direction components (0 if positive, 1 if negative).
    sign: [usize; 3],
}

#[derive(Serialize, Deserialize)]
struct RayRepr {
    origin: Point3,
    direction: Vec3,
}

impl From<RayRepr> for Ray {
    fn from(r: RayRepr) -> Self {
        Ray::new(r.origin, r.direction)
    }
}

impl From<Ray> for RayRepr {
    fn from(r: Ray) -> Self {
        RayRepr {
            origin: r.origin,
            direction: r.direction.into_inner(),
        }
    }
}

impl Ray {
    /// Create a new ray from origin and direction.
    ///
    /// The direction will be normalized.
    pub fn new(origin: Point3, direction: Vec3) -> Self {
        let dir = Dir3::new_normalize(direction);
        let inv = Vec3::new(1.0 / dir.x, 1.0 / dir.y, 1.0 / dir.z);
        let sign = [
            if inv.x < 0.0 { 1 } else { 0 },
            if inv.y < 0.0 { 1 } else { 0 },
            if inv.z < 0.0 { 1 } else { 0 },
        ];
        Self {
            origin,
            direction: dir,
            inv_direction: inv,
            sign,
        }
    }

    /// Ray from `origin` through `target`.
    ///
    /// Falls back to `fallback` when the two points coincide.
    pub fn towards(origin: Point3, target: &Point3, fallback: &Vec3) -> Self {
        let d = target - origin;
        if d.norm_squared() > f64::EPSILON {
            Self::new(origin, d)
        } else {
            Self::new(origin, *fallback)
        }
    }

    /// Evaluate the ray at parameter `t`: `origin + t * direction`.
    #[inline]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + t * self.direction.as_ref()
    }

    /// Express this ray in another frame.
    pub fn transformed(&self, t: &Transform) -> Self {
        Self::new(t.apply_point(&self.origin), t.apply_vec(self.direction.as_ref()))
    }

    /// Test ray-AABB intersection using the slab method.
    ///
    /// Returns `Some((t_min, t_max))` if the ray intersects the box,
    /// where `t_min` and `t_max` are the entry and exit parameters.
    /// Returns `None` if no intersection.
    #[inline]
    pub fn intersect_aabb(&self, aabb: &Aabb3) -> Option<(f64, f64)> {
        let bounds = [aabb.min, aabb.max];

        let tx1 = (bounds[self.sign[0]].x - self.origin.x) * self.inv_direction.x;
        let tx2 = (bounds[1 - self.sign[0]].x - self.origin.x) * self.inv_direction.x;

        let mut t_min = tx1;
        let mut t_max = tx2;

        let ty1 = (bounds[self.sign[1]].y - self.origin.y) * self.inv_direction.y;
        let ty2 = (bounds[1 - self.sign[1]].y - self.origin.y) * self.inv_direction.y;

        t_min = t_min.max(ty1);
        t_max = t_max.min(ty2);

        let tz1 = (bounds[self.sign[2]].z - self.origin.z) * self.inv_direction.z;
        let tz2 = (bounds[1 - self.sign[2]].z - self.origin.z) * self.inv_direction.z;

        t_min = t_min.max(tz1);
        t_max = t_max.min(tz2);

        if t_max >= t_min && t_max >= 0.0 {
            Some((t_min.max(0.0), t_max))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Point3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0));
        let p = ray.at(5.0);
        assert!((p.x - 5.0).abs() < 1e-12);
        assert!(p.y.abs() < 1e-12);
        assert!(p.z.abs() < 1e-12);
    }

    #[test]
    fn test_ray_aabb_hit() {
        let ray = Ray::new(Point3::new(-5.0, 0.5, 0.5), Vec3::new(1.0, 0.0, 0.0));
        let aabb = Aabb3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        let (t_min, t_max) = ray.intersect_aabb(&aabb).unwrap();
        assert!((t_min - 5.0).abs() < 1e-10);
        assert!((t_max - 6.0).abs() < 1e-10);
    }

    #[test]
    fn test_ray_aabb_miss_and_behind() {
        let aabb = Aabb3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        let miss = Ray::new(Point3::new(-5.0, 5.0, 5.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(miss.intersect_aabb(&aabb).is_none());
        let behind = Ray::new(Point3::new(-5.0, 0.5, 0.5), Vec3::new(-1.0, 0.0, 0.0));
        assert!(behind.intersect_aabb(&aabb).is_none());
    }

    #[test]
    fn test_flat_aabb_is_hit() {
        // A box around a single point still has a valid slab interval.
        let p = Point3::new(2.0, 0.0, 0.0);
        let aabb = Aabb3::new(p, p);
        let ray = Ray::new(Point3::origin(), Vec3::new(1.0, 0.0, 0.0));
        assert!(ray.intersect_aabb(&aabb).is_some());
    }

    #[test]
    fn test_towards_and_transform() {
        let ray = Ray::towards(Point3::origin(), &Point3::new(0.0, 0.0, 3.0), &Vec3::x());
        assert!((ray.direction.z - 1.0).abs() < 1e-12);
        let degenerate = Ray::towards(Point3::origin(), &Point3::origin(), &Vec3::x());
        assert!((degenerate.direction.x - 1.0).abs() < 1e-12);

        let moved = ray.transformed(&Transform::translation(1.0, 0.0, 0.0));
        assert!((moved.origin.x - 1.0).abs() < 1e-12);
        assert!((moved.direction.z - 1.0).abs() < 1e-12);
    }
}
