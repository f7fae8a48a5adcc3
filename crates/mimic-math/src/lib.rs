#![warn(missing_docs)]

//! Math types for anchored surface projection.
//!
//! Thin wrappers around nalgebra providing the domain types shared by the
//! projection crates: points, vectors, orientations, lifted (higher
//! dimensional) coordinates, affine transforms, and tolerance constants.

mod bbox;
mod handedness;
mod ray;
mod triangle;

pub use bbox::Aabb3;
pub use handedness::Handedness;
pub use ray::Ray;
pub use triangle::{
    closest_point_on_triangle, intersect_ray_triangle, triangle_barycentric_closest,
    triangle_normal, RayTriangleHit, TriangleProjection,
};

use nalgebra::{Matrix4, SVector, Unit, UnitQuaternion, Vector3, Vector4};
use serde::{Deserialize, Serialize};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// An orientation in 3D space.
pub type Quat = UnitQuaternion<f64>;

/// Number of components of a lifted (embedding) coordinate.
pub const LIFTED_DIM: usize = 8;

/// A point in the lifted embedding space.
pub type LiftedPoint = SVector<f64, LIFTED_DIM>;

/// A 4x4 affine transformation matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// The underlying 4x4 matrix.
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Translation by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 3)] = dx;
        m[(1, 3)] = dy;
        m[(2, 3)] = dz;
        Self { matrix: m }
    }

    /// Uniform scale by `s`.
    pub fn uniform_scale(s: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 0)] = s;
        m[(1, 1)] = s;
        m[(2, 2)] = s;
        Self { matrix: m }
    }

    /// Rotation by a unit quaternion.
    pub fn rotation(q: &Quat) -> Self {
        Self {
            matrix: q.to_homogeneous(),
        }
    }

    /// Translation, rotation and uniform scale, applied scale first.
    ///
    /// This is the usual local-to-world matrix of a scene node.
    pub fn from_trs(translation: &Vec3, rotation: &Quat, scale: f64) -> Self {
        Self::translation(translation.x, translation.y, translation.z)
            .then(&Self::rotation(rotation))
            .then(&Self::uniform_scale(scale))
    }

    /// Compose: `self` then `other` (self * other).
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        let v = self.matrix * Vector4::new(p.x, p.y, p.z, 1.0);
        Point3::new(v.x, v.y, v.z)
    }

    /// Transform a direction vector (ignores translation, applies rotation/scale).
    pub fn apply_vec(&self, v: &Vec3) -> Vec3 {
        let r = self.matrix * Vector4::new(v.x, v.y, v.z, 0.0);
        Vec3::new(r.x, r.y, r.z)
    }

    /// Transform a unit direction and re-normalize it.
    ///
    /// Returns the input unchanged if the transform collapses it.
    pub fn apply_dir(&self, v: &Vec3) -> Vec3 {
        let r = self.apply_vec(v);
        r.try_normalize(f64::EPSILON).unwrap_or(*v)
    }

    /// Inverse of this transform, if it exists.
    pub fn inverse(&self) -> Option<Self> {
        self.matrix.try_inverse().map(|matrix| Self { matrix })
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Tolerance constants for geometric comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Lower bound a barycentric weight may reach and still count as inside.
    ///
    /// Negative so that points lying numerically on (or just beyond) a face
    /// are still accepted.
    pub barycentric: f64,
}

impl Tolerance {
    /// Default tolerance (-1e-5 barycentric).
    pub const DEFAULT: Self = Self { barycentric: -1e-5 };

    /// Check that every barycentric weight exceeds the barycentric bound.
    pub fn barycentric_valid(&self, weights: &[f64]) -> bool {
        weights.iter().all(|&w| w > self.barycentric)
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}
