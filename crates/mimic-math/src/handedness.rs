//! Conversion between the scene's coordinate handedness and the one used by
//! mesh files and the lifted subsystem.
//!
//! The conversion mirrors the X axis. It is an involution: applying it twice
//! returns the original value bit for bit, since it only negates components.

use nalgebra::Quaternion;

use crate::{Point3, Quat, Vec3};

/// Values that can be carried across the handedness boundary.
pub trait Handedness {
    /// Return the value expressed in the opposite handedness.
    fn flip_handedness(&self) -> Self;
}

impl Handedness for Point3 {
    fn flip_handedness(&self) -> Self {
        Point3::new(-self.x, self.y, self.z)
    }
}

impl Handedness for Vec3 {
    fn flip_handedness(&self) -> Self {
        Vec3::new(-self.x, self.y, self.z)
    }
}

impl Handedness for Quat {
    /// Mirroring X negates the rotation's X and W components.
    fn flip_handedness(&self) -> Self {
        let q = self.quaternion();
        Quat::new_unchecked(Quaternion::new(-q.w, -q.i, q.j, q.k))
    }
}
