//! Projection results and the pose snapshot attached to each of them.

use mimic_math::{Point3, Transform, Vec3};
use serde::{Deserialize, Serialize};

/// Tracking data of one frame: head and pointer poses plus a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    /// Milliseconds since the session started.
    pub timestamp: f64,
    /// Head position.
    pub head_position: Point3,
    /// Pen tip position.
    pub pen_position: Point3,
    /// Head up direction.
    pub head_up: Vec3,
    /// Head forward direction.
    pub head_forward: Vec3,
    /// Controller up direction.
    pub controller_up: Vec3,
    /// Controller forward direction.
    pub controller_forward: Vec3,
}

impl Default for PoseFrame {
    fn default() -> Self {
        Self {
            timestamp: 0.0,
            head_position: Point3::origin(),
            pen_position: Point3::origin(),
            head_up: Vec3::y(),
            head_forward: Vec3::z(),
            controller_up: Vec3::y(),
            controller_forward: Vec3::z(),
        }
    }
}

impl PoseFrame {
    /// Express the frame through `transform`: positions are mapped as
    /// points, directions are mapped and re-normalized.
    pub fn transformed(&self, transform: &Transform) -> Self {
        Self {
            timestamp: self.timestamp,
            head_position: transform.apply_point(&self.head_position),
            pen_position: transform.apply_point(&self.pen_position),
            head_up: transform.apply_dir(&self.head_up),
            head_forward: transform.apply_dir(&self.head_forward),
            controller_up: transform.apply_dir(&self.controller_up),
            controller_forward: transform.apply_dir(&self.controller_forward),
        }
    }

    /// World frame to the local frame of a target.
    pub fn to_local(&self, world_to_local: &Transform) -> Self {
        self.transformed(world_to_local)
    }

    /// Local frame of a target back to world.
    pub fn to_world(&self, local_to_world: &Transform) -> Self {
        self.transformed(local_to_world)
    }
}

/// Why a smooth projection was replaced by a closest-point projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackReason {
    /// The query was outside the offset-surface shell.
    OutsideVolume,
    /// No tet contained the query.
    PointNotLocated,
    /// The foot-point solver failed.
    ProjectionFailure,
}

/// Which projection produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HitSource {
    /// Nearest intersection along a ray.
    Raycast,
    /// Exact closest point.
    ClosestPoint,
    /// Smooth projection through the lifted embedding.
    Smooth,
    /// Closest point standing in for a failed smooth projection.
    Fallback(FallbackReason),
}

/// Result of projecting onto a target, in the target's local frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitResult {
    /// Projected point.
    pub point: Point3,
    /// Outward normal of the hit triangle.
    pub normal: Vec3,
    /// Hit triangle, `None` for misses.
    pub triangle: Option<usize>,
    /// Barycentric weights of `point` within `triangle`.
    pub barycentric: Vec3,
    /// Distance from the query point (or ray origin) to `point`.
    ///
    /// Infinite for misses, and left out of the serialized form then.
    #[serde(default = "unbounded", skip_serializing_if = "is_unbounded")]
    pub distance: f64,
    /// Whether the projection produced a point.
    pub success: bool,
    /// Tracking data of the frame that produced the hit, local frame.
    pub frame: PoseFrame,
    /// Which projection produced the hit.
    pub source: HitSource,
}

fn unbounded() -> f64 {
    f64::INFINITY
}

fn is_unbounded(d: &f64) -> bool {
    !d.is_finite()
}

impl HitResult {
    /// A failed hit carrying only the frame.
    pub fn miss(frame: PoseFrame, source: HitSource) -> Self {
        Self {
            point: Point3::origin(),
            normal: Vec3::y(),
            triangle: None,
            barycentric: Vec3::zeros(),
            distance: f64::INFINITY,
            success: false,
            frame,
            source,
        }
    }

    /// True if this hit stands in for a failed smooth projection.
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, HitSource::Fallback(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mimic_math::Quat;

    #[test]
    fn test_frame_round_trip() {
        let q = Quat::from_euler_angles(0.1, 0.7, -0.3);
        let local_to_world = Transform::from_trs(&Vec3::new(1.0, -2.0, 0.5), &q, 2.0);
        let world_to_local = local_to_world.inverse().unwrap();
        let frame = PoseFrame {
            timestamp: 12.5,
            head_position: Point3::new(0.0, 1.7, 0.0),
            pen_position: Point3::new(0.3, 1.2, 0.4),
            ..PoseFrame::default()
        };

        let local = frame.to_local(&world_to_local);
        assert_relative_eq!(local.head_forward.norm(), 1.0, epsilon = 1e-12);
        let back = local.to_world(&local_to_world);
        assert_eq!(back.timestamp, 12.5);
        assert_relative_eq!(back.pen_position, frame.pen_position, epsilon = 1e-12);
        assert_relative_eq!(back.controller_up, frame.controller_up, epsilon = 1e-12);
    }

    #[test]
    fn test_hit_serializes_source() {
        let mut hit = HitResult::miss(PoseFrame::default(), HitSource::Fallback(FallbackReason::ProjectionFailure));
        hit.distance = 0.5;
        hit.success = true;
        let json = serde_json::to_string(&hit).unwrap();
        assert!(json.contains("projection-failure"));
        let back: HitResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hit);
        assert!(back.is_fallback());
    }

    #[test]
    fn test_miss_survives_json() {
        let miss = HitResult::miss(PoseFrame::default(), HitSource::Raycast);
        let json = serde_json::to_string(&miss).unwrap();
        assert!(!json.contains("distance"));
        let back: HitResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, miss);
        assert_eq!(back.distance, f64::INFINITY);
    }
}
