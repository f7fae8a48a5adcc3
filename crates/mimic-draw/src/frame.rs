//! Per-frame input: tracked poses, raw button states, and where they come from.

use std::collections::VecDeque;
use std::path::Path;

use log::info;
use mimic_math::{Point3, Quat, Vec3};
use mimic_project::PoseFrame;
use serde::{Deserialize, Serialize};

use crate::error::ReplayError;

/// A tracked rigid pose in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Position.
    pub position: Point3,
    /// Orientation.
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Point3::origin(),
            rotation: Quat::identity(),
        }
    }
}

impl Pose {
    /// Pose at `position` with orientation `rotation`.
    pub fn new(position: Point3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Local point of the posed frame in world space.
    pub fn transform_point(&self, local: &Vec3) -> Point3 {
        self.position + self.rotation * local
    }

    /// Local direction of the posed frame in world space.
    pub fn transform_vector(&self, local: &Vec3) -> Vec3 {
        self.rotation * local
    }

    /// Local +Y in world space.
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::y()
    }

    /// Local +Z in world space.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::z()
    }
}

/// Everything the drawing loop reads in one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameInput {
    /// Milliseconds since the session started.
    pub timestamp: f64,
    /// Head (camera) pose.
    pub head: Pose,
    /// Pen controller pose.
    pub controller: Pose,
    /// Raw state of the draw/erase action button.
    #[serde(default)]
    pub action: bool,
    /// Raw state of the drawing/erasing toggle button.
    #[serde(default)]
    pub toggle: bool,
}

impl FrameInput {
    /// Pose snapshot with the pen tip at `pen_tip_offset` in the controller frame.
    pub fn pose_frame(&self, pen_tip_offset: &Vec3) -> PoseFrame {
        PoseFrame {
            timestamp: self.timestamp,
            head_position: self.head.position,
            pen_position: self.controller.transform_point(pen_tip_offset),
            head_up: self.head.up(),
            head_forward: self.head.forward(),
            controller_up: self.controller.up(),
            controller_forward: self.controller.forward(),
        }
    }
}

/// Edge state of a button after one update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonState {
    /// Held this frame.
    pub pressed: bool,
    /// Went down this frame.
    pub just_pressed: bool,
    /// Went up this frame.
    pub just_released: bool,
}

/// Derives press and release edges from raw per-frame button states.
#[derive(Debug, Clone, Default)]
pub struct ButtonTracker {
    last: bool,
}

impl ButtonTracker {
    /// Feed this frame's raw state.
    pub fn update(&mut self, raw: bool) -> ButtonState {
        let state = ButtonState {
            pressed: raw,
            just_pressed: raw && !self.last,
            just_released: !raw && self.last,
        };
        self.last = raw;
        state
    }
}

/// Supplies one [`FrameInput`] per tick.
pub trait FrameSource {
    /// Input for the next frame, `None` once the source is exhausted.
    fn next_frame(&mut self) -> Option<FrameInput>;
}

/// Plays back a recorded sequence of frames.
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    frames: VecDeque<FrameInput>,
}

impl ReplaySource {
    /// Source yielding `frames` in order.
    pub fn new(frames: impl IntoIterator<Item = FrameInput>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// Parse a JSON array of frames.
    pub fn from_json(text: &str) -> Result<Self, ReplayError> {
        let frames: Vec<FrameInput> = serde_json::from_str(text)?;
        Ok(Self::new(frames))
    }

    /// Read a JSON recording.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let path = path.as_ref();
        let source = Self::from_json(&std::fs::read_to_string(path)?)?;
        info!("loaded {} frames from {}", source.remaining(), path.display());
        Ok(source)
    }

    /// Frames not yet played.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for ReplaySource {
    fn next_frame(&mut self) -> Option<FrameInput> {
        self.frames.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_button_edges() {
        let mut button = ButtonTracker::default();
        let states: Vec<_> = [false, true, true, false, false]
            .into_iter()
            .map(|raw| button.update(raw))
            .collect();
        assert_eq!(states[0], ButtonState::default());
        assert!(states[1].pressed && states[1].just_pressed);
        assert!(states[2].pressed && !states[2].just_pressed);
        assert!(!states[3].pressed && states[3].just_released);
        assert_eq!(states[4], ButtonState::default());
    }

    #[test]
    fn test_pen_tip_follows_controller() {
        let input = FrameInput {
            timestamp: 3.0,
            controller: Pose::new(
                Point3::new(1.0, 0.0, 0.0),
                Quat::from_axis_angle(&Vec3::y_axis(), FRAC_PI_2),
            ),
            ..FrameInput::default()
        };
        let frame = input.pose_frame(&Vec3::new(0.0, 0.0, 0.5));
        // +Z turned a quarter about +Y points along +X
        assert_relative_eq!(frame.pen_position, Point3::new(1.5, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(frame.controller_forward, Vec3::x(), epsilon = 1e-12);
        assert_relative_eq!(frame.controller_up, Vec3::y(), epsilon = 1e-12);
        assert_eq!(frame.timestamp, 3.0);
    }

    #[test]
    fn test_replay_json() {
        let text = r#"[
            {"timestamp": 0.0,
             "head": {"position": [0.0, 1.7, 0.0], "rotation": [0.0, 0.0, 0.0, 1.0]},
             "controller": {"position": [0.1, 1.2, 0.3], "rotation": [0.0, 0.0, 0.0, 1.0]},
             "action": true},
            {"timestamp": 11.1,
             "head": {"position": [0.0, 1.7, 0.0], "rotation": [0.0, 0.0, 0.0, 1.0]},
             "controller": {"position": [0.1, 1.2, 0.3], "rotation": [0.0, 0.0, 0.0, 1.0]}}
        ]"#;
        let mut source = ReplaySource::from_json(text).unwrap();
        assert_eq!(source.remaining(), 2);
        let first = source.next_frame().unwrap();
        assert!(first.action);
        assert!(!first.toggle);
        assert_eq!(first.controller.position, Point3::new(0.1, 1.2, 0.3));
        assert!(!source.next_frame().unwrap().action);
        assert!(source.next_frame().is_none());

        assert!(matches!(
            ReplaySource::from_json("{}"),
            Err(ReplayError::Json(_))
        ));
    }
}
