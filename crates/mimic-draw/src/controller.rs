//! The anchored projection controller.
//!
//! While a stroke is being drawn, the previous stroke point acts as an
//! anchor: the pen's world-space displacement since that point was
//! projected is added to it, and the sum is projected back onto the
//! surface. The result is the surface point closest to
//! `anchor + delta`, so stroke motion follows pen motion even where the
//! surface bends. Spraypaint mode skips anchoring and raycasts every
//! frame; the first point of every stroke is always raycast.

use log::debug;
use mimic_math::{Ray, Vec3};
use mimic_project::{HitResult, Target};
use serde::{Deserialize, Serialize};

use crate::frame::{ButtonState, FrameInput};
use crate::settings::{DrawSettings, ProjectionMode};
use crate::stroke::{Stroke, StrokeSink};

/// What the action button does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionMode {
    /// The action button draws strokes.
    #[default]
    Drawing,
    /// The action button erases; no strokes are started.
    Erasing,
}

impl InteractionMode {
    /// The other mode.
    pub fn toggled(self) -> Self {
        match self {
            InteractionMode::Drawing => InteractionMode::Erasing,
            InteractionMode::Erasing => InteractionMode::Drawing,
        }
    }
}

/// Result of one controller tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutput {
    /// Hit shown to the user, target-local.
    pub hit: HitResult,
    /// World-space ray from the pen tip toward the hit.
    pub ray: Ray,
    /// True if a stroke is active after the tick.
    pub drawing: bool,
}

/// Per-stroke state machine: idle, or drawing one stroke.
#[derive(Debug)]
pub struct AnchoredController {
    mode: ProjectionMode,
    pen_tip_offset: Vec3,
    spray_direction: Vec3,
    interaction: InteractionMode,
    stroke: Option<Stroke>,
    next_id: u64,
}

impl AnchoredController {
    /// Controller configured from `settings`.
    pub fn new(settings: &DrawSettings) -> Self {
        Self {
            mode: settings.mode,
            pen_tip_offset: settings.pen_tip_offset,
            spray_direction: settings.spray_direction,
            interaction: InteractionMode::default(),
            stroke: None,
            next_id: 0,
        }
    }

    /// Projection mode for new frames.
    pub fn mode(&self) -> ProjectionMode {
        self.mode
    }

    /// Change the projection mode. Takes effect on the next frame.
    pub fn set_mode(&mut self, mode: ProjectionMode) {
        self.mode = mode;
    }

    /// Current interaction mode.
    pub fn interaction(&self) -> InteractionMode {
        self.interaction
    }

    /// Switch interaction mode; leaving drawing cancels the active stroke.
    pub fn set_interaction(&mut self, interaction: InteractionMode, sink: &mut dyn StrokeSink) {
        if interaction == InteractionMode::Erasing {
            self.cancel(sink);
        }
        self.interaction = interaction;
    }

    /// The stroke being drawn, if any.
    pub fn stroke(&self) -> Option<&Stroke> {
        self.stroke.as_ref()
    }

    /// True while a stroke is active.
    pub fn is_drawing(&self) -> bool {
        self.stroke.is_some()
    }

    /// Drop the active stroke without finalizing it.
    pub fn cancel(&mut self, sink: &mut dyn StrokeSink) {
        if let Some(stroke) = self.stroke.take() {
            debug!("stroke {} cancelled", stroke.id());
            sink.discard(stroke);
        }
    }

    /// Finalize the active stroke.
    pub fn finish(&mut self, sink: &mut dyn StrokeSink) {
        if let Some(stroke) = self.stroke.take() {
            sink.finalize(stroke.finish());
        }
    }

    /// Run one frame.
    ///
    /// The spray raycast runs every frame, for the pointer display when
    /// idle and as the first point of a new stroke.
    pub fn tick(
        &mut self,
        target: &mut Target,
        input: &FrameInput,
        action: ButtonState,
        sink: &mut dyn StrokeSink,
    ) -> TickOutput {
        let frame = input.pose_frame(&self.pen_tip_offset);
        let spray = Ray::new(
            frame.pen_position,
            input.controller.transform_vector(&self.spray_direction),
        );
        let spray_hit = target.raycast(&spray, &frame);

        if self.interaction == InteractionMode::Erasing {
            return self.output(spray_hit, spray);
        }

        if action.just_pressed {
            self.finish(sink);
            if spray_hit.success {
                self.start(target, &spray_hit, sink);
            }
            return self.output(spray_hit, spray);
        }

        if action.just_released {
            self.finish(sink);
            return self.output(spray_hit, spray);
        }

        if !action.pressed {
            return self.output(spray_hit, spray);
        }

        let Some(last) = self.stroke.as_ref().and_then(|s| s.last_hit()) else {
            return self.output(spray_hit, spray);
        };

        let (hit, ray) = match self.mode {
            ProjectionMode::Spraypaint => (spray_hit, spray),
            ProjectionMode::AnchoredClosest | ProjectionMode::AnchoredSmooth => {
                let anchor = target.to_world(&last.point);
                let delta = frame.pen_position - target.to_world(&last.frame.pen_position);
                let query = anchor + delta;
                let hit = if self.mode == ProjectionMode::AnchoredSmooth {
                    target.project_smooth(&query, &frame)
                } else {
                    target.project_closest(&query, &frame)
                };
                let ray = Ray::towards(
                    frame.pen_position,
                    &target.to_world(&hit.point),
                    spray.direction.as_ref(),
                );
                (hit, ray)
            }
        };

        self.accept(&hit, sink);
        self.output(hit, ray)
    }

    fn start(&mut self, target: &Target, first: &HitResult, sink: &mut dyn StrokeSink) {
        let mut stroke = Stroke::new(self.next_id, self.mode, target.local_to_world().clone());
        self.next_id += 1;
        debug!("stroke {} started in {:?} mode", stroke.id(), self.mode);
        sink.begin(&stroke);
        stroke.push(first);
        sink.append(&stroke, first);
        self.stroke = Some(stroke);
    }

    fn accept(&mut self, hit: &HitResult, sink: &mut dyn StrokeSink) {
        let Some(stroke) = self.stroke.as_mut() else {
            return;
        };
        if stroke.push(hit) {
            sink.append(stroke, hit);
        } else {
            self.finish(sink);
        }
    }

    fn output(&self, hit: HitResult, ray: Ray) -> TickOutput {
        TickOutput {
            hit,
            ray,
            drawing: self.is_drawing(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{ButtonTracker, Pose};
    use crate::stroke::StrokeRecorder;
    use crate::test_support::{cube_target, settings};
    use approx::assert_relative_eq;
    use mimic_math::{Point3, Quat, Transform};
    use mimic_project::HitSource;

    fn input(pen: Point3, rotation: Quat, action: bool) -> FrameInput {
        FrameInput {
            controller: Pose::new(pen, rotation),
            action,
            ..FrameInput::default()
        }
    }

    struct Rig {
        target: Target,
        controller: AnchoredController,
        button: ButtonTracker,
        sink: StrokeRecorder,
    }

    impl Rig {
        fn new(mode: ProjectionMode, smooth: bool) -> Self {
            Self {
                target: cube_target(smooth),
                controller: AnchoredController::new(&settings(mode)),
                button: ButtonTracker::default(),
                sink: StrokeRecorder::default(),
            }
        }

        fn tick(&mut self, input: FrameInput) -> TickOutput {
            let action = self.button.update(input.action);
            self.controller
                .tick(&mut self.target, &input, action, &mut self.sink)
        }
    }

    #[test]
    fn test_first_point_is_raycast_then_smooth() {
        let mut rig = Rig::new(ProjectionMode::AnchoredSmooth, true);
        let q = Quat::identity();

        let idle = rig.tick(input(Point3::new(0.2, 0.1, -3.0), q, false));
        assert!(!idle.drawing);
        assert!(idle.hit.success);

        let first = rig.tick(input(Point3::new(0.2, 0.1, -3.0), q, true));
        assert!(first.drawing);
        assert_eq!(first.hit.source, HitSource::Raycast);
        assert_relative_eq!(first.hit.point, Point3::new(0.2, 0.1, -1.0), epsilon = 1e-9);

        let second = rig.tick(input(Point3::new(0.3, 0.1, -3.0), q, true));
        assert_eq!(second.hit.source, HitSource::Smooth);
        assert_relative_eq!(second.hit.point, Point3::new(0.3, 0.1, -1.0), epsilon = 1e-9);
        assert_eq!(rig.controller.stroke().map(Stroke::len), Some(2));
    }

    #[test]
    fn test_anchored_ignores_aim() {
        let mut rig = Rig::new(ProjectionMode::AnchoredClosest, false);
        rig.tick(input(Point3::new(0.2, 0.1, -3.0), Quat::identity(), true));

        // Turning the pen does not move the anchored point.
        let turned = Quat::from_axis_angle(&Vec3::y_axis(), 0.4);
        let out = rig.tick(input(Point3::new(0.2, 0.1, -3.0), turned, true));
        assert_eq!(out.hit.source, HitSource::ClosestPoint);
        assert_relative_eq!(out.hit.point, Point3::new(0.2, 0.1, -1.0), epsilon = 1e-9);

        // The ray points from the pen tip at the hit.
        assert_relative_eq!(out.ray.origin, Point3::new(0.2, 0.1, -3.0), epsilon = 1e-9);
        assert_relative_eq!(out.ray.direction.into_inner(), Vec3::z(), epsilon = 1e-9);
    }

    #[test]
    fn test_anchored_continuity_across_edge() {
        let mut rig = Rig::new(ProjectionMode::AnchoredClosest, false);
        rig.tick(input(Point3::new(0.7, 0.1, -3.0), Quat::identity(), true));

        // Pen moves 0.5 in +X: the anchor would leave the -Z face past the
        // edge at x = 1, so the point wraps onto the edge.
        let out = rig.tick(input(Point3::new(1.2, 0.1, -3.0), Quat::identity(), true));
        let anchor = Point3::new(0.7, 0.1, -1.0);
        let query = anchor + Vec3::new(0.5, 0.0, 0.0);
        assert_relative_eq!(out.hit.point, Point3::new(1.0, 0.1, -1.0), epsilon = 1e-9);
        let best = (out.hit.point - query).norm();
        for q in rig.target.surface().positions() {
            assert!(best <= (q - query).norm() + 1e-12);
        }
    }

    #[test]
    fn test_spraypaint_follows_aim() {
        let mut rig = Rig::new(ProjectionMode::Spraypaint, true);
        let pen = Point3::new(0.05, 0.1, -3.0);
        let mut points = Vec::new();
        for (i, angle) in [0.0, 0.1, 0.2, 0.3].into_iter().enumerate() {
            let q = Quat::from_axis_angle(&Vec3::y_axis(), angle);
            let out = rig.tick(input(pen, q, true));
            assert_eq!(out.hit.source, HitSource::Raycast, "frame {i}");
            points.push(out.hit.point);
        }
        for pair in points.windows(2) {
            assert!((pair[1] - pair[0]).norm() > 1e-3);
        }
        assert_eq!(rig.controller.stroke().map(Stroke::len), Some(4));
    }

    #[test]
    fn test_press_on_miss_does_not_start() {
        let mut rig = Rig::new(ProjectionMode::AnchoredSmooth, true);
        let out = rig.tick(input(Point3::new(5.0, 0.0, -3.0), Quat::identity(), true));
        assert!(!out.hit.success);
        assert!(!out.drawing);
        let out = rig.tick(input(Point3::new(0.0, 0.0, -3.0), Quat::identity(), true));
        assert!(!out.drawing);
        assert_eq!(rig.sink.appended(), 0);
    }

    #[test]
    fn test_failed_hit_finalizes() {
        let mut rig = Rig::new(ProjectionMode::Spraypaint, false);
        rig.tick(input(Point3::new(0.05, 0.1, -3.0), Quat::identity(), true));
        rig.tick(input(Point3::new(0.15, 0.1, -3.0), Quat::identity(), true));
        let out = rig.tick(input(Point3::new(5.0, 0.0, -3.0), Quat::identity(), true));
        assert!(!out.drawing);

        let strokes = rig.sink.strokes();
        assert_eq!(strokes.len(), 1);
        assert_eq!(strokes[0].len(), 2);
        assert!(strokes[0].is_consistent());
        assert_eq!(strokes[0].mode(), ProjectionMode::Spraypaint);

        // holding on does not start a new stroke
        let out = rig.tick(input(Point3::new(0.0, 0.0, -3.0), Quat::identity(), true));
        assert!(!out.drawing);
    }

    #[test]
    fn test_release_finalizes_and_records_model_matrix() {
        let mut rig = Rig::new(ProjectionMode::AnchoredClosest, false);
        let placement = Transform::translation(0.0, 0.0, 0.5);
        rig.target.set_transform(placement.clone()).unwrap();
        rig.tick(input(Point3::new(0.0, 0.2, -3.0), Quat::identity(), true));
        rig.tick(input(Point3::new(0.1, 0.2, -3.0), Quat::identity(), true));
        rig.tick(input(Point3::new(0.1, 0.2, -3.0), Quat::identity(), false));

        let stroke = &rig.sink.strokes()[0];
        assert_eq!(stroke.len(), 2);
        assert_eq!(stroke.model_matrix(), &placement);
        // points are local: the face at local z = -1 sits at world z = -0.5
        assert_relative_eq!(stroke.points()[1], Point3::new(0.1, 0.2, -1.0), epsilon = 1e-9);
    }

    #[test]
    fn test_erasing_cancels_and_blocks_strokes() {
        let mut rig = Rig::new(ProjectionMode::AnchoredClosest, false);
        rig.tick(input(Point3::new(0.05, 0.1, -3.0), Quat::identity(), true));
        assert!(rig.controller.is_drawing());

        rig.controller
            .set_interaction(InteractionMode::Erasing, &mut rig.sink);
        assert!(!rig.controller.is_drawing());
        assert_eq!(rig.sink.discarded(), 1);
        assert!(rig.sink.strokes().is_empty());

        rig.tick(input(Point3::new(0.0, 0.0, -3.0), Quat::identity(), false));
        let out = rig.tick(input(Point3::new(0.0, 0.0, -3.0), Quat::identity(), true));
        assert!(!out.drawing);
        assert_eq!(InteractionMode::Erasing.toggled(), InteractionMode::Drawing);
    }
}
