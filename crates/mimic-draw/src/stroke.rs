//! Strokes and the sink that receives them.

use log::{debug, warn};
use mimic_math::{Point3, Transform};
use mimic_project::HitResult;
use serde::{Deserialize, Serialize};

use crate::settings::ProjectionMode;

/// An ordered run of accepted hits on one target.
///
/// Points are in the target's local frame. Every point has exactly one
/// hit, from the first append to finalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    id: u64,
    mode: ProjectionMode,
    model_matrix: Transform,
    points: Vec<Point3>,
    hits: Vec<HitResult>,
}

impl Stroke {
    /// Empty stroke drawn in `mode` on a target placed at `model_matrix`.
    pub fn new(id: u64, mode: ProjectionMode, model_matrix: Transform) -> Self {
        Self {
            id,
            mode,
            model_matrix,
            points: Vec::new(),
            hits: Vec::new(),
        }
    }

    /// Identifier, unique within a session.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Projection mode the stroke was started in.
    pub fn mode(&self) -> ProjectionMode {
        self.mode
    }

    /// Local-to-world matrix of the target when the stroke was started.
    pub fn model_matrix(&self) -> &Transform {
        &self.model_matrix
    }

    /// Stroke points, target-local.
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// Hits the points came from.
    pub fn hits(&self) -> &[HitResult] {
        &self.hits
    }

    /// Most recent hit.
    pub fn last_hit(&self) -> Option<&HitResult> {
        self.hits.last()
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True before the first point.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True if points and hits pair up.
    pub fn is_consistent(&self) -> bool {
        self.points.len() == self.hits.len()
    }

    /// Append a hit. Failed hits are rejected.
    pub fn push(&mut self, hit: &HitResult) -> bool {
        if !hit.success {
            return false;
        }
        self.points.push(hit.point);
        self.hits.push(hit.clone());
        true
    }

    pub(crate) fn finish(self) -> Self {
        if !self.is_consistent() {
            warn!(
                "stroke {} has {} points but {} hits",
                self.id,
                self.points.len(),
                self.hits.len()
            );
        }
        debug!("stroke {} finished with {} points", self.id, self.len());
        self
    }
}

/// Receives strokes as they are drawn.
pub trait StrokeSink {
    /// A stroke was started; it is still empty.
    fn begin(&mut self, _stroke: &Stroke) {}

    /// A point was appended to `stroke`.
    fn append(&mut self, stroke: &Stroke, hit: &HitResult);

    /// The stroke ended and will not change again.
    fn finalize(&mut self, stroke: Stroke);

    /// The stroke was cancelled and should be thrown away.
    fn discard(&mut self, _stroke: Stroke) {}
}

/// Sink that keeps every finalized stroke.
#[derive(Debug, Clone, Default)]
pub struct StrokeRecorder {
    strokes: Vec<Stroke>,
    appended: usize,
    discarded: usize,
}

impl StrokeRecorder {
    /// Finalized strokes, in order.
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    /// Take the finalized strokes.
    pub fn into_strokes(self) -> Vec<Stroke> {
        self.strokes
    }

    /// Points appended over all strokes, including discarded ones.
    pub fn appended(&self) -> usize {
        self.appended
    }

    /// Strokes thrown away.
    pub fn discarded(&self) -> usize {
        self.discarded
    }
}

impl StrokeSink for StrokeRecorder {
    fn append(&mut self, _stroke: &Stroke, _hit: &HitResult) {
        self.appended += 1;
    }

    fn finalize(&mut self, stroke: Stroke) {
        self.strokes.push(stroke);
    }

    fn discard(&mut self, _stroke: Stroke) {
        self.discarded += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimic_project::{HitSource, PoseFrame};

    fn hit(x: f64, success: bool) -> HitResult {
        let mut hit = HitResult::miss(PoseFrame::default(), HitSource::Raycast);
        hit.point = Point3::new(x, 0.0, 0.0);
        hit.triangle = success.then_some(0);
        hit.success = success;
        hit
    }

    #[test]
    fn test_push_keeps_points_and_hits_paired() {
        let mut stroke = Stroke::new(4, ProjectionMode::Spraypaint, Transform::identity());
        assert!(stroke.is_empty());
        assert!(stroke.push(&hit(1.0, true)));
        assert!(!stroke.push(&hit(2.0, false)));
        assert!(stroke.push(&hit(3.0, true)));
        assert_eq!(stroke.len(), 2);
        assert_eq!(stroke.hits().len(), 2);
        assert!(stroke.is_consistent());
        assert_eq!(stroke.points()[1], Point3::new(3.0, 0.0, 0.0));
        assert_eq!(stroke.last_hit().map(|h| h.point.x), Some(3.0));
    }

    #[test]
    fn test_recorder() {
        let mut recorder = StrokeRecorder::default();
        let mut stroke = Stroke::new(0, ProjectionMode::AnchoredClosest, Transform::identity());
        stroke.push(&hit(1.0, true));
        recorder.append(&stroke, &hit(1.0, true));
        recorder.finalize(stroke.finish());
        recorder.discard(Stroke::new(1, ProjectionMode::AnchoredClosest, Transform::identity()));
        assert_eq!(recorder.strokes().len(), 1);
        assert_eq!(recorder.appended(), 1);
        assert_eq!(recorder.discarded(), 1);
        assert_eq!(recorder.into_strokes()[0].mode(), ProjectionMode::AnchoredClosest);
    }
}
