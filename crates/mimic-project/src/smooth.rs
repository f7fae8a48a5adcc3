//! Smooth projection through the lifted tetrahedral embedding.
//!
//! All inputs and outputs are in the native handedness of the mesh files.

use std::sync::Arc;

use log::{debug, info, warn};
use mimic_math::{Point3, Tolerance, Vec3};
use mimic_mesh::OffsetSurface;
use mimic_tet::{SurfaceEmbedding, TetLocator, TetMesh};
use serde::{Deserialize, Serialize};

use crate::error::{SmoothError, SolverError};
use crate::hit::FallbackReason;
use crate::solver::{LiftedSurfaceSolver, SolverHandle, SolverMode};

/// A foot-point on the surface, native frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothProjection {
    /// Projected point.
    pub point: Point3,
    /// Surface triangle containing the point.
    pub triangle: usize,
    /// Barycentric weights within `triangle`.
    pub barycentric: Vec3,
    /// Distance from the query point.
    pub distance: f64,
}

/// Outcome counters of a smooth projector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmoothDiagnostics {
    /// Total projection attempts.
    pub attempts: u64,
    /// Attempts that produced a smooth foot-point.
    pub succeeded: u64,
    /// Queries outside the offset-surface shell.
    pub outside_volume: u64,
    /// Queries inside the shell that no tet contained.
    pub point_not_located: u64,
    /// Solver failures.
    pub projection_failure: u64,
}

impl SmoothDiagnostics {
    /// Failures of the given kind so far.
    pub fn count(&self, reason: FallbackReason) -> u64 {
        match reason {
            FallbackReason::OutsideVolume => self.outside_volume,
            FallbackReason::PointNotLocated => self.point_not_located,
            FallbackReason::ProjectionFailure => self.projection_failure,
        }
    }

    fn record(&mut self, reason: FallbackReason) -> u64 {
        let slot = match reason {
            FallbackReason::OutsideVolume => &mut self.outside_volume,
            FallbackReason::PointNotLocated => &mut self.point_not_located,
            FallbackReason::ProjectionFailure => &mut self.projection_failure,
        };
        *slot += 1;
        *slot
    }
}

impl SmoothError {
    /// The fallback reason reported for this error.
    pub fn reason(&self) -> FallbackReason {
        match self {
            SmoothError::OutsideVolume { .. } => FallbackReason::OutsideVolume,
            SmoothError::PointNotLocated(_) => FallbackReason::PointNotLocated,
            SmoothError::ProjectionFailure(_) => FallbackReason::ProjectionFailure,
        }
    }
}

/// Projects points near a surface onto its smooth approximation.
///
/// Owns everything the smooth path needs for one target, including the
/// foot-point solver handle, so dropping the projector releases it.
#[derive(Debug)]
pub struct SmoothProjector {
    outer: OffsetSurface,
    inner: Option<OffsetSurface>,
    locator: TetLocator,
    embedding: Arc<SurfaceEmbedding>,
    solver: SolverHandle,
    mode: SolverMode,
    last_triangle: Option<usize>,
    diagnostics: SmoothDiagnostics,
}

impl SmoothProjector {
    /// Projector using the bundled [`LiftedSurfaceSolver`].
    pub fn new(
        outer: OffsetSurface,
        inner: Option<OffsetSurface>,
        tets: Arc<TetMesh>,
        embedding: Arc<SurfaceEmbedding>,
        tolerance: Tolerance,
    ) -> Self {
        let solver = SolverHandle::new(
            Box::new(LiftedSurfaceSolver::new(&embedding)),
            format!("{} lifted triangles", embedding.triangle_count()),
        );
        Self::with_solver(outer, inner, tets, embedding, tolerance, solver)
    }

    /// Projector using an externally supplied solver.
    pub fn with_solver(
        outer: OffsetSurface,
        inner: Option<OffsetSurface>,
        tets: Arc<TetMesh>,
        embedding: Arc<SurfaceEmbedding>,
        tolerance: Tolerance,
        solver: SolverHandle,
    ) -> Self {
        Self {
            outer,
            inner,
            locator: TetLocator::new(tets, tolerance),
            embedding,
            solver,
            mode: SolverMode::default(),
            last_triangle: None,
            diagnostics: SmoothDiagnostics::default(),
        }
    }

    /// How the solver is called.
    pub fn mode(&self) -> SolverMode {
        self.mode
    }

    /// Change how the solver is called.
    pub fn set_mode(&mut self, mode: SolverMode) {
        self.mode = mode;
    }

    /// Outcome counters so far.
    pub fn diagnostics(&self) -> &SmoothDiagnostics {
        &self.diagnostics
    }

    /// The point locator, with its statistics.
    pub fn locator(&self) -> &TetLocator {
        &self.locator
    }

    /// The lifted surface triangulation.
    pub fn embedding(&self) -> &Arc<SurfaceEmbedding> {
        &self.embedding
    }

    /// True if `p` lies between the offset surfaces.
    pub fn in_volume(&self, p: &Point3) -> bool {
        self.containment(p).is_ok()
    }

    /// Project `p` onto the smooth surface.
    ///
    /// Failures are counted and logged here; the caller decides how to
    /// fall back.
    pub fn project(&mut self, p: &Point3) -> Result<SmoothProjection, SmoothError> {
        self.diagnostics.attempts += 1;
        match self.try_project(p) {
            Ok(projection) => {
                self.diagnostics.succeeded += 1;
                self.last_triangle = Some(projection.triangle);
                Ok(projection)
            }
            Err(err) => {
                self.last_triangle = None;
                let reason = err.reason();
                let seen = self.diagnostics.record(reason);
                if reason == FallbackReason::OutsideVolume || seen > 1 {
                    debug!("smooth projection failed ({} times): {}", seen, err);
                } else {
                    warn!("smooth projection failed: {}", err);
                }
                Err(err)
            }
        }
    }

    fn containment(&self, p: &Point3) -> Result<(), SmoothError> {
        let outer = self.outer.winding_number(p);
        let inner = self.inner.as_ref().map(|s| s.winding_number(p));
        let inside_outer = outer >= OffsetSurface::INSIDE_THRESHOLD;
        let outside_inner = inner.map_or(true, |w| w < OffsetSurface::INSIDE_THRESHOLD);
        if inside_outer && outside_inner {
            Ok(())
        } else {
            Err(SmoothError::OutsideVolume { outer, inner })
        }
    }

    fn try_project(&mut self, p: &Point3) -> Result<SmoothProjection, SmoothError> {
        self.containment(p)?;

        let location = self.locator.locate(p)?;
        let lifted = self
            .locator
            .mesh()
            .interpolate_lifted(location.tet, &location.barycentric);

        let foot = match (self.mode, self.last_triangle) {
            (SolverMode::WarmStart, Some(seed)) => {
                self.solver.solve(&lifted, SolverMode::WarmStart, seed)?
            }
            _ => self.solver.solve(&lifted, SolverMode::BruteForce, 0)?,
        };
        if foot.triangle >= self.embedding.triangle_count() {
            return Err(SolverError::InvalidTriangle(foot.triangle).into());
        }

        let point = self
            .embedding
            .point_from_barycentric(foot.triangle, &foot.barycentric);
        Ok(SmoothProjection {
            point,
            triangle: foot.triangle,
            barycentric: foot.barycentric,
            distance: (point - p).norm(),
        })
    }
}

impl Drop for SmoothProjector {
    fn drop(&mut self) {
        info!("tet locator: {}", self.locator.stats());
    }
}
