//! Foot-point solvers: map a lifted point to a point of the lifted surface.
//!
//! A solver is created once per target and owned through a
//! [`SolverHandle`], which releases it when the target goes away. The
//! bundled [`LiftedSurfaceSolver`] is pure Rust; other implementations
//! (for example bindings to a native library) plug in through
//! [`FootPointSolver`].

use std::fmt;

use log::debug;
use mimic_math::{triangle_barycentric_closest, LiftedPoint, Vec3};
use mimic_tet::SurfaceEmbedding;
use serde::{Deserialize, Serialize};

use crate::error::SolverError;

/// How the smooth projector calls its solver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolverMode {
    /// Search every lifted triangle. Slow but robust.
    #[default]
    BruteForce,
    /// Start from the previous foot-point triangle. Fast, may fail.
    WarmStart,
}

/// A point of the lifted surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FootPoint {
    /// Triangle containing the point.
    pub triangle: usize,
    /// Barycentric weights within the triangle.
    pub barycentric: Vec3,
}

/// Projects lifted points onto a lifted surface triangulation.
///
/// Calls on one solver never overlap.
pub trait FootPointSolver: fmt::Debug {
    /// Projection seeded with a triangle near the expected answer.
    fn project(&mut self, lifted: &LiftedPoint, warm_start: usize) -> Result<FootPoint, SolverError>;

    /// Projection searching the whole surface.
    fn project_brute_force(&mut self, lifted: &LiftedPoint) -> Result<FootPoint, SolverError>;

    /// Release any resources held outside Rust's ownership.
    fn release(&mut self) {}
}

/// Exclusive owner of a foot-point solver.
///
/// Not clonable; dropping it releases the solver exactly once.
#[derive(Debug)]
pub struct SolverHandle {
    solver: Box<dyn FootPointSolver>,
    label: String,
}

impl SolverHandle {
    /// Take ownership of `solver`; `label` names it in logs.
    pub fn new(solver: Box<dyn FootPointSolver>, label: impl Into<String>) -> Self {
        Self {
            solver,
            label: label.into(),
        }
    }

    /// Solve in the given mode.
    pub fn solve(
        &mut self,
        lifted: &LiftedPoint,
        mode: SolverMode,
        warm_start: usize,
    ) -> Result<FootPoint, SolverError> {
        match mode {
            SolverMode::BruteForce => self.solver.project_brute_force(lifted),
            SolverMode::WarmStart => self.solver.project(lifted, warm_start),
        }
    }
}

impl Drop for SolverHandle {
    fn drop(&mut self) {
        self.solver.release();
        debug!("released foot-point solver for {}", self.label);
    }
}

/// Euclidean closest point on the lifted triangulation.
#[derive(Debug, Clone)]
pub struct LiftedSurfaceSolver {
    vertices: Vec<LiftedPoint>,
    triangles: Vec<[u32; 3]>,
    vertex_triangles: Vec<Vec<u32>>,
    max_steps: usize,
}

impl LiftedSurfaceSolver {
    /// Default bound on warm-start descent steps.
    pub const DEFAULT_MAX_STEPS: usize = 64;

    /// Solver over the lifted triangles of `embedding`.
    pub fn new(embedding: &SurfaceEmbedding) -> Self {
        let mut vertex_triangles = vec![Vec::new(); embedding.vertex_count()];
        for (t, tri) in embedding.triangles().iter().enumerate() {
            for &v in tri {
                vertex_triangles[v as usize].push(t as u32);
            }
        }
        Self {
            vertices: embedding.lifted().to_vec(),
            triangles: embedding.triangles().to_vec(),
            vertex_triangles,
            max_steps: Self::DEFAULT_MAX_STEPS,
        }
    }

    /// Override the warm-start step bound.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    fn closest_on(&self, t: usize, q: &LiftedPoint) -> (f64, [f64; 3]) {
        let [a, b, c] = self.triangles[t].map(|i| &self.vertices[i as usize]);
        let w = triangle_barycentric_closest(q, a, b, c);
        let p = a * w[0] + b * w[1] + c * w[2];
        ((q - p).norm_squared(), w)
    }

    fn foot_point(t: usize, w: [f64; 3]) -> FootPoint {
        FootPoint {
            triangle: t,
            barycentric: Vec3::new(w[0], w[1], w[2]),
        }
    }
}

impl FootPointSolver for LiftedSurfaceSolver {
    /// Greedy descent across vertex-adjacent triangles from `warm_start`.
    fn project(&mut self, lifted: &LiftedPoint, warm_start: usize) -> Result<FootPoint, SolverError> {
        if warm_start >= self.triangles.len() {
            return Err(SolverError::InvalidStart(warm_start));
        }

        let mut current = warm_start;
        let (mut best_d2, mut best_w) = self.closest_on(current, lifted);

        for _ in 0..self.max_steps {
            let mut next = current;
            for &v in &self.triangles[current] {
                for &n in &self.vertex_triangles[v as usize] {
                    let n = n as usize;
                    if n == current {
                        continue;
                    }
                    let (d2, w) = self.closest_on(n, lifted);
                    if d2 < best_d2 {
                        best_d2 = d2;
                        best_w = w;
                        next = n;
                    }
                }
            }
            if next == current {
                return Ok(Self::foot_point(current, best_w));
            }
            current = next;
        }

        Err(SolverError::NotConverged {
            steps: self.max_steps,
        })
    }

    fn project_brute_force(&mut self, lifted: &LiftedPoint) -> Result<FootPoint, SolverError> {
        (0..self.triangles.len())
            .map(|t| (t, self.closest_on(t, lifted)))
            .min_by(|a, b| a.1 .0.total_cmp(&b.1 .0))
            .map(|(t, (_, w))| Self::foot_point(t, w))
            .ok_or(SolverError::Empty)
    }
}
