#![warn(missing_docs)]

//! Projection of points and rays onto drawable targets.
//!
//! Two projections are offered. The vanilla one returns the exact closest
//! point of the triangle mesh. The smooth one locates the query in a tet
//! mesh, interpolates its lifted coordinates, and hands them to a
//! foot-point solver; its foot-points move continuously across triangle
//! edges. A failed smooth projection degrades to the vanilla one.

pub mod error;
pub mod hit;
pub mod smooth;
pub mod solver;
pub mod target;
pub mod vanilla;

pub use error::{SmoothError, SolverError, TargetError};
pub use hit::{FallbackReason, HitResult, HitSource, PoseFrame};
pub use smooth::{SmoothDiagnostics, SmoothProjection, SmoothProjector};
pub use solver::{FootPoint, FootPointSolver, LiftedSurfaceSolver, SolverHandle, SolverMode};
pub use target::{Target, TargetSettings};
pub use vanilla::VanillaProjector;
