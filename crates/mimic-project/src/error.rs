//! Error types for projection and target loading.

use std::path::PathBuf;

use mimic_mesh::MeshError;
use mimic_tet::{LoadError, LocateError};
use thiserror::Error;

/// Failures of the foot-point solver.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// Warm-started descent did not settle.
    #[error("descent did not settle within {steps} steps")]
    NotConverged {
        /// Steps taken before giving up.
        steps: usize,
    },

    /// Warm-start triangle does not exist.
    #[error("warm-start triangle {0} out of range")]
    InvalidStart(usize),

    /// The solver returned a triangle the surface does not have.
    #[error("solver returned triangle {0}, which is out of range")]
    InvalidTriangle(usize),

    /// The solver has no triangles to project onto.
    #[error("no triangles to project onto")]
    Empty,
}

/// Reasons a smooth projection can fail.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SmoothError {
    /// The point is not between the offset surfaces.
    #[error("point outside the projection volume (outer winding {outer:.3}, inner winding {inner:?})")]
    OutsideVolume {
        /// Winding number with respect to the outer offset surface.
        outer: f64,
        /// Winding number with respect to the inner offset surface, if any.
        inner: Option<f64>,
    },

    /// The point passed containment but no tet holds it.
    #[error("point location failed: {0}")]
    PointNotLocated(#[from] LocateError),

    /// The foot-point solver failed.
    #[error("foot-point solver failed: {0}")]
    ProjectionFailure(#[from] SolverError),
}

/// Errors that can occur while setting up a target.
#[derive(Error, Debug)]
pub enum TargetError {
    /// The rendered surface could not be read.
    #[error("failed to load surface {}: {source}", path.display())]
    Surface {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: MeshError,
    },

    /// An offset surface could not be read.
    #[error("failed to load offset surface {}: {source}", path.display())]
    OffsetSurface {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: MeshError,
    },

    /// A tet mesh or embedding file could not be read.
    #[error("failed to load {}: {source}", path.display())]
    Volume {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: LoadError,
    },

    /// The embedding does not match the rendered surface.
    #[error("embedding has {embedding} triangles but the surface has {surface}")]
    EmbeddingMismatch {
        /// Triangles in the embedding.
        embedding: usize,
        /// Triangles in the rendered surface.
        surface: usize,
    },

    /// The local-to-world transform cannot be inverted.
    #[error("target transform is singular")]
    SingularTransform,
}
