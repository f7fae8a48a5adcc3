//! Error types for surface mesh construction and loading.

use thiserror::Error;

/// Errors that can occur while building or reading a surface mesh.
#[derive(Error, Debug)]
pub enum MeshError {
    /// I/O error reading a mesh file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed line in a mesh file.
    #[error("parse error at line {line}: {message}")]
    Parse {
        /// Line number (1-indexed).
        line: usize,
        /// Error message.
        message: String,
    },

    /// A triangle references a vertex that does not exist.
    #[error("triangle {triangle} references vertex {index}, but the mesh has {count} vertices")]
    IndexOutOfRange {
        /// Offending triangle.
        triangle: usize,
        /// Offending vertex index.
        index: usize,
        /// Number of vertices in the mesh.
        count: usize,
    },

    /// Mesh has no triangles.
    #[error("mesh is empty")]
    EmptyMesh,
}

impl MeshError {
    /// Create a parse error.
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

/// Result type for mesh operations.
pub type Result<T> = std::result::Result<T, MeshError>;
