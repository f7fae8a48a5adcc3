//! Error types for volume mesh loading and point location.

use thiserror::Error;

/// Errors that can occur while loading a tet mesh or surface embedding.
#[derive(Error, Debug)]
pub enum LoadError {
    /// I/O error reading a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A count header line is missing.
    #[error("missing {what} count header")]
    MissingHeader {
        /// Which count was expected.
        what: &'static str,
    },

    /// The file ends before the declared number of lines.
    #[error("file truncated: expected {expected} lines, found {found}")]
    Truncated {
        /// Lines required by the header counts.
        expected: usize,
        /// Lines present.
        found: usize,
    },

    /// Non-empty content after the declared sections.
    #[error("unexpected data after the declared sections at line {line}")]
    TrailingData {
        /// First offending line (1-indexed).
        line: usize,
    },

    /// A line could not be parsed.
    #[error("parse error at line {line}: {message}")]
    Parse {
        /// Line number (1-indexed).
        line: usize,
        /// Error message.
        message: String,
    },

    /// An element references a vertex that does not exist.
    #[error("{element} {index} references vertex {vertex}, but there are {count} vertices")]
    IndexOutOfRange {
        /// Kind of element ("tet" or "triangle").
        element: &'static str,
        /// Offending element.
        index: usize,
        /// Offending vertex index.
        vertex: usize,
        /// Number of vertices.
        count: usize,
    },

    /// Geometry that cannot be queried (no elements, flat tets).
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),
}

impl LoadError {
    /// Create a parse error.
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

/// Errors from point location.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocateError {
    /// No tet contains the point, even after the exhaustive search.
    #[error("point ({x}, {y}, {z}) is not inside any tet")]
    NotLocated {
        /// Query x.
        x: f64,
        /// Query y.
        y: f64,
        /// Query z.
        z: f64,
    },
}

/// Result type for loading operations.
pub type Result<T> = std::result::Result<T, LoadError>;
