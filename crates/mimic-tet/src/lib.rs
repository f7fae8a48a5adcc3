#![warn(missing_docs)]

//! Tetrahedral volume meshes for smooth surface projection.
//!
//! Holds the two stores read from the custom text formats, the tet mesh
//! (3D and lifted vertex coordinates, positively oriented tets) and the
//! lifted surface embedding, plus the tiered [`TetLocator`].

pub mod embedding;
pub mod error;
pub mod grid;
pub mod locate;
pub mod tet_mesh;
mod text;

pub use embedding::SurfaceEmbedding;
pub use error::{LoadError, LocateError, Result};
pub use grid::kuhn_grid;
pub use locate::{LocateStats, SearchTier, TetLocation, TetLocator};
pub use tet_mesh::TetMesh;
