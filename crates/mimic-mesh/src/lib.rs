#![warn(missing_docs)]

//! Triangle surface meshes for anchored surface projection.
//!
//! Provides the indexed [`SurfaceMesh`], an OBJ reader, a SAH bounding
//! volume hierarchy, the [`SurfaceIndex`] used for raycasts and exact
//! closest-point queries, and winding-number containment against closed
//! offset surfaces.

pub mod bvh;
pub mod error;
pub mod index;
pub mod obj;
pub mod surface;
pub mod winding;

pub use bvh::{Bvh, BvhNode};
pub use error::{MeshError, Result};
pub use index::{SurfaceHit, SurfaceIndex};
pub use obj::{parse_obj, read_obj};
pub use surface::SurfaceMesh;
pub use winding::{winding_number, OffsetSurface};
