//! Wavefront OBJ reader.
//!
//! Only geometry is read: `v` positions and `f` faces. Faces with more than
//! three corners are fan-triangulated. Texture coordinates, normals, groups
//! and materials are skipped.

use std::path::Path;

use log::info;
use mimic_math::Point3;

use crate::error::{MeshError, Result};
use crate::SurfaceMesh;

/// Read an OBJ file from a path.
pub fn read_obj(path: impl AsRef<Path>) -> Result<SurfaceMesh> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let mesh = parse_obj(&text)?;
    info!(
        "loaded {}: {} vertices, {} triangles",
        path.display(),
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

/// Parse OBJ text into a surface mesh.
pub fn parse_obj(text: &str) -> Result<SurfaceMesh> {
    let mut positions = Vec::new();
    let mut triangles = Vec::new();

    for (i, raw) in text.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.split('#').next().unwrap_or("").trim();
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("v") => {
                let mut coords = [0.0; 3];
                for c in coords.iter_mut() {
                    let token = tokens
                        .next()
                        .ok_or_else(|| MeshError::parse(line_no, "vertex needs three coordinates"))?;
                    *c = token.parse().map_err(|_| {
                        MeshError::parse(line_no, format!("invalid coordinate '{token}'"))
                    })?;
                }
                positions.push(Point3::new(coords[0], coords[1], coords[2]));
            }
            Some("f") => {
                let corners = tokens
                    .map(|t| resolve_index(t, positions.len(), line_no))
                    .collect::<Result<Vec<u32>>>()?;
                if corners.len() < 3 {
                    return Err(MeshError::parse(line_no, "face needs at least three corners"));
                }
                for k in 1..corners.len() - 1 {
                    triangles.push([corners[0], corners[k], corners[k + 1]]);
                }
            }
            _ => {}
        }
    }

    SurfaceMesh::new(positions, triangles)
}

/// Resolve a face corner token (`v`, `v/vt`, `v//vn`, `v/vt/vn`) to a
/// zero-based vertex index. Negative indices count back from the most
/// recent vertex.
fn resolve_index(token: &str, vertex_count: usize, line_no: usize) -> Result<u32> {
    let head = token.split('/').next().unwrap_or("");
    let raw: i64 = head
        .parse()
        .map_err(|_| MeshError::parse(line_no, format!("invalid face index '{token}'")))?;
    let resolved = match raw {
        0 => None,
        r if r > 0 => Some(r - 1),
        r => Some(vertex_count as i64 + r),
    };
    match resolved {
        Some(idx) if idx >= 0 && (idx as usize) < vertex_count => Ok(idx as u32),
        _ => Err(MeshError::parse(
            line_no,
            format!("face index {raw} out of range for {vertex_count} vertices"),
        )),
    }
}
