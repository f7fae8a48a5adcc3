//! Shared fixtures for the controller and session tests.

use std::sync::Arc;

use mimic_math::{Aabb3, LiftedPoint, Point3, Tolerance, Vec3};
use mimic_mesh::{OffsetSurface, SurfaceMesh};
use mimic_project::{SmoothProjector, Target, TargetSettings};
use mimic_tet::{kuhn_grid, SurfaceEmbedding};

use crate::{DrawSettings, ProjectionMode};

fn lift(p: &Point3) -> LiftedPoint {
    let mut l = LiftedPoint::zeros();
    l.fixed_rows_mut::<3>(0).copy_from(&p.coords);
    l
}

/// Unit cube (half extent 1) at the origin, optionally with smooth data.
pub fn cube_target(smooth: bool) -> Target {
    let surface = SurfaceMesh::cube(Point3::origin(), 1.0);
    let smooth = smooth.then(|| {
        let bounds = Aabb3::new(Point3::new(-2.0, -2.0, -2.0), Point3::new(2.0, 2.0, 2.0));
        let tets = kuhn_grid(&bounds, 4, lift).unwrap();
        let embedding = SurfaceEmbedding::from_surface(&surface, lift);
        let outer = OffsetSurface::new(SurfaceMesh::cube(Point3::origin(), 2.0));
        SmoothProjector::new(
            outer,
            None,
            Arc::new(tets),
            Arc::new(embedding),
            Tolerance::DEFAULT,
        )
    });
    Target::from_geometry("cube", &surface, smooth)
}

/// Settings with the pen tip at the controller origin, spraying along +Z.
pub fn settings(mode: ProjectionMode) -> DrawSettings {
    DrawSettings {
        mode,
        pen_tip_offset: Vec3::zeros(),
        spray_direction: Vec3::z(),
        ..DrawSettings::new(TargetSettings::new("cube", "assets"))
    }
}
