//! Drawable targets: the geometry of one model and projection onto it.
//!
//! Mesh files are stored in the opposite handedness from the scene. A
//! target keeps the files' native geometry for the smooth path and a
//! mirrored copy for everything the scene sees; points cross between the
//! two with [`Handedness::flip_handedness`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};
use mimic_math::{Handedness, Point3, Ray, Tolerance, Transform};
use mimic_mesh::{read_obj, OffsetSurface, SurfaceHit, SurfaceMesh};
use mimic_tet::{LocateStats, SurfaceEmbedding, TetMesh};
use serde::{Deserialize, Serialize};

use crate::error::TargetError;
use crate::hit::{FallbackReason, HitResult, HitSource, PoseFrame};
use crate::smooth::{SmoothDiagnostics, SmoothProjector};
use crate::solver::SolverMode;
use crate::vanilla::VanillaProjector;

/// Where a target's files live and which optional parts to load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSettings {
    /// Base name shared by the target's files.
    pub name: String,
    /// Directory holding the files.
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,
    /// Also load `<name>_in.obj` and require queries to lie outside it.
    #[serde(default)]
    pub load_inner_offset: bool,
    /// Lowest barycentric weight accepted by the tet locator.
    #[serde(default = "default_barycentric_tolerance")]
    pub barycentric_tolerance: f64,
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("assets")
}

fn default_barycentric_tolerance() -> f64 {
    Tolerance::DEFAULT.barycentric
}

impl TargetSettings {
    /// Settings for `name` in `assets_dir` with default options.
    pub fn new(name: impl Into<String>, assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            assets_dir: assets_dir.into(),
            load_inner_offset: false,
            barycentric_tolerance: default_barycentric_tolerance(),
        }
    }

    fn file(&self, suffix: &str) -> PathBuf {
        self.assets_dir.join(format!("{}{}", self.name, suffix))
    }

    /// Rendered surface, `<name>.obj`.
    pub fn surface_path(&self) -> PathBuf {
        self.file(".obj")
    }

    /// Tet mesh, `<name>_tet.txt`.
    pub fn tet_path(&self) -> PathBuf {
        self.file("_tet.txt")
    }

    /// Lifted surface embedding, `<name>_tri.txt`.
    pub fn embedding_path(&self) -> PathBuf {
        self.file("_tri.txt")
    }

    /// Outer offset surface, `<name>_out.obj`.
    pub fn outer_offset_path(&self) -> PathBuf {
        self.file("_out.obj")
    }

    /// Inner offset surface, `<name>_in.obj`.
    pub fn inner_offset_path(&self) -> PathBuf {
        self.file("_in.obj")
    }

    /// Locator tolerance built from these settings.
    pub fn tolerance(&self) -> Tolerance {
        Tolerance {
            barycentric: self.barycentric_tolerance,
        }
    }
}

/// A drawable model and everything needed to project onto it.
///
/// Hits are reported in the target's local (scene-handed) frame; queries
/// arrive in world space.
#[derive(Debug)]
pub struct Target {
    name: String,
    local_to_world: Transform,
    world_to_local: Transform,
    vanilla: VanillaProjector,
    smooth: Option<SmoothProjector>,
}

impl Target {
    /// Load a target from its files.
    ///
    /// The rendered surface is required. Failing to load any smooth
    /// projection data only disables smooth projection for this target.
    pub fn load(settings: &TargetSettings) -> Result<Self, TargetError> {
        let path = settings.surface_path();
        let surface = read_obj(&path).map_err(|source| TargetError::Surface { path, source })?;

        let smooth = match load_smooth(settings, &surface) {
            Ok(smooth) => Some(smooth),
            Err(err) => {
                warn!("smooth projection disabled for {}: {}", settings.name, err);
                None
            }
        };

        let target = Self::from_geometry(&settings.name, &surface, smooth);
        info!(
            "target {} ready ({} triangles, smooth projection {})",
            target.name,
            target.surface().triangle_count(),
            if target.has_smooth() { "on" } else { "off" }
        );
        Ok(target)
    }

    /// Target from geometry already in memory.
    ///
    /// `surface` is in the native handedness, as read from file.
    pub fn from_geometry(
        name: impl Into<String>,
        surface: &SurfaceMesh,
        smooth: Option<SmoothProjector>,
    ) -> Self {
        Self {
            name: name.into(),
            local_to_world: Transform::identity(),
            world_to_local: Transform::identity(),
            vanilla: VanillaProjector::new(Arc::new(surface.mirrored())),
            smooth,
        }
    }

    /// Name of the target.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rendered surface in the local scene frame.
    pub fn surface(&self) -> &SurfaceMesh {
        self.vanilla.mesh()
    }

    /// Local-to-world transform.
    pub fn local_to_world(&self) -> &Transform {
        &self.local_to_world
    }

    /// World-to-local transform.
    pub fn world_to_local(&self) -> &Transform {
        &self.world_to_local
    }

    /// Place the target in the world.
    pub fn set_transform(&mut self, local_to_world: Transform) -> Result<(), TargetError> {
        let world_to_local = local_to_world
            .inverse()
            .ok_or(TargetError::SingularTransform)?;
        self.local_to_world = local_to_world;
        self.world_to_local = world_to_local;
        Ok(())
    }

    /// True if smooth projection data is loaded.
    pub fn has_smooth(&self) -> bool {
        self.smooth.is_some()
    }

    /// The smooth projector, if loaded.
    pub fn smooth(&self) -> Option<&SmoothProjector> {
        self.smooth.as_ref()
    }

    /// Change how the smooth projector calls its solver.
    pub fn set_solver_mode(&mut self, mode: SolverMode) {
        if let Some(smooth) = &mut self.smooth {
            smooth.set_mode(mode);
        }
    }

    /// Smooth projection counters, if smooth projection is loaded.
    pub fn smooth_diagnostics(&self) -> Option<&SmoothDiagnostics> {
        self.smooth.as_ref().map(|s| s.diagnostics())
    }

    /// Point location counters, if smooth projection is loaded.
    pub fn locate_stats(&self) -> Option<&LocateStats> {
        self.smooth.as_ref().map(|s| s.locator().stats())
    }

    /// World point to local.
    pub fn to_local(&self, p: &Point3) -> Point3 {
        self.world_to_local.apply_point(p)
    }

    /// Local point to world.
    pub fn to_world(&self, p: &Point3) -> Point3 {
        self.local_to_world.apply_point(p)
    }

    /// Nearest surface hit along a world-space ray.
    ///
    /// The only projection that can miss.
    pub fn raycast(&self, ray: &Ray, frame: &PoseFrame) -> HitResult {
        let local_ray = ray.transformed(&self.world_to_local);
        let frame = frame.to_local(&self.world_to_local);
        match self.vanilla.raycast(&local_ray) {
            Some(hit) => surface_hit(hit, frame, HitSource::Raycast),
            None => HitResult::miss(frame, HitSource::Raycast),
        }
    }

    /// Exact closest surface point to a world-space point.
    pub fn project_closest(&self, p: &Point3, frame: &PoseFrame) -> HitResult {
        self.closest_with_source(p, frame, HitSource::ClosestPoint)
    }

    /// Smooth projection of a world-space point.
    ///
    /// Without smooth data this is [`Target::project_closest`]. A failed
    /// smooth projection is replaced by the closest point, reported as
    /// successful with the failure recorded in [`HitResult::source`].
    pub fn project_smooth(&mut self, p: &Point3, frame: &PoseFrame) -> HitResult {
        let Some(smooth) = self.smooth.as_mut() else {
            return self.project_closest(p, frame);
        };

        let native = self.world_to_local.apply_point(p).flip_handedness();
        match smooth.project(&native) {
            Ok(projection) if projection.triangle < self.vanilla.mesh().triangle_count() => {
                let surface = self.vanilla.mesh();
                HitResult {
                    point: projection.point.flip_handedness(),
                    normal: surface.normal(projection.triangle),
                    triangle: Some(projection.triangle),
                    barycentric: projection.barycentric,
                    distance: projection.distance,
                    success: true,
                    frame: frame.to_local(&self.world_to_local),
                    source: HitSource::Smooth,
                }
            }
            Ok(projection) => {
                warn!(
                    "smooth projection on {} returned triangle {} of {}",
                    self.name,
                    projection.triangle,
                    self.vanilla.mesh().triangle_count()
                );
                let source = HitSource::Fallback(FallbackReason::ProjectionFailure);
                self.closest_with_source(p, frame, source)
            }
            Err(err) => self.closest_with_source(p, frame, HitSource::Fallback(err.reason())),
        }
    }

    fn closest_with_source(&self, p: &Point3, frame: &PoseFrame, source: HitSource) -> HitResult {
        let local = self.world_to_local.apply_point(p);
        let frame = frame.to_local(&self.world_to_local);
        match self.vanilla.closest(&local) {
            Some(hit) => surface_hit(hit, frame, source),
            None => HitResult::miss(frame, source),
        }
    }
}

fn surface_hit(hit: SurfaceHit, frame: PoseFrame, source: HitSource) -> HitResult {
    HitResult {
        point: hit.point,
        normal: hit.normal,
        triangle: Some(hit.triangle),
        barycentric: hit.barycentric,
        distance: hit.distance,
        success: true,
        frame,
        source,
    }
}

fn load_offset(path: PathBuf) -> Result<OffsetSurface, TargetError> {
    read_obj(&path)
        .map(OffsetSurface::new)
        .map_err(|source| TargetError::OffsetSurface { path, source })
}

fn load_volume<T>(
    path: PathBuf,
    load: impl FnOnce(&Path) -> mimic_tet::Result<T>,
) -> Result<T, TargetError> {
    load(&path).map_err(|source| TargetError::Volume { path, source })
}

fn load_smooth(
    settings: &TargetSettings,
    surface: &SurfaceMesh,
) -> Result<SmoothProjector, TargetError> {
    let outer = load_offset(settings.outer_offset_path())?;
    let inner = if settings.load_inner_offset {
        Some(load_offset(settings.inner_offset_path())?)
    } else {
        None
    };
    let tets = load_volume(settings.tet_path(), |p| TetMesh::load(p))?;
    let embedding = load_volume(settings.embedding_path(), |p| SurfaceEmbedding::load(p))?;
    if !embedding.pairs_with(surface) {
        return Err(TargetError::EmbeddingMismatch {
            embedding: embedding.triangle_count(),
            surface: surface.triangle_count(),
        });
    }

    Ok(SmoothProjector::new(
        outer,
        inner,
        Arc::new(tets),
        Arc::new(embedding),
        settings.tolerance(),
    ))
}
