//! Drawing settings, read from TOML.

use std::path::Path;

use log::info;
use mimic_math::Vec3;
use mimic_project::{SolverMode, TargetSettings};
use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// How each stroke point is found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectionMode {
    /// Raycast along the spray direction every frame.
    Spraypaint,
    /// Smooth projection of the anchored query point.
    #[default]
    AnchoredSmooth,
    /// Closest-point projection of the anchored query point.
    AnchoredClosest,
}

impl ProjectionMode {
    /// True for the two anchored modes.
    pub fn is_anchored(self) -> bool {
        !matches!(self, ProjectionMode::Spraypaint)
    }
}

/// Everything a drawing session is configured with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawSettings {
    /// Projection mode used for new strokes.
    #[serde(default)]
    pub mode: ProjectionMode,
    /// Pen tip in the controller's local frame.
    #[serde(default = "default_pen_tip_offset")]
    pub pen_tip_offset: Vec3,
    /// Spray direction in the controller's local frame.
    #[serde(default = "default_spray_direction")]
    pub spray_direction: Vec3,
    /// How the smooth projector calls its solver.
    #[serde(default)]
    pub solver: SolverMode,
    /// Target to draw on.
    pub target: TargetSettings,
}

fn default_pen_tip_offset() -> Vec3 {
    Vec3::new(0.0, -0.01, -0.02)
}

fn default_spray_direction() -> Vec3 {
    Vec3::z()
}

impl DrawSettings {
    /// Defaults for drawing on `target`.
    pub fn new(target: TargetSettings) -> Self {
        Self {
            mode: ProjectionMode::default(),
            pen_tip_offset: default_pen_tip_offset(),
            spray_direction: default_spray_direction(),
            solver: SolverMode::default(),
            target,
        }
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read, parse and validate a settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml_str(&text)?;
        info!("loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let invalid = |field, message: &str| SettingsError::Invalid {
            field,
            message: message.to_string(),
        };

        if !self.pen_tip_offset.iter().all(|v| v.is_finite()) {
            return Err(invalid("pen_tip_offset", "must be finite"));
        }
        if !self.spray_direction.iter().all(|v| v.is_finite())
            || self.spray_direction.norm_squared() < f64::EPSILON
        {
            return Err(invalid("spray_direction", "must be a finite non-zero vector"));
        }
        if self.target.name.trim().is_empty() {
            return Err(invalid("target.name", "must not be empty"));
        }
        let eps = self.target.barycentric_tolerance;
        if !(eps.is_finite() && eps <= 0.0 && eps > -1.0) {
            return Err(SettingsError::Invalid {
                field: "target.barycentric_tolerance",
                message: format!("{eps} is not in (-1, 0]"),
            });
        }
        Ok(())
    }
}
