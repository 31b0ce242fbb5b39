//! MapConfig - load-time settings and runtime render switches.

use crate::constants::{LIGHTMAP_GAMMA, MAX_TESSELLATION_LEVEL, TESSELLATION_LEVEL, WORLD_SCALE};
use crate::error::{BspError, Result};

bitflags::bitflags! {
  /// Render and debug switches.
  ///
  /// Only `SKIP_PVS` and `SKIP_FC` change what the core computes; the rest
  /// are carried for the draw stage.
  #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
  pub struct RenderFlags: u32 {
    const SHOW_WIREFRAME   = 1 << 0;
    const SHOW_LIGHTMAPS   = 1 << 1;
    const USE_LIGHTMAPS    = 1 << 2;
    const ALPHA_TEST       = 1 << 3;
    const SKIP_MISSING_TEX = 1 << 4;
    /// Admit every leaf regardless of cluster visibility.
    const SKIP_PVS         = 1 << 5;
    /// Admit every leaf regardless of the view frustum.
    const SKIP_FC          = 1 << 6;
  }
}

impl Default for RenderFlags {
  fn default() -> Self {
    RenderFlags::USE_LIGHTMAPS
  }
}

/// How stereo rendering drives the visibility pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VisibilityPolicy {
  /// One pass per frame, reused by both eyes.
  #[default]
  Shared,
  /// One pass per eye with that eye's position and frustum.
  PerEye,
}

/// Stereo eye selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Eye {
  Left,
  Right,
}

/// Settings fixed when a map is built.
#[derive(Clone, Debug, PartialEq)]
pub struct MapConfig {
  /// File units per render unit.
  pub world_scale: f32,

  /// Subdivisions per side of every biquadratic sub-patch.
  pub tessellation_level: u32,

  /// Lightmap gamma applied once at init. `None` keeps the raw bytes.
  pub lightmap_gamma: Option<f32>,

  pub visibility_policy: VisibilityPolicy,

  /// Render flags in effect right after init.
  pub initial_flags: RenderFlags,
}

impl Default for MapConfig {
  fn default() -> Self {
    Self {
      world_scale: WORLD_SCALE,
      tessellation_level: TESSELLATION_LEVEL,
      lightmap_gamma: Some(LIGHTMAP_GAMMA),
      visibility_policy: VisibilityPolicy::default(),
      initial_flags: RenderFlags::default(),
    }
  }
}

impl MapConfig {
  pub fn with_world_scale(mut self, scale: f32) -> Self {
    self.world_scale = scale;
    self
  }

  pub fn with_tessellation_level(mut self, level: u32) -> Self {
    self.tessellation_level = level;
    self
  }

  pub fn with_lightmap_gamma(mut self, gamma: Option<f32>) -> Self {
    self.lightmap_gamma = gamma;
    self
  }

  pub fn with_visibility_policy(mut self, policy: VisibilityPolicy) -> Self {
    self.visibility_policy = policy;
    self
  }

  pub fn with_initial_flags(mut self, flags: RenderFlags) -> Self {
    self.initial_flags = flags;
    self
  }

  /// Reject values that would make init or the per-frame pass meaningless.
  pub fn validate(&self) -> Result<()> {
    if !self.world_scale.is_finite() || self.world_scale <= 0.0 {
      return Err(BspError::InvalidConfig(format!(
        "world_scale must be finite and positive, got {}",
        self.world_scale
      )));
    }
    if self.tessellation_level == 0 || self.tessellation_level > MAX_TESSELLATION_LEVEL {
      return Err(BspError::InvalidTessellationLevel(self.tessellation_level));
    }
    if let Some(gamma) = self.lightmap_gamma {
      if !gamma.is_finite() || gamma <= 0.0 {
        return Err(BspError::InvalidConfig(format!(
          "lightmap_gamma must be finite and positive, got {}",
          gamma
        )));
      }
    }
    Ok(())
  }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
