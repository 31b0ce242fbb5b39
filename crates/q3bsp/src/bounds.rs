//! Axis-aligned boxes in render units.

use glam::Vec3;

/// Single-precision axis-aligned bounding box.
///
/// Leaf bounds are stored as integers in file units; [`Aabb::from_leaf_bounds`]
/// converts them once at init so the per-frame frustum test works on floats.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
  /// Minimum corner (inclusive).
  pub min: Vec3,
  /// Maximum corner (inclusive).
  pub max: Vec3,
}

impl Aabb {
  pub fn new(min: Vec3, max: Vec3) -> Self {
    debug_assert!(
      min.cmple(max).all(),
      "AABB min must be <= max on all axes"
    );
    Self { min, max }
  }

  /// Integer file-unit bounds divided by `world_scale`.
  ///
  /// Compilers occasionally write swapped min/max pairs, so each axis is
  /// reordered instead of trusted.
  pub fn from_leaf_bounds(mins: [i32; 3], maxs: [i32; 3], world_scale: f32) -> Self {
    let a = Vec3::new(mins[0] as f32, mins[1] as f32, mins[2] as f32) / world_scale;
    let b = Vec3::new(maxs[0] as f32, maxs[1] as f32, maxs[2] as f32) / world_scale;
    Self {
      min: a.min(b),
      max: a.max(b),
    }
  }

  /// The eight corners, X varying slowest, then Y, then Z.
  ///
  /// ```text
  /// 0: (min.x, min.y, min.z)   4: (max.x, min.y, min.z)
  /// 1: (min.x, min.y, max.z)   5: (max.x, min.y, max.z)
  /// 2: (min.x, max.y, min.z)   6: (max.x, max.y, min.z)
  /// 3: (min.x, max.y, max.z)   7: (max.x, max.y, max.z)
  /// ```
  pub fn corners(&self) -> [Vec3; 8] {
    let (lo, hi) = (self.min, self.max);
    [
      Vec3::new(lo.x, lo.y, lo.z),
      Vec3::new(lo.x, lo.y, hi.z),
      Vec3::new(lo.x, hi.y, lo.z),
      Vec3::new(lo.x, hi.y, hi.z),
      Vec3::new(hi.x, lo.y, lo.z),
      Vec3::new(hi.x, lo.y, hi.z),
      Vec3::new(hi.x, hi.y, lo.z),
      Vec3::new(hi.x, hi.y, hi.z),
    ]
  }

  #[inline]
  pub fn contains_point(&self, point: Vec3) -> bool {
    point.cmpge(self.min).all() && point.cmple(self.max).all()
  }

  #[inline]
  pub fn size(&self) -> Vec3 {
    self.max - self.min
  }

  #[inline]
  pub fn center(&self) -> Vec3 {
    (self.min + self.max) * 0.5
  }

  /// Grow to include `point`.
  pub fn encapsulate(&mut self, point: Vec3) {
    self.min = self.min.min(point);
    self.max = self.max.max(point);
  }
}
