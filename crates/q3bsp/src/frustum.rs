//! Six-plane view frustum and conservative box culling.
//!
//! Planes point into the frustum: a point `p` is inside plane `(n, d)` when
//! `dot(n, p) + d >= 0`. A box is rejected only when all eight of its
//! corners are strictly outside one and the same plane, so boxes that merely
//! straddle a frustum edge are kept.

use glam::{Mat4, Vec3, Vec4};

/// One clipping plane, normal pointing inward.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrustumPlane {
  pub normal: Vec3,
  pub d: f32,
}

impl FrustumPlane {
  pub fn new(normal: Vec3, d: f32) -> Self {
    Self { normal, d }
  }

  /// Normalized plane from packed `(a, b, c, d)` coefficients.
  ///
  /// Degenerate rows (zero normal) are kept unnormalized; they then accept
  /// or reject everything according to the sign of `d`.
  fn from_coefficients(v: Vec4) -> Self {
    let normal = v.truncate();
    let len = normal.length();
    if len > f32::EPSILON {
      Self::new(normal / len, v.w / len)
    } else {
      Self::new(normal, v.w)
    }
  }

  /// Signed distance; non-negative means inside.
  #[inline]
  pub fn distance(&self, point: Vec3) -> f32 {
    self.normal.dot(point) + self.d
  }
}

/// Index of each plane in [`Frustum::planes`].
pub mod plane {
  pub const NEAR: usize = 0;
  pub const FAR: usize = 1;
  pub const LEFT: usize = 2;
  pub const RIGHT: usize = 3;
  pub const TOP: usize = 4;
  pub const BOTTOM: usize = 5;
}

/// The camera frustum for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frustum {
  planes: [FrustumPlane; 6],
}

impl Default for Frustum {
  fn default() -> Self {
    Self::everything()
  }
}

impl Frustum {
  /// Planes in near, far, left, right, top, bottom order.
  pub fn from_planes(planes: [FrustumPlane; 6]) -> Self {
    Self { planes }
  }

  /// A frustum that accepts every box.
  pub fn everything() -> Self {
    Self {
      planes: [FrustumPlane::new(Vec3::ZERO, f32::INFINITY); 6],
    }
  }

  /// Gribb-Hartmann extraction for an OpenGL-style clip volume
  /// (`-w <= z <= w`).
  pub fn from_view_projection(view_projection: Mat4) -> Self {
    let m = view_projection;
    let (r0, r1, r2, r3) = (m.row(0), m.row(1), m.row(2), m.row(3));
    Self::from_rows(r3 + r2, r3 - r2, r3 + r0, r3 - r0, r3 - r1, r3 + r1)
  }

  /// Extraction for a zero-to-one depth range (`0 <= z <= w`), as produced
  /// by `Mat4::perspective_rh` and friends.
  pub fn from_view_projection_zero_to_one(view_projection: Mat4) -> Self {
    let m = view_projection;
    let (r0, r1, r2, r3) = (m.row(0), m.row(1), m.row(2), m.row(3));
    Self::from_rows(r2, r3 - r2, r3 + r0, r3 - r0, r3 - r1, r3 + r1)
  }

  fn from_rows(near: Vec4, far: Vec4, left: Vec4, right: Vec4, top: Vec4, bottom: Vec4) -> Self {
    Self {
      planes: [near, far, left, right, top, bottom].map(FrustumPlane::from_coefficients),
    }
  }

  pub fn planes(&self) -> &[FrustumPlane; 6] {
    &self.planes
  }

  /// Push every plane outward by `margin` (render units).
  pub fn expanded(&self, margin: f32) -> Self {
    Self {
      planes: self.planes.map(|p| FrustumPlane::new(p.normal, p.d + margin)),
    }
  }

  #[inline]
  pub fn point_in_frustum(&self, point: Vec3) -> bool {
    self.planes.iter().all(|plane| plane.distance(point) >= 0.0)
  }

  /// False only when all eight corners are outside a single plane.
  #[inline]
  pub fn box_in_frustum(&self, corners: &[Vec3; 8]) -> bool {
    !self
      .planes
      .iter()
      .any(|plane| corners.iter().all(|&corner| plane.distance(corner) < 0.0))
  }
}

#[cfg(test)]
#[path = "frustum_test.rs"]
mod frustum_test;
