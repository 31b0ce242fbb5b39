//! Biquadratic curved-surface tessellation.
//!
//! A patch face stores a `width × height` grid of control points. The grid is
//! cut into overlapping 3×3 sub-patches that share their border rows and
//! columns:
//!
//! ```text
//!   width = 5, height = 3  →  2 × 1 sub-patches
//!
//!   c ─ c ─ c ─ c ─ c
//!   │ (0,0) │ (1,0) │      sub-patch (x, y) starts at
//!   c   c   c   c   c      y*2*width + x*2
//!   │       │       │
//!   c ─ c ─ c ─ c ─ c
//! ```
//!
//! Each sub-patch is sampled on an `(L+1) × (L+1)` grid using the quadratic
//! Bernstein basis, first across each control row in `u`, then across the
//! three row results in `v`:
//!
//! ```text
//! B0(t) = (1-t)²   B1(t) = 2t(1-t)   B2(t) = t²
//!
//! row_r(u) = Σk Bk(u) · cp[3r + k]
//! P(u, v)  = Σr Br(v) · row_r(u)
//! ```
//!
//! Sample `(i, j)` (row `i` along `v`, column `j` along `u`) lands at index
//! `i*(L+1) + j`.

use glam::{Vec2, Vec3, Vec4};

use crate::constants::{MAX_TESSELLATION_LEVEL, PATCH_CONTROL_POINTS};
use crate::error::{BspError, Result};
use crate::types::{Face, FaceKind, Vertex};

/// Quadratic Bernstein weights at `t`.
#[inline]
fn basis(t: f32) -> [f32; 3] {
  let s = 1.0 - t;
  [s * s, 2.0 * t * s, t * t]
}

/// Vertex attributes in float form while blending.
#[derive(Clone, Copy, Default)]
struct Sample {
  position: Vec3,
  tex_coord: Vec2,
  lightmap_coord: Vec2,
  normal: Vec3,
  color: Vec4,
}

impl Sample {
  fn from_vertex(v: &Vertex) -> Self {
    Self {
      position: v.position,
      tex_coord: v.tex_coord,
      lightmap_coord: v.lightmap_coord,
      normal: v.normal,
      color: Vec4::new(
        v.color[0] as f32,
        v.color[1] as f32,
        v.color[2] as f32,
        v.color[3] as f32,
      ),
    }
  }

  fn blend(samples: [Sample; 3], weights: [f32; 3]) -> Self {
    let mut out = Sample::default();
    for (s, w) in samples.iter().zip(weights) {
      out.position += s.position * w;
      out.tex_coord += s.tex_coord * w;
      out.lightmap_coord += s.lightmap_coord * w;
      out.normal += s.normal * w;
      out.color += s.color * w;
    }
    out
  }

  fn into_vertex(self) -> Vertex {
    let color = self.color.round().clamp(Vec4::ZERO, Vec4::splat(255.0));
    Vertex {
      position: self.position,
      tex_coord: self.tex_coord,
      lightmap_coord: self.lightmap_coord,
      normal: self.normal.try_normalize().unwrap_or(self.normal),
      color: [color.x as u8, color.y as u8, color.z as u8, color.w as u8],
    }
  }
}

/// One 3×3 sub-patch and its generated geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct BiquadPatch {
  /// Row-major control points, copied out of the face's vertex span.
  pub control_points: [Vertex; 9],
  level: u32,
  vertices: Vec<Vertex>,
  indices: Vec<u32>,
  strip_indices: Vec<u32>,
}

impl BiquadPatch {
  /// An untessellated sub-patch.
  pub fn new(control_points: [Vertex; 9]) -> Self {
    Self {
      control_points,
      level: 0,
      vertices: Vec::new(),
      indices: Vec::new(),
      strip_indices: Vec::new(),
    }
  }

  /// Takes the first nine points of `points`.
  pub fn from_control_points(points: &[Vertex]) -> Result<Self> {
    let control_points: [Vertex; 9] = points
      .get(..PATCH_CONTROL_POINTS)
      .and_then(|head| head.try_into().ok())
      .ok_or(BspError::NotEnoughControlPoints {
        count: points.len(),
      })?;
    Ok(Self::new(control_points))
  }

  /// Evaluate the surface at `level` subdivisions per side, replacing any
  /// previous output. `level` must be in `1..=MAX_TESSELLATION_LEVEL`.
  pub fn tessellate(&mut self, level: u32) -> Result<()> {
    if level == 0 || level > MAX_TESSELLATION_LEVEL {
      return Err(BspError::InvalidTessellationLevel(level));
    }

    let l1 = level as usize + 1;
    let steps = level as f32;
    let cp = self.control_points.map(|v| Sample::from_vertex(&v));

    self.vertices.clear();
    self.vertices.reserve(l1 * l1);
    for i in 0..l1 {
      let wv = basis(i as f32 / steps);
      for j in 0..l1 {
        let wu = basis(j as f32 / steps);
        let rows = [0, 1, 2].map(|r| Sample::blend([cp[3 * r], cp[3 * r + 1], cp[3 * r + 2]], wu));
        self.vertices.push(Sample::blend(rows, wv).into_vertex());
      }
    }

    let l1 = l1 as u32;

    self.indices.clear();
    self.indices.reserve(6 * (level * level) as usize);
    for i in 0..level {
      for j in 0..level {
        let a = i * l1 + j;
        let b = a + 1;
        let c = a + l1;
        let d = c + 1;
        self.indices.extend_from_slice(&[a, c, b, b, c, d]);
      }
    }

    self.strip_indices.clear();
    self.strip_indices.reserve((level * 2 * l1) as usize);
    for i in 0..level {
      for j in 0..l1 {
        self.strip_indices.push((i + 1) * l1 + j);
        self.strip_indices.push(i * l1 + j);
      }
    }

    self.level = level;
    Ok(())
  }

  /// Level of the last tessellation, 0 before the first.
  pub fn level(&self) -> u32 {
    self.level
  }

  pub fn vertices(&self) -> &[Vertex] {
    &self.vertices
  }

  /// Triangle list, two triangles per grid cell.
  pub fn indices(&self) -> &[u32] {
    &self.indices
  }

  /// All row strips back to back.
  pub fn strip_indices(&self) -> &[u32] {
    &self.strip_indices
  }

  /// Indices per row strip.
  #[inline]
  pub fn triangles_per_row(&self) -> usize {
    2 * (self.level as usize + 1)
  }

  /// Number of row strips.
  #[inline]
  pub fn row_count(&self) -> usize {
    self.level as usize
  }

  /// Strip for one row of quads.
  pub fn row_strip(&self, row: usize) -> Option<&[u32]> {
    if row >= self.row_count() {
      return None;
    }
    let len = self.triangles_per_row();
    self.strip_indices.get(row * len..(row + 1) * len)
  }

  pub fn triangle_count(&self) -> usize {
    self.indices.len() / 3
  }
}

/// All sub-patches of one curved-surface face.
#[derive(Clone, Debug, PartialEq)]
pub struct Patch {
  /// Index of the source face.
  pub face: usize,
  pub texture: i32,
  pub lightmap: i32,
  pub width: usize,
  pub height: usize,
  pub quadratic_patches: Vec<BiquadPatch>,
}

impl Patch {
  /// Cut the face's control grid into sub-patches and tessellate each one.
  pub fn build(face_id: usize, face: &Face, vertices: &[Vertex], level: u32) -> Result<Self> {
    let [width, height] = face.patch_size;
    if width < 3 || height < 3 || width % 2 == 0 || height % 2 == 0 {
      return Err(BspError::InvalidPatchSize {
        face: face_id,
        width,
        height,
      });
    }
    if level == 0 || level > MAX_TESSELLATION_LEVEL {
      return Err(BspError::InvalidTessellationLevel(level));
    }

    let (w, h) = (width as usize, height as usize);
    let available = vertices.len().saturating_sub(face.first_vertex);
    if available < w * h {
      return Err(BspError::NotEnoughControlPoints { count: available });
    }
    let grid = &vertices[face.first_vertex..face.first_vertex + w * h];

    let (patches_x, patches_y) = ((w - 1) / 2, (h - 1) / 2);
    let mut quadratic_patches = Vec::with_capacity(patches_x * patches_y);

    for y in 0..patches_y {
      for x in 0..patches_x {
        let origin = y * 2 * w + x * 2;
        let mut control_points = [Vertex::default(); 9];
        for row in 0..3 {
          for col in 0..3 {
            control_points[row * 3 + col] = grid[origin + row * w + col];
          }
        }
        let mut patch = BiquadPatch::new(control_points);
        patch.tessellate(level)?;
        quadratic_patches.push(patch);
      }
    }

    Ok(Self {
      face: face_id,
      texture: face.texture,
      lightmap: face.lightmap,
      width: w,
      height: h,
      quadratic_patches,
    })
  }

  pub fn vertex_count(&self) -> usize {
    self.quadratic_patches.iter().map(|p| p.vertices().len()).sum()
  }

  pub fn triangle_count(&self) -> usize {
    self.quadratic_patches.iter().map(BiquadPatch::triangle_count).sum()
  }
}

/// Tessellate every patch face, in face order.
#[tracing::instrument(skip_all, name = "patch::tessellate_patches")]
pub fn tessellate_patches(faces: &[Face], vertices: &[Vertex], level: u32) -> Result<Vec<Patch>> {
  let patch_faces = faces
    .iter()
    .enumerate()
    .filter(|(_, face)| face.kind == FaceKind::Patch);

  #[cfg(feature = "parallel")]
  let patches: Result<Vec<Patch>> = {
    use rayon::prelude::*;
    patch_faces
      .collect::<Vec<_>>()
      .into_par_iter()
      .map(|(id, face)| Patch::build(id, face, vertices, level))
      .collect()
  };

  #[cfg(not(feature = "parallel"))]
  let patches: Result<Vec<Patch>> = patch_faces
    .map(|(id, face)| Patch::build(id, face, vertices, level))
    .collect();

  let patches = patches?;
  tracing::debug!(
    patches = patches.len(),
    sub_patches = patches.iter().map(|p| p.quadratic_patches.len()).sum::<usize>(),
    level,
    "tessellated patches"
  );
  Ok(patches)
}

#[cfg(test)]
#[path = "patch_test.rs"]
mod patch_test;
