//! Per-frame visible face resolution.
//!
//! ```text
//! camera position ──► × world_scale ──► BspTree::find_leaf ──► camera cluster
//!                                                                   │
//! for each leaf (load order):                                       ▼
//!   ├─ PVS:      cluster_visible(camera, leaf.cluster) ?  ──── no ──► skip
//!   ├─ frustum:  box_in_frustum(leaf.corners) ?           ──── no ──► skip
//!   └─ faces:    leaf_faces[range] ──► VisibleFaceSet::insert (dedup)
//! ```
//!
//! Both tests can be switched off independently; each switch only widens the
//! admitted set.

use glam::Vec3;

use crate::bounds::Aabb;
use crate::frustum::Frustum;
use crate::pvs::{cluster_visible, VisData};
use crate::tree::BspTree;
use crate::types::{Face, FaceKind, Leaf};

/// Leaf with its bounds converted to render units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderLeaf {
  pub cluster: i32,
  pub bounds: Aabb,
  /// `bounds.corners()`, cached for the frustum test.
  pub corners: [Vec3; 8],
  pub first_face: usize,
  pub num_faces: usize,
}

impl RenderLeaf {
  pub fn from_leaf(leaf: &Leaf, world_scale: f32) -> Self {
    let bounds = Aabb::from_leaf_bounds(leaf.mins, leaf.maxs, world_scale);
    Self {
      cluster: leaf.cluster,
      bounds,
      corners: bounds.corners(),
      first_face: leaf.first_face,
      num_faces: leaf.num_faces,
    }
  }

  #[inline]
  pub fn face_range(&self) -> std::ops::Range<usize> {
    self.first_face..self.first_face + self.num_faces
  }
}

/// Ordered, duplicate-free list of face ids.
///
/// Membership is tracked in a bitmap sized to the face array, so inserts are
/// O(1) and clearing only touches the faces admitted last frame.
#[derive(Clone, Debug, Default)]
pub struct VisibleFaceSet {
  faces: Vec<usize>,
  visited: Vec<bool>,
}

impl VisibleFaceSet {
  pub fn new(face_count: usize) -> Self {
    Self {
      faces: Vec::new(),
      visited: vec![false; face_count],
    }
  }

  /// Empty the set, keeping its allocations.
  pub fn clear(&mut self) {
    for &face in &self.faces {
      self.visited[face] = false;
    }
    self.faces.clear();
  }

  /// Empty the set and resize the bitmap for a new face array.
  pub fn reset(&mut self, face_count: usize) {
    self.faces.clear();
    self.visited.clear();
    self.visited.resize(face_count, false);
  }

  /// Append `face` unless it is already present or out of range. Returns
  /// whether it was added.
  #[inline]
  pub fn insert(&mut self, face: usize) -> bool {
    match self.visited.get_mut(face) {
      Some(seen) if !*seen => {
        *seen = true;
        self.faces.push(face);
        true
      }
      _ => false,
    }
  }

  #[inline]
  pub fn contains(&self, face: usize) -> bool {
    self.visited.get(face).copied().unwrap_or(false)
  }

  pub fn as_slice(&self) -> &[usize] {
    &self.faces
  }

  pub fn len(&self) -> usize {
    self.faces.len()
  }

  pub fn is_empty(&self) -> bool {
    self.faces.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
    self.faces.iter().copied()
  }
}

/// Everything one visibility pass reads.
#[derive(Clone, Copy, Debug)]
pub struct VisibilityInput<'a> {
  pub tree: BspTree<'a>,
  pub leaves: &'a [RenderLeaf],
  pub leaf_faces: &'a [u32],
  pub faces: &'a [Face],
  pub vis: Option<&'a VisData>,
  pub frustum: &'a Frustum,
  pub world_scale: f32,
  pub skip_pvs: bool,
  pub skip_frustum: bool,
}

/// Counters from one pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VisibilityStats {
  pub camera_leaf: Option<usize>,
  /// `-1` when the camera is outside every cluster.
  pub camera_cluster: i32,
  pub leaves_tested: usize,
  pub leaves_culled_pvs: usize,
  pub leaves_culled_frustum: usize,
  /// Leaf-face entries walked, duplicates included.
  pub faces_considered: usize,
  pub visible_faces: usize,
  pub visible_patches: usize,
}

/// Rebuild `out` with the faces visible from `camera_position` (render
/// units).
#[tracing::instrument(skip_all, name = "visibility::resolve")]
pub fn resolve(
  input: &VisibilityInput<'_>,
  camera_position: Vec3,
  out: &mut VisibleFaceSet,
) -> VisibilityStats {
  out.clear();
  if out.visited.len() != input.faces.len() {
    out.reset(input.faces.len());
  }

  let camera_leaf = input.tree.find_leaf(camera_position * input.world_scale);
  let camera_cluster = camera_leaf
    .and_then(|leaf| input.leaves.get(leaf))
    .map_or(-1, |leaf| leaf.cluster);
  if camera_leaf.is_none() {
    tracing::debug!(?camera_position, "camera leaf not found, PVS disabled");
  }

  let mut stats = VisibilityStats {
    camera_leaf,
    camera_cluster,
    ..Default::default()
  };

  for leaf in input.leaves {
    stats.leaves_tested += 1;

    if !input.skip_pvs && !cluster_visible(input.vis, camera_cluster, leaf.cluster) {
      stats.leaves_culled_pvs += 1;
      continue;
    }
    if !input.skip_frustum && !input.frustum.box_in_frustum(&leaf.corners) {
      stats.leaves_culled_frustum += 1;
      continue;
    }

    let Some(entries) = input.leaf_faces.get(leaf.face_range()) else {
      continue;
    };
    for &face in entries {
      stats.faces_considered += 1;
      let face = face as usize;
      if face < input.faces.len() && out.insert(face) && input.faces[face].kind == FaceKind::Patch {
        stats.visible_patches += 1;
      }
    }
  }

  stats.visible_faces = out.len();
  stats
}

#[cfg(test)]
#[path = "visibility_test.rs"]
mod visibility_test;
