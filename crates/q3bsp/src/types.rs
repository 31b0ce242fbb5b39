//! Core data types for decoded BSP maps.
//!
//! Everything here is written once at load time and read-only afterwards.
//! Indices between arrays are plain `usize` offsets into the owning
//! [`BspData`] vectors; [`BspData::validate`] guarantees they are in range.

use std::ops::Range;

use glam::{Vec2, Vec3};

use crate::lightmap::Lightmap;
use crate::pvs::VisData;

/// Which side of a splitting plane a point lies on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaneSide {
  /// In front of or on the plane.
  Front,
  /// Strictly behind the plane.
  Back,
}

/// Splitting plane: `dot(normal, p) - dist` is the signed distance of `p`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
  /// Unit normal.
  pub normal: Vec3,
  /// Distance from the origin along `normal`.
  pub dist: f32,
}

impl Plane {
  pub fn new(normal: Vec3, dist: f32) -> Self {
    Self { normal, dist }
  }

  /// Signed distance of a point from the plane.
  #[inline]
  pub fn distance(&self, point: Vec3) -> f32 {
    self.normal.dot(point) - self.dist
  }

  /// Classify a point. Points on the plane count as front.
  #[inline]
  pub fn side(&self, point: Vec3) -> PlaneSide {
    if self.distance(point) >= 0.0 {
      PlaneSide::Front
    } else {
      PlaneSide::Back
    }
  }
}

/// Child reference of a tree node.
///
/// On disk this is a single `i32`: non-negative values index the node array,
/// negative values encode a leaf as `!leaf_index`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChildRef {
  Node(usize),
  Leaf(usize),
}

impl ChildRef {
  /// Decode the on-disk representation.
  #[inline]
  pub fn from_raw(raw: i32) -> Self {
    if raw >= 0 {
      ChildRef::Node(raw as usize)
    } else {
      ChildRef::Leaf(!raw as usize)
    }
  }

  /// Encode back to the on-disk representation.
  #[inline]
  pub fn to_raw(self) -> i32 {
    match self {
      ChildRef::Node(index) => index as i32,
      ChildRef::Leaf(index) => !(index as i32),
    }
  }
}

/// Internal tree node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Node {
  /// Index of the splitting plane.
  pub plane: usize,
  /// Subtree for points on the front side.
  pub front: ChildRef,
  /// Subtree for points behind the plane.
  pub back: ChildRef,
  /// Integer bounding box (file units).
  pub mins: [i32; 3],
  pub maxs: [i32; 3],
}

impl Node {
  /// Child to follow for a point on the given side.
  #[inline]
  pub fn child(&self, side: PlaneSide) -> ChildRef {
    match side {
      PlaneSide::Front => self.front,
      PlaneSide::Back => self.back,
    }
  }
}

/// Tree leaf: a convex region of space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Leaf {
  /// PVS row, or -1 when the leaf is outside the playable volume.
  pub cluster: i32,
  /// Area portal id (decoded, unused by the core).
  pub area: i32,
  /// Integer bounding box (file units).
  pub mins: [i32; 3],
  pub maxs: [i32; 3],
  /// First entry in `BspData::leaf_faces`.
  pub first_face: usize,
  /// Number of entries in `BspData::leaf_faces`.
  pub num_faces: usize,
}

impl Leaf {
  /// Range into the leaf-face index list.
  #[inline]
  pub fn face_range(&self) -> Range<usize> {
    self.first_face..self.first_face + self.num_faces
  }
}

/// Face kind tag as stored in the face lump.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum FaceKind {
  /// Convex polygon, drawn through its mesh-vertex list.
  Polygon = 1,
  /// Curved surface described by a control-point grid.
  Patch = 2,
  /// Triangle soup, drawn like a polygon.
  Mesh = 3,
  /// Sprite placeholder. Decoded but never drawn.
  Billboard = 4,
}

impl FaceKind {
  pub fn from_raw(raw: i32) -> Option<Self> {
    match raw {
      1 => Some(FaceKind::Polygon),
      2 => Some(FaceKind::Patch),
      3 => Some(FaceKind::Mesh),
      4 => Some(FaceKind::Billboard),
      _ => None,
    }
  }
}

/// Renderable surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Face {
  /// Texture index, or negative for none.
  pub texture: i32,
  /// Effect (fog volume) index, -1 for none.
  pub effect: i32,
  pub kind: FaceKind,
  /// First vertex in `BspData::vertices`.
  pub first_vertex: usize,
  pub num_vertices: usize,
  /// First entry in `BspData::mesh_vertices`.
  pub first_mesh_vertex: usize,
  pub num_mesh_vertices: usize,
  /// Lightmap index, negative when the face is unlit.
  pub lightmap: i32,
  /// Surface normal (planar faces only).
  pub normal: Vec3,
  /// Control-point grid dimensions (patches only).
  pub patch_size: [i32; 2],
}

impl Face {
  /// Range into the vertex array.
  #[inline]
  pub fn vertex_range(&self) -> Range<usize> {
    self.first_vertex..self.first_vertex + self.num_vertices
  }

  /// Range into the mesh-vertex (index offset) array.
  #[inline]
  pub fn mesh_vertex_range(&self) -> Range<usize> {
    self.first_mesh_vertex..self.first_mesh_vertex + self.num_mesh_vertices
  }

  /// Lightmap slot, `None` for unlit faces.
  #[inline]
  pub fn lightmap_index(&self) -> Option<usize> {
    usize::try_from(self.lightmap).ok()
  }
}

/// Map vertex with all attributes.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Vertex {
  /// Position in file units.
  pub position: Vec3,
  /// Surface texture coordinate.
  pub tex_coord: Vec2,
  /// Lightmap texture coordinate.
  pub lightmap_coord: Vec2,
  /// Vertex normal.
  pub normal: Vec3,
  /// RGBA vertex color.
  pub color: [u8; 4],
}

impl Vertex {
  /// Vertex with only a position set.
  pub fn at(position: Vec3) -> Self {
    Self {
      position,
      ..Self::default()
    }
  }
}

/// Texture reference from the texture lump.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Texture {
  /// Shader path without extension, e.g. `textures/base_wall/concrete`.
  pub name: String,
  pub flags: i32,
  pub contents: i32,
}

/// Decoded lump arrays of one map.
///
/// Produced by [`crate::loader::parse`] or assembled by any other loader.
#[derive(Clone, Debug, Default)]
pub struct BspData {
  /// Raw entity lump text.
  pub entities: String,
  pub textures: Vec<Texture>,
  pub planes: Vec<Plane>,
  pub nodes: Vec<Node>,
  pub leaves: Vec<Leaf>,
  /// Leaf → face indirection, indexed by `Leaf::face_range`.
  pub leaf_faces: Vec<u32>,
  pub faces: Vec<Face>,
  pub vertices: Vec<Vertex>,
  /// Per-face index offsets, relative to `Face::first_vertex`.
  pub mesh_vertices: Vec<u32>,
  pub lightmaps: Vec<Lightmap>,
  /// Potentially visible set; `None` when the map was compiled without vis.
  pub vis: Option<VisData>,
}

impl BspData {
  /// Number of curved-surface faces.
  pub fn patch_count(&self) -> usize {
    self
      .faces
      .iter()
      .filter(|face| face.kind == FaceKind::Patch)
      .count()
  }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
