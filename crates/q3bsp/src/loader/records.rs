//! On-disk record layouts of the IBSP v46 format.
//!
//! All integers and floats are little-endian. Records are `repr(C)` with only
//! 4-byte fields (or byte arrays), so they have no padding and decode with
//! `bytemuck::pod_read_unaligned` straight from the file buffer.

use bytemuck::{Pod, Zeroable};

use crate::constants::NUM_LUMPS;

/// Directory slot of each lump, in file order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lump {
  Entities = 0,
  Textures = 1,
  Planes = 2,
  Nodes = 3,
  Leaves = 4,
  LeafFaces = 5,
  LeafBrushes = 6,
  Models = 7,
  Brushes = 8,
  BrushSides = 9,
  Vertices = 10,
  MeshVertices = 11,
  Effects = 12,
  Faces = 13,
  Lightmaps = 14,
  LightVolumes = 15,
  VisData = 16,
}

impl Lump {
  #[inline]
  pub fn index(self) -> usize {
    self as usize
  }

  pub fn name(self) -> &'static str {
    match self {
      Lump::Entities => "entities",
      Lump::Textures => "textures",
      Lump::Planes => "planes",
      Lump::Nodes => "nodes",
      Lump::Leaves => "leaves",
      Lump::LeafFaces => "leaf faces",
      Lump::LeafBrushes => "leaf brushes",
      Lump::Models => "models",
      Lump::Brushes => "brushes",
      Lump::BrushSides => "brush sides",
      Lump::Vertices => "vertices",
      Lump::MeshVertices => "mesh vertices",
      Lump::Effects => "effects",
      Lump::Faces => "faces",
      Lump::Lightmaps => "lightmaps",
      Lump::LightVolumes => "light volumes",
      Lump::VisData => "vis data",
    }
  }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct RawLumpEntry {
  pub offset: i32,
  pub length: i32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct RawHeader {
  pub magic: [u8; 4],
  pub version: i32,
  pub lumps: [RawLumpEntry; NUM_LUMPS],
}

/// Fixed-size record stored in one lump.
pub trait Record: Pod {
  const LUMP: Lump;
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct RawTexture {
  pub name: [u8; 64],
  pub flags: i32,
  pub contents: i32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct RawPlane {
  pub normal: [f32; 3],
  pub dist: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct RawNode {
  pub plane: i32,
  /// Front, back. Negative values are `!leaf`.
  pub children: [i32; 2],
  pub mins: [i32; 3],
  pub maxs: [i32; 3],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct RawLeaf {
  pub cluster: i32,
  pub area: i32,
  pub mins: [i32; 3],
  pub maxs: [i32; 3],
  pub leaf_face: i32,
  pub n_leaf_faces: i32,
  pub leaf_brush: i32,
  pub n_leaf_brushes: i32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct RawVertex {
  pub position: [f32; 3],
  /// Surface coordinate, then lightmap coordinate.
  pub tex_coord: [[f32; 2]; 2],
  pub normal: [f32; 3],
  pub color: [u8; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct RawFace {
  pub texture: i32,
  pub effect: i32,
  pub kind: i32,
  pub vertex: i32,
  pub n_vertices: i32,
  pub mesh_vertex: i32,
  pub n_mesh_vertices: i32,
  pub lm_index: i32,
  pub lm_start: [i32; 2],
  pub lm_size: [i32; 2],
  pub lm_origin: [f32; 3],
  pub lm_vecs: [[f32; 3]; 2],
  pub normal: [f32; 3],
  pub size: [i32; 2],
}

/// Leaf-face and mesh-vertex lumps are bare `i32` arrays.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct RawIndex(pub i32);

impl Record for RawTexture {
  const LUMP: Lump = Lump::Textures;
}

impl Record for RawPlane {
  const LUMP: Lump = Lump::Planes;
}

impl Record for RawNode {
  const LUMP: Lump = Lump::Nodes;
}

impl Record for RawLeaf {
  const LUMP: Lump = Lump::Leaves;
}

impl Record for RawVertex {
  const LUMP: Lump = Lump::Vertices;
}

impl Record for RawFace {
  const LUMP: Lump = Lump::Faces;
}
