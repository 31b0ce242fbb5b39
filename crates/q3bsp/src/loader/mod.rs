//! IBSP v46 decoding.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ header: "IBSP" | version 0x2E | 17 × (offset, length)
//! ├──────────────────────────────────────────────┤
//! │ lump 0  entities      text                   │
//! │ lump 1  textures      72-byte records        │
//! │ lump 2  planes        16                     │
//! │ lump 3  nodes         36                     │
//! │ lump 4  leaves        48                     │
//! │ lump 5  leaf faces    4                      │
//! │ lump 10 vertices      44                     │
//! │ lump 11 mesh vertices 4                      │
//! │ lump 13 faces         104                    │
//! │ lump 14 lightmaps     128×128×3              │
//! │ lump 16 vis data      n_vecs, sz_vecs, bits  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Brush, model, effect and light-volume lumps are bounds-checked but not
//! decoded. Records are read in host byte order, so decoding expects a
//! little-endian target.

mod records;

use std::path::Path;

use bytemuck::Pod;
use glam::{Vec2, Vec3};

pub use records::Lump;
use records::{
  RawFace, RawHeader, RawIndex, RawLeaf, RawNode, RawPlane, RawTexture, RawVertex, Record,
};

use crate::constants::{BSP_MAGIC, BSP_VERSION, HEADER_SIZE, LIGHTMAP_BYTES};
use crate::error::{BspError, Result};
use crate::lightmap::Lightmap;
use crate::pvs::VisData;
use crate::types::{BspData, ChildRef, Face, FaceKind, Leaf, Node, Plane, Texture, Vertex};

/// Read and decode a `.bsp` file.
pub fn load_file(path: impl AsRef<Path>) -> Result<BspData> {
  let path = path.as_ref();
  let bytes = std::fs::read(path)?;
  tracing::debug!(path = %path.display(), len = bytes.len(), "read map file");
  parse(&bytes)
}

/// Decode a complete IBSP image and validate its cross references.
#[tracing::instrument(skip_all, name = "loader::parse")]
pub fn parse(bytes: &[u8]) -> Result<BspData> {
  let header = read_header(bytes)?;
  let file = LumpReader { bytes, header };

  let entities = file.lump(Lump::Entities)?;
  let entities = String::from_utf8_lossy(entities)
    .trim_end_matches('\0')
    .to_string();

  let textures = file
    .records::<RawTexture>()?
    .into_iter()
    .map(decode_texture)
    .collect();

  let planes = file
    .records::<RawPlane>()?
    .into_iter()
    .map(|p| Plane::new(Vec3::from_array(p.normal), p.dist))
    .collect();

  let nodes = file
    .records::<RawNode>()?
    .into_iter()
    .map(decode_node)
    .collect::<Result<Vec<_>>>()?;

  let leaves = file
    .records::<RawLeaf>()?
    .into_iter()
    .map(decode_leaf)
    .collect::<Result<Vec<_>>>()?;

  let leaf_faces = decode_indices(file.lump_records::<RawIndex>(Lump::LeafFaces)?, "leaf face")?;

  let vertices = file
    .records::<RawVertex>()?
    .into_iter()
    .map(decode_vertex)
    .collect();

  let mesh_vertices =
    decode_indices(file.lump_records::<RawIndex>(Lump::MeshVertices)?, "mesh vertex")?;

  let faces = file
    .records::<RawFace>()?
    .into_iter()
    .enumerate()
    .map(|(id, raw)| decode_face(id, raw))
    .collect::<Result<Vec<_>>>()?;

  let lightmap_bytes = file.lump(Lump::Lightmaps)?;
  check_multiple(Lump::Lightmaps, lightmap_bytes.len(), LIGHTMAP_BYTES)?;
  let lightmaps = lightmap_bytes
    .chunks_exact(LIGHTMAP_BYTES)
    .map(|page| Lightmap::from_texels(page.to_vec()))
    .collect();

  let vis = decode_vis(file.lump(Lump::VisData)?)?;
  if vis.is_none() {
    tracing::warn!("map has no vis data, every cluster will be drawn");
  }

  // Undecoded lumps still have to lie inside the file.
  for lump in [
    Lump::LeafBrushes,
    Lump::Models,
    Lump::Brushes,
    Lump::BrushSides,
    Lump::Effects,
    Lump::LightVolumes,
  ] {
    file.lump(lump)?;
  }

  let data = BspData {
    entities,
    textures,
    planes,
    nodes,
    leaves,
    leaf_faces,
    faces,
    vertices,
    mesh_vertices,
    lightmaps,
    vis,
  };

  tracing::debug!(
    planes = data.planes.len(),
    nodes = data.nodes.len(),
    leaves = data.leaves.len(),
    faces = data.faces.len(),
    vertices = data.vertices.len(),
    lightmaps = data.lightmaps.len(),
    patches = data.patch_count(),
    "decoded lumps"
  );

  data.validate()?;
  Ok(data)
}

fn read_header(bytes: &[u8]) -> Result<RawHeader> {
  let head = bytes.get(..HEADER_SIZE).ok_or(BspError::Truncated {
    needed: HEADER_SIZE,
    len: bytes.len(),
  })?;
  let header: RawHeader = bytemuck::pod_read_unaligned(head);

  if header.magic != BSP_MAGIC {
    return Err(BspError::BadMagic(header.magic));
  }
  if header.version != BSP_VERSION {
    return Err(BspError::UnsupportedVersion {
      found: header.version,
      expected: BSP_VERSION,
    });
  }
  Ok(header)
}

struct LumpReader<'a> {
  bytes: &'a [u8],
  header: RawHeader,
}

impl<'a> LumpReader<'a> {
  fn lump(&self, lump: Lump) -> Result<&'a [u8]> {
    let entry = self.header.lumps[lump.index()];
    let (offset, length) = (entry.offset, entry.length);
    let out_of_bounds = || BspError::LumpOutOfBounds {
      lump: lump.name(),
      offset,
      length,
      file_len: self.bytes.len(),
    };

    let start = usize::try_from(offset).map_err(|_| out_of_bounds())?;
    let len = usize::try_from(length).map_err(|_| out_of_bounds())?;
    let end = start.checked_add(len).ok_or_else(out_of_bounds)?;
    self.bytes.get(start..end).ok_or_else(out_of_bounds)
  }

  fn lump_records<T: Pod>(&self, lump: Lump) -> Result<Vec<T>> {
    let bytes = self.lump(lump)?;
    let size = std::mem::size_of::<T>();
    check_multiple(lump, bytes.len(), size)?;
    Ok(
      bytes
        .chunks_exact(size)
        .map(bytemuck::pod_read_unaligned)
        .collect(),
    )
  }

  fn records<T: Record>(&self) -> Result<Vec<T>> {
    self.lump_records(T::LUMP)
  }
}

fn check_multiple(lump: Lump, length: usize, record_size: usize) -> Result<()> {
  if length % record_size != 0 {
    return Err(BspError::MisalignedLump {
      lump: lump.name(),
      length,
      record_size,
    });
  }
  Ok(())
}

fn to_index(kind: &'static str, raw: i32) -> Result<usize> {
  usize::try_from(raw).map_err(|_| BspError::InvalidReference {
    kind,
    index: raw as i64,
    len: 0,
  })
}

fn decode_indices(raw: Vec<RawIndex>, kind: &'static str) -> Result<Vec<u32>> {
  raw
    .into_iter()
    .map(|RawIndex(i)| u32::try_from(i).map_err(|_| BspError::InvalidReference {
      kind,
      index: i as i64,
      len: 0,
    }))
    .collect()
}

fn decode_texture(raw: RawTexture) -> Texture {
  let end = raw.name.iter().position(|&b| b == 0).unwrap_or(raw.name.len());
  Texture {
    name: String::from_utf8_lossy(&raw.name[..end]).into_owned(),
    flags: raw.flags,
    contents: raw.contents,
  }
}

fn decode_node(raw: RawNode) -> Result<Node> {
  Ok(Node {
    plane: to_index("node plane", raw.plane)?,
    front: ChildRef::from_raw(raw.children[0]),
    back: ChildRef::from_raw(raw.children[1]),
    mins: raw.mins,
    maxs: raw.maxs,
  })
}

fn decode_leaf(raw: RawLeaf) -> Result<Leaf> {
  Ok(Leaf {
    cluster: raw.cluster,
    area: raw.area,
    mins: raw.mins,
    maxs: raw.maxs,
    first_face: to_index("leaf faces", raw.leaf_face)?,
    num_faces: to_index("leaf faces", raw.n_leaf_faces)?,
  })
}

fn decode_vertex(raw: RawVertex) -> Vertex {
  Vertex {
    position: Vec3::from_array(raw.position),
    tex_coord: Vec2::from_array(raw.tex_coord[0]),
    lightmap_coord: Vec2::from_array(raw.tex_coord[1]),
    normal: Vec3::from_array(raw.normal),
    color: raw.color,
  }
}

fn decode_face(id: usize, raw: RawFace) -> Result<Face> {
  let kind = FaceKind::from_raw(raw.kind).ok_or(BspError::UnknownFaceKind {
    face: id,
    raw: raw.kind,
  })?;
  Ok(Face {
    texture: raw.texture,
    effect: raw.effect,
    kind,
    first_vertex: to_index("face vertices", raw.vertex)?,
    num_vertices: to_index("face vertices", raw.n_vertices)?,
    first_mesh_vertex: to_index("face mesh vertices", raw.mesh_vertex)?,
    num_mesh_vertices: to_index("face mesh vertices", raw.n_mesh_vertices)?,
    lightmap: raw.lm_index,
    normal: Vec3::from_array(raw.normal),
    patch_size: raw.size,
  })
}

/// An empty lump means the map was compiled without vis.
fn decode_vis(bytes: &[u8]) -> Result<Option<VisData>> {
  if bytes.is_empty() {
    return Ok(None);
  }
  let head = bytes.get(..8).ok_or(BspError::Truncated {
    needed: 8,
    len: bytes.len(),
  })?;
  let n_vecs = i32::from_le_bytes([head[0], head[1], head[2], head[3]]);
  let sz_vecs = i32::from_le_bytes([head[4], head[5], head[6], head[7]]);

  let num_clusters = to_index("vis cluster count", n_vecs)?;
  let bytes_per_cluster = to_index("vis row length", sz_vecs)?;

  VisData::new(num_clusters, bytes_per_cluster, bytes[8..].to_vec()).map(Some)
}
