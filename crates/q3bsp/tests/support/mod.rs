//! Synthetic maps shared by the integration tests and benches.
//!
//! ```text
//! grid_map(3):                 y
//!   ┌─────┬─────┬─────┐        ▲
//!   │  6  │  7  │  8  │        │
//!   ├─────┼─────┼─────┤        │
//!   │  3  │  4  │  5  │        │
//!   ├─────┼─────┼─────┤        │
//!   │  0  │  1  │  2  │        │
//!   └─────┴─────┴─────┘ ──► x
//! ```
//!
//! Leaf `i` is cell `(i % n, i / n)`, cluster `i`. Each cell owns one polygon
//! face, every fourth cell also owns a 3×3 patch, and each leaf lists the
//! polygon of its right-hand neighbour too, so faces are shared across
//! leaves. Cluster A sees cluster B when their cells touch (including
//! diagonals).

#![allow(dead_code)]

use glam::{Vec2, Vec3};
use q3bsp::{BspData, ChildRef, Face, FaceKind, Leaf, Node, Plane, Texture, VisData, Vertex};

/// Cell edge in file units.
pub const CELL: f32 = 256.0;

/// Faces owned by one cell: `(polygon, patch)`.
#[derive(Clone, Copy, Debug)]
pub struct CellFaces {
  pub polygon: usize,
  pub patch: Option<usize>,
}

pub fn cell_of(leaf: usize, cells: usize) -> (usize, usize) {
  (leaf % cells, leaf / cells)
}

/// Whether the PVS of [`grid_map`] marks `to` visible from `from`.
pub fn neighbours(from: usize, to: usize, cells: usize) -> bool {
  let (ax, ay) = cell_of(from, cells);
  let (bx, by) = cell_of(to, cells);
  ax.abs_diff(bx) <= 1 && ay.abs_diff(by) <= 1
}

/// Center of a cell in file units.
pub fn cell_center(leaf: usize, cells: usize) -> Vec3 {
  let (x, y) = cell_of(leaf, cells);
  Vec3::new((x as f32 + 0.5) * CELL, (y as f32 + 0.5) * CELL, 0.0)
}

fn split(
  x: (usize, usize),
  y: (usize, usize),
  cells: usize,
  planes: &mut Vec<Plane>,
  nodes: &mut Vec<Node>,
) -> ChildRef {
  let (x0, x1) = x;
  let (y0, y1) = y;
  if x1 - x0 == 1 && y1 - y0 == 1 {
    return ChildRef::Leaf(y0 * cells + x0);
  }

  let index = nodes.len();
  nodes.push(Node {
    plane: planes.len(),
    front: ChildRef::Leaf(0),
    back: ChildRef::Leaf(0),
    mins: [(x0 as f32 * CELL) as i32, (y0 as f32 * CELL) as i32, -CELL as i32],
    maxs: [(x1 as f32 * CELL) as i32, (y1 as f32 * CELL) as i32, CELL as i32],
  });

  let (front, back) = if x1 - x0 >= y1 - y0 {
    let mid = (x0 + x1) / 2;
    planes.push(Plane::new(Vec3::X, mid as f32 * CELL));
    (
      split((mid, x1), y, cells, planes, nodes),
      split((x0, mid), y, cells, planes, nodes),
    )
  } else {
    let mid = (y0 + y1) / 2;
    planes.push(Plane::new(Vec3::Y, mid as f32 * CELL));
    (
      split(x, (mid, y1), cells, planes, nodes),
      split(x, (y0, mid), cells, planes, nodes),
    )
  };
  nodes[index].front = front;
  nodes[index].back = back;
  ChildRef::Node(index)
}

fn polygon(first_vertex: usize) -> Face {
  Face {
    texture: 0,
    effect: -1,
    kind: FaceKind::Polygon,
    first_vertex,
    num_vertices: 3,
    first_mesh_vertex: 0,
    num_mesh_vertices: 3,
    lightmap: -1,
    normal: Vec3::Z,
    patch_size: [0, 0],
  }
}

fn patch(first_vertex: usize) -> Face {
  Face {
    texture: 0,
    effect: -1,
    kind: FaceKind::Patch,
    first_vertex,
    num_vertices: 9,
    first_mesh_vertex: 0,
    num_mesh_vertices: 0,
    lightmap: -1,
    normal: Vec3::ZERO,
    patch_size: [3, 3],
  }
}

/// `cells × cells` grid map plus the faces each cell owns.
pub fn grid_map_with_faces(cells: usize) -> (BspData, Vec<CellFaces>) {
  let count = cells * cells;
  let mut planes = Vec::new();
  let mut nodes = Vec::new();
  split((0, cells), (0, cells), cells, &mut planes, &mut nodes);

  let mut vertices = Vec::new();
  let mut faces = Vec::new();
  let mut owned = Vec::with_capacity(count);

  for leaf in 0..count {
    let origin = cell_center(leaf, cells);
    let polygon_id = faces.len();
    faces.push(polygon(vertices.len()));
    for corner in [Vec3::ZERO, Vec3::X * 16.0, Vec3::Y * 16.0] {
      vertices.push(Vertex::at(origin + corner));
    }

    let patch_id = (leaf % 4 == 0).then(|| {
      faces.push(patch(vertices.len()));
      for row in 0..3 {
        for col in 0..3 {
          let lift = if row == 1 && col == 1 { 32.0 } else { 0.0 };
          vertices.push(Vertex {
            position: origin + Vec3::new(col as f32 * 32.0, row as f32 * 32.0, lift),
            tex_coord: Vec2::new(col as f32 * 0.5, row as f32 * 0.5),
            normal: Vec3::Z,
            color: [255; 4],
            ..Default::default()
          });
        }
      }
      faces.len() - 1
    });

    owned.push(CellFaces {
      polygon: polygon_id,
      patch: patch_id,
    });
  }

  let mut leaves = Vec::with_capacity(count);
  let mut leaf_faces = Vec::new();
  for leaf in 0..count {
    let (x, y) = cell_of(leaf, cells);
    let first_face = leaf_faces.len();
    leaf_faces.push(owned[leaf].polygon as u32);
    if let Some(patch) = owned[leaf].patch {
      leaf_faces.push(patch as u32);
    }
    if x + 1 < cells {
      leaf_faces.push(owned[leaf + 1].polygon as u32);
    }

    leaves.push(Leaf {
      cluster: leaf as i32,
      area: 0,
      mins: [(x as f32 * CELL) as i32, (y as f32 * CELL) as i32, -CELL as i32],
      maxs: [((x + 1) as f32 * CELL) as i32, ((y + 1) as f32 * CELL) as i32, CELL as i32],
      first_face,
      num_faces: leaf_faces.len() - first_face,
    });
  }

  let mut vis = VisData::empty(count);
  for from in 0..count {
    for to in 0..count {
      if neighbours(from, to, cells) {
        vis.set_visible(from, to);
      }
    }
  }

  let data = BspData {
    entities: String::new(),
    textures: vec![Texture {
      name: "textures/grid/floor".to_string(),
      flags: 0,
      contents: 1,
    }],
    planes,
    nodes,
    leaves,
    leaf_faces,
    faces,
    vertices,
    mesh_vertices: vec![0, 1, 2],
    lightmaps: Vec::new(),
    vis: Some(vis),
  };
  (data, owned)
}

pub fn grid_map(cells: usize) -> BspData {
  grid_map_with_faces(cells).0
}

// ============================================================================
// IBSP writer
// ============================================================================

fn put_i32(out: &mut Vec<u8>, value: i32) {
  out.extend_from_slice(&value.to_le_bytes());
}

fn put_f32(out: &mut Vec<u8>, value: f32) {
  out.extend_from_slice(&value.to_le_bytes());
}

fn put_vec3(out: &mut Vec<u8>, value: Vec3) {
  for c in value.to_array() {
    put_f32(out, c);
  }
}

/// Serialize `data` as a little-endian IBSP v46 image.
pub fn encode(data: &BspData) -> Vec<u8> {
  let mut lumps: Vec<Vec<u8>> = vec![Vec::new(); 17];

  let mut entities = data.entities.as_bytes().to_vec();
  entities.push(0);
  lumps[0] = entities;

  for texture in &data.textures {
    let mut name = [0u8; 64];
    name[..texture.name.len()].copy_from_slice(texture.name.as_bytes());
    lumps[1].extend_from_slice(&name);
    put_i32(&mut lumps[1], texture.flags);
    put_i32(&mut lumps[1], texture.contents);
  }

  for plane in &data.planes {
    put_vec3(&mut lumps[2], plane.normal);
    put_f32(&mut lumps[2], plane.dist);
  }

  for node in &data.nodes {
    let out = &mut lumps[3];
    put_i32(out, node.plane as i32);
    put_i32(out, node.front.to_raw());
    put_i32(out, node.back.to_raw());
    for v in node.mins.iter().chain(&node.maxs) {
      put_i32(out, *v);
    }
  }

  for leaf in &data.leaves {
    let out = &mut lumps[4];
    put_i32(out, leaf.cluster);
    put_i32(out, leaf.area);
    for v in leaf.mins.iter().chain(&leaf.maxs) {
      put_i32(out, *v);
    }
    put_i32(out, leaf.first_face as i32);
    put_i32(out, leaf.num_faces as i32);
    put_i32(out, 0);
    put_i32(out, 0);
  }

  for &index in &data.leaf_faces {
    put_i32(&mut lumps[5], index as i32);
  }

  for vertex in &data.vertices {
    let out = &mut lumps[10];
    put_vec3(out, vertex.position);
    for c in vertex.tex_coord.to_array().into_iter().chain(vertex.lightmap_coord.to_array()) {
      put_f32(out, c);
    }
    put_vec3(out, vertex.normal);
    out.extend_from_slice(&vertex.color);
  }

  for &index in &data.mesh_vertices {
    put_i32(&mut lumps[11], index as i32);
  }

  for face in &data.faces {
    let out = &mut lumps[13];
    put_i32(out, face.texture);
    put_i32(out, face.effect);
    put_i32(out, face.kind as i32);
    put_i32(out, face.first_vertex as i32);
    put_i32(out, face.num_vertices as i32);
    put_i32(out, face.first_mesh_vertex as i32);
    put_i32(out, face.num_mesh_vertices as i32);
    put_i32(out, face.lightmap);
    // lm_start, lm_size
    for _ in 0..4 {
      put_i32(out, 0);
    }
    // lm_origin, lm_vecs
    for _ in 0..9 {
      put_f32(out, 0.0);
    }
    put_vec3(out, face.normal);
    put_i32(out, face.patch_size[0]);
    put_i32(out, face.patch_size[1]);
  }

  for lightmap in &data.lightmaps {
    lumps[14].extend_from_slice(&lightmap.texels);
  }

  if let Some(vis) = &data.vis {
    put_i32(&mut lumps[16], vis.num_clusters as i32);
    put_i32(&mut lumps[16], vis.bytes_per_cluster as i32);
    lumps[16].extend_from_slice(&vis.vecs);
  }

  let mut out = Vec::new();
  out.extend_from_slice(b"IBSP");
  put_i32(&mut out, 0x2E);
  let mut offset = 8 + 17 * 8;
  for lump in &lumps {
    put_i32(&mut out, offset as i32);
    put_i32(&mut out, lump.len() as i32);
    offset += lump.len();
  }
  for lump in &lumps {
    out.extend_from_slice(lump);
  }
  out
}
