//! Test fixtures: small synthetic maps with known geometry.
//!
//! ```text
//! two_leaf_data():
//!
//!           plane x = 0
//!                │
//!   leaf 1       │      leaf 0
//!   cluster 1    │      cluster 0
//!   x ∈ [-512,0] │      x ∈ [0,512]
//!   faces 2,3,4  │      faces 0,1,4
//!                │
//! face 3 is a 3×3 patch, face 4 is shared by both leaves.
//! ```

use glam::{Vec2, Vec3};

use crate::pvs::VisData;
use crate::types::{BspData, ChildRef, Face, FaceKind, Leaf, Node, Plane, Texture, Vertex};

/// PVS variants for [`two_leaf_data`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TwoLeafVis {
  /// No vis lump.
  Absent,
  /// Cluster 0 sees only itself, cluster 1 sees only itself.
  ZeroSeesOnlyZero,
  /// Every cluster sees every cluster.
  AllVisible,
}

/// Planar face spanning `count` vertices, drawn as one triangle fan index
/// list `[0, 1, 2]`.
pub fn polygon_face(first_vertex: usize, count: usize) -> Face {
  Face {
    texture: 0,
    effect: -1,
    kind: FaceKind::Polygon,
    first_vertex,
    num_vertices: count,
    first_mesh_vertex: 0,
    num_mesh_vertices: 3,
    lightmap: 0,
    normal: Vec3::Z,
    patch_size: [0, 0],
  }
}

/// Curved surface face with a `width × height` control grid.
pub fn patch_face(first_vertex: usize, width: i32, height: i32) -> Face {
  Face {
    texture: 0,
    effect: -1,
    kind: FaceKind::Patch,
    first_vertex,
    num_vertices: (width * height).max(0) as usize,
    first_mesh_vertex: 0,
    num_mesh_vertices: 0,
    lightmap: -1,
    normal: Vec3::ZERO,
    patch_size: [width, height],
  }
}

/// Flat control grid in the z = 0 plane, one unit between points.
pub fn flat_grid(width: usize, height: usize) -> Vec<Vertex> {
  let mut vertices = Vec::with_capacity(width * height);
  for row in 0..height {
    for col in 0..width {
      vertices.push(Vertex {
        position: Vec3::new(col as f32, row as f32, 0.0),
        tex_coord: Vec2::new(col as f32, row as f32),
        lightmap_coord: Vec2::new(col as f32 * 0.5, row as f32 * 0.5),
        normal: Vec3::Z,
        color: [255; 4],
      });
    }
  }
  vertices
}

/// Control points of a dome: flat corners, raised middle.
pub fn dome_control_points() -> [Vertex; 9] {
  let mut points = [Vertex::default(); 9];
  for row in 0..3 {
    for col in 0..3 {
      let height = if row == 1 && col == 1 { 4.0 } else { 0.0 };
      points[row * 3 + col] = Vertex {
        position: Vec3::new(col as f32, row as f32, height),
        tex_coord: Vec2::new(col as f32 * 0.5, row as f32 * 0.5),
        lightmap_coord: Vec2::new(col as f32 * 0.5, row as f32 * 0.5),
        normal: Vec3::Z,
        color: [255, 128, 0, 255],
      };
    }
  }
  points
}

fn leaf(cluster: i32, min_x: i32, max_x: i32, first_face: usize, num_faces: usize) -> Leaf {
  Leaf {
    cluster,
    area: 0,
    mins: [min_x, -512, -512],
    maxs: [max_x, 512, 512],
    first_face,
    num_faces,
  }
}

/// Two leaves split by the plane x = 0. See the module docs.
pub fn two_leaf_data(vis: TwoLeafVis) -> BspData {
  let mut vertices = Vec::new();
  let mut faces = Vec::new();

  for _ in 0..3 {
    faces.push(polygon_face(vertices.len(), 3));
    vertices.extend([
      Vertex::at(Vec3::new(0.0, 0.0, 0.0)),
      Vertex::at(Vec3::new(64.0, 0.0, 0.0)),
      Vertex::at(Vec3::new(0.0, 64.0, 0.0)),
    ]);
  }

  faces.push(patch_face(vertices.len(), 3, 3));
  vertices.extend(flat_grid(3, 3));

  faces.push(polygon_face(vertices.len(), 3));
  vertices.extend([
    Vertex::at(Vec3::new(0.0, 0.0, 8.0)),
    Vertex::at(Vec3::new(8.0, 0.0, 8.0)),
    Vertex::at(Vec3::new(0.0, 8.0, 8.0)),
  ]);

  let vis = match vis {
    TwoLeafVis::Absent => None,
    TwoLeafVis::ZeroSeesOnlyZero => {
      let mut vis = VisData::empty(2);
      vis.set_visible(0, 0);
      vis.set_visible(1, 1);
      Some(vis)
    }
    TwoLeafVis::AllVisible => {
      let mut vis = VisData::empty(2);
      for from in 0..2 {
        for to in 0..2 {
          vis.set_visible(from, to);
        }
      }
      Some(vis)
    }
  };

  BspData {
    entities: String::new(),
    textures: vec![Texture {
      name: "textures/test/wall".to_string(),
      flags: 0,
      contents: 1,
    }],
    planes: vec![Plane::new(Vec3::X, 0.0)],
    nodes: vec![Node {
      plane: 0,
      front: ChildRef::Leaf(0),
      back: ChildRef::Leaf(1),
      mins: [-512; 3],
      maxs: [512; 3],
    }],
    leaves: vec![leaf(0, 0, 512, 0, 3), leaf(1, -512, 0, 3, 3)],
    leaf_faces: vec![0, 1, 4, 2, 3, 4],
    faces,
    vertices,
    mesh_vertices: vec![0, 1, 2],
    lightmaps: Vec::new(),
    vis,
  }
}

/// Chain of slabs along X: node `i` splits at `x = 100 * i`, its back child
/// is leaf `i`, its front child is node `i + 1` (the last node's front child
/// is leaf `depth`).
pub fn slab_chain(depth: usize) -> (Vec<Plane>, Vec<Node>) {
  let mut planes = Vec::with_capacity(depth);
  let mut nodes = Vec::with_capacity(depth);
  for i in 0..depth {
    planes.push(Plane::new(Vec3::X, 100.0 * i as f32));
    let front = if i + 1 < depth {
      ChildRef::Node(i + 1)
    } else {
      ChildRef::Leaf(depth)
    };
    nodes.push(Node {
      plane: i,
      front,
      back: ChildRef::Leaf(i),
      mins: [0; 3],
      maxs: [0; 3],
    });
  }
  (planes, nodes)
}
