//! Cross-reference validation for decoded lumps.
//!
//! The per-frame paths index arrays directly, so every index stored in one
//! lump is checked against the lump it points into before a map is built.

use crate::error::{BspError, Result};
use crate::types::{BspData, ChildRef, FaceKind};

fn check(kind: &'static str, index: usize, len: usize) -> Result<()> {
  if index < len {
    Ok(())
  } else {
    Err(BspError::InvalidReference {
      kind,
      index: index as i64,
      len,
    })
  }
}

fn check_span(kind: &'static str, first: usize, count: usize, len: usize) -> Result<()> {
  match first.checked_add(count) {
    Some(end) if end <= len => Ok(()),
    _ => Err(BspError::InvalidReference {
      kind,
      index: first as i64 + count as i64,
      len,
    }),
  }
}

impl BspData {
  /// Check every cross reference and the tree shape.
  ///
  /// Fails on out-of-range plane/node/leaf/face/vertex references, on a node
  /// reachable from the root by more than one path, and on a visibility
  /// buffer shorter than its declared size.
  pub fn validate(&self) -> Result<()> {
    for node in &self.nodes {
      check("node plane", node.plane, self.planes.len())?;
      for child in [node.front, node.back] {
        match child {
          ChildRef::Node(index) => check("node child", index, self.nodes.len())?,
          ChildRef::Leaf(index) => check("node leaf", index, self.leaves.len())?,
        }
      }
    }
    self.validate_tree_shape()?;

    for leaf in &self.leaves {
      check_span("leaf faces", leaf.first_face, leaf.num_faces, self.leaf_faces.len())?;
    }
    for &face in &self.leaf_faces {
      check("leaf face", face as usize, self.faces.len())?;
    }

    for face in &self.faces {
      check_span("face vertices", face.first_vertex, face.num_vertices, self.vertices.len())?;
      if matches!(face.kind, FaceKind::Polygon | FaceKind::Mesh) {
        check_span(
          "face mesh vertices",
          face.first_mesh_vertex,
          face.num_mesh_vertices,
          self.mesh_vertices.len(),
        )?;
        for &offset in &self.mesh_vertices[face.mesh_vertex_range()] {
          check("mesh vertex", offset as usize, face.num_vertices)?;
        }
      }
    }

    if let Some(vis) = &self.vis {
      vis.check_len()?;
    }

    Ok(())
  }

  /// Walk the tree from the root; revisiting a node means a cycle or a
  /// shared subtree.
  fn validate_tree_shape(&self) -> Result<()> {
    if self.nodes.is_empty() {
      return Ok(());
    }

    let mut visited = vec![false; self.nodes.len()];
    let mut stack = vec![0usize];

    while let Some(index) = stack.pop() {
      if visited[index] {
        return Err(BspError::TreeCycle { node: index });
      }
      visited[index] = true;

      let node = &self.nodes[index];
      for child in [node.back, node.front] {
        if let ChildRef::Node(child) = child {
          stack.push(child);
        }
      }
    }

    Ok(())
  }
}
