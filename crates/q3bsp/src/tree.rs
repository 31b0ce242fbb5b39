//! Point location in the BSP tree.
//!
//! ```text
//!              node 0 (plane p0)
//!             /front          \back
//!        node 1 (p1)         leaf ~(-2) = 1
//!        /       \
//!   leaf 0     leaf 2
//! ```
//!
//! Descent starts at node 0 and follows the front child when the point is on
//! or in front of the node's plane, the back child otherwise, until a leaf
//! reference is reached.

use glam::Vec3;

use crate::types::{ChildRef, Node, Plane};

/// Borrowed view over the plane and node arrays of a map.
#[derive(Clone, Copy, Debug)]
pub struct BspTree<'a> {
  planes: &'a [Plane],
  nodes: &'a [Node],
}

impl<'a> BspTree<'a> {
  pub fn new(planes: &'a [Plane], nodes: &'a [Node]) -> Self {
    Self { planes, nodes }
  }

  /// Number of internal nodes.
  pub fn node_count(&self) -> usize {
    self.nodes.len()
  }

  /// Leaf containing `point` (file units).
  ///
  /// A tree without nodes is a single leaf, so every point maps to leaf 0.
  /// Returns `None` only for data that failed to validate: an out-of-range
  /// reference or a walk longer than the node count.
  #[inline]
  pub fn find_leaf(&self, point: Vec3) -> Option<usize> {
    self.find_leaf_counted(point).map(|(leaf, _)| leaf)
  }

  /// Leaf containing `point` plus the number of nodes visited.
  pub fn find_leaf_counted(&self, point: Vec3) -> Option<(usize, usize)> {
    if self.nodes.is_empty() {
      return Some((0, 0));
    }

    let mut current = ChildRef::Node(0);
    let mut steps = 0;

    loop {
      match current {
        ChildRef::Leaf(leaf) => return Some((leaf, steps)),
        ChildRef::Node(index) => {
          // A strict tree never visits more nodes than it has.
          if steps >= self.nodes.len() {
            return None;
          }
          let node = self.nodes.get(index)?;
          let plane = self.planes.get(node.plane)?;
          current = node.child(plane.side(point));
          steps += 1;
        }
      }
    }
  }

  /// Longest root-to-leaf path, counted in nodes.
  pub fn depth(&self) -> usize {
    if self.nodes.is_empty() {
      return 0;
    }

    let mut max_depth = 0;
    let mut stack = vec![(0usize, 1usize)];

    while let Some((index, depth)) = stack.pop() {
      let Some(node) = self.nodes.get(index) else {
        continue;
      };
      max_depth = max_depth.max(depth);
      if depth > self.nodes.len() {
        // Cyclic data; validation rejects it before a map is built.
        break;
      }
      for child in [node.front, node.back] {
        if let ChildRef::Node(child) = child {
          stack.push((child, depth + 1));
        }
      }
    }

    max_depth
  }
}

#[cfg(test)]
#[path = "tree_test.rs"]
mod tree_test;
