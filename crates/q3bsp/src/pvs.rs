//! Potentially visible set: a precomputed cluster-to-cluster bit matrix.
//!
//! # Layout
//!
//! ```text
//! vecs: [ row 0 | row 1 | ... | row num_clusters-1 ]
//!         └─ bytes_per_cluster bytes each
//!
//! visible(a, b) = vecs[a * bytes_per_cluster + (b >> 3)] & (1 << (b & 7)) != 0
//! ```
//!
//! A map compiled without vis has no matrix at all; every query then fails
//! open and reports the cluster as visible.

use crate::error::{BspError, Result};

/// Uncompressed visibility matrix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisData {
  /// Number of clusters (matrix rows).
  pub num_clusters: usize,
  /// Row length in bytes.
  pub bytes_per_cluster: usize,
  /// Row-major bit matrix.
  pub vecs: Vec<u8>,
}

impl VisData {
  /// Build a matrix, checking that the buffer covers every row.
  pub fn new(num_clusters: usize, bytes_per_cluster: usize, vecs: Vec<u8>) -> Result<Self> {
    let vis = Self {
      num_clusters,
      bytes_per_cluster,
      vecs,
    };
    vis.check_len()?;
    Ok(vis)
  }

  /// An all-zero matrix sized for `num_clusters`.
  pub fn empty(num_clusters: usize) -> Self {
    let bytes_per_cluster = num_clusters.div_ceil(8);
    Self {
      num_clusters,
      bytes_per_cluster,
      vecs: vec![0; num_clusters * bytes_per_cluster],
    }
  }

  pub(crate) fn check_len(&self) -> Result<()> {
    let expected = self
      .num_clusters
      .checked_mul(self.bytes_per_cluster)
      .unwrap_or(usize::MAX);
    if self.vecs.len() < expected {
      return Err(BspError::InvalidVisData {
        len: self.vecs.len(),
        expected,
      });
    }
    Ok(())
  }

  /// Mark `to` as visible from `from`. Out-of-range pairs are ignored.
  pub fn set_visible(&mut self, from: usize, to: usize) {
    if to >> 3 >= self.bytes_per_cluster {
      return;
    }
    let Some(idx) = self.byte_index(from, to) else {
      return;
    };
    if let Some(byte) = self.vecs.get_mut(idx) {
      *byte |= 1 << (to & 7);
    }
  }

  /// Raw bit lookup. Out-of-range queries read as not visible.
  #[inline]
  pub fn is_visible(&self, from: usize, to: usize) -> bool {
    if from >= self.num_clusters || to >> 3 >= self.bytes_per_cluster {
      return false;
    }
    self
      .byte_index(from, to)
      .and_then(|idx| self.vecs.get(idx))
      .is_some_and(|byte| byte & (1 << (to & 7)) != 0)
  }

  /// Row of the matrix for one cluster.
  pub fn row(&self, cluster: usize) -> Option<&[u8]> {
    let start = cluster.checked_mul(self.bytes_per_cluster)?;
    let end = start.checked_add(self.bytes_per_cluster)?;
    self.vecs.get(start..end)
  }

  #[inline]
  fn byte_index(&self, from: usize, to: usize) -> Option<usize> {
    from
      .checked_mul(self.bytes_per_cluster)?
      .checked_add(to >> 3)
  }

  /// Iterate the clusters visible from `from`.
  pub fn visible_from(&self, from: usize) -> impl Iterator<Item = usize> + '_ {
    (0..self.num_clusters).filter(move |&to| self.is_visible(from, to))
  }
}

/// Cluster visibility with the fail-open policy.
///
/// Returns true when there is no vis data or `from` is negative (camera
/// outside the world). A negative `to` is a leaf without a cluster and is
/// never visible from a real cluster.
#[inline]
pub fn cluster_visible(vis: Option<&VisData>, from: i32, to: i32) -> bool {
  let Some(vis) = vis else {
    return true;
  };
  if from < 0 {
    return true;
  }
  if to < 0 {
    return false;
  }
  vis.is_visible(from as usize, to as usize)
}

#[cfg(test)]
#[path = "pvs_test.rs"]
mod pvs_test;
