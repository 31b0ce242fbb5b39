//! Map statistics and visibility pass metrics.
//!
//! [`MapStats`] is always maintained: static totals are filled at init and
//! the per-pass counters are overwritten by every visibility pass.
//!
//! [`VisibilityMetrics`] keeps timing history. Recording is compiled in only
//! with the `metrics` feature and can be switched off at runtime:
//!
//! ```ignore
//! use std::sync::atomic::Ordering;
//! use q3bsp::stats::COLLECT_METRICS;
//!
//! // Compile with --features metrics
//! COLLECT_METRICS.store(false, Ordering::Relaxed);
//! ```

use std::collections::VecDeque;
#[cfg(feature = "metrics")]
use std::sync::atomic::Ordering;
use std::sync::atomic::AtomicBool;

use web_time::Instant;

use crate::visibility::VisibilityStats;

/// Runtime toggle for metrics collection.
pub static COLLECT_METRICS: AtomicBool = AtomicBool::new(true);

/// Whether metrics are collected (feature enabled and runtime toggle on).
#[inline]
pub fn is_enabled() -> bool {
  #[cfg(feature = "metrics")]
  {
    COLLECT_METRICS.load(Ordering::Relaxed)
  }
  #[cfg(not(feature = "metrics"))]
  {
    false
  }
}

/// Fixed-capacity history, oldest value evicted first.
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
  buffer: VecDeque<T>,
  capacity: usize,
}

impl<T> RollingWindow<T> {
  pub fn new(capacity: usize) -> Self {
    Self {
      buffer: VecDeque::with_capacity(capacity),
      capacity,
    }
  }

  pub fn push(&mut self, value: T) {
    if self.capacity == 0 {
      return;
    }
    if self.buffer.len() >= self.capacity {
      self.buffer.pop_front();
    }
    self.buffer.push_back(value);
  }

  pub fn len(&self) -> usize {
    self.buffer.len()
  }

  pub fn is_empty(&self) -> bool {
    self.buffer.is_empty()
  }

  pub fn clear(&mut self) {
    self.buffer.clear();
  }

  /// Oldest to newest.
  pub fn iter(&self) -> impl Iterator<Item = &T> {
    self.buffer.iter()
  }

  pub fn last(&self) -> Option<&T> {
    self.buffer.back()
  }
}

impl RollingWindow<u64> {
  pub fn sum(&self) -> u64 {
    self.buffer.iter().sum()
  }

  pub fn average(&self) -> f64 {
    if self.buffer.is_empty() {
      0.0
    } else {
      self.sum() as f64 / self.buffer.len() as f64
    }
  }

  pub fn min_max(&self) -> Option<(u64, u64)> {
    let min = *self.buffer.iter().min()?;
    let max = *self.buffer.iter().max()?;
    Some((min, max))
  }
}

impl Default for RollingWindow<u64> {
  fn default() -> Self {
    Self::new(128)
  }
}

/// Counters describing a loaded map and its last visibility pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MapStats {
  // Static, filled at init
  pub total_vertices: usize,
  pub total_faces: usize,
  pub total_patches: usize,
  pub total_leaves: usize,
  /// Vertices generated by patch tessellation.
  pub tessellated_vertices: usize,

  // Last visibility pass
  pub visible_faces: usize,
  pub visible_patches: usize,
  pub faces_considered: usize,
  pub leaves_tested: usize,
  pub leaves_culled_pvs: usize,
  pub leaves_culled_frustum: usize,
  pub camera_leaf: Option<usize>,
  pub camera_cluster: i32,
}

impl MapStats {
  /// Overwrite the per-pass counters.
  pub fn record_pass(&mut self, pass: &VisibilityStats) {
    self.visible_faces = pass.visible_faces;
    self.visible_patches = pass.visible_patches;
    self.faces_considered = pass.faces_considered;
    self.leaves_tested = pass.leaves_tested;
    self.leaves_culled_pvs = pass.leaves_culled_pvs;
    self.leaves_culled_frustum = pass.leaves_culled_frustum;
    self.camera_leaf = pass.camera_leaf;
    self.camera_cluster = pass.camera_cluster;
  }
}

/// Timing history of visibility passes.
#[derive(Debug, Clone, Default)]
pub struct VisibilityMetrics {
  /// Pass durations in microseconds.
  pub pass_timings: RollingWindow<u64>,
  /// Visible face count per pass.
  pub visible_face_counts: RollingWindow<u64>,
  pub last_pass_us: u64,
  /// Cumulative, survives [`VisibilityMetrics::reset`].
  pub total_passes: u64,
}

impl VisibilityMetrics {
  pub fn new() -> Self {
    Self::default()
  }

  /// Start timing a pass; `None` when collection is off.
  #[inline]
  pub fn start(&self) -> Option<Instant> {
    is_enabled().then(Instant::now)
  }

  /// Finish a pass started with [`VisibilityMetrics::start`].
  pub fn finish(&mut self, started: Option<Instant>, visible_faces: usize) {
    if let Some(started) = started {
      self.record_pass(started.elapsed().as_micros() as u64, visible_faces);
    }
  }

  pub fn record_pass(&mut self, timing_us: u64, visible_faces: usize) {
    if !is_enabled() {
      return;
    }
    self.pass_timings.push(timing_us);
    self.visible_face_counts.push(visible_faces as u64);
    self.last_pass_us = timing_us;
    self.total_passes += 1;
  }

  pub fn avg_pass_us(&self) -> f64 {
    self.pass_timings.average()
  }

  pub fn reset(&mut self) {
    self.pass_timings.clear();
    self.visible_face_counts.clear();
    self.last_pass_us = 0;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_rolling_window() {
    let mut window = RollingWindow::new(3);
    assert!(window.is_empty());
    assert_eq!(window.min_max(), None);

    window.push(10u64);
    window.push(20);
    window.push(30);
    assert_eq!(window.sum(), 60);
    assert_eq!(window.average(), 20.0);

    window.push(40);
    assert_eq!(window.len(), 3);
    assert_eq!(window.sum(), 90);
    assert_eq!(window.min_max(), Some((20, 40)));
    assert_eq!(window.last(), Some(&40));
  }

  #[test]
  fn test_zero_capacity_window_stays_empty() {
    let mut window = RollingWindow::new(0);
    window.push(1u64);
    assert!(window.is_empty());
  }

  #[test]
  fn test_record_pass_copies_counters() {
    let mut stats = MapStats {
      total_faces: 9,
      ..Default::default()
    };
    stats.record_pass(&VisibilityStats {
      camera_leaf: Some(2),
      camera_cluster: 5,
      leaves_tested: 4,
      leaves_culled_pvs: 1,
      leaves_culled_frustum: 1,
      faces_considered: 7,
      visible_faces: 6,
      visible_patches: 2,
    });
    assert_eq!(stats.total_faces, 9);
    assert_eq!(stats.visible_faces, 6);
    assert_eq!(stats.visible_patches, 2);
    assert_eq!(stats.camera_cluster, 5);
    assert_eq!(stats.camera_leaf, Some(2));
  }

  #[cfg(feature = "metrics")]
  #[test]
  fn test_timing_recording() {
    let mut metrics = VisibilityMetrics::new();
    metrics.record_pass(100, 10);
    metrics.record_pass(300, 12);

    assert_eq!(metrics.pass_timings.len(), 2);
    assert_eq!(metrics.avg_pass_us(), 200.0);
    assert_eq!(metrics.last_pass_us, 300);
    assert_eq!(metrics.total_passes, 2);

    metrics.reset();
    assert!(metrics.pass_timings.is_empty());
    assert_eq!(metrics.total_passes, 2);
  }

  #[cfg(not(feature = "metrics"))]
  #[test]
  fn test_recording_compiled_out() {
    let mut metrics = VisibilityMetrics::new();
    assert!(metrics.start().is_none());
    metrics.record_pass(100, 10);
    assert!(metrics.pass_timings.is_empty());
    assert_eq!(metrics.total_passes, 0);
  }
}
