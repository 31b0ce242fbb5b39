use super::*;

/// Three clusters: 0 sees {0, 1}, 1 sees {1}, 2 sees {0, 2}.
fn three_cluster_vis() -> VisData {
  let mut vis = VisData::empty(3);
  vis.set_visible(0, 0);
  vis.set_visible(0, 1);
  vis.set_visible(1, 1);
  vis.set_visible(2, 0);
  vis.set_visible(2, 2);
  vis
}

#[test]
fn test_absent_vis_is_fail_open() {
  for from in -3..20 {
    for to in -3..20 {
      assert!(
        cluster_visible(None, from, to),
        "({}, {}) must be visible without vis data",
        from,
        to
      );
    }
  }
}

#[test]
fn test_negative_from_is_fail_open() {
  let vis = VisData::empty(4);
  assert!(cluster_visible(Some(&vis), -1, 0));
  assert!(cluster_visible(Some(&vis), -1, 3));
  assert!(cluster_visible(Some(&vis), -1, -1));
}

#[test]
fn test_negative_to_is_hidden() {
  let vis = three_cluster_vis();
  assert!(!cluster_visible(Some(&vis), 0, -1));
}

#[test]
fn test_bit_lookup() {
  let vis = three_cluster_vis();
  assert!(cluster_visible(Some(&vis), 0, 0));
  assert!(cluster_visible(Some(&vis), 0, 1));
  assert!(!cluster_visible(Some(&vis), 0, 2));
  assert!(!cluster_visible(Some(&vis), 1, 0));
  assert!(cluster_visible(Some(&vis), 1, 1));
  assert!(cluster_visible(Some(&vis), 2, 0));
  assert!(!cluster_visible(Some(&vis), 2, 1));
}

#[test]
fn test_bit_layout_matches_byte_buffer() {
  // Cluster 9 lives in byte 1, bit 1 of the row.
  let vis = VisData::new(10, 2, vec![0, 0, 0b0000_0000, 0b0000_0010]).unwrap();
  assert!(vis.is_visible(1, 9));
  assert!(!vis.is_visible(0, 9));
  assert!(!vis.is_visible(1, 8));
}

#[test]
fn test_out_of_range_reads_hidden() {
  let vis = three_cluster_vis();
  assert!(!vis.is_visible(0, 64));
  assert!(!vis.is_visible(17, 0));
}

#[test]
fn test_short_buffer_rejected() {
  let err = VisData::new(16, 2, vec![0; 31]).unwrap_err();
  assert!(matches!(
    err,
    BspError::InvalidVisData {
      len: 31,
      expected: 32
    }
  ));
}

#[test]
fn test_row_and_visible_from() {
  let vis = three_cluster_vis();
  assert_eq!(vis.row(0), Some(&[0b0000_0011][..]));
  assert_eq!(vis.row(3), None);
  assert_eq!(vis.visible_from(2).collect::<Vec<_>>(), vec![0, 2]);
}

#[test]
fn test_empty_rounds_up_row_length() {
  let vis = VisData::empty(9);
  assert_eq!(vis.bytes_per_cluster, 2);
  assert_eq!(vis.vecs.len(), 18);
}

#[test]
fn test_oversized_fields_do_not_overflow() {
  let mut vis = VisData {
    num_clusters: usize::MAX,
    bytes_per_cluster: usize::MAX / 2,
    vecs: vec![0xff; 4],
  };
  vis.set_visible(3, 1);
  vis.set_visible(usize::MAX, usize::MAX);
  assert!(!vis.is_visible(3, 1));
  assert_eq!(vis.row(3), None);
  assert_eq!(vis.row(usize::MAX), None);
  assert_eq!(vis.vecs, vec![0xff; 4]);
}

#[test]
fn test_set_visible_stays_in_row() {
  let mut vis = VisData::empty(3);
  vis.set_visible(0, 8);
  vis.set_visible(0, 2);
  assert_eq!(vis.vecs, vec![0b0000_0100, 0, 0]);
}
