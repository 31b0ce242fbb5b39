//! Load-time errors.
//!
//! Every failure the core can report happens while a map is being decoded,
//! validated or prepared. Per-frame operations never fail: missing visibility
//! data and a camera outside the tree both fall back to "show everything".

/// All the possible problems a map can have before it becomes renderable.
#[derive(Debug, thiserror::Error)]
pub enum BspError {
  /// The first four bytes are not `IBSP`.
  #[error("not an IBSP file (magic {0:?})")]
  BadMagic([u8; 4]),

  /// The header names a format revision this crate does not decode.
  #[error("unsupported BSP version {found} (expected {expected})")]
  UnsupportedVersion { found: i32, expected: i32 },

  /// The buffer ends before a structure it must contain.
  #[error("file truncated: need {needed} bytes, have {len}")]
  Truncated { needed: usize, len: usize },

  /// A directory entry points outside the file.
  #[error("lump {lump} at offset {offset} with length {length} lies outside the {file_len}-byte file")]
  LumpOutOfBounds {
    lump: &'static str,
    offset: i32,
    length: i32,
    file_len: usize,
  },

  /// A lump length is not a whole number of records.
  #[error("lump {lump} length {length} is not a multiple of record size {record_size}")]
  MisalignedLump {
    lump: &'static str,
    length: usize,
    record_size: usize,
  },

  /// An index stored in one lump does not fit the lump it refers to.
  #[error("{kind} reference {index} out of range (len {len})")]
  InvalidReference {
    kind: &'static str,
    index: i64,
    len: usize,
  },

  /// A face record carries a type tag outside 1..=4.
  #[error("face {face} has unknown type {raw}")]
  UnknownFaceKind { face: usize, raw: i32 },

  /// A node is reachable from the root by more than one path.
  #[error("node {node} is reachable by more than one path")]
  TreeCycle { node: usize },

  /// The visibility bitset is smaller than `num_clusters * bytes_per_cluster`.
  #[error("vis data holds {len} bytes, expected at least {expected}")]
  InvalidVisData { len: usize, expected: usize },

  /// Tessellation level outside `1..=MAX_TESSELLATION_LEVEL`.
  #[error("tessellation level must be between 1 and 256, got {0}")]
  InvalidTessellationLevel(u32),

  /// A sub-patch was built from fewer than 9 control points.
  #[error("biquadratic patch needs 9 control points, got {count}")]
  NotEnoughControlPoints { count: usize },

  /// Patch dimensions cannot be split into 3×3 sub-patches.
  #[error("patch face {face} has invalid size {width}x{height}")]
  InvalidPatchSize { face: usize, width: i32, height: i32 },

  /// `MapConfig` holds a value the map cannot work with.
  #[error("invalid configuration: {0}")]
  InvalidConfig(String),

  #[error(transparent)]
  Io(#[from] std::io::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, BspError>;
