//! Format and rendering constants for Quake III (IBSP v46) maps.
//!
//! # Coordinate Scale
//!
//! ```text
//! file units ──(÷ WORLD_SCALE)──▶ render units
//!
//! planes, node/leaf bounds      leaf bounding-box corners,
//! vertex positions              camera position
//! ```
//!
//! The tree is always descended in file units, so the camera position is
//! multiplied by the world scale before [`crate::tree::BspTree::find_leaf`].

/// Default scale-down factor between file units and render units.
pub const WORLD_SCALE: f32 = 64.0;

/// Default curved surface tessellation level (grid is `(L+1)²` vertices).
pub const TESSELLATION_LEVEL: u32 = 10;

/// Highest accepted tessellation level. Keeps `(L+1)²` vertex indices and
/// `6L²` index counts well inside `u32`.
pub const MAX_TESSELLATION_LEVEL: u32 = 256;

/// Default gamma boost applied to lightmaps at load.
pub const LIGHTMAP_GAMMA: f32 = 2.5;

/// Lightmap edge length in texels.
pub const LIGHTMAP_SIZE: usize = 128;

/// Bytes per lightmap (128 × 128 RGB).
pub const LIGHTMAP_BYTES: usize = LIGHTMAP_SIZE * LIGHTMAP_SIZE * 3;

/// Control points per biquadratic sub-patch (3×3).
pub const PATCH_CONTROL_POINTS: usize = 9;

/// File magic.
pub const BSP_MAGIC: [u8; 4] = *b"IBSP";

/// Quake III Arena BSP version.
pub const BSP_VERSION: i32 = 0x2E;

/// Number of lump directory entries in the header.
pub const NUM_LUMPS: usize = 17;

/// Header size: magic + version + 17 × (offset, length).
pub const HEADER_SIZE: usize = 4 + 4 + NUM_LUMPS * 8;

/// Camera start used when the entity lump has no `info_player_deathmatch`.
pub const DEFAULT_PLAYER_START: [f32; 3] = [0.0, 0.0, 4.0];
