//! q3bsp - Renderer-agnostic Quake III BSP visibility core
//!
//! This crate decodes Quake III Arena (IBSP v46) maps and answers, every
//! frame, which faces a camera can see. Rendering stays outside: the map
//! hands back face ids and [`DrawCommand`]s, the caller binds textures and
//! issues the draws.
//!
//! # Features
//!
//! - **Lump decoding**: `bytemuck` record views over the file image, with
//!   cross-reference validation before anything is indexed
//! - **Camera location**: BSP descent to the camera's leaf and cluster
//! - **PVS culling**: cluster-to-cluster bitset lookups that fail open when a
//!   map has no vis data
//! - **Frustum culling**: Gribb-Hartmann planes and a conservative box test
//! - **Curved surfaces**: biquadratic Bézier patch tessellation into indexed
//!   triangles and per-row strips
//!
//! # Example
//!
//! ```ignore
//! use q3bsp::{BspMap, MapConfig, SpatialMap};
//!
//! let mut map = BspMap::load_file("maps/q3dm1.bsp", MapConfig::default())?;
//!
//! // Per frame
//! map.update_frustum(projection * view);
//! map.calculate_visible_faces(camera_position);
//! for draw in map.draw_list() {
//!   // bind draw.texture / draw.lightmap, issue draw.geometry
//! }
//! ```

pub mod constants;
pub mod error;
pub mod types;

pub use constants::{LIGHTMAP_GAMMA, TESSELLATION_LEVEL, WORLD_SCALE};
pub use error::{BspError, Result};
pub use types::{BspData, ChildRef, Face, FaceKind, Leaf, Node, Plane, PlaneSide, Texture, Vertex};

// Decoding and load-time checks
pub mod entities;
pub mod lightmap;
pub mod loader;
mod validate;
pub use lightmap::Lightmap;

// Spatial queries
pub mod bounds;
pub mod frustum;
pub mod pvs;
pub mod tree;
pub use bounds::Aabb;
pub use frustum::{Frustum, FrustumPlane};
pub use pvs::{cluster_visible, VisData};
pub use tree::BspTree;

// Curved surfaces
pub mod patch;
pub use patch::{BiquadPatch, Patch};

// Per-frame visibility
pub mod visibility;
pub use visibility::{RenderLeaf, VisibilityStats, VisibleFaceSet};

// Map facade
pub mod config;
pub mod map;
pub mod stats;
pub use config::{Eye, MapConfig, RenderFlags, VisibilityPolicy};
pub use map::{BspMap, DrawCommand, DrawGeometry, Q3BspMap, SpatialMap};
pub use stats::{MapStats, VisibilityMetrics};

#[cfg(test)]
mod test_utils;
