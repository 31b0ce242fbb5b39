//! Map facade: owns the decoded data, the derived render structures and the
//! per-frame visibility state.
//!
//! ```text
//!  BspData ──► Q3BspMap::new (validate) ──► init
//!                                            ├─ render leaves (bounds / world_scale)
//!                                            ├─ patches (tessellate)
//!                                            ├─ lightmap gamma
//!                                            └─ static stats
//!
//!  per frame:  update_frustum(view_projection)
//!              calculate_visible_faces(camera)
//!              draw_list() ──► external draw stage
//! ```

use std::path::Path;

use glam::{Mat4, Vec3};

use crate::config::{Eye, MapConfig, RenderFlags, VisibilityPolicy};
use crate::entities;
use crate::error::Result;
use crate::frustum::Frustum;
use crate::lightmap::apply_gamma;
use crate::loader;
use crate::patch::{tessellate_patches, Patch};
use crate::pvs::cluster_visible;
use crate::stats::{MapStats, VisibilityMetrics};
use crate::tree::BspTree;
use crate::types::{BspData, Face, FaceKind};
use crate::visibility::{resolve, RenderLeaf, VisibilityInput, VisibleFaceSet};

/// Capabilities every renderable spatial map offers.
pub trait SpatialMap {
  /// One-time preparation. Calling it again is a no-op.
  fn init(&mut self) -> Result<()>;

  /// Rebuild the visible face list for a camera at `camera_position`
  /// (render units).
  fn calculate_visible_faces(&mut self, camera_position: Vec3);

  /// PVS lookup with the fail-open policy.
  fn cluster_visible(&self, from: i32, to: i32) -> bool;

  /// Leaf containing a camera at `camera_position` (render units).
  fn find_camera_leaf(&self, camera_position: Vec3) -> Option<usize>;

  fn visible_faces(&self) -> &[usize];

  fn stats(&self) -> &MapStats;

  fn render_flags(&self) -> RenderFlags;

  fn set_render_flag(&mut self, flag: RenderFlags, enabled: bool);

  fn toggle_render_flag(&mut self, flag: RenderFlags) {
    let enabled = !self.has_render_flag(flag);
    self.set_render_flag(flag, enabled);
  }

  fn has_render_flag(&self, flag: RenderFlags) -> bool {
    self.render_flags().contains(flag)
  }

  /// Frustum used by the next [`SpatialMap::calculate_visible_faces`].
  fn set_frustum(&mut self, frustum: Frustum);

  /// Recompute the frustum from this frame's view-projection matrix
  /// (OpenGL clip conventions, render units).
  fn update_frustum(&mut self, view_projection: Mat4) {
    self.set_frustum(Frustum::from_view_projection(view_projection));
  }

  /// The visible faces as draw commands, in visibility order.
  fn draw_list(&self) -> Vec<DrawCommand>;
}

/// Geometry reference of one draw.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DrawGeometry {
  /// Indexed triangles: `mesh_vertices` offsets are relative to
  /// `first_vertex`.
  Indexed {
    first_vertex: usize,
    mesh_vertices: std::ops::Range<usize>,
  },
  /// Index into [`Q3BspMap::patches`].
  Patch(usize),
}

/// One visible face, ready for the draw stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawCommand {
  pub face: usize,
  pub kind: FaceKind,
  /// `None` when the face has no valid texture.
  pub texture: Option<usize>,
  /// `None` means "bind the white texture".
  pub lightmap: Option<usize>,
  pub geometry: DrawGeometry,
}

/// A Quake III (IBSP v46) map.
#[derive(Debug)]
pub struct Q3BspMap {
  config: MapConfig,
  data: BspData,
  render_leaves: Vec<RenderLeaf>,
  patches: Vec<Patch>,
  patch_of_face: Vec<Option<usize>>,
  visible: VisibleFaceSet,
  eye_visible: [VisibleFaceSet; 2],
  frustum: Frustum,
  flags: RenderFlags,
  stats: MapStats,
  metrics: VisibilityMetrics,
  initialized: bool,
}

impl Q3BspMap {
  /// Validate `data` and `config`. Call [`SpatialMap::init`] before the
  /// first frame, or use [`Q3BspMap::build`].
  pub fn new(data: BspData, config: MapConfig) -> Result<Self> {
    config.validate()?;
    data.validate()?;

    let flags = config.initial_flags;
    Ok(Self {
      config,
      data,
      render_leaves: Vec::new(),
      patches: Vec::new(),
      patch_of_face: Vec::new(),
      visible: VisibleFaceSet::default(),
      eye_visible: Default::default(),
      frustum: Frustum::everything(),
      flags,
      stats: MapStats::default(),
      metrics: VisibilityMetrics::default(),
      initialized: false,
    })
  }

  /// [`Q3BspMap::new`] followed by [`SpatialMap::init`].
  pub fn build(data: BspData, config: MapConfig) -> Result<Self> {
    let mut map = Self::new(data, config)?;
    map.init()?;
    Ok(map)
  }

  pub fn load_file(path: impl AsRef<Path>, config: MapConfig) -> Result<Self> {
    Self::build(loader::load_file(path)?, config)
  }

  pub fn parse(bytes: &[u8], config: MapConfig) -> Result<Self> {
    Self::build(loader::parse(bytes)?, config)
  }

  pub fn is_initialized(&self) -> bool {
    self.initialized
  }

  pub fn config(&self) -> &MapConfig {
    &self.config
  }

  pub fn data(&self) -> &BspData {
    &self.data
  }

  pub fn faces(&self) -> &[Face] {
    &self.data.faces
  }

  pub fn patches(&self) -> &[Patch] {
    &self.patches
  }

  /// Tessellated geometry of a patch face.
  pub fn patch_for_face(&self, face: usize) -> Option<&Patch> {
    let index = (*self.patch_of_face.get(face)?)?;
    self.patches.get(index)
  }

  pub fn render_leaves(&self) -> &[RenderLeaf] {
    &self.render_leaves
  }

  pub fn frustum(&self) -> &Frustum {
    &self.frustum
  }

  pub fn metrics(&self) -> &VisibilityMetrics {
    &self.metrics
  }

  /// First deathmatch spawn point, in render units.
  pub fn player_start(&self) -> Vec3 {
    entities::find_player_start(&self.data.entities) / self.config.world_scale
  }

  /// Visibility pass for one stereo eye.
  ///
  /// With [`VisibilityPolicy::Shared`] the left eye runs the pass and the
  /// right eye reuses it; with [`VisibilityPolicy::PerEye`] every eye gets
  /// its own pass and result.
  pub fn calculate_visible_faces_for_eye(&mut self, eye: Eye, camera_position: Vec3, frustum: Frustum) {
    match self.config.visibility_policy {
      VisibilityPolicy::Shared => {
        if eye == Eye::Left {
          self.frustum = frustum;
          self.run_pass(camera_position, None);
        }
      }
      VisibilityPolicy::PerEye => {
        self.frustum = frustum;
        self.run_pass(camera_position, Some(eye));
      }
    }
  }

  /// Faces visible to `eye` after the last pass.
  pub fn visible_faces_for_eye(&self, eye: Eye) -> &[usize] {
    match self.config.visibility_policy {
      VisibilityPolicy::Shared => self.visible.as_slice(),
      VisibilityPolicy::PerEye => self.eye_visible[eye_slot(eye)].as_slice(),
    }
  }

  pub fn draw_list_for_eye(&self, eye: Eye) -> Vec<DrawCommand> {
    self.draw_commands(self.visible_faces_for_eye(eye))
  }

  fn draw_commands(&self, faces: &[usize]) -> Vec<DrawCommand> {
    let use_lightmaps = self.flags.contains(RenderFlags::USE_LIGHTMAPS);
    let skip_missing = self.flags.contains(RenderFlags::SKIP_MISSING_TEX);

    faces
      .iter()
      .filter_map(|&id| {
        let face = self.data.faces.get(id)?;
        let texture = usize::try_from(face.texture)
          .ok()
          .filter(|&t| t < self.data.textures.len());
        // Patches are drawn even without a texture; the draw stage binds
        // its missing-texture fallback.
        let indexed = matches!(face.kind, FaceKind::Polygon | FaceKind::Mesh);
        if skip_missing && indexed && texture.is_none() {
          return None;
        }
        let lightmap = face
          .lightmap_index()
          .filter(|&lm| use_lightmaps && lm < self.data.lightmaps.len());

        let geometry = match face.kind {
          FaceKind::Polygon | FaceKind::Mesh => DrawGeometry::Indexed {
            first_vertex: face.first_vertex,
            mesh_vertices: face.mesh_vertex_range(),
          },
          FaceKind::Patch => DrawGeometry::Patch((*self.patch_of_face.get(id)?)?),
          FaceKind::Billboard => return None,
        };

        Some(DrawCommand {
          face: id,
          kind: face.kind,
          texture,
          lightmap,
          geometry,
        })
      })
      .collect()
  }

  fn run_pass(&mut self, camera_position: Vec3, eye: Option<Eye>) {
    let started = self.metrics.start();

    let input = VisibilityInput {
      tree: BspTree::new(&self.data.planes, &self.data.nodes),
      leaves: &self.render_leaves,
      leaf_faces: &self.data.leaf_faces,
      faces: &self.data.faces,
      vis: self.data.vis.as_ref(),
      frustum: &self.frustum,
      world_scale: self.config.world_scale,
      skip_pvs: self.flags.contains(RenderFlags::SKIP_PVS),
      skip_frustum: self.flags.contains(RenderFlags::SKIP_FC),
    };
    let out = match eye {
      None => &mut self.visible,
      Some(eye) => &mut self.eye_visible[eye_slot(eye)],
    };
    let pass = resolve(&input, camera_position, out);

    self.stats.record_pass(&pass);
    self.metrics.finish(started, pass.visible_faces);
  }
}

fn eye_slot(eye: Eye) -> usize {
  match eye {
    Eye::Left => 0,
    Eye::Right => 1,
  }
}

impl SpatialMap for Q3BspMap {
  #[tracing::instrument(skip_all, name = "map::init")]
  fn init(&mut self) -> Result<()> {
    if self.initialized {
      return Ok(());
    }

    let scale = self.config.world_scale;
    self.render_leaves = self
      .data
      .leaves
      .iter()
      .map(|leaf| RenderLeaf::from_leaf(leaf, scale))
      .collect();

    self.patches = tessellate_patches(
      &self.data.faces,
      &self.data.vertices,
      self.config.tessellation_level,
    )?;
    self.patch_of_face = vec![None; self.data.faces.len()];
    for (index, patch) in self.patches.iter().enumerate() {
      self.patch_of_face[patch.face] = Some(index);
    }

    if let Some(gamma) = self.config.lightmap_gamma {
      for lightmap in &mut self.data.lightmaps {
        apply_gamma(lightmap, gamma);
      }
    }

    let billboards = self
      .data
      .faces
      .iter()
      .filter(|face| face.kind == FaceKind::Billboard)
      .count();
    if billboards > 0 {
      tracing::warn!(billboards, "billboard faces are not drawn");
    }
    if self.data.vis.is_none() {
      tracing::debug!("no vis data, PVS culling disabled");
    }

    self.visible.reset(self.data.faces.len());
    for set in &mut self.eye_visible {
      set.reset(self.data.faces.len());
    }

    self.stats = MapStats {
      total_vertices: self.data.vertices.len(),
      total_faces: self.data.faces.len(),
      total_patches: self.patches.len(),
      total_leaves: self.render_leaves.len(),
      tessellated_vertices: self.patches.iter().map(Patch::vertex_count).sum(),
      camera_cluster: -1,
      ..Default::default()
    };
    self.initialized = true;

    tracing::debug!(
      leaves = self.stats.total_leaves,
      faces = self.stats.total_faces,
      patches = self.stats.total_patches,
      tessellated_vertices = self.stats.tessellated_vertices,
      "map initialized"
    );
    Ok(())
  }

  fn calculate_visible_faces(&mut self, camera_position: Vec3) {
    self.run_pass(camera_position, None);
  }

  fn cluster_visible(&self, from: i32, to: i32) -> bool {
    cluster_visible(self.data.vis.as_ref(), from, to)
  }

  fn find_camera_leaf(&self, camera_position: Vec3) -> Option<usize> {
    BspTree::new(&self.data.planes, &self.data.nodes)
      .find_leaf(camera_position * self.config.world_scale)
  }

  fn visible_faces(&self) -> &[usize] {
    self.visible.as_slice()
  }

  fn stats(&self) -> &MapStats {
    &self.stats
  }

  fn render_flags(&self) -> RenderFlags {
    self.flags
  }

  fn set_render_flag(&mut self, flag: RenderFlags, enabled: bool) {
    self.flags.set(flag, enabled);
  }

  fn set_frustum(&mut self, frustum: Frustum) {
    self.frustum = frustum;
  }

  fn draw_list(&self) -> Vec<DrawCommand> {
    self.draw_commands(self.visible.as_slice())
  }
}

/// Any supported map format.
#[derive(Debug)]
pub enum BspMap {
  Quake3(Q3BspMap),
}

impl BspMap {
  pub fn load_file(path: impl AsRef<Path>, config: MapConfig) -> Result<Self> {
    Q3BspMap::load_file(path, config).map(BspMap::Quake3)
  }

  pub fn parse(bytes: &[u8], config: MapConfig) -> Result<Self> {
    Q3BspMap::parse(bytes, config).map(BspMap::Quake3)
  }

  pub fn as_quake3(&self) -> Option<&Q3BspMap> {
    match self {
      BspMap::Quake3(map) => Some(map),
    }
  }

  fn inner(&self) -> &dyn SpatialMap {
    match self {
      BspMap::Quake3(map) => map,
    }
  }

  fn inner_mut(&mut self) -> &mut dyn SpatialMap {
    match self {
      BspMap::Quake3(map) => map,
    }
  }
}

impl SpatialMap for BspMap {
  fn init(&mut self) -> Result<()> {
    self.inner_mut().init()
  }

  fn calculate_visible_faces(&mut self, camera_position: Vec3) {
    self.inner_mut().calculate_visible_faces(camera_position)
  }

  fn cluster_visible(&self, from: i32, to: i32) -> bool {
    self.inner().cluster_visible(from, to)
  }

  fn find_camera_leaf(&self, camera_position: Vec3) -> Option<usize> {
    self.inner().find_camera_leaf(camera_position)
  }

  fn visible_faces(&self) -> &[usize] {
    self.inner().visible_faces()
  }

  fn stats(&self) -> &MapStats {
    self.inner().stats()
  }

  fn render_flags(&self) -> RenderFlags {
    self.inner().render_flags()
  }

  fn set_render_flag(&mut self, flag: RenderFlags, enabled: bool) {
    self.inner_mut().set_render_flag(flag, enabled)
  }

  fn set_frustum(&mut self, frustum: Frustum) {
    self.inner_mut().set_frustum(frustum)
  }

  fn update_frustum(&mut self, view_projection: Mat4) {
    self.inner_mut().update_frustum(view_projection)
  }

  fn draw_list(&self) -> Vec<DrawCommand> {
    self.inner().draw_list()
  }
}

#[cfg(test)]
#[path = "map_test.rs"]
mod map_test;
