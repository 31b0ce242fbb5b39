//! Baked lightmaps and the load-time brightness adjustment.

use crate::constants::{LIGHTMAP_BYTES, LIGHTMAP_SIZE};

/// One 128×128 RGB lightmap page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lightmap {
  /// Row-major RGB bytes, `LIGHTMAP_SIZE²·3` long.
  pub texels: Vec<u8>,
}

impl Default for Lightmap {
  fn default() -> Self {
    Self {
      texels: vec![0; LIGHTMAP_BYTES],
    }
  }
}

impl Lightmap {
  /// Side length in texels.
  pub const SIZE: usize = LIGHTMAP_SIZE;

  pub fn from_texels(texels: Vec<u8>) -> Self {
    Self { texels }
  }

  /// RGB of texel `(x, y)`.
  pub fn texel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
    let i = (y * Self::SIZE + x) * 3;
    let rgb = self.texels.get(i..i + 3)?;
    Some([rgb[0], rgb[1], rgb[2]])
  }
}

/// Brighten `lightmap` by `gamma`.
///
/// Channels are scaled by `gamma / 255`; a texel whose brightest channel then
/// exceeds 1.0 is scaled down as a whole so its hue is kept instead of
/// clipping each channel separately.
pub fn apply_gamma(lightmap: &mut Lightmap, gamma: f32) {
  let factor = gamma / 255.0;
  for rgb in lightmap.texels.chunks_exact_mut(3) {
    let mut c = [rgb[0] as f32 * factor, rgb[1] as f32 * factor, rgb[2] as f32 * factor];

    let scale = c
      .iter()
      .filter(|&&v| v > 1.0)
      .fold(1.0f32, |scale, &v| scale.min(1.0 / v));

    for (out, v) in rgb.iter_mut().zip(c.iter_mut()) {
      *v *= scale * 255.0;
      *out = *v as u8;
    }
  }
}
