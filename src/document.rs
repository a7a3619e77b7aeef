//! Sprite document operations: layer resolution, frame flattening and
//! tileset lookup.

use image::{Rgba, RgbaImage};
use log::debug;
use rayon::prelude::*;

use crate::error::PackError;
use crate::models::{
    Frame, LayerInfo, LayerKind, PackingConfig, SpriteDocument, Tileset, TilesetKey,
};

/// Transparent color for flattened frame backgrounds
const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

impl SpriteDocument {
    /// Look up a tileset by dense index or by unique name.
    ///
    /// ```
    /// use celpack::models::{SpriteDocument, Tileset};
    /// use image::RgbaImage;
    ///
    /// let mut doc = SpriteDocument::default();
    /// doc.tilesets.push(Tileset {
    ///     id: 0,
    ///     name: "ground".to_string(),
    ///     tile_width: 8,
    ///     tile_height: 8,
    ///     image: RgbaImage::new(8, 16),
    /// });
    ///
    /// assert_eq!(doc.tileset(0usize).unwrap().name, "ground");
    /// assert_eq!(doc.tileset("ground").unwrap().id, 0);
    /// assert!(doc.tileset(1usize).is_err());
    /// assert!(doc.tileset("water").is_err());
    /// ```
    pub fn tileset<'a>(&self, key: impl Into<TilesetKey<'a>>) -> Result<&Tileset, PackError> {
        match key.into() {
            TilesetKey::Index(index) => self
                .tilesets
                .get(index)
                .ok_or(PackError::IndexOutOfRange { index, len: self.tilesets.len() }),
            TilesetKey::Name(name) => self
                .tilesets
                .iter()
                .find(|t| t.name == name)
                .ok_or_else(|| PackError::NotFound(name.to_string())),
        }
    }

    /// Layer visibility combined with every enclosing group's visibility.
    pub fn effective_visibility(&self, layer: usize) -> bool {
        let mut current = Some(layer);
        // Bounded walk so a malformed parent chain cannot loop forever
        for _ in 0..=self.layers.len() {
            match current.and_then(|i| self.layers.get(i)) {
                Some(l) if !l.flags.visible => return false,
                Some(l) => current = l.parent,
                None => return true,
            }
        }
        true
    }

    /// Packer-facing description of a layer.
    pub fn layer_info(&self, layer: usize) -> Result<LayerInfo, PackError> {
        let l = self
            .layers
            .get(layer)
            .ok_or(PackError::IndexOutOfRange { index: layer, len: self.layers.len() })?;
        Ok(LayerInfo {
            name: l.name.clone(),
            visible: self.effective_visibility(layer),
            background: l.flags.background,
            kind: l.kind,
        })
    }

    /// Composite one frame from the cels of the layers passing `config`.
    ///
    /// The returned frame lists every layer that has a cel in this frame, so
    /// the packer can apply the same rules to decide whether it is kept.
    pub fn flatten_frame(&self, index: usize, config: &PackingConfig) -> Result<Frame, PackError> {
        let frame = self
            .frames
            .get(index)
            .ok_or(PackError::IndexOutOfRange { index, len: self.frames.len() })?;

        let mut cels: Vec<_> = frame.cels.iter().collect();
        // Lower layer indices are drawn first
        cels.sort_by_key(|cel| cel.layer);

        let mut canvas = RgbaImage::from_pixel(self.width, self.height, TRANSPARENT);
        let mut layers = Vec::new();

        for cel in cels {
            let info = self.layer_info(cel.layer)?;
            let layer = &self.layers[cel.layer];
            if info.kind != LayerKind::Group && info.passes(config) {
                let opacity = (f32::from(layer.opacity) / 255.0) * (f32::from(cel.opacity) / 255.0);
                blit_blended(&mut canvas, &cel.image, cel.x, cel.y, opacity);
            }
            if !layers.contains(&info) {
                layers.push(info);
            }
        }

        Ok(Frame {
            name: index.to_string(),
            source: format!("frame {}", index),
            image: canvas,
            duration_ms: frame.duration_ms,
            layers,
        })
    }

    /// Flatten every frame, in order.
    pub fn flatten_frames(&self, config: &PackingConfig) -> Result<Vec<Frame>, PackError> {
        debug!("flattening {} frames ({} layers)", self.frames.len(), self.layers.len());
        (0..self.frames.len()).into_par_iter().map(|i| self.flatten_frame(i, config)).collect()
    }
}

/// Blit a cel onto the canvas with source-over alpha blending.
/// Pixels falling outside the canvas are clipped.
fn blit_blended(canvas: &mut RgbaImage, cel: &RgbaImage, x: i32, y: i32, opacity: f32) {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity == 0.0 {
        return;
    }
    let canvas_width = i64::from(canvas.width());
    let canvas_height = i64::from(canvas.height());

    for (sx, sy, src) in cel.enumerate_pixels() {
        let dest_x = i64::from(x) + i64::from(sx);
        let dest_y = i64::from(y) + i64::from(sy);
        if dest_x < 0 || dest_y < 0 || dest_x >= canvas_width || dest_y >= canvas_height {
            continue;
        }
        // Fully transparent source, skip
        if src[3] == 0 {
            continue;
        }

        let src_alpha = (f32::from(src[3]) / 255.0) * opacity;
        let dst = canvas.get_pixel(dest_x as u32, dest_y as u32);
        let blended = blend_over(src, dst, src_alpha);
        canvas.put_pixel(dest_x as u32, dest_y as u32, blended);
    }
}

/// Porter-Duff "source over" on straight-alpha pixels.
fn blend_over(src: &Rgba<u8>, dst: &Rgba<u8>, src_alpha: f32) -> Rgba<u8> {
    let dst_alpha = f32::from(dst[3]) / 255.0;
    let out_alpha = src_alpha + dst_alpha * (1.0 - src_alpha);
    if out_alpha == 0.0 {
        return TRANSPARENT;
    }

    let composite = |s: u8, d: u8| -> u8 {
        let s = f32::from(s) / 255.0;
        let d = f32::from(d) / 255.0;
        let result = (s * src_alpha + d * dst_alpha * (1.0 - src_alpha)) / out_alpha;
        (result.clamp(0.0, 1.0) * 255.0).round() as u8
    };

    Rgba([
        composite(src[0], dst[0]),
        composite(src[1], dst[1]),
        composite(src[2], dst[2]),
        (out_alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
    ])
}
