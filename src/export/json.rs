//! Generic JSON export format.
//!
//! # Atlas Output
//!
//! ```json
//! {
//!   "image": "hero.png",
//!   "size": [64, 32],
//!   "padding": { "border": 1, "spacing": 1, "inner": 0 },
//!   "frames": [
//!     { "name": "hero 0", "index": 0, "x": 1, "y": 1, "w": 16, "h": 16, "duration": 100, "instance": 0 }
//!   ],
//!   "animations": {
//!     "walk": { "from": 0, "to": 3, "direction": "forward", "frames": ["hero 0", "hero 1"] }
//!   }
//! }
//! ```
//!
//! Frames are listed in input order; merged duplicates appear once per
//! original frame and share `x`/`y`/`instance`.
//!
//! # Tileset Output
//!
//! ```json
//! { "image": "ground.png", "name": "ground", "id": 0, "tile_width": 16, "tile_height": 16,
//!   "columns": 1, "rows": 8, "tile_count": 8 }
//! ```

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::export::{write_file, ExportOptions, Exporter, Result};
use crate::models::AnimationDirection;
use crate::processor::{TextureAtlas, TilesetTexture};

/// Padding values used to build an atlas
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PaddingMetadata {
    pub border: u32,
    pub spacing: u32,
    pub inner: u32,
}

/// A frame's position and size within an atlas
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FrameMetadata {
    pub name: String,
    /// Original frame index
    pub index: usize,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    /// Frame duration in milliseconds
    pub duration: u32,
    pub instance: usize,
}

/// Animation metadata built from a tag
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AnimationMetadata {
    pub from: usize,
    pub to: usize,
    pub direction: AnimationDirection,
    /// Names of the packed frames in the tag's range
    pub frames: Vec<String>,
}

/// Complete atlas metadata
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AtlasMetadata {
    pub image: String,
    pub size: [u32; 2],
    pub padding: PaddingMetadata,
    pub frames: Vec<FrameMetadata>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub animations: BTreeMap<String, AnimationMetadata>,
}

impl AtlasMetadata {
    pub fn from_atlas(atlas: &TextureAtlas, image_name: &str) -> Self {
        let packed = &atlas.atlas;
        let frames: Vec<FrameMetadata> = packed
            .regions
            .iter()
            .zip(&atlas.durations)
            .map(|(region, &duration)| FrameMetadata {
                name: region.name.clone(),
                index: region.frame_index,
                x: region.x,
                y: region.y,
                w: region.width,
                h: region.height,
                duration,
                instance: region.instance,
            })
            .collect();

        let animations = atlas
            .tags
            .iter()
            .map(|tag| {
                let names = frames
                    .iter()
                    .filter(|f| f.index >= tag.from && f.index <= tag.to)
                    .map(|f| f.name.clone())
                    .collect();
                (
                    tag.name.clone(),
                    AnimationMetadata { from: tag.from, to: tag.to, direction: tag.direction, frames: names },
                )
            })
            .collect();

        Self {
            image: image_name.to_string(),
            size: [packed.width(), packed.height()],
            padding: PaddingMetadata {
                border: packed.border_padding,
                spacing: packed.spacing,
                inner: packed.inner_padding,
            },
            frames,
            animations,
        }
    }
}

/// Tileset texture metadata
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TilesetMetadata {
    pub image: String,
    pub name: String,
    pub id: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub columns: u32,
    pub rows: u32,
    pub tile_count: u32,
}

impl TilesetMetadata {
    pub fn from_tileset(tileset: &TilesetTexture, image_name: &str) -> Self {
        Self {
            image: image_name.to_string(),
            name: tileset.name.clone(),
            id: tileset.id,
            tile_width: tileset.grid.tile_width,
            tile_height: tileset.grid.tile_height,
            columns: tileset.grid.columns,
            rows: tileset.grid.rows,
            tile_count: tileset.grid.tile_count(),
        }
    }
}

/// JSON format exporter.
#[derive(Debug, Default)]
pub struct JsonExporter;

impl JsonExporter {
    /// Create a new JSON exporter.
    pub fn new() -> Self {
        Self
    }

    fn to_json<T: Serialize>(value: &T, options: &ExportOptions) -> Result<String> {
        let json = if options.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(json)
    }

    /// Export atlas metadata to a JSON string.
    pub fn atlas_to_string(
        &self,
        atlas: &TextureAtlas,
        image_name: &str,
        options: &ExportOptions,
    ) -> Result<String> {
        Self::to_json(&AtlasMetadata::from_atlas(atlas, image_name), options)
    }

    /// Export tileset metadata to a JSON string.
    pub fn tileset_to_string(
        &self,
        tileset: &TilesetTexture,
        image_name: &str,
        options: &ExportOptions,
    ) -> Result<String> {
        Self::to_json(&TilesetMetadata::from_tileset(tileset, image_name), options)
    }
}

impl Exporter for JsonExporter {
    fn export_atlas(
        &self,
        atlas: &TextureAtlas,
        image_name: &str,
        output_path: &Path,
        options: &ExportOptions,
    ) -> Result<()> {
        let json = self.atlas_to_string(atlas, image_name, options)?;
        write_file(output_path, &json)
    }

    fn export_tileset(
        &self,
        tileset: &TilesetTexture,
        image_name: &str,
        output_path: &Path,
        options: &ExportOptions,
    ) -> Result<()> {
        let json = self.tileset_to_string(tileset, image_name, options)?;
        write_file(output_path, &json)
    }

    fn format_name(&self) -> &'static str {
        "json"
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}
