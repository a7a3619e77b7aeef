//! Adapters turning sprite documents into engine-ready textures.
//!
//! [`AtlasProcessor`] flattens every frame of a document and packs them into
//! a [`TextureAtlas`] whose regions are named sub-images. [`TilesetProcessor`]
//! takes one tileset out of a document and wraps its pixels with tile-grid
//! metadata; the tileset image is copied as-is, never repacked.

use image::RgbaImage;
use log::info;

use crate::atlas::{pack, PackedAtlas, Region};
use crate::error::PackError;
use crate::models::{Frame, PackingConfig, SpriteDocument, Tag, TilesetKey};
use crate::tileset::{slice, TilesetGrid};

/// A packed atlas with named regions, ready to upload as one texture.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureAtlas {
    pub name: String,
    pub atlas: PackedAtlas,
    /// Duration of each packed region, parallel to `atlas.regions`
    pub durations: Vec<u32>,
    pub tags: Vec<Tag>,
}

impl TextureAtlas {
    pub fn image(&self) -> &RgbaImage {
        &self.atlas.image
    }

    pub fn regions(&self) -> &[Region] {
        &self.atlas.regions
    }

    /// Region by its sub-image name, e.g. `"hero 3"`.
    pub fn region(&self, name: &str) -> Option<&Region> {
        self.atlas.region_by_name(name)
    }

    /// Region of an original document frame.
    pub fn region_at(&self, frame_index: usize) -> Option<&Region> {
        self.atlas.region(frame_index)
    }
}

/// Name given to the sub-image of a document frame.
pub fn region_name(atlas_name: &str, frame_index: usize) -> String {
    format!("{} {}", atlas_name, frame_index)
}

/// Builds a [`TextureAtlas`] from every frame of a document.
#[derive(Debug, Default)]
pub struct AtlasProcessor {
    pub config: PackingConfig,
}

impl AtlasProcessor {
    pub fn new(config: PackingConfig) -> Self {
        Self { config }
    }

    pub fn process(&self, document: &SpriteDocument, name: &str) -> Result<TextureAtlas, PackError> {
        self.config.validate()?;
        let frames: Vec<Frame> = document
            .flatten_frames(&self.config)?
            .into_iter()
            .enumerate()
            .map(|(index, mut frame)| {
                frame.name = region_name(name, index);
                frame.source = format!("{}#{}", name, index);
                frame
            })
            .collect();

        self.process_frames(&frames, name, document.tags.clone())
    }

    /// Pack already decoded frames (loose images, slices, ...).
    pub fn process_frames(
        &self,
        frames: &[Frame],
        name: &str,
        tags: Vec<Tag>,
    ) -> Result<TextureAtlas, PackError> {
        let atlas = pack(frames, &self.config)?;
        let durations = atlas.regions.iter().map(|r| frames[r.frame_index].duration_ms).collect();

        info!(
            "atlas '{}': {} regions, {} unique, {}x{}",
            name,
            atlas.regions.len(),
            atlas.instance_count,
            atlas.width(),
            atlas.height()
        );

        Ok(TextureAtlas { name: name.to_string(), atlas, durations, tags })
    }
}

/// A tileset texture plus its tile grid.
#[derive(Debug, Clone, PartialEq)]
pub struct TilesetTexture {
    pub id: u32,
    pub name: String,
    pub grid: TilesetGrid,
    /// The tileset's pixel buffer, unchanged
    pub image: RgbaImage,
    /// Individual tiles, row-major
    pub tiles: Vec<Frame>,
}

impl TilesetTexture {
    pub fn tile(&self, n: usize) -> Result<&Frame, PackError> {
        self.tiles.get(n).ok_or(PackError::IndexOutOfRange { index: n, len: self.tiles.len() })
    }
}

/// Extracts one tileset of a document.
#[derive(Debug, Default)]
pub struct TilesetProcessor;

impl TilesetProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Look up the tileset by index or name and wrap it with its tile grid.
    pub fn process<'a>(
        &self,
        document: &SpriteDocument,
        key: impl Into<TilesetKey<'a>>,
    ) -> Result<TilesetTexture, PackError> {
        let tileset = document.tileset(key)?;
        let source = Frame::new(tileset.name.clone(), tileset.image.clone());
        let tiles = slice(&source, tileset.tile_width, tileset.tile_height)?;
        let grid = TilesetGrid::new(
            tileset.image.width(),
            tileset.image.height(),
            tileset.tile_width,
            tileset.tile_height,
        )?;

        info!(
            "tileset '{}': {} tiles of {}x{}",
            tileset.name,
            grid.tile_count(),
            grid.tile_width,
            grid.tile_height
        );

        Ok(TilesetTexture {
            id: tileset.id,
            name: tileset.name.clone(),
            grid,
            image: source.image,
            tiles,
        })
    }
}
