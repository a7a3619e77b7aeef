//! Decoded sprite document types (frames, layers, cels, tilesets, tags).

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use super::layer::{LayerFlags, LayerKind};

/// A layer of a sprite document.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub name: String,
    pub flags: LayerFlags,
    pub kind: LayerKind,
    /// Layer opacity (0-255)
    pub opacity: u8,
    /// Index of the group layer containing this one
    pub parent: Option<usize>,
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flags: LayerFlags::default(),
            kind: LayerKind::Image,
            opacity: 255,
            parent: None,
        }
    }
}

/// The pixels of one layer in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Cel {
    pub layer: usize,
    /// Offset of the cel image on the document canvas
    pub x: i32,
    pub y: i32,
    pub opacity: u8,
    pub image: RgbaImage,
}

impl Cel {
    pub fn new(layer: usize, image: RgbaImage) -> Self {
        Self { layer, x: 0, y: 0, opacity: 255, image }
    }

    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.x = x;
        self.y = y;
        self
    }
}

/// One animation frame of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentFrame {
    pub duration_ms: u32,
    pub cels: Vec<Cel>,
}

/// A tileset embedded in a document. Tiles are laid out row-major in `image`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tileset {
    pub id: u32,
    pub name: String,
    pub tile_width: u32,
    pub tile_height: u32,
    pub image: RgbaImage,
}

/// Playback direction of a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationDirection {
    #[default]
    Forward,
    Reverse,
    PingPong,
}

/// A named, inclusive frame range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub from: usize,
    pub to: usize,
    #[serde(default)]
    pub direction: AnimationDirection,
}

/// A decoded sprite document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpriteDocument {
    pub width: u32,
    pub height: u32,
    pub layers: Vec<Layer>,
    pub frames: Vec<DocumentFrame>,
    pub tilesets: Vec<Tileset>,
    pub tags: Vec<Tag>,
}

/// Key for looking up a tileset: dense index or unique name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TilesetKey<'a> {
    Index(usize),
    Name(&'a str),
}

impl From<usize> for TilesetKey<'_> {
    fn from(index: usize) -> Self {
        TilesetKey::Index(index)
    }
}

impl<'a> From<&'a str> for TilesetKey<'a> {
    fn from(name: &'a str) -> Self {
        TilesetKey::Name(name)
    }
}
