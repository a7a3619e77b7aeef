//! Frame type consumed by the packer and the tileset slicer.

use image::RgbaImage;

use super::layer::LayerInfo;

/// A decoded frame ready for packing.
///
/// `duration_ms` and the layer list are carried through from the source
/// document; only the layer list influences packing (through the layer
/// rules), the duration is passed to exporters untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub name: String,
    /// Where the frame came from (file path, document frame, tileset tile)
    pub source: String,
    pub image: RgbaImage,
    pub duration_ms: u32,
    /// Layers that contributed pixels to this frame; empty for plain images
    pub layers: Vec<LayerInfo>,
}

impl Frame {
    /// A plain image frame with no layer metadata.
    pub fn new(name: impl Into<String>, image: RgbaImage) -> Self {
        let name = name.into();
        Self { source: name.clone(), name, image, duration_ms: 100, layers: Vec::new() }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_duration(mut self, duration_ms: u32) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_layers(mut self, layers: Vec<LayerInfo>) -> Self {
        self.layers = layers;
        self
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
