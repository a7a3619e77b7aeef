//! Data models for frames, layers, packing options and sprite documents

mod document;
mod frame;
mod layer;
mod packing;

// Re-export all public types
pub use document::{
    AnimationDirection, Cel, DocumentFrame, Layer, SpriteDocument, Tag, Tileset, TilesetKey,
};
pub use frame::Frame;
pub use layer::{LayerFlags, LayerInfo, LayerKind};
pub(crate) use packing::Padding;
pub use packing::PackingConfig;

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_frame_builders() {
        let frame = Frame::new("idle", RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 255])))
            .with_source("hero.json#0")
            .with_duration(80)
            .with_layers(vec![LayerInfo::new("body")]);
        assert_eq!(frame.name, "idle");
        assert_eq!(frame.source, "hero.json#0");
        assert_eq!(frame.duration_ms, 80);
        assert_eq!((frame.width(), frame.height()), (3, 2));
        assert_eq!(frame.layers.len(), 1);
    }

    #[test]
    fn test_tileset_key_conversions() {
        assert_eq!(TilesetKey::from(2usize), TilesetKey::Index(2));
        assert_eq!(TilesetKey::from("ground"), TilesetKey::Name("ground"));
    }

    #[test]
    fn test_tag_direction_default() {
        let tag: Tag = serde_json::from_str(r#"{"name": "walk", "from": 0, "to": 3}"#).unwrap();
        assert_eq!(tag.direction, AnimationDirection::Forward);

        let tag: Tag =
            serde_json::from_str(r#"{"name": "bob", "from": 1, "to": 2, "direction": "ping_pong"}"#)
                .unwrap();
        assert_eq!(tag.direction, AnimationDirection::PingPong);
    }
}
