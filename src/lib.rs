//! Celpack - Library for packing sprite document frames into texture atlases
//!
//! This library provides functionality to:
//! - Pack frames into a single atlas with shelf packing and duplicate merging
//! - Filter frames by layer visibility, background and tilemap rules
//! - Slice tileset images into row-major tiles
//! - Export atlas and tileset metadata as JSON

pub mod atlas;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod manifest;
pub mod models;
pub mod output;
pub mod processor;
pub mod tileset;

pub use atlas::{pack, PackedAtlas, Region};
pub use error::PackError;
pub use models::{Frame, PackingConfig};
pub use tileset::slice;
