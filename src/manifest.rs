//! JSON document manifests.
//!
//! A manifest describes a sprite document whose cel and tileset images are
//! PNG files next to it:
//!
//! ```json
//! {
//!   "width": 16,
//!   "height": 16,
//!   "layers": [
//!     { "name": "background", "background": true },
//!     { "name": "body" },
//!     { "name": "sketch", "visible": false }
//!   ],
//!   "frames": [
//!     { "duration": 100, "cels": [{ "layer": 1, "image": "body_0.png", "x": 2, "y": 0 }] }
//!   ],
//!   "tilesets": [
//!     { "name": "ground", "tile_width": 8, "tile_height": 8, "image": "ground.png" }
//!   ],
//!   "tags": [{ "name": "idle", "from": 0, "to": 0 }]
//! }
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{
    Cel, DocumentFrame, Layer, LayerFlags, LayerKind, SpriteDocument, Tag, Tileset,
};

/// Error loading a manifest
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid manifest JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Cannot decode image '{}': {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Invalid manifest: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
struct ManifestFile {
    width: u32,
    height: u32,
    #[serde(default)]
    layers: Vec<ManifestLayer>,
    #[serde(default)]
    frames: Vec<ManifestFrame>,
    #[serde(default)]
    tilesets: Vec<ManifestTileset>,
    #[serde(default)]
    tags: Vec<Tag>,
}

#[derive(Debug, Deserialize)]
struct ManifestLayer {
    name: String,
    #[serde(flatten)]
    flags: LayerFlags,
    #[serde(default)]
    kind: LayerKind,
    #[serde(default = "opaque")]
    opacity: u8,
    #[serde(default)]
    parent: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct ManifestFrame {
    #[serde(default = "default_duration")]
    duration: u32,
    #[serde(default)]
    cels: Vec<ManifestCel>,
}

#[derive(Debug, Deserialize)]
struct ManifestCel {
    layer: usize,
    image: PathBuf,
    #[serde(default)]
    x: i32,
    #[serde(default)]
    y: i32,
    #[serde(default = "opaque")]
    opacity: u8,
}

#[derive(Debug, Deserialize)]
struct ManifestTileset {
    #[serde(default)]
    id: Option<u32>,
    name: String,
    tile_width: u32,
    tile_height: u32,
    image: PathBuf,
}

fn opaque() -> u8 {
    255
}

fn default_duration() -> u32 {
    100
}

/// Load a manifest and every image it references.
pub fn load_manifest(path: &Path) -> Result<SpriteDocument, ManifestError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|source| ManifestError::Io { path: path.to_path_buf(), source })?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    parse_manifest(&contents, base_dir)
}

/// Parse manifest JSON, resolving image paths against `base_dir`.
pub fn parse_manifest(json: &str, base_dir: &Path) -> Result<SpriteDocument, ManifestError> {
    let manifest: ManifestFile = serde_json::from_str(json)?;
    validate(&manifest)?;

    let layers = manifest
        .layers
        .into_iter()
        .map(|l| Layer { name: l.name, flags: l.flags, kind: l.kind, opacity: l.opacity, parent: l.parent })
        .collect();

    let mut frames = Vec::with_capacity(manifest.frames.len());
    for frame in manifest.frames {
        let mut cels = Vec::with_capacity(frame.cels.len());
        for cel in frame.cels {
            cels.push(Cel {
                layer: cel.layer,
                x: cel.x,
                y: cel.y,
                opacity: cel.opacity,
                image: load_image(&base_dir.join(&cel.image))?,
            });
        }
        frames.push(DocumentFrame { duration_ms: frame.duration, cels });
    }

    let mut tilesets = Vec::with_capacity(manifest.tilesets.len());
    for (index, tileset) in manifest.tilesets.into_iter().enumerate() {
        tilesets.push(Tileset {
            id: tileset.id.unwrap_or(index as u32),
            name: tileset.name,
            tile_width: tileset.tile_width,
            tile_height: tileset.tile_height,
            image: load_image(&base_dir.join(&tileset.image))?,
        });
    }

    Ok(SpriteDocument {
        width: manifest.width,
        height: manifest.height,
        layers,
        frames,
        tilesets,
        tags: manifest.tags,
    })
}

fn load_image(path: &Path) -> Result<image::RgbaImage, ManifestError> {
    let image = image::open(path)
        .map_err(|source| ManifestError::Image { path: path.to_path_buf(), source })?;
    Ok(image.to_rgba8())
}

/// A single path component: non-empty, no separators, not `.` or `..`
fn is_file_stem(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\', '\0'])
}

/// Check cross references before any image is loaded
fn validate(manifest: &ManifestFile) -> Result<(), ManifestError> {
    let layer_count = manifest.layers.len();
    let mut errors = Vec::new();

    for (i, layer) in manifest.layers.iter().enumerate() {
        if let Some(parent) = layer.parent {
            match manifest.layers.get(parent) {
                None => errors.push(format!("layer '{}' has unknown parent {}", layer.name, parent)),
                Some(p) if p.kind != LayerKind::Group => {
                    errors.push(format!("layer '{}' has parent '{}' which is not a group", layer.name, p.name))
                }
                Some(_) if parent == i => errors.push(format!("layer '{}' is its own parent", layer.name)),
                Some(_) => {}
            }
        }
    }

    for (i, frame) in manifest.frames.iter().enumerate() {
        for cel in &frame.cels {
            if cel.layer >= layer_count {
                errors.push(format!("frame {} has a cel on unknown layer {}", i, cel.layer));
            }
        }
    }

    for tag in &manifest.tags {
        if tag.from > tag.to || tag.to >= manifest.frames.len() {
            errors.push(format!(
                "tag '{}' range {}..={} is outside {} frames",
                tag.name,
                tag.from,
                tag.to,
                manifest.frames.len()
            ));
        }
    }

    // Tileset names become output file names
    for tileset in &manifest.tilesets {
        if !is_file_stem(&tileset.name) {
            errors.push(format!("tileset name '{}' cannot be used as a file name", tileset.name));
        }
    }

    let mut names: Vec<&str> = manifest.tilesets.iter().map(|t| t.name.as_str()).collect();
    names.sort_unstable();
    if let Some(pair) = names.windows(2).find(|w| w[0] == w[1]) {
        errors.push(format!("tileset name '{}' is used more than once", pair[0]));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ManifestError::Invalid(errors.join("; ")))
    }
}
