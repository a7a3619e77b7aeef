//! Export formats for atlas and tileset metadata.
//!
//! The packed image is written as PNG by [`crate::output`]; exporters write
//! the description that lets an engine find each sub-image or tile in it.
//!
//! # Supported Formats
//!
//! - **JSON**: frame rectangles, durations, animations and tile grids
//!
//! # Example
//!
//! ```ignore
//! use celpack::export::{ExportOptions, Exporter, JsonExporter};
//!
//! let exporter = JsonExporter::new();
//! exporter.export_atlas(&atlas, "hero.png", Path::new("hero.json"), &ExportOptions::default())?;
//! ```

pub mod json;

pub use json::*;

use std::path::Path;
use thiserror::Error;

use crate::processor::{TextureAtlas, TilesetTexture};

/// Common error type for export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// IO error during file writing
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for export operations
pub type Result<T> = std::result::Result<T, ExportError>;

/// Options for export operations.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Pretty print output (with indentation)
    pub pretty: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self { pretty: true }
    }
}

/// Trait for export format implementations.
pub trait Exporter {
    /// Export atlas metadata; `image_name` is how the metadata refers to the PNG.
    fn export_atlas(
        &self,
        atlas: &TextureAtlas,
        image_name: &str,
        output_path: &Path,
        options: &ExportOptions,
    ) -> Result<()>;

    /// Export tileset metadata.
    fn export_tileset(
        &self,
        tileset: &TilesetTexture,
        image_name: &str,
        output_path: &Path,
        options: &ExportOptions,
    ) -> Result<()>;

    /// Get the format name for this exporter.
    fn format_name(&self) -> &'static str;

    /// Get the default file extension for this format.
    fn extension(&self) -> &'static str;
}

/// Write `contents` to `path`, creating parent directories.
pub(crate) fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, contents)?;
    Ok(())
}
