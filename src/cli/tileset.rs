//! CLI dispatch for the `celpack tileset` and `celpack slice` commands.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::CliOverrides;
use crate::export::{ExportOptions, Exporter, JsonExporter};
use crate::manifest::load_manifest;
use crate::models::{Frame, TilesetKey};
use crate::output::{image_output_path, metadata_path_beside, save_png, tile_output_path};
use crate::processor::TilesetProcessor;
use crate::tileset::slice;

use super::{parse_size, resolve_config, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Write each frame as `{dir}/{frame name}.png`.
fn write_tiles(tiles: &[Frame], dir: &Path) -> Result<(), ExitCode> {
    for tile in tiles {
        let path = tile_output_path(dir, &tile.name);
        if let Err(e) = save_png(&tile.image, &path) {
            eprintln!("Error: Failed to save '{}': {}", path.display(), e);
            return Err(ExitCode::from(EXIT_ERROR));
        }
    }
    eprintln!("Wrote: {} tiles to {}", tiles.len(), dir.display());
    Ok(())
}

/// Execute the tileset command.
pub fn run_tileset(
    manifest: &Path,
    index: Option<usize>,
    name: Option<&str>,
    output: Option<&Path>,
    tiles_dir: Option<&Path>,
    no_metadata: bool,
    config_path: Option<&Path>,
) -> ExitCode {
    let key = match (index, name) {
        (Some(i), _) => TilesetKey::Index(i),
        (None, Some(n)) => TilesetKey::Name(n),
        (None, None) => {
            eprintln!("Error: one of --index or --name is required");
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let overrides = CliOverrides { metadata: no_metadata.then_some(false), ..Default::default() };
    let config = match resolve_config(config_path, &overrides) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let document = match load_manifest(manifest) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let texture = match TilesetProcessor::new().process(&document, key) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error: {}", e);
            if !document.tilesets.is_empty() {
                eprintln!("Available tilesets:");
                for (i, t) in document.tilesets.iter().enumerate() {
                    eprintln!("  {}: {}", i, t.name);
                }
            }
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let default_input = manifest.with_file_name(format!("{}.json", texture.name));
    let image_path = image_output_path(&default_input, output);
    if let Err(e) = save_png(&texture.image, &image_path) {
        eprintln!("Error: Failed to save '{}': {}", image_path.display(), e);
        return ExitCode::from(EXIT_ERROR);
    }
    eprintln!("Wrote: {}", image_path.display());

    if config.output.metadata {
        let json_path = metadata_path_beside(&image_path, manifest);
        let image_name = image_path.file_name().and_then(|s| s.to_str()).unwrap_or("tileset.png");
        let options = ExportOptions { pretty: config.output.pretty };
        if let Err(e) = JsonExporter::new().export_tileset(&texture, image_name, &json_path, &options) {
            eprintln!("Error: Failed to write '{}': {}", json_path.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
        eprintln!("Wrote: {}", json_path.display());
    }

    if let Some(dir) = tiles_dir {
        if let Err(code) = write_tiles(&texture.tiles, dir) {
            return code;
        }
    }

    ExitCode::from(EXIT_SUCCESS)
}

/// Execute the slice command.
pub fn run_slice(input: &Path, tile: &str, output: Option<&Path>) -> ExitCode {
    let (tile_width, tile_height) = match parse_size(tile) {
        Ok(size) => size,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let image = match image::open(input) {
        Ok(img) => img.to_rgba8(),
        Err(e) => {
            eprintln!("Error: Cannot open '{}': {}", input.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("tile");
    let source = Frame::new(stem, image).with_source(input.display().to_string());
    let tiles = match slice(&source, tile_width, tile_height) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let dir: PathBuf = match output {
        Some(dir) => dir.to_path_buf(),
        None => input.with_file_name(format!("{}_tiles", stem)),
    };
    match write_tiles(&tiles, &dir) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(code) => code,
    }
}
