//! CLI dispatch for the `celpack atlas` and `celpack pack` commands.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use log::debug;

use crate::config::CelpackConfig;
use crate::export::{ExportOptions, Exporter, JsonExporter};
use crate::manifest::load_manifest;
use crate::models::Frame;
use crate::output::{image_output_path, metadata_path, metadata_path_beside, same_file, save_png};
use crate::processor::{AtlasProcessor, TextureAtlas};

use super::{find_png_files, is_png_file, resolve_config, PackArgs, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Execute the atlas command.
pub fn run_atlas(
    manifest: &Path,
    output: Option<&Path>,
    name: Option<&str>,
    config_path: Option<&Path>,
    pack: &PackArgs,
) -> ExitCode {
    let config = match resolve_config(config_path, &pack.overrides()) {
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

    let stem = manifest.file_stem().and_then(|s| s.to_str()).unwrap_or("atlas");
    let name = name.unwrap_or(stem);

    let atlas = match AtlasProcessor::new(config.atlas.clone()).process(&document, name) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let output_dir = config.output.dir.as_deref().map(dir_arg);
    let image_path = image_output_path(manifest, output.or(output_dir.as_deref()));
    let json_path = metadata_path_beside(&image_path, manifest);
    write_atlas(&atlas, &image_path, &json_path, &config)
}

/// Execute the pack command.
pub fn run_pack(
    inputs: &[PathBuf],
    output: Option<&Path>,
    config_path: Option<&Path>,
    pack: &PackArgs,
) -> ExitCode {
    let config = match resolve_config(config_path, &pack.overrides()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let image_path = match output {
        Some(path) => path.to_path_buf(),
        None => config.output.dir.clone().unwrap_or_default().join("atlas.png"),
    };

    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            files.extend(find_png_files(input));
        } else if is_png_file(input) {
            files.push(input.clone());
        } else {
            eprintln!("Error: '{}' is not a PNG file or directory", input.display());
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    }
    // A previous run's atlas is output, not input
    files.retain(|path| {
        let previous = same_file(path, &image_path);
        if previous {
            debug!("skipping '{}': it is the output atlas", path.display());
        }
        !previous
    });
    if files.is_empty() {
        eprintln!("Error: No PNG files found");
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    let mut frames = Vec::with_capacity(files.len());
    for path in &files {
        let image = match image::open(path) {
            Ok(img) => img.to_rgba8(),
            Err(e) => {
                eprintln!("Error: Cannot open '{}': {}", path.display(), e);
                return ExitCode::from(EXIT_ERROR);
            }
        };
        let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("frame");
        frames.push(Frame::new(name, image).with_source(path.display().to_string()));
    }

    let name = image_path.file_stem().and_then(|s| s.to_str()).unwrap_or("atlas").to_string();

    let atlas = match AtlasProcessor::new(config.atlas.clone()).process_frames(&frames, &name, vec![]) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let json_path = metadata_path(&image_path);
    write_atlas(&atlas, &image_path, &json_path, &config)
}

/// Treat a configured output directory as a directory argument
fn dir_arg(dir: &Path) -> PathBuf {
    let mut s = dir.as_os_str().to_os_string();
    if !s.to_string_lossy().ends_with('/') {
        s.push("/");
    }
    PathBuf::from(s)
}

/// Write the atlas PNG and, unless disabled, its JSON metadata.
fn write_atlas(
    atlas: &TextureAtlas,
    image_path: &Path,
    json_path: &Path,
    config: &CelpackConfig,
) -> ExitCode {
    if let Err(e) = save_png(atlas.image(), image_path) {
        eprintln!("Error: Failed to save '{}': {}", image_path.display(), e);
        return ExitCode::from(EXIT_ERROR);
    }
    eprintln!("Wrote: {}", image_path.display());

    if config.output.metadata {
        let image_name = image_path.file_name().and_then(|s| s.to_str()).unwrap_or("atlas.png");
        let options = ExportOptions { pretty: config.output.pretty };
        if let Err(e) = JsonExporter::new().export_atlas(atlas, image_name, json_path, &options) {
            eprintln!("Error: Failed to write '{}': {}", json_path.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
        eprintln!("Wrote: {}", json_path.display());
    }

    ExitCode::from(EXIT_SUCCESS)
}
