//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod atlas;
mod tileset;

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use glob::glob;

use crate::config::{load_config, merge_cli_overrides, validate_config, CelpackConfig, CliOverrides};

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Check if a path is a PNG image.
pub fn is_png_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()).map(|e| e.eq_ignore_ascii_case("png")).unwrap_or(false)
}

/// Find all PNG files in a directory (recursively), sorted by path.
pub fn find_png_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = match glob(&format!("{}/**/*.png", dir.display())) {
        Ok(paths) => paths.filter_map(Result::ok).collect(),
        Err(_) => Vec::new(),
    };
    files.sort();
    files
}

/// Celpack - pack sprite document frames into texture atlases and tilesets
#[derive(Parser)]
#[command(name = "celpack")]
#[command(about = "Celpack - pack sprite frames into texture atlases and slice tilesets")]
#[command(version)]
pub struct Cli {
    /// Increase log output (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to celpack.toml (default: search upward from the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Packing flags shared by `atlas` and `pack`
#[derive(Args, Debug, Default, Clone)]
pub struct PackArgs {
    /// Transparent pixels around the whole atlas
    #[arg(long, allow_negative_numbers = true)]
    pub border_padding: Option<i32>,

    /// Transparent pixels between neighbouring frames
    #[arg(long, allow_negative_numbers = true)]
    pub spacing: Option<i32>,

    /// Transparent pixels around each frame inside its cell
    #[arg(long, allow_negative_numbers = true)]
    pub inner_padding: Option<i32>,

    /// Target atlas width; rows wrap before exceeding it
    #[arg(long)]
    pub max_width: Option<u32>,

    /// Keep pixel-identical frames as separate copies
    #[arg(long)]
    pub no_merge_duplicates: bool,

    /// Include hidden layers
    #[arg(long)]
    pub all_layers: bool,

    /// Exclude the background layer
    #[arg(long)]
    pub no_background: bool,

    /// Exclude tilemap layers
    #[arg(long)]
    pub no_tilemaps: bool,

    /// Force power-of-two atlas dimensions
    #[arg(long)]
    pub power_of_two: bool,

    /// Do not write JSON metadata
    #[arg(long)]
    pub no_metadata: bool,
}

impl PackArgs {
    /// Flags given on the command line, as config overrides
    pub fn overrides(&self) -> CliOverrides {
        let flag = |set: bool, value: bool| if set { Some(value) } else { None };
        CliOverrides {
            only_visible_layers: flag(self.all_layers, false),
            include_background_layer: flag(self.no_background, false),
            include_tilemap_layers: flag(self.no_tilemaps, false),
            merge_duplicates: flag(self.no_merge_duplicates, false),
            border_padding: self.border_padding,
            spacing: self.spacing,
            inner_padding: self.inner_padding,
            max_width: self.max_width,
            power_of_two: flag(self.power_of_two, true),
            metadata: flag(self.no_metadata, false),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Pack every frame of a document manifest into one atlas
    Atlas {
        /// Document manifest (.json) describing layers, frames and cel images
        manifest: PathBuf,

        /// Output PNG file or directory (ends with /).
        /// If omitted: {manifest}.png next to the manifest
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Atlas name used for region names (default: manifest file stem)
        #[arg(short, long)]
        name: Option<String>,

        #[command(flatten)]
        pack: PackArgs,
    },
    /// Pack loose PNG images (files or directories) into one atlas
    Pack {
        /// PNG files or directories to search recursively
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output PNG file (default: atlas.png in the configured output directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        pack: PackArgs,
    },
    /// Extract a tileset from a document manifest
    Tileset {
        /// Document manifest (.json)
        manifest: PathBuf,

        /// Tileset index
        #[arg(long, conflicts_with = "name")]
        index: Option<usize>,

        /// Tileset name
        #[arg(long)]
        name: Option<String>,

        /// Output PNG file or directory (default: {tileset}.png next to the manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write every tile as its own PNG into this directory
        #[arg(long)]
        tiles: Option<PathBuf>,

        /// Do not write JSON metadata
        #[arg(long)]
        no_metadata: bool,
    },
    /// Split a PNG into fixed-size tiles
    Slice {
        /// Input PNG
        input: PathBuf,

        /// Tile size as WxH (e.g., 16x16)
        #[arg(long)]
        tile: String,

        /// Output directory (default: {input}_tiles/ next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Initialize `env_logger` from the verbosity count; `RUST_LOG` wins.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}

/// Load celpack.toml, apply command-line overrides, then validate.
pub(crate) fn resolve_config(
    path: Option<&Path>,
    overrides: &CliOverrides,
) -> Result<CelpackConfig, crate::config::ConfigError> {
    let mut config = load_config(path)?;
    merge_cli_overrides(&mut config, overrides);
    validate_config(&config)?;
    Ok(config)
}

/// Parse a `WxH` size argument.
pub(crate) fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        return Err(format!("Invalid size format '{}'. Use WxH (e.g., 16x16)", s));
    }
    let w = parts[0].trim().parse::<u32>().map_err(|_| format!("Invalid width in '{}'", s))?;
    let h = parts[1].trim().parse::<u32>().map_err(|_| format!("Invalid height in '{}'", s))?;
    Ok((w, h))
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Atlas { manifest, output, name, pack } => {
            atlas::run_atlas(&manifest, output.as_deref(), name.as_deref(), config_path, &pack)
        }
        Commands::Pack { inputs, output, pack } => {
            atlas::run_pack(&inputs, output.as_deref(), config_path, &pack)
        }
        Commands::Tileset { manifest, index, name, output, tiles, no_metadata } => {
            tileset::run_tileset(
                &manifest,
                index,
                name.as_deref(),
                output.as_deref(),
                tiles.as_deref(),
                no_metadata,
                config_path,
            )
        }
        Commands::Slice { input, tile, output } => {
            tileset::run_slice(&input, &tile, output.as_deref())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("16x8"), Ok((16, 8)));
        assert!(parse_size("16").is_err());
        assert!(parse_size("ax8").is_err());
    }

    #[test]
    fn test_negative_padding_reaches_overrides() {
        let cli = Cli::try_parse_from(["celpack", "pack", "a.png", "--spacing", "-1", "--no-metadata"])
            .unwrap();
        match cli.command {
            Commands::Pack { pack, .. } => {
                let overrides = pack.overrides();
                assert_eq!(overrides.spacing, Some(-1));
                assert_eq!(overrides.metadata, Some(false));
                assert_eq!(overrides.merge_duplicates, None);
            }
            _ => panic!("expected pack command"),
        }
    }

    #[test]
    fn test_is_png_file() {
        assert!(is_png_file(Path::new("a/b.png")));
        assert!(is_png_file(Path::new("B.PNG")));
        assert!(!is_png_file(Path::new("b.json")));
    }
}
