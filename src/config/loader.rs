//! Configuration loading and discovery for `celpack.toml`

use super::schema::CelpackConfig;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file
pub const CONFIG_FILE: &str = "celpack.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse celpack.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub only_visible_layers: Option<bool>,
    pub include_background_layer: Option<bool>,
    pub include_tilemap_layers: Option<bool>,
    pub merge_duplicates: Option<bool>,
    pub border_padding: Option<i32>,
    pub spacing: Option<i32>,
    pub inner_padding: Option<i32>,
    pub max_width: Option<u32>,
    pub power_of_two: Option<bool>,
    pub metadata: Option<bool>,
}

/// Find celpack.toml by walking up from the current working directory.
pub fn find_config() -> Option<PathBuf> {
    env::current_dir().ok().and_then(find_config_from)
}

/// Find celpack.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from `path`, or from a discovered celpack.toml, or
/// fall back to defaults when neither exists.
pub fn load_config(path: Option<&Path>) -> Result<CelpackConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => {
            log::debug!("loading config from {}", p.display());
            load_config_file(&p)
        }
        None => Ok(CelpackConfig::default()),
    }
}

/// Load configuration from a specific file path.
///
/// Values are not validated here; call [`validate_config`] once command-line
/// overrides have been merged.
fn load_config_file(path: &Path) -> Result<CelpackConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    Ok(toml::from_str(&contents)?)
}

/// Reject a configuration with invalid values, listing every problem.
pub fn validate_config(config: &CelpackConfig) -> Result<(), ConfigError> {
    let errors = config.validate();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()))
    }
}

/// Merge CLI overrides into a configuration. CLI arguments win.
pub fn merge_cli_overrides(config: &mut CelpackConfig, overrides: &CliOverrides) {
    let atlas = &mut config.atlas;
    if let Some(v) = overrides.only_visible_layers {
        atlas.only_visible_layers = v;
    }
    if let Some(v) = overrides.include_background_layer {
        atlas.include_background_layer = v;
    }
    if let Some(v) = overrides.include_tilemap_layers {
        atlas.include_tilemap_layers = v;
    }
    if let Some(v) = overrides.merge_duplicates {
        atlas.merge_duplicates = v;
    }
    if let Some(v) = overrides.border_padding {
        atlas.border_padding = v;
    }
    if let Some(v) = overrides.spacing {
        atlas.spacing = v;
    }
    if let Some(v) = overrides.inner_padding {
        atlas.inner_padding = v;
    }
    if let Some(v) = overrides.max_width {
        atlas.max_width = Some(v);
    }
    if let Some(v) = overrides.power_of_two {
        atlas.power_of_two = v;
    }
    if let Some(v) = overrides.metadata {
        config.output.metadata = v;
    }
}
