//! Configuration schema types for `celpack.toml`
//!
//! ```toml
//! [atlas]
//! merge_duplicates = true
//! border_padding = 1
//! spacing = 1
//! inner_padding = 0
//! max_width = 1024
//!
//! [output]
//! dir = "build"
//! metadata = true
//! pretty = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::PackingConfig;

/// Where and how results are written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output directory used when `-o` is not given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    /// Write JSON metadata next to each image
    pub metadata: bool,
    /// Pretty-print JSON metadata
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { dir: None, metadata: true, pretty: true }
    }
}

/// Root of `celpack.toml`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CelpackConfig {
    pub atlas: PackingConfig,
    pub output: OutputConfig,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "atlas.spacing")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "celpack.toml: '{}' {}", self.field, self.message)
    }
}

impl CelpackConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        for (field, value) in [
            ("atlas.border_padding", self.atlas.border_padding),
            ("atlas.spacing", self.atlas.spacing),
            ("atlas.inner_padding", self.atlas.inner_padding),
        ] {
            if value < 0 {
                errors.push(ConfigValidationError {
                    field: field.to_string(),
                    message: format!("must not be negative (got {})", value),
                });
            }
        }

        if self.atlas.max_width == Some(0) {
            errors.push(ConfigValidationError {
                field: "atlas.max_width".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: CelpackConfig = toml::from_str("").unwrap();
        assert_eq!(config, CelpackConfig::default());
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_full_config() {
        let config: CelpackConfig = toml::from_str(
            r#"
            [atlas]
            only_visible_layers = false
            merge_duplicates = false
            border_padding = 2
            spacing = 1
            inner_padding = 1
            max_width = 512
            power_of_two = true

            [output]
            dir = "build"
            metadata = false
            "#,
        )
        .unwrap();

        assert!(!config.atlas.only_visible_layers);
        assert_eq!(config.atlas.border_padding, 2);
        assert_eq!(config.atlas.max_width, Some(512));
        assert!(config.atlas.power_of_two);
        assert_eq!(config.output.dir, Some(PathBuf::from("build")));
        assert!(!config.output.metadata);
        assert!(config.output.pretty);
    }

    #[test]
    fn test_validate_reports_each_field() {
        let mut config = CelpackConfig::default();
        config.atlas.spacing = -1;
        config.atlas.inner_padding = -2;
        config.atlas.max_width = Some(0);

        let errors = config.validate();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["atlas.spacing", "atlas.inner_padding", "atlas.max_width"]);
        assert!(errors[0].to_string().starts_with("celpack.toml: 'atlas.spacing'"));
    }
}
