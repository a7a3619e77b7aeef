//! Packing configuration.

use serde::{Deserialize, Serialize};

use crate::error::PackError;

/// Options controlling which frames are packed and how they are spaced.
///
/// Padding values are signed so that a negative value coming from a config
/// file or the command line reaches [`PackingConfig::validate`] and is
/// reported, rather than being rejected by the parser with a less useful
/// message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackingConfig {
    /// Drop layers that are hidden (directly or through a parent group)
    pub only_visible_layers: bool,
    /// Keep layers flagged as the background layer
    pub include_background_layer: bool,
    /// Keep tilemap layers
    pub include_tilemap_layers: bool,
    /// Collapse pixel-identical frames into one packed instance
    pub merge_duplicates: bool,
    /// Transparent pixels around the whole atlas
    pub border_padding: i32,
    /// Transparent pixels between neighbouring cells
    pub spacing: i32,
    /// Transparent pixels around each frame inside its cell
    pub inner_padding: i32,
    /// Target atlas width; shelves wrap before exceeding it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_width: Option<u32>,
    /// Round atlas dimensions up to powers of two
    pub power_of_two: bool,
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            only_visible_layers: true,
            include_background_layer: true,
            include_tilemap_layers: true,
            merge_duplicates: true,
            border_padding: 0,
            spacing: 0,
            inner_padding: 0,
            max_width: None,
            power_of_two: false,
        }
    }
}

/// Padding values after validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Padding {
    pub border: u32,
    pub spacing: u32,
    pub inner: u32,
}

impl PackingConfig {
    /// Check padding values, returning them as unsigned amounts.
    pub(crate) fn padding(&self) -> Result<Padding, PackError> {
        let check = |name: &str, value: i32| -> Result<u32, PackError> {
            u32::try_from(value).map_err(|_| {
                PackError::ConfigurationError(format!("{} must not be negative (got {})", name, value))
            })
        };
        let padding = Padding {
            border: check("border_padding", self.border_padding)?,
            spacing: check("spacing", self.spacing)?,
            inner: check("inner_padding", self.inner_padding)?,
        };
        if let Some(max_width) = self.max_width {
            if max_width <= padding.border.saturating_mul(2) {
                return Err(PackError::ConfigurationError(format!(
                    "max_width ({}) leaves no room inside a border of {}",
                    max_width, padding.border
                )));
            }
        }
        Ok(padding)
    }

    /// Validate the configuration without packing anything.
    pub fn validate(&self) -> Result<(), PackError> {
        self.padding().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(PackingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_negative_values_rejected() {
        for config in [
            PackingConfig { border_padding: -1, ..Default::default() },
            PackingConfig { spacing: -2, ..Default::default() },
            PackingConfig { inner_padding: -3, ..Default::default() },
        ] {
            assert!(matches!(config.validate(), Err(PackError::ConfigurationError(_))));
        }
    }

    #[test]
    fn test_max_width_must_fit_border() {
        let config = PackingConfig { border_padding: 4, max_width: Some(8), ..Default::default() };
        assert!(matches!(config.validate(), Err(PackError::ConfigurationError(_))));
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let config: PackingConfig = toml::from_str("spacing = 2\nmerge_duplicates = false").unwrap();
        assert_eq!(config.spacing, 2);
        assert!(!config.merge_duplicates);
        assert!(config.only_visible_layers);
        assert_eq!(config.max_width, None);
    }
}
