//! Layer metadata shared by documents and frames.

use serde::{Deserialize, Serialize};

use super::packing::PackingConfig;

/// What a layer holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    /// Regular pixel layer
    #[default]
    Image,
    /// Folder of other layers; has no pixels of its own
    Group,
    /// Layer whose cels reference tiles of a tileset
    Tilemap,
}

/// Visibility and role flags of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerFlags {
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub background: bool,
}

fn default_visible() -> bool {
    true
}

impl Default for LayerFlags {
    fn default() -> Self {
        Self { visible: true, background: false }
    }
}

/// A layer as seen by the packer: the layer rules are evaluated on this.
///
/// `visible` is the effective visibility, already combined with every
/// parent group's flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerInfo {
    pub name: String,
    pub visible: bool,
    pub background: bool,
    pub kind: LayerKind,
}

impl LayerInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), visible: true, background: false, kind: LayerKind::Image }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn background(mut self) -> Self {
        self.background = true;
        self
    }

    pub fn with_kind(mut self, kind: LayerKind) -> Self {
        self.kind = kind;
        self
    }

    /// Whether this layer survives the visibility/background/tilemap rules.
    pub fn passes(&self, config: &PackingConfig) -> bool {
        if config.only_visible_layers && !self.visible {
            return false;
        }
        if !config.include_background_layer && self.background {
            return false;
        }
        if !config.include_tilemap_layers && self.kind == LayerKind::Tilemap {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_rules() {
        let config = PackingConfig::default();
        assert!(LayerInfo::new("body").passes(&config));
        assert!(!LayerInfo::new("sketch").hidden().passes(&config));
        assert!(LayerInfo::new("bg").background().passes(&config));
        assert!(LayerInfo::new("map").with_kind(LayerKind::Tilemap).passes(&config));
    }

    #[test]
    fn test_rules_can_be_relaxed_or_tightened() {
        let config = PackingConfig {
            only_visible_layers: false,
            include_background_layer: false,
            include_tilemap_layers: false,
            ..Default::default()
        };
        assert!(LayerInfo::new("sketch").hidden().passes(&config));
        assert!(!LayerInfo::new("bg").background().passes(&config));
        assert!(!LayerInfo::new("map").with_kind(LayerKind::Tilemap).passes(&config));
    }

    #[test]
    fn test_layer_flags_deserialize_defaults() {
        let flags: LayerFlags = serde_json::from_str("{}").unwrap();
        assert!(flags.visible);
        assert!(!flags.background);

        let kind: LayerKind = serde_json::from_str("\"tilemap\"").unwrap();
        assert_eq!(kind, LayerKind::Tilemap);
    }
}
