//! Error types for packing, slicing and tileset lookup

use thiserror::Error;

/// Error returned by the packer, the tileset slicer and the adapters.
///
/// Every failure is reported before any output is produced; a packing call
/// either returns a complete atlas or one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackError {
    /// Empty frame set, zero-sized frame, or nothing left after filtering
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Negative or overflowing padding/spacing values
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    /// Source image is not an exact multiple of the tile size
    #[error("Image size ({width}x{height}) is not divisible by tile size ({tile_width}x{tile_height})")]
    DimensionMismatch { width: u32, height: u32, tile_width: u32, tile_height: u32 },
    /// Lookup by dense index past the end
    #[error("Index {index} is out of range (count is {len})")]
    IndexOutOfRange { index: usize, len: usize },
    /// Lookup by name found nothing
    #[error("No entry named '{0}'")]
    NotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = PackError::DimensionMismatch { width: 65, height: 32, tile_width: 16, tile_height: 16 };
        assert_eq!(err.to_string(), "Image size (65x32) is not divisible by tile size (16x16)");

        let err = PackError::IndexOutOfRange { index: 3, len: 2 };
        assert!(err.to_string().contains("out of range"));

        let err = PackError::NotFound("terrain".to_string());
        assert!(err.to_string().contains("'terrain'"));
    }
}
