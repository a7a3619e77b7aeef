//! Tileset slicing - splits a tileset image into a row-major grid of tiles

use image::imageops;
use serde::Serialize;

use crate::error::PackError;
use crate::models::Frame;

/// Grid geometry of a tileset image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TilesetGrid {
    pub tile_width: u32,
    pub tile_height: u32,
    pub columns: u32,
    pub rows: u32,
}

impl TilesetGrid {
    /// Grid for an image of the given size.
    ///
    /// Fails with `InvalidInput` for a zero tile size and with
    /// `DimensionMismatch` when the image is not an exact multiple of it.
    pub fn new(width: u32, height: u32, tile_width: u32, tile_height: u32) -> Result<Self, PackError> {
        if tile_width == 0 || tile_height == 0 {
            return Err(PackError::InvalidInput(format!(
                "tile size must be non-zero (got {}x{})",
                tile_width, tile_height
            )));
        }
        if width % tile_width != 0 || height % tile_height != 0 {
            return Err(PackError::DimensionMismatch { width, height, tile_width, tile_height });
        }
        Ok(Self { tile_width, tile_height, columns: width / tile_width, rows: height / tile_height })
    }

    pub fn tile_count(&self) -> u32 {
        self.columns * self.rows
    }

    /// Pixel rectangle `(x, y, w, h)` of tile `n`, counted row-major.
    pub fn tile_rect(&self, n: u32) -> Option<(u32, u32, u32, u32)> {
        if n >= self.tile_count() {
            return None;
        }
        let col = n % self.columns;
        let row = n / self.columns;
        Some((col * self.tile_width, row * self.tile_height, self.tile_width, self.tile_height))
    }
}

/// Split `source` into `tile_width` x `tile_height` tiles, row-major.
///
/// Tiles are named `{source name}_{n}` and keep the source's duration and
/// layer list.
///
/// # Examples
///
/// ```
/// use celpack::models::Frame;
/// use celpack::tileset::slice;
/// use image::RgbaImage;
///
/// let sheet = Frame::new("terrain", RgbaImage::new(64, 32));
/// let tiles = slice(&sheet, 16, 16).unwrap();
/// assert_eq!(tiles.len(), 8);
/// assert_eq!(tiles[5].name, "terrain_5");
///
/// let odd = Frame::new("odd", RgbaImage::new(65, 32));
/// assert!(slice(&odd, 16, 16).is_err());
/// ```
pub fn slice(source: &Frame, tile_width: u32, tile_height: u32) -> Result<Vec<Frame>, PackError> {
    if source.width() == 0 || source.height() == 0 {
        return Err(PackError::InvalidInput(format!("tileset '{}' has zero size", source.name)));
    }
    let grid = TilesetGrid::new(source.width(), source.height(), tile_width, tile_height)?;

    let tiles = (0..grid.tile_count())
        .filter_map(|n| grid.tile_rect(n).map(|rect| (n, rect)))
        .map(|(n, (x, y, w, h))| Frame {
            name: format!("{}_{}", source.name, n),
            source: format!("{}#{}", source.source, n),
            image: imageops::crop_imm(&source.image, x, y, w, h).to_image(),
            duration_ms: source.duration_ms,
            layers: source.layers.clone(),
        })
        .collect();

    Ok(tiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    /// 64x32 image where every 16x16 tile is filled with its own index
    fn numbered_sheet() -> Frame {
        let image = RgbaImage::from_fn(64, 32, |x, y| {
            let n = (y / 16) * 4 + x / 16;
            Rgba([n as u8, 0, 0, 255])
        });
        Frame::new("sheet", image)
    }

    #[test]
    fn test_slice_row_major() {
        let tiles = slice(&numbered_sheet(), 16, 16).unwrap();
        assert_eq!(tiles.len(), 8);
        for (n, tile) in tiles.iter().enumerate() {
            assert_eq!((tile.width(), tile.height()), (16, 16));
            assert_eq!(tile.image.get_pixel(0, 0)[0], n as u8);
            assert_eq!(tile.image.get_pixel(15, 15)[0], n as u8);
            assert_eq!(tile.name, format!("sheet_{}", n));
        }
    }

    #[test]
    fn test_slice_dimension_mismatch() {
        let frame = Frame::new("odd", RgbaImage::new(65, 32));
        let result = slice(&frame, 16, 16);
        assert_eq!(
            result,
            Err(PackError::DimensionMismatch { width: 65, height: 32, tile_width: 16, tile_height: 16 })
        );

        let frame = Frame::new("odd", RgbaImage::new(64, 33));
        assert!(matches!(slice(&frame, 16, 16), Err(PackError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_zero_tile_size() {
        assert!(matches!(slice(&numbered_sheet(), 0, 16), Err(PackError::InvalidInput(_))));
    }

    #[test]
    fn test_single_tile() {
        let tiles = slice(&numbered_sheet(), 64, 32).unwrap();
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].image, numbered_sheet().image);
    }

    #[test]
    fn test_grid_rects() {
        let grid = TilesetGrid::new(32, 48, 16, 16).unwrap();
        assert_eq!((grid.columns, grid.rows, grid.tile_count()), (2, 3, 6));
        assert_eq!(grid.tile_rect(3), Some((16, 16, 16, 16)));
        assert_eq!(grid.tile_rect(6), None);
    }
}
