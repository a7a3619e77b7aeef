//! Atlas packing - combines frames into a single texture atlas with placement metadata
//!
//! Implements shelf bin packing over deduplicated frame content. Frames are
//! placed in first-occurrence order, so identical input always produces an
//! identical atlas.

use image::{imageops, Rgba, RgbaImage};
use log::debug;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

use crate::error::PackError;
use crate::models::{Frame, PackingConfig, Padding};

/// Transparent color for atlas background
const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Placement of one input frame inside a packed atlas.
///
/// `x`/`y` is the top-left corner of the frame's pixels, after inner
/// padding. Regions of merged duplicates share the same rectangle and
/// `instance`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// Index of the frame in the slice passed to [`pack`]
    pub frame_index: usize,
    pub name: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Index of the packed unique instance this region shows
    pub instance: usize,
}

impl Region {
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// Result of packing: the atlas image and one region per packed frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedAtlas {
    pub image: RgbaImage,
    /// Regions in input order, one per frame that passed the layer rules
    pub regions: Vec<Region>,
    /// Number of distinct images actually drawn into the atlas
    pub instance_count: usize,
    pub border_padding: u32,
    pub spacing: u32,
    pub inner_padding: u32,
}

impl PackedAtlas {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Region for an original frame index, if that frame was packed.
    pub fn region(&self, frame_index: usize) -> Option<&Region> {
        self.regions
            .binary_search_by_key(&frame_index, |r| r.frame_index)
            .ok()
            .map(|i| &self.regions[i])
    }

    /// Region by frame name (first match).
    pub fn region_by_name(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.name == name)
    }

    /// The first region of every instance, in instance order.
    pub fn unique_regions(&self) -> Vec<&Region> {
        let mut seen = vec![false; self.instance_count];
        let mut unique = Vec::with_capacity(self.instance_count);
        for region in &self.regions {
            if !seen[region.instance] {
                seen[region.instance] = true;
                unique.push(region);
            }
        }
        unique
    }
}

/// A shelf in the shelf packing algorithm
#[derive(Debug)]
struct Shelf {
    y: u64,
    height: u64,
    width_used: u64,
}

/// Cell positions plus the extent of the laid out cells (without border)
#[derive(Debug)]
struct Layout {
    positions: Vec<(u64, u64)>,
    width: u64,
    height: u64,
}

/// Pack frames into a single texture atlas.
///
/// Frames are first filtered by the layer rules in `config`, then
/// deduplicated when `merge_duplicates` is set, then placed on shelves in
/// first-occurrence order.
///
/// # Errors
///
/// * [`PackError::InvalidInput`] if `frames` is empty, a frame has zero
///   width or height, or no frame passes the layer rules
/// * [`PackError::ConfigurationError`] for negative padding values, a
///   frame that cannot fit `max_width`, or an atlas too large to address
pub fn pack(frames: &[Frame], config: &PackingConfig) -> Result<PackedAtlas, PackError> {
    if frames.is_empty() {
        return Err(PackError::InvalidInput("no frames to pack".to_string()));
    }
    if let Some((index, frame)) =
        frames.iter().enumerate().find(|(_, f)| f.width() == 0 || f.height() == 0)
    {
        return Err(PackError::InvalidInput(format!(
            "frame {} ('{}') has zero size ({}x{})",
            index,
            frame.name,
            frame.width(),
            frame.height()
        )));
    }
    let padding = config.padding()?;

    let included: Vec<usize> = frames
        .iter()
        .enumerate()
        .filter(|(_, frame)| frame_passes(frame, config))
        .map(|(index, _)| index)
        .collect();
    if included.is_empty() {
        return Err(PackError::InvalidInput(
            "no frames remain after applying the layer rules".to_string(),
        ));
    }

    let (instances, frame_instance) = deduplicate(frames, &included, config.merge_duplicates);

    let inner = u64::from(padding.inner);
    let cells: Vec<(u64, u64)> = instances
        .iter()
        .map(|&i| (u64::from(frames[i].width()) + 2 * inner, u64::from(frames[i].height()) + 2 * inner))
        .collect();

    let max_inner_width = match config.max_width {
        Some(max_width) => {
            let available = u64::from(max_width) - 2 * u64::from(padding.border);
            if let Some((pos, cell)) = cells.iter().enumerate().find(|(_, c)| c.0 > available) {
                let frame = &frames[instances[pos]];
                return Err(PackError::ConfigurationError(format!(
                    "frame '{}' needs a {}px wide cell but max_width {} leaves only {}px",
                    frame.name, cell.0, max_width, available
                )));
            }
            Some(available)
        }
        None => None,
    };

    let layout = layout_shelves(&cells, u64::from(padding.spacing), max_inner_width);
    let (atlas_w, atlas_h) = atlas_size(&layout, padding, config.power_of_two)?;

    let mut image = RgbaImage::from_pixel(atlas_w, atlas_h, TRANSPARENT);
    let border = u64::from(padding.border);
    let origins: Vec<(u32, u32)> = layout
        .positions
        .iter()
        .map(|&(x, y)| ((border + x + inner) as u32, (border + y + inner) as u32))
        .collect();

    for (instance, &frame_index) in instances.iter().enumerate() {
        let (x, y) = origins[instance];
        copy_frame_to_atlas(&mut image, &frames[frame_index].image, x, y);
    }

    let regions: Vec<Region> = included
        .iter()
        .zip(&frame_instance)
        .map(|(&frame_index, &instance)| {
            let (x, y) = origins[instance];
            let frame = &frames[frame_index];
            Region {
                frame_index,
                name: frame.name.clone(),
                x,
                y,
                width: frame.width(),
                height: frame.height(),
                instance,
            }
        })
        .collect();

    debug!(
        "packed {} of {} frames ({} unique) into {}x{} atlas",
        regions.len(),
        frames.len(),
        instances.len(),
        atlas_w,
        atlas_h
    );

    Ok(PackedAtlas {
        image,
        regions,
        instance_count: instances.len(),
        border_padding: padding.border,
        spacing: padding.spacing,
        inner_padding: padding.inner,
    })
}

/// A frame is packed iff at least one contributing layer passes the rules.
/// Frames without layer metadata are plain images and always pass.
fn frame_passes(frame: &Frame, config: &PackingConfig) -> bool {
    frame.layers.is_empty() || frame.layers.iter().any(|layer| layer.passes(config))
}

/// Content fingerprint over dimensions and pixel bytes
fn fingerprint(image: &RgbaImage) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(image.width().to_le_bytes());
    hasher.update(image.height().to_le_bytes());
    hasher.update(image.as_raw());
    hasher.finalize().into()
}

/// Map included frames to unique instances.
///
/// Returns the frame index of each instance's first occurrence, and for
/// every included frame (parallel to `included`) the instance it uses.
fn deduplicate(frames: &[Frame], included: &[usize], merge: bool) -> (Vec<usize>, Vec<usize>) {
    if !merge {
        return (included.to_vec(), (0..included.len()).collect());
    }

    let mut instances: Vec<usize> = Vec::new();
    let mut frame_instance = Vec::with_capacity(included.len());
    let mut by_fingerprint: HashMap<[u8; 32], Vec<usize>> = HashMap::new();

    for &frame_index in included {
        let image = &frames[frame_index].image;
        let candidates = by_fingerprint.entry(fingerprint(image)).or_default();
        // Confirm byte equality so a hash collision can never merge different frames
        let existing = candidates
            .iter()
            .copied()
            .find(|&instance| frames[instances[instance]].image == *image);

        let instance = match existing {
            Some(instance) => instance,
            None => {
                let instance = instances.len();
                instances.push(frame_index);
                candidates.push(instance);
                instance
            }
        };
        frame_instance.push(instance);
    }

    (instances, frame_instance)
}

/// Width shelves wrap at when no `max_width` is configured: the side of a
/// square holding every cell, but never narrower than the widest cell.
fn default_shelf_width(cells: &[(u64, u64)], spacing: u64) -> u64 {
    let widest = cells.iter().map(|c| c.0).max().unwrap_or(1);
    let area: u64 = cells.iter().map(|&(w, h)| (w + spacing) * (h + spacing)).sum();
    let side = (area as f64).sqrt().ceil() as u64;
    side.max(widest)
}

/// Place cells on shelves, first fit, in the given order.
fn layout_shelves(cells: &[(u64, u64)], spacing: u64, max_width: Option<u64>) -> Layout {
    let shelf_width = max_width.unwrap_or_else(|| default_shelf_width(cells, spacing));
    let mut shelves: Vec<Shelf> = vec![];
    let mut positions = Vec::with_capacity(cells.len());

    for &(w, h) in cells {
        let pos = try_place_in_shelves(&mut shelves, w, h, spacing, shelf_width);
        positions.push(pos);
    }

    let width = shelves.iter().map(|s| s.width_used).max().unwrap_or(0);
    let height = shelves.last().map(|s| s.y + s.height).unwrap_or(0);
    Layout { positions, width, height }
}

/// Place a cell in an existing shelf or open a new one below the last.
fn try_place_in_shelves(
    shelves: &mut Vec<Shelf>,
    w: u64,
    h: u64,
    spacing: u64,
    shelf_width: u64,
) -> (u64, u64) {
    for shelf in shelves.iter_mut() {
        let x = shelf.width_used + spacing;
        if h <= shelf.height && x + w <= shelf_width {
            shelf.width_used = x + w;
            return (x, shelf.y);
        }
    }

    let y = shelves.last().map(|s| s.y + s.height + spacing).unwrap_or(0);
    shelves.push(Shelf { y, height: h, width_used: w });
    (0, y)
}

/// Final atlas dimensions: layout extent plus border on both sides
fn atlas_size(layout: &Layout, padding: Padding, power_of_two: bool) -> Result<(u32, u32), PackError> {
    let border = 2 * u64::from(padding.border);
    let mut width = layout.width + border;
    let mut height = layout.height + border;
    if power_of_two {
        width = width.next_power_of_two();
        height = height.next_power_of_two();
    }

    match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(PackError::ConfigurationError(format!(
            "atlas would be {}x{} pixels, which exceeds the addressable size",
            width, height
        ))),
    }
}

/// Copy a frame image into the atlas at the given position
fn copy_frame_to_atlas(atlas: &mut RgbaImage, frame: &RgbaImage, x: u32, y: u32) {
    imageops::replace(atlas, frame, i64::from(x), i64::from(y));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LayerInfo, LayerKind};

    fn make_solid_frame(name: &str, width: u32, height: u32, color: Rgba<u8>) -> Frame {
        Frame::new(name, RgbaImage::from_pixel(width, height, color))
    }

    fn overlaps(a: &Region, b: &Region) -> bool {
        a.x < b.right() && b.x < a.right() && a.y < b.bottom() && b.y < a.bottom()
    }

    #[test]
    fn test_empty_frames() {
        let result = pack(&[], &PackingConfig::default());
        assert!(matches!(result, Err(PackError::InvalidInput(_))));
    }

    #[test]
    fn test_zero_sized_frame() {
        let frames = vec![make_solid_frame("a", 4, 4, Rgba([255, 0, 0, 255])), Frame::new("b", RgbaImage::new(0, 3))];
        let result = pack(&frames, &PackingConfig::default());
        assert!(matches!(result, Err(PackError::InvalidInput(msg)) if msg.contains("'b'")));
    }

    #[test]
    fn test_negative_spacing() {
        let frames = vec![make_solid_frame("a", 4, 4, Rgba([255, 0, 0, 255]))];
        let config = PackingConfig { spacing: -1, ..Default::default() };
        assert!(matches!(pack(&frames, &config), Err(PackError::ConfigurationError(_))));
    }

    #[test]
    fn test_single_frame() {
        let red = Rgba([255, 0, 0, 255]);
        let atlas = pack(&[make_solid_frame("red", 16, 16, red)], &PackingConfig::default()).unwrap();

        assert_eq!((atlas.width(), atlas.height()), (16, 16));
        assert_eq!(atlas.regions.len(), 1);
        let region = &atlas.regions[0];
        assert_eq!((region.x, region.y, region.width, region.height), (0, 0, 16, 16));
        assert_eq!(*atlas.image.get_pixel(0, 0), red);
        assert_eq!(*atlas.image.get_pixel(15, 15), red);
    }

    #[test]
    fn test_multiple_frames_no_overlap() {
        let red = Rgba([255, 0, 0, 255]);
        let green = Rgba([0, 255, 0, 255]);
        let blue = Rgba([0, 0, 255, 255]);
        let frames = vec![
            make_solid_frame("red", 16, 16, red),
            make_solid_frame("green", 8, 24, green),
            make_solid_frame("blue", 12, 4, blue),
        ];

        let atlas = pack(&frames, &PackingConfig::default()).unwrap();
        assert_eq!(atlas.regions.len(), 3);

        for i in 0..atlas.regions.len() {
            let a = &atlas.regions[i];
            assert!(a.right() <= atlas.width() && a.bottom() <= atlas.height());
            for b in &atlas.regions[i + 1..] {
                assert!(!overlaps(a, b), "Regions overlap: {:?} {:?}", a, b);
            }
        }

        for (region, color) in atlas.regions.iter().zip([red, green, blue]) {
            assert_eq!(*atlas.image.get_pixel(region.x, region.y), color);
            assert_eq!(*atlas.image.get_pixel(region.right() - 1, region.bottom() - 1), color);
        }
    }

    #[test]
    fn test_regions_keep_input_order() {
        let frames: Vec<Frame> = (0..5)
            .map(|i| make_solid_frame(&format!("f{}", i), 4 + i, 10 - i, Rgba([i as u8, 0, 0, 255])))
            .collect();
        let atlas = pack(&frames, &PackingConfig::default()).unwrap();
        let indices: Vec<usize> = atlas.regions.iter().map(|r| r.frame_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        assert_eq!(atlas.region_by_name("f3").unwrap().frame_index, 3);
    }

    #[test]
    fn test_merge_duplicates() {
        let red = Rgba([255, 0, 0, 255]);
        let blue = Rgba([0, 0, 255, 255]);
        let frames = vec![
            make_solid_frame("a", 8, 8, red),
            make_solid_frame("b", 8, 8, blue),
            make_solid_frame("c", 8, 8, red),
        ];

        let atlas = pack(&frames, &PackingConfig::default()).unwrap();
        assert_eq!(atlas.instance_count, 2);
        assert_eq!(atlas.regions.len(), 3);

        let a = atlas.region(0).unwrap();
        let c = atlas.region(2).unwrap();
        assert_eq!(a.instance, c.instance);
        assert_eq!((a.x, a.y, a.width, a.height), (c.x, c.y, c.width, c.height));
        assert_ne!(atlas.region(1).unwrap().instance, a.instance);
        assert_eq!(atlas.unique_regions().len(), 2);
    }

    #[test]
    fn test_merge_disabled_keeps_every_frame() {
        let red = Rgba([255, 0, 0, 255]);
        let frames = vec![make_solid_frame("a", 8, 8, red), make_solid_frame("b", 8, 8, red)];
        let config = PackingConfig { merge_duplicates: false, ..Default::default() };

        let atlas = pack(&frames, &config).unwrap();
        assert_eq!(atlas.instance_count, 2);
        assert!(!overlaps(&atlas.regions[0], &atlas.regions[1]));
    }

    #[test]
    fn test_same_pixels_different_shape_not_merged() {
        let red = Rgba([255, 0, 0, 255]);
        let frames = vec![make_solid_frame("wide", 4, 2, red), make_solid_frame("tall", 2, 4, red)];
        let atlas = pack(&frames, &PackingConfig::default()).unwrap();
        assert_eq!(atlas.instance_count, 2);
    }

    #[test]
    fn test_layer_rules_filter_frames() {
        let red = Rgba([255, 0, 0, 255]);
        let frames = vec![
            make_solid_frame("shown", 4, 4, red).with_layers(vec![LayerInfo::new("body")]),
            make_solid_frame("hidden", 4, 4, red).with_layers(vec![LayerInfo::new("sketch").hidden()]),
            make_solid_frame("mixed", 4, 4, red)
                .with_layers(vec![LayerInfo::new("sketch").hidden(), LayerInfo::new("body")]),
            make_solid_frame("map", 4, 4, red)
                .with_layers(vec![LayerInfo::new("ground").with_kind(LayerKind::Tilemap)]),
        ];
        let config = PackingConfig { include_tilemap_layers: false, ..Default::default() };

        let atlas = pack(&frames, &config).unwrap();
        let names: Vec<&str> = atlas.regions.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["shown", "mixed"]);
        assert!(atlas.region(1).is_none());
        assert!(atlas.region(3).is_none());
    }

    #[test]
    fn test_everything_filtered_is_invalid() {
        let frames = vec![make_solid_frame("bg", 4, 4, Rgba([0, 0, 0, 255]))
            .with_layers(vec![LayerInfo::new("bg").background()])];
        let config = PackingConfig { include_background_layer: false, ..Default::default() };
        assert!(matches!(pack(&frames, &config), Err(PackError::InvalidInput(_))));
    }

    #[test]
    fn test_border_and_inner_padding_offsets() {
        let red = Rgba([255, 0, 0, 255]);
        let config = PackingConfig { border_padding: 3, inner_padding: 2, ..Default::default() };
        let atlas = pack(&[make_solid_frame("red", 4, 4, red)], &config).unwrap();

        assert_eq!((atlas.regions[0].x, atlas.regions[0].y), (5, 5));
        assert_eq!((atlas.width(), atlas.height()), (14, 14));
        assert_eq!(*atlas.image.get_pixel(4, 4), TRANSPARENT);
        assert_eq!(*atlas.image.get_pixel(5, 5), red);
        assert_eq!(*atlas.image.get_pixel(9, 9), TRANSPARENT);
    }

    #[test]
    fn test_spacing_between_cells() {
        let red = Rgba([255, 0, 0, 255]);
        let frames = vec![make_solid_frame("a", 8, 8, red), make_solid_frame("b", 8, 8, red)];
        let config = PackingConfig {
            spacing: 2,
            merge_duplicates: false,
            max_width: Some(64),
            ..Default::default()
        };

        let atlas = pack(&frames, &config).unwrap();
        assert_eq!((atlas.regions[1].x, atlas.regions[1].y), (10, 0));
        assert_eq!((atlas.width(), atlas.height()), (18, 8));
    }

    #[test]
    fn test_max_width_wraps_shelves() {
        let red = Rgba([255, 0, 0, 255]);
        let frames: Vec<Frame> =
            (0..4).map(|i| make_solid_frame(&format!("f{}", i), 8, 8, red)).collect();
        let config = PackingConfig { merge_duplicates: false, max_width: Some(16), ..Default::default() };

        let atlas = pack(&frames, &config).unwrap();
        assert_eq!((atlas.width(), atlas.height()), (16, 16));
        let positions: Vec<(u32, u32)> = atlas.regions.iter().map(|r| (r.x, r.y)).collect();
        assert_eq!(positions, vec![(0, 0), (8, 0), (0, 8), (8, 8)]);
    }

    #[test]
    fn test_frame_wider_than_max_width() {
        let frames = vec![make_solid_frame("wide", 32, 4, Rgba([1, 1, 1, 255]))];
        let config = PackingConfig { max_width: Some(16), ..Default::default() };
        assert!(matches!(pack(&frames, &config), Err(PackError::ConfigurationError(_))));
    }

    #[test]
    fn test_power_of_two() {
        let red = Rgba([255, 0, 0, 255]);
        let config = PackingConfig { power_of_two: true, ..Default::default() };
        let atlas = pack(&[make_solid_frame("red", 10, 10, red)], &config).unwrap();
        assert_eq!((atlas.width(), atlas.height()), (16, 16));
    }

    #[test]
    fn test_default_shelf_width_is_roughly_square() {
        let cells = vec![(8, 8); 16];
        assert_eq!(default_shelf_width(&cells, 0), 32);
        assert_eq!(default_shelf_width(&[(40, 2)], 0), 40);
    }

    #[test]
    fn test_packing_is_deterministic() {
        let frames: Vec<Frame> = (0..12)
            .map(|i| {
                make_solid_frame(&format!("f{}", i), 3 + (i * 7) % 11, 2 + (i * 5) % 9, Rgba([i as u8 % 3, 9, 9, 255]))
            })
            .collect();
        let config = PackingConfig { spacing: 1, inner_padding: 1, border_padding: 1, ..Default::default() };

        let first = pack(&frames, &config).unwrap();
        let second = pack(&frames, &config).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.image.as_raw(), second.image.as_raw());
    }
}
