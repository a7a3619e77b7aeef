//! PNG output and file path generation

use image::RgbaImage;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Error type for output operations
#[derive(Debug, Error)]
pub enum OutputError {
    /// IO error during file operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Image encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Save an RGBA image to a PNG file, creating parent directories.
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    image.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}

/// Output path for an atlas or tileset image.
///
/// | Scenario | Output |
/// |----------|--------|
/// | No `-o` | `{input_stem}.png` next to the input |
/// | `-o out.png` | `out.png` |
/// | `-o dir/` | `dir/{input_stem}.png` |
pub fn image_output_path(input: &Path, output_arg: Option<&Path>) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("atlas");
    match output_arg {
        Some(output) if is_dir_arg(output) => output.join(format!("{}.png", stem)),
        Some(output) => output.to_path_buf(),
        None => input.with_file_name(format!("{}.png", stem)),
    }
}

/// Metadata path paired with an image: same name, `.json` extension.
pub fn metadata_path(image_path: &Path) -> PathBuf {
    image_path.with_extension("json")
}

/// Like [`metadata_path`], but never the manifest the image was built from.
///
/// `hero.json` packed next to itself yields `hero.png` plus `hero.atlas.json`.
pub fn metadata_path_beside(image_path: &Path, manifest: &Path) -> PathBuf {
    let path = metadata_path(image_path);
    if same_file(&path, manifest) {
        image_path.with_extension("atlas.json")
    } else {
        path
    }
}

/// Whether two paths name the same file, however they are spelled.
///
/// The file itself does not have to exist yet.
pub fn same_file(a: &Path, b: &Path) -> bool {
    resolve(a) == resolve(b)
}

/// Absolute, symlink-free form of `path` where it (or its directory) exists,
/// otherwise a lexically normalized absolute path.
fn resolve(path: &Path) -> PathBuf {
    if let Ok(resolved) = path.canonicalize() {
        return resolved;
    }
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if let (Ok(dir), Some(name)) = (parent.canonicalize(), path.file_name()) {
        return dir.join(name);
    }
    normalize(path)
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = if path.is_absolute() {
        PathBuf::new()
    } else {
        std::env::current_dir().unwrap_or_default()
    };
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Path of tile `name` inside an output directory.
pub fn tile_output_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.png", name))
}

fn is_dir_arg(path: &Path) -> bool {
    path.as_os_str().to_string_lossy().ends_with('/') || path.is_dir()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_image_output_path_default() {
        let path = image_output_path(Path::new("assets/hero.json"), None);
        assert_eq!(path, PathBuf::from("assets/hero.png"));
    }

    #[test]
    fn test_image_output_path_explicit_file() {
        let path = image_output_path(Path::new("hero.json"), Some(Path::new("build/atlas.png")));
        assert_eq!(path, PathBuf::from("build/atlas.png"));
    }

    #[test]
    fn test_image_output_path_directory() {
        let path = image_output_path(Path::new("assets/hero.json"), Some(Path::new("build/")));
        assert_eq!(path, PathBuf::from("build/hero.png"));
    }

    #[test]
    fn test_metadata_and_tile_paths() {
        assert_eq!(metadata_path(Path::new("build/hero.png")), PathBuf::from("build/hero.json"));
        assert_eq!(tile_output_path(Path::new("tiles"), "ground_3"), PathBuf::from("tiles/ground_3.png"));
    }

    #[test]
    fn test_metadata_path_keeps_manifest() {
        let manifest = Path::new("assets/hero.json");
        let image = image_output_path(manifest, None);
        assert_eq!(metadata_path_beside(&image, manifest), PathBuf::from("assets/hero.atlas.json"));
        assert_eq!(
            metadata_path_beside(Path::new("build/hero.png"), manifest),
            PathBuf::from("build/hero.json")
        );
    }

    #[test]
    fn test_metadata_path_keeps_manifest_spelled_differently() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("hero.json");
        std::fs::write(&manifest, "{}").unwrap();

        let dotted = dir.path().join(".").join("hero.png");
        assert_eq!(metadata_path_beside(&dotted, &manifest), dir.path().join(".").join("hero.atlas.json"));

        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let via_parent = dir.path().join("sub").join("..").join("hero.png");
        assert_eq!(
            metadata_path_beside(&via_parent, &manifest),
            via_parent.with_extension("atlas.json")
        );
    }

    #[test]
    fn test_same_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("atlas.png");
        assert!(same_file(&file, &dir.path().join(".").join("atlas.png")));
        std::fs::write(&file, b"x").unwrap();
        assert!(same_file(&file, &dir.path().join(".").join("atlas.png")));
        assert!(!same_file(&file, &dir.path().join("other.png")));
    }

    #[test]
    fn test_save_png_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dirs/test.png");

        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        image.put_pixel(1, 0, Rgba([0, 0, 0, 0]));

        save_png(&image, &path).unwrap();
        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded, image);
    }
}
