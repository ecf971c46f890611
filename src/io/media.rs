// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Image file loading and snapshot export.

use anyhow::{Context, Result};
use image::RgbaImage;
use std::path::Path;

/// Image file extensions offered in the open dialog.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

/// A decoded image in RGBA8.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub image: RgbaImage,
}

impl LoadedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Raw RGBA bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }
}

/// Decode an image file.
pub fn load_image(path: &Path) -> Result<LoadedImage> {
    let decoded = image::open(path).with_context(|| format!("Failed to decode {}", path.display()))?;
    Ok(LoadedImage {
        image: decoded.to_rgba8(),
    })
}

/// Write a rendered snapshot; the format follows the file extension.
pub fn save_snapshot(image: &RgbaImage, path: &Path) -> Result<()> {
    image
        .save(path)
        .with_context(|| format!("Failed to write snapshot {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_snapshot_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.png");
        let image = RgbaImage::from_pixel(4, 3, Rgba([10, 20, 30, 255]));

        save_snapshot(&image, &path).unwrap();
        let loaded = load_image(&path).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (4, 3));
        assert_eq!(&loaded.pixels()[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_image(&dir.path().join("missing.png")).is_err());
    }
}
