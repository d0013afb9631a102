//! Background map layer and image loading.

use crate::raster::blend_over;
use crate::{CANVAS_HEIGHT, CANVAS_WIDTH};
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Map image loading errors.
#[derive(Debug, Error)]
pub enum ImageLoadError {
    #[error("Unsupported image format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Raster formats accepted for maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapFormat {
    Png,
    Jpeg,
}

impl MapFormat {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(MapFormat::Png),
            "jpg" | "jpeg" => Some(MapFormat::Jpeg),
            _ => None,
        }
    }

    /// Detect format from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

/// The opaque background layer at canonical resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct MapLayer {
    pixels: RgbaImage,
}

impl MapLayer {
    /// A map of a single opaque color.
    pub fn blank(background: Rgba<u8>) -> Self {
        let background = Rgba([background[0], background[1], background[2], 255]);
        Self {
            pixels: RgbaImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, background),
        }
    }

    /// Decode an image file and fit it to the canonical resolution.
    ///
    /// Only PNG and JPEG files are accepted.
    pub fn load(path: impl AsRef<Path>, background: Rgba<u8>) -> Result<Self, ImageLoadError> {
        let path = path.as_ref();
        if MapFormat::from_path(path).is_none() {
            return Err(ImageLoadError::UnsupportedFormat(path.to_path_buf()));
        }
        let bytes = std::fs::read(path).map_err(|source| ImageLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let decoded = image::load_from_memory(&bytes).map_err(|source| ImageLoadError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!(
            "Decoded map {:?} ({}x{})",
            path,
            decoded.width(),
            decoded.height()
        );
        Ok(Self::from_image(&decoded, background))
    }

    /// Fit an already decoded image to the canonical resolution.
    ///
    /// The image is scaled (up or down) to fit while keeping its aspect
    /// ratio and placed at the top-left corner. Uncovered area and any
    /// translucency are filled with `background`.
    pub fn from_image(source: &DynamicImage, background: Rgba<u8>) -> Self {
        let mut map = Self::blank(background);
        if source.width() == 0 || source.height() == 0 {
            return map;
        }
        let scaled = source
            .resize(CANVAS_WIDTH, CANVAS_HEIGHT, FilterType::CatmullRom)
            .to_rgba8();
        for (x, y, pixel) in scaled.enumerate_pixels() {
            if x < CANVAS_WIDTH && y < CANVAS_HEIGHT {
                let base = map.pixels.get_pixel_mut(x, y);
                *base = blend_over(*base, *pixel);
                base[3] = 255;
            }
        }
        map
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Borrow the underlying image.
    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Read a pixel, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        self.pixels.get_pixel_checked(x, y).copied()
    }
}
