//! Form image canvas

use crate::error::{OverlayError, Result};
use formfill_core::ImageDimensions;
use image::RgbaImage;
use std::path::{Path, PathBuf};

/// A decoded form image, owned by exactly one render pass
#[derive(Debug, Clone)]
pub struct FormCanvas {
    source: Option<PathBuf>,
    image: RgbaImage,
}

impl FormCanvas {
    /// Decode the image at `path` into an RGBA buffer.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::ImageOpen`] if the file is missing or is not a
    /// decodable image.
    pub fn open(path: &Path) -> Result<Self> {
        let image = image::open(path)
            .map_err(|source| OverlayError::ImageOpen {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();
        log::debug!(
            "Opened {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        Ok(Self {
            source: Some(path.to_path_buf()),
            image,
        })
    }

    /// Wrap an in-memory image
    #[inline]
    #[must_use = "canvas is created but not used"]
    pub const fn from_image(image: RgbaImage) -> Self {
        Self {
            source: None,
            image,
        }
    }

    /// Path the canvas was opened from, if any
    #[inline]
    #[must_use = "source path is returned but not used"]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Pixel dimensions of the image
    #[inline]
    #[must_use = "dimensions are returned but not used"]
    pub fn dimensions(&self) -> ImageDimensions {
        ImageDimensions::new(self.image.width(), self.image.height())
    }

    pub(crate) fn into_image(self) -> RgbaImage {
        self.image
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_open_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("form.png");
        RgbaImage::from_pixel(40, 30, Rgba([255, 255, 255, 255]))
            .save(&path)
            .unwrap();

        let canvas = FormCanvas::open(&path).unwrap();
        assert_eq!(canvas.dimensions(), ImageDimensions::new(40, 30));
        assert_eq!(canvas.source(), Some(path.as_path()));
    }

    #[test]
    fn test_open_missing_image() {
        let err = FormCanvas::open(Path::new("/nonexistent/form.png")).unwrap_err();
        assert!(matches!(err, OverlayError::ImageOpen { .. }));
    }

    #[test]
    fn test_open_non_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("form.png");
        std::fs::write(&path, b"plain text").unwrap();
        assert!(FormCanvas::open(&path).is_err());
    }
}
