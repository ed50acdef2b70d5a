//! Font loading for answer text
//!
//! A TrueType font is read from the configured path or from a list of common
//! system locations. When none is available a block face is used: every
//! visible character becomes a solid cell of fixed advance. Output is still
//! produced and text extents stay measurable, only the glyph shapes are lost.

use ab_glyph::{FontVec, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::path::Path;

/// System font locations tried in order
pub const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/System/Library/Fonts/Helvetica.ttc",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Block cell width as a fraction of the font size
const BLOCK_ADVANCE_RATIO: f32 = 0.6;

/// Face used to draw answers
pub enum OverlayFont {
    /// A TrueType/OpenType font
    TrueType(FontVec),
    /// Built-in block face
    Blocks,
}

impl std::fmt::Debug for OverlayFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TrueType(_) => write!(f, "OverlayFont::TrueType"),
            Self::Blocks => write!(f, "OverlayFont::Blocks"),
        }
    }
}

impl OverlayFont {
    /// Read a font file, returning `None` if it is missing or not a font
    #[must_use = "loaded font is returned but not used"]
    pub fn from_file(path: &Path) -> Option<Self> {
        let bytes = std::fs::read(path).ok()?;
        match FontVec::try_from_vec(bytes) {
            Ok(font) => Some(Self::TrueType(font)),
            Err(e) => {
                log::warn!("{} is not a usable font: {e}", path.display());
                None
            }
        }
    }

    /// Load `preferred` if given, else the first system font found, else the
    /// block face
    #[must_use = "loaded font is returned but not used"]
    pub fn load(preferred: Option<&Path>) -> Self {
        if let Some(path) = preferred {
            if let Some(font) = Self::from_file(path) {
                log::debug!("Using font {}", path.display());
                return font;
            }
            log::warn!("Configured font {} could not be loaded", path.display());
        }

        for candidate in SYSTEM_FONT_CANDIDATES {
            let path = Path::new(candidate);
            if path.is_file() {
                if let Some(font) = Self::from_file(path) {
                    log::debug!("Using system font {candidate}");
                    return font;
                }
            }
        }

        log::warn!("No TrueType font available, drawing answers with block glyphs");
        Self::Blocks
    }

    /// Whether this is the built-in block face
    #[inline]
    #[must_use = "font kind is returned but not used"]
    pub const fn is_blocks(&self) -> bool {
        matches!(self, Self::Blocks)
    }

    // Block cells are small positive sizes derived from the font size
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn block_cell(size: f32) -> (u32, u32) {
        let advance = (size * BLOCK_ADVANCE_RATIO).ceil().max(2.0) as u32;
        let height = size.ceil().max(2.0) as u32;
        (advance, height)
    }

    /// Width and height in pixels of `text` drawn at `size`
    #[must_use = "text size is computed but not used"]
    pub fn text_size(&self, size: f32, text: &str) -> (u32, u32) {
        match self {
            Self::TrueType(font) => text_size(PxScale::from(size), font, text),
            Self::Blocks => {
                let (advance, height) = Self::block_cell(size);
                let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
                (advance.saturating_mul(chars), height)
            }
        }
    }

    /// Draw `text` with its top-left corner at `(x, y)`
    pub fn draw(&self, img: &mut RgbaImage, color: Rgba<u8>, x: i32, y: i32, size: f32, text: &str) {
        match self {
            Self::TrueType(font) => {
                draw_text_mut(img, color, x, y, PxScale::from(size), font, text);
            }
            Self::Blocks => {
                let (advance, height) = Self::block_cell(size);
                let cell_w = advance.saturating_sub(2).max(1);
                let cell_h = (height * 3 / 4).max(1);
                let top = y + i32::try_from(height - cell_h).unwrap_or(0);
                let step = i32::try_from(advance).unwrap_or(i32::MAX);
                let mut left = x;
                for c in text.chars() {
                    if !c.is_whitespace() {
                        let rect = Rect::at(left + 1, top).of_size(cell_w, cell_h);
                        draw_filled_rect_mut(img, rect, color);
                    }
                    left = left.saturating_add(step);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_text_size() {
        let font = OverlayFont::Blocks;
        assert_eq!(font.text_size(10.0, "abc"), (18, 10));
        assert_eq!(font.text_size(10.0, ""), (0, 10));
    }

    #[test]
    fn test_block_draw_marks_pixels() {
        let mut img = RgbaImage::from_pixel(100, 40, Rgba([255, 255, 255, 255]));
        let black = Rgba([0, 0, 0, 255]);
        OverlayFont::Blocks.draw(&mut img, black, 10, 10, 16.0, "A B");
        let dark = img.pixels().filter(|p| **p == black).count();
        assert!(dark > 0);
        // The space cell stays empty
        let (advance, _) = OverlayFont::block_cell(16.0);
        let space_x = 10 + advance + advance / 2;
        assert!((0..40).all(|y| *img.get_pixel(space_x, y) != black));
    }

    #[test]
    fn test_missing_font_file() {
        assert!(OverlayFont::from_file(Path::new("/nonexistent/font.ttf")).is_none());
    }

    #[test]
    fn test_non_font_file_falls_through() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("bogus.ttf");
        std::fs::write(&bogus, b"definitely not a font").unwrap();
        assert!(OverlayFont::from_file(&bogus).is_none());
        // Loading never fails: system font or blocks
        let _ = OverlayFont::load(Some(&bogus));
    }
}
