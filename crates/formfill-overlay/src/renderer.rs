//! Overlay renderer
//!
//! Draws each answer at its pixel position with a thin box around the text
//! extent. Matched answers are drawn in black, fallback answers in red so
//! a reviewer can spot guesses at a glance.

use crate::canvas::FormCanvas;
use crate::error::{OverlayError, Result};
use crate::font::OverlayFont;
use formfill_core::{ImageDimensions, MatchTier, NormalizedPoint, PixelPoint};
use image::buffer::ConvertBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::{Rgba, RgbImage, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Default JPEG quality for filled forms
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Default file name prefix for filled forms
pub const DEFAULT_OUTPUT_PREFIX: &str = "filled_";

/// Text color for matched answers
pub const MATCHED_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);
/// Text color for fallback answers
pub const FALLBACK_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);
/// Box color around every answer
pub const BOX_COLOR: Rgba<u8> = Rgba([0, 0, 255, 255]);

// ============================================================================
// Items
// ============================================================================

/// Where an answer goes, in either coordinate space
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    /// Page-fraction position, denormalized against the canvas
    Normalized(NormalizedPoint),
    /// Already in pixels
    Pixel(PixelPoint),
}

impl Anchor {
    /// Pixel position on an image of the given size
    #[inline]
    #[must_use = "pixel position is computed but not used"]
    pub fn to_pixel(self, dims: ImageDimensions) -> PixelPoint {
        match self {
            Self::Normalized(p) => p.denormalize(dims),
            Self::Pixel(p) => p,
        }
    }
}

/// How an answer's position was chosen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementOrigin {
    /// A detected label matched the field
    Matched {
        /// The coordinate-map label that matched
        candidate: String,
        /// Tier that produced the match
        tier: MatchTier,
    },
    /// No label matched; the fallback table chose the position
    Fallback,
}

impl PlacementOrigin {
    /// Whether the position came from the fallback table
    #[inline]
    #[must_use = "origin check result is returned but not used"]
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback)
    }
}

impl std::fmt::Display for PlacementOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Matched { candidate, tier } => write!(f, "{tier} '{candidate}'"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// An answer to draw
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayItem {
    /// Field label
    pub label: String,
    /// Answer text
    pub value: String,
    /// Target position
    pub anchor: Anchor,
    /// How the position was chosen
    pub origin: PlacementOrigin,
}

/// An answer after it was placed on a concrete image
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedField {
    /// Field label
    pub label: String,
    /// Answer text
    pub value: String,
    /// Top-left corner of the text, in pixels
    pub position: PixelPoint,
    /// How the position was chosen
    pub origin: PlacementOrigin,
}

// ============================================================================
// Renderer
// ============================================================================

/// Rendering options
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Font size in pixels
    pub font_scale: f32,
    /// Box line thickness
    pub line_thickness: u32,
    /// Gap between text and box
    pub box_padding: u32,
}

impl Default for RenderOptions {
    #[inline]
    fn default() -> Self {
        Self {
            font_scale: 16.0,
            line_thickness: 1,
            box_padding: 2,
        }
    }
}

/// Draws answers onto a canvas
#[derive(Debug)]
pub struct OverlayRenderer {
    font: OverlayFont,
    options: RenderOptions,
}

impl OverlayRenderer {
    /// Create a renderer
    #[inline]
    #[must_use = "renderer is created but not used"]
    pub const fn new(font: OverlayFont, options: RenderOptions) -> Self {
        Self { font, options }
    }

    /// Rendering options
    #[inline]
    #[must_use = "options are returned but not used"]
    pub const fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Font in use
    #[inline]
    #[must_use = "font is returned but not used"]
    pub const fn font(&self) -> &OverlayFont {
        &self.font
    }

    /// Place an item on an image of the given size.
    ///
    /// Returns `None` for blank answers, which are never drawn.
    #[must_use = "positioned field is computed but not used"]
    pub fn position(&self, item: &OverlayItem, dims: ImageDimensions) -> Option<PositionedField> {
        if item.value.trim().is_empty() {
            return None;
        }
        Some(PositionedField {
            label: item.label.clone(),
            value: item.value.clone(),
            position: item.anchor.to_pixel(dims),
            origin: item.origin.clone(),
        })
    }

    /// Draw every item onto the canvas, consuming it.
    #[must_use = "rendered form is returned but not used"]
    pub fn render(&self, canvas: FormCanvas, items: &[OverlayItem]) -> RenderedForm {
        let dims = canvas.dimensions();
        let mut image = canvas.into_image();
        let mut placed = Vec::with_capacity(items.len());

        for item in items {
            let Some(field) = self.position(item, dims) else {
                log::debug!("Skipping '{}': no value", item.label);
                continue;
            };
            self.draw_field(&mut image, &field);
            log::debug!(
                "Drew '{}' at {} ({})",
                field.label,
                field.position,
                field.origin
            );
            placed.push(field);
        }

        RenderedForm { image, placed }
    }

    // Positions are clamped to the image, so the casts stay in range
    #[allow(clippy::cast_possible_truncation)]
    fn draw_field(&self, image: &mut RgbaImage, field: &PositionedField) {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return;
        }
        let x = field.position.x.clamp(0.0, f64::from(width - 1)).round() as i32;
        let y = field.position.y.clamp(0.0, f64::from(height - 1)).round() as i32;

        let color = if field.origin.is_fallback() {
            FALLBACK_COLOR
        } else {
            MATCHED_COLOR
        };
        self.font
            .draw(image, color, x, y, self.options.font_scale, &field.value);

        let (text_w, text_h) = self.font.text_size(self.options.font_scale, &field.value);
        let pad = i32::try_from(self.options.box_padding).unwrap_or(0);
        let box_w = text_w + 2 * self.options.box_padding;
        let box_h = text_h + 2 * self.options.box_padding;
        for t in 0..self.options.line_thickness {
            let inner_w = box_w.saturating_sub(2 * t);
            let inner_h = box_h.saturating_sub(2 * t);
            if inner_w == 0 || inner_h == 0 {
                break;
            }
            let offset = i32::try_from(t).unwrap_or(0);
            let rect = Rect::at(x - pad + offset, y - pad + offset).of_size(inner_w, inner_h);
            draw_hollow_rect_mut(image, rect, BOX_COLOR);
        }
    }
}

impl Default for OverlayRenderer {
    #[inline]
    fn default() -> Self {
        Self::new(OverlayFont::load(None), RenderOptions::default())
    }
}

// ============================================================================
// Output
// ============================================================================

/// Result of a render pass
#[derive(Debug, Clone)]
pub struct RenderedForm {
    image: RgbaImage,
    placed: Vec<PositionedField>,
}

impl RenderedForm {
    /// The filled image
    #[inline]
    #[must_use = "image is returned but not used"]
    pub const fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Answers that were drawn, in draw order
    #[inline]
    #[must_use = "placed fields are returned but not used"]
    pub fn placed(&self) -> &[PositionedField] {
        &self.placed
    }

    /// Take the placed fields
    #[inline]
    #[must_use = "placed fields are returned but not used"]
    pub fn into_placed(self) -> Vec<PositionedField> {
        self.placed
    }

    fn encode_jpeg<W: Write>(&self, writer: W, quality: u8) -> Result<()> {
        let rgb: RgbImage = self.image.convert();
        JpegEncoder::new_with_quality(writer, quality.clamp(1, 100))
            .encode_image(&rgb)
            .map_err(OverlayError::Encode)
    }

    /// Encode as JPEG.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::Encode`] if encoding fails.
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.encode_jpeg(&mut bytes, quality)?;
        Ok(bytes)
    }

    /// Write as JPEG to `path` at the source resolution.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::Write`] if the file cannot be created or
    /// flushed, or [`OverlayError::Encode`] if encoding fails.
    pub fn save(&self, path: &Path, quality: u8) -> Result<()> {
        let write_err = |source| OverlayError::Write {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(write_err)?;
        let mut writer = BufWriter::new(file);
        self.encode_jpeg(&mut writer, quality)?;
        writer.flush().map_err(write_err)?;
        log::info!("Saved filled form to {}", path.display());
        Ok(())
    }
}

/// `<prefix><stem>.jpg` beside the input image
#[must_use = "output path is computed but not used"]
pub fn default_output_path(input: &Path, prefix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "form".into(), |s| s.to_string_lossy());
    input.with_file_name(format!("{prefix}{stem}.jpg"))
}
