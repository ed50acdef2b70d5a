//! Configuration for form filling

use crate::font::OverlayFont;
use crate::renderer::{RenderOptions, DEFAULT_JPEG_QUALITY, DEFAULT_OUTPUT_PREFIX};
use formfill_core::{AdjustmentRule, AdjustmentRules, LAST_NAME_RULE};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Default answer font size in pixels
pub const DEFAULT_FONT_SIZE: f32 = 16.0;

/// Configuration for filling a form image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// TrueType font for answers; system fonts are tried when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,

    /// Answer font size in pixels
    pub font_size: f32,

    /// JPEG quality (1-100)
    pub jpeg_quality: u8,

    /// File name prefix for the default output path
    pub output_prefix: String,

    /// Box line thickness in pixels
    pub line_thickness: u32,

    /// Post-match offsets
    pub adjustments: AdjustmentRules,
}

impl OverlayConfig {
    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `FORMFILL_FONT_PATH`: TrueType font file (default: system font)
    /// - `FORMFILL_FONT_SIZE`: Font size in pixels (default: 16)
    /// - `FORMFILL_JPEG_QUALITY`: JPEG quality 1-100 (default: 95)
    /// - `FORMFILL_LAST_NAME_OFFSET`: Downward shift for last-name fields as a
    ///   fraction of page height (default: 0.05)
    /// - `FORMFILL_OUTPUT_PREFIX`: Output file name prefix (default: "filled_")
    #[must_use = "creates config from environment variables"]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply any `FORMFILL_*` environment variables on top of `self`
    #[must_use = "returns the updated config"]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(path) = env::var("FORMFILL_FONT_PATH") {
            if !path.is_empty() {
                self.font_path = Some(PathBuf::from(path));
            }
        }

        if let Some(size) = env::var("FORMFILL_FONT_SIZE")
            .ok()
            .and_then(|s| s.parse::<f32>().ok())
            .filter(|s| s.is_finite() && *s > 0.0)
        {
            self.font_size = size;
        }

        if let Some(quality) = env::var("FORMFILL_JPEG_QUALITY")
            .ok()
            .and_then(|s| s.parse::<u8>().ok())
        {
            self.jpeg_quality = quality.clamp(1, 100);
        }

        if let Some(offset) = env::var("FORMFILL_LAST_NAME_OFFSET")
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|v| v.is_finite())
        {
            self.set_last_name_offset(offset);
        }

        if let Ok(prefix) = env::var("FORMFILL_OUTPUT_PREFIX") {
            self.output_prefix = prefix;
        }

        self
    }

    /// Set the vertical offset of the last-name rule, adding the rule if the
    /// configuration removed it
    pub fn set_last_name_offset(&mut self, dy: f64) {
        match self.adjustments.rule_mut(LAST_NAME_RULE) {
            Some(rule) => rule.dy = dy,
            None => self.adjustments.push(AdjustmentRule::last_name(dy)),
        }
    }

    /// Renderer options derived from this configuration
    #[must_use = "render options are computed but not used"]
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            font_scale: self.font_size,
            line_thickness: self.line_thickness,
            ..RenderOptions::default()
        }
    }

    /// Load the configured font, falling back to system fonts and then the
    /// block face
    #[must_use = "font is loaded but not used"]
    pub fn load_font(&self) -> OverlayFont {
        OverlayFont::load(self.font_path.as_deref())
    }
}

impl Default for OverlayConfig {
    #[inline]
    fn default() -> Self {
        Self {
            font_path: None,
            font_size: DEFAULT_FONT_SIZE,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
            line_thickness: 1,
            adjustments: AdjustmentRules::default(),
        }
    }
}
