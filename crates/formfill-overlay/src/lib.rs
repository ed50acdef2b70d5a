//! # formfill-overlay
//!
//! Draws collected answers onto a scanned form image.
//!
//! - [`canvas`]: decoded source image
//! - [`font`]: TrueType or block-glyph answer font
//! - [`renderer`]: text and box drawing, JPEG output
//! - [`orchestrator`]: coordinate resolution, placement planning, filling
//! - [`config`]: defaults and `FORMFILL_*` environment overrides
//!
//! ## Example
//!
//! ```rust,no_run
//! use formfill_core::FormSchema;
//! use formfill_overlay::{CoordinateSources, FormFiller, OverlayConfig};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = FormSchema::load(Path::new("schema.json"))?;
//! let filler = FormFiller::new(&OverlayConfig::from_env());
//! let sources = CoordinateSources {
//!     coordinate_file: Some(Path::new("coords.json")),
//!     ..CoordinateSources::default()
//! };
//! let report = filler.fill(Path::new("form.png"), &schema, &sources, None)?;
//! println!("{} answers written to {}", report.placed.len(), report.output.display());
//! # Ok(())
//! # }
//! ```

pub mod canvas;
pub mod config;
pub mod error;
pub mod font;
pub mod orchestrator;
pub mod renderer;

pub use canvas::FormCanvas;
pub use config::{OverlayConfig, DEFAULT_FONT_SIZE};
pub use error::{OverlayError, Result};
pub use font::OverlayFont;
pub use orchestrator::{
    CoordinateSource, CoordinateSources, FillReport, FormFiller, ResolvedCoordinates,
};
pub use renderer::{
    default_output_path, Anchor, OverlayItem, OverlayRenderer, PlacementOrigin, PositionedField,
    RenderOptions, RenderedForm, DEFAULT_JPEG_QUALITY, DEFAULT_OUTPUT_PREFIX,
};
