//! # formfill-core
//!
//! Placement logic for drawing collected answers back onto a scanned form.
//!
//! Given text detected on a page and a schema of fields, this crate decides
//! where each answer belongs:
//!
//! - [`geometry`]: normalized vs pixel coordinate spaces and the polygon
//!   normalizer
//! - [`layout`]: the layout-analysis input model and keyword field locator
//! - [`coordinates`]: the label → coordinate map and its JSON persistence
//! - [`matcher`]: tiered field-label matching
//! - [`adjustment`]: data-driven post-match offsets
//! - [`fallback`]: heuristic positions for unmatched fields
//! - [`overrides`]: hand-curated per-form data looked up by content hash
//!
//! Rendering lives in `formfill-overlay`.
//!
//! ## Example
//!
//! ```rust
//! use formfill_core::{AdjustmentRules, CoordinateMap, Field, FieldMatcher, NormalizedPoint};
//!
//! let mut coords = CoordinateMap::new();
//! coords.insert("zip", NormalizedPoint::new(0.3, 0.6));
//!
//! let field = Field::with_value("Zip Code", "10001");
//! let hit = FieldMatcher::new().find_match(&field, &coords).unwrap();
//! let point = AdjustmentRules::default().apply(&field.label, hit.point);
//! assert_eq!(point, NormalizedPoint::new(0.3, 0.6));
//! ```

pub mod adjustment;
pub mod coordinates;
pub mod error;
pub mod fallback;
pub mod geometry;
pub mod layout;
pub mod matcher;
pub mod overrides;
pub mod schema;

pub use adjustment::{AdjustmentRule, AdjustmentRules, DEFAULT_LAST_NAME_OFFSET, LAST_NAME_RULE};
pub use coordinates::CoordinateMap;
pub use error::{FormFillError, Result};
pub use fallback::{fallback_pixel_position, fallback_position, DEFAULT_FALLBACK};
pub use geometry::{
    normalize_polygon, ImageDimensions, NormalizedPoint, PixelPoint, Polygon, TextElement,
};
pub use layout::{
    identify_field_label, FieldLocator, JsonLayoutFile, KeywordLocator, LayoutAnalysis,
    LayoutAnalyzer,
};
pub use matcher::{FieldMatcher, LabelMatch, MatchStrategy, MatchTier, SemanticCategory};
pub use overrides::{file_hash, LookupKey, OverrideEntry, OverrideMetadata, OverrideStore};
pub use schema::{Field, FieldType, FormSchema, Section};
