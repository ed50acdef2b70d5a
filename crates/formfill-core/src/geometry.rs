//! Coordinate spaces and the polygon normalizer
//!
//! Two coordinate spaces exist and they are kept apart by type:
//!
//! - [`NormalizedPoint`]: fraction of page width/height, origin top-left.
//!   This is what a [`CoordinateMap`](crate::CoordinateMap) stores.
//! - [`PixelPoint`]: pixel position on a concrete image. This is what the
//!   renderer draws at.
//!
//! The only way from one to the other is [`NormalizedPoint::denormalize`]
//! (and [`normalize_polygon`] for raw layout geometry).

use serde::{Deserialize, Serialize};

// ============================================================================
// Normalized (page-fraction) space
// ============================================================================

/// A point expressed as a fraction of page width and height.
///
/// Serialized as a two-element array `[x, y]`, the shape used by persisted
/// coordinate maps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct NormalizedPoint {
    /// Horizontal fraction (0 = left edge, 1 = right edge)
    pub x: f64,
    /// Vertical fraction (0 = top edge, 1 = bottom edge)
    pub y: f64,
}

impl NormalizedPoint {
    /// Create a new normalized point
    #[inline]
    #[must_use = "normalized point is created but not used"]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Normalize a single page-space point by the page dimensions.
    ///
    /// Returns `None` when either dimension is not a positive finite number.
    #[inline]
    #[must_use = "normalized point is computed but not used"]
    pub fn from_page_point(x: f64, y: f64, page_width: f64, page_height: f64) -> Option<Self> {
        if !valid_extent(page_width) || !valid_extent(page_height) {
            return None;
        }
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        Some(Self::new(x / page_width, y / page_height))
    }

    /// Whether both components lie in `[0, 1]`
    #[inline]
    #[must_use = "range check result is computed but not used"]
    pub fn is_on_page(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }

    /// Shift the point by a page-fraction offset
    #[inline]
    #[must_use = "offset point is computed but not used"]
    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Convert to pixel space for an image of the given size.
    ///
    /// Linear and exact: `(x * width, y * height)`.
    #[inline]
    #[must_use = "pixel point is computed but not used"]
    pub fn denormalize(&self, dims: ImageDimensions) -> PixelPoint {
        PixelPoint::new(
            self.x * f64::from(dims.width),
            self.y * f64::from(dims.height),
        )
    }
}

impl From<[f64; 2]> for NormalizedPoint {
    #[inline]
    fn from(value: [f64; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl From<NormalizedPoint> for [f64; 2] {
    #[inline]
    fn from(point: NormalizedPoint) -> Self {
        [point.x, point.y]
    }
}

impl std::fmt::Display for NormalizedPoint {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

// ============================================================================
// Pixel space
// ============================================================================

/// A position in pixels on a concrete image, origin top-left
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    /// Horizontal pixel offset
    pub x: f64,
    /// Vertical pixel offset
    pub y: f64,
}

impl PixelPoint {
    /// Create a new pixel point
    #[inline]
    #[must_use = "pixel point is created but not used"]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for PixelPoint {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Pixel dimensions of an image
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageDimensions {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl ImageDimensions {
    /// Create new image dimensions
    #[inline]
    #[must_use = "image dimensions are created but not used"]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

// ============================================================================
// Layout geometry
// ============================================================================

/// Bounding polygon as produced by layout analysis: `[x0, y0, x1, y1, ...]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon(pub Vec<f64>);

impl Polygon {
    /// Minimum number of vertices for a usable polygon
    pub const MIN_POINTS: usize = 2;

    /// Number of complete (x, y) vertices
    #[inline]
    #[must_use = "point count is computed but not used"]
    pub fn point_count(&self) -> usize {
        self.0.len() / 2
    }

    /// Vertex-mean centroid in page units.
    ///
    /// This is the mean of all vertices, not the bounding-box center.
    /// Returns `None` for fewer than two vertices, a dangling coordinate, or
    /// non-finite values.
    #[must_use = "centroid is computed but not used"]
    pub fn centroid(&self) -> Option<(f64, f64)> {
        if self.0.len() % 2 != 0 || self.point_count() < Self::MIN_POINTS {
            return None;
        }
        if self.0.iter().any(|v| !v.is_finite()) {
            return None;
        }

        // Precision loss acceptable: polygons have a handful of vertices
        #[allow(clippy::cast_precision_loss)]
        let n = self.point_count() as f64;
        let (sum_x, sum_y) = self
            .0
            .chunks_exact(2)
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p[0], sy + p[1]));
        Some((sum_x / n, sum_y / n))
    }
}

impl From<Vec<f64>> for Polygon {
    #[inline]
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// A text element detected on a page, with the page it was measured on
#[derive(Debug, Clone, PartialEq)]
pub struct TextElement {
    /// Recognized text
    pub content: String,
    /// Bounding polygon in page units
    pub polygon: Polygon,
    /// Page width in page units
    pub page_width: f64,
    /// Page height in page units
    pub page_height: f64,
}

impl TextElement {
    /// Normalized center of this element, or `None` if the geometry is
    /// unusable and the element should be skipped
    #[inline]
    #[must_use = "normalized center is computed but not used"]
    pub fn normalized_center(&self) -> Option<NormalizedPoint> {
        normalize_polygon(&self.polygon, self.page_width, self.page_height)
    }
}

#[inline]
fn valid_extent(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

/// Convert a page-unit polygon into a page-fraction center point.
///
/// Returns `None` (skip the element, not an error) when the polygon has fewer
/// than two vertices or the page dimensions are not positive.
#[must_use = "normalized point is computed but not used"]
pub fn normalize_polygon(
    polygon: &Polygon,
    page_width: f64,
    page_height: f64,
) -> Option<NormalizedPoint> {
    let (cx, cy) = polygon.centroid()?;
    NormalizedPoint::from_page_point(cx, cy, page_width, page_height)
}
