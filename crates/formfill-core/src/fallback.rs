//! Heuristic placement for fields with no coordinate match
//!
//! A fixed keyword table maps common field labels to a column position on
//! the page. Anything unrecognized lands near the bottom of the page. The
//! renderer draws these in a distinct color so a reviewer can spot them.

use crate::geometry::{ImageDimensions, NormalizedPoint, PixelPoint};

/// Position used when no keyword matches
pub const DEFAULT_FALLBACK: NormalizedPoint = NormalizedPoint::new(0.3, 0.85);

/// Keyword table checked in order against the lowercased label
const FALLBACK_TABLE: &[(&[&str], NormalizedPoint)] = &[
    (&["name"], NormalizedPoint::new(0.3, 0.15)),
    (&["address"], NormalizedPoint::new(0.3, 0.25)),
    (&["city"], NormalizedPoint::new(0.3, 0.35)),
    (&["state"], NormalizedPoint::new(0.3, 0.45)),
    (&["zip", "postal"], NormalizedPoint::new(0.3, 0.55)),
    (&["ssn", "social"], NormalizedPoint::new(0.3, 0.65)),
    (&["ein", "employer"], NormalizedPoint::new(0.3, 0.75)),
];

/// Relative page position for an unmatched field label
#[must_use = "fallback position is returned but not used"]
pub fn fallback_position(label: &str) -> NormalizedPoint {
    let label = label.to_lowercase();
    FALLBACK_TABLE
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| label.contains(k)))
        .map_or(DEFAULT_FALLBACK, |(_, point)| *point)
}

/// Fallback position resolved directly into pixel space
#[inline]
#[must_use = "fallback position is returned but not used"]
pub fn fallback_pixel_position(label: &str, dims: ImageDimensions) -> PixelPoint {
    fallback_position(label).denormalize(dims)
}
