//! Layout analysis input and field location
//!
//! Layout analysis itself (OCR plus reading-order detection) is performed by an
//! external service. This module models its JSON result, turns it into
//! [`TextElement`]s, and locates field labels on the page to build a
//! [`CoordinateMap`].

use crate::coordinates::CoordinateMap;
use crate::error::Result;
use crate::geometry::{Polygon, TextElement};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// Layout analysis result (external JSON shape)
// ============================================================================

/// A text line on a page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutLine {
    /// Recognized text
    #[serde(default)]
    pub content: String,
    /// Bounding polygon in page units
    #[serde(default)]
    pub polygon: Polygon,
}

/// One analyzed page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutPage {
    /// Page width in page units
    #[serde(default = "unit_extent")]
    pub width: f64,
    /// Page height in page units
    #[serde(default = "unit_extent")]
    pub height: f64,
    /// Lines detected on this page
    #[serde(default)]
    pub lines: Vec<LayoutLine>,
}

/// Region a paragraph occupies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingRegion {
    /// 1-based page number, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    /// Bounding polygon in page units
    #[serde(default)]
    pub polygon: Polygon,
}

/// A paragraph spanning one or more regions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutParagraph {
    /// Paragraph text
    #[serde(default)]
    pub content: String,
    /// Regions, first one is used for positioning
    #[serde(default)]
    pub bounding_regions: Vec<BoundingRegion>,
}

/// Result of layout analysis on a form image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutAnalysis {
    /// Pages; forms are treated as single-page and only the first is used
    #[serde(default)]
    pub pages: Vec<LayoutPage>,
    /// Paragraphs across the document
    #[serde(default)]
    pub paragraphs: Vec<LayoutParagraph>,
}

const fn unit_extent() -> f64 {
    1.0
}

impl LayoutAnalysis {
    /// Text elements of the first page: paragraphs first, then lines.
    ///
    /// Elements with blank content are dropped. Geometry is not validated
    /// here; see [`TextElement::normalized_center`].
    #[must_use = "text elements are returned but not used"]
    pub fn text_elements(&self) -> Vec<TextElement> {
        let Some(page) = self.pages.first() else {
            return Vec::new();
        };

        let paragraphs = self.paragraphs.iter().filter_map(|p| {
            p.bounding_regions
                .first()
                .map(|region| (p.content.as_str(), &region.polygon))
        });
        let lines = page.lines.iter().map(|l| (l.content.as_str(), &l.polygon));

        paragraphs
            .chain(lines)
            .filter_map(|(content, polygon)| {
                let content = content.trim();
                (!content.is_empty()).then(|| TextElement {
                    content: content.to_string(),
                    polygon: polygon.clone(),
                    page_width: page.width,
                    page_height: page.height,
                })
            })
            .collect()
    }
}

// ============================================================================
// Collaborator seams
// ============================================================================

/// External layout analysis service (OCR + layout)
pub trait LayoutAnalyzer {
    /// Analyze a form image.
    ///
    /// # Errors
    ///
    /// Returns an error if the service cannot analyze the image.
    fn analyze(&self, image_path: &Path) -> Result<LayoutAnalysis>;
}

/// Turns a layout analysis into a label → coordinate map
pub trait FieldLocator {
    /// Locate field labels on the analyzed page
    fn locate(&self, analysis: &LayoutAnalysis) -> CoordinateMap;
}

/// Layout analysis read from a JSON file produced earlier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonLayoutFile {
    path: std::path::PathBuf,
}

impl JsonLayoutFile {
    /// Analyzer that ignores the image and reads `path`
    #[inline]
    #[must_use = "layout file analyzer is created but not used"]
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LayoutAnalyzer for JsonLayoutFile {
    fn analyze(&self, _image_path: &Path) -> Result<LayoutAnalysis> {
        let file = std::fs::File::open(&self.path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }
}

// ============================================================================
// Keyword locator
// ============================================================================

/// Canonical labels and the text patterns that identify them, most specific
/// first
const LABEL_PATTERNS: &[(&str, &[&str])] = &[
    ("business_name", &["business name", "company name", "employer name"]),
    ("account_number", &["account number", "account #"]),
    ("ssn", &["social security", "ssn"]),
    ("ein", &["employer identification", "employer id", "ein"]),
    ("zip", &["zip", "postal"]),
    ("name", &["legal name", "name"]),
    ("address", &["street address", "business address", "address"]),
    ("city", &["city", "town"]),
    ("state", &["state", "province"]),
    ("date", &["signature date", "date"]),
    ("signature", &["sign here", "signature"]),
];

/// Canonical label for a piece of form text, if it names a known field
#[must_use = "identified label is returned but not used"]
pub fn identify_field_label(content: &str) -> Option<&'static str> {
    let content = content.to_lowercase();
    LABEL_PATTERNS
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|p| content.contains(p)))
        .map(|(label, _)| *label)
}

/// Locates fields by classifying each text element's content against a
/// fixed pattern table and recording its normalized center.
///
/// Later elements overwrite earlier ones for the same label, so a page line
/// wins over the paragraph containing it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeywordLocator;

impl FieldLocator for KeywordLocator {
    fn locate(&self, analysis: &LayoutAnalysis) -> CoordinateMap {
        let mut map = CoordinateMap::new();
        for element in analysis.text_elements() {
            let Some(point) = element.normalized_center() else {
                log::debug!("Skipping '{}': unusable polygon", element.content);
                continue;
            };
            if let Some(label) = identify_field_label(&element.content) {
                map.insert(label, point);
            }
        }
        log::info!("Located {} field labels on the page", map.len());
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::NormalizedPoint;

    const LAYOUT_JSON: &str = r#"{
        "pages": [{
            "width": 1000,
            "height": 2000,
            "lines": [
                {"content": "City:", "polygon": [100, 400, 200, 400, 200, 440, 100, 440]},
                {"content": "   ", "polygon": [0, 0, 1, 1]},
                {"content": "Zip Code", "polygon": [100, 1200]}
            ]
        }],
        "paragraphs": [
            {"content": "Full Name", "boundingRegions": [{"pageNumber": 1, "polygon": [100, 200, 300, 200, 300, 240, 100, 240]}]},
            {"content": "Orphan", "boundingRegions": []}
        ]
    }"#;

    #[test]
    fn test_parse_layout() {
        let layout: LayoutAnalysis = serde_json::from_str(LAYOUT_JSON).unwrap();
        assert_eq!(layout.pages.len(), 1);
        assert_eq!(layout.paragraphs[0].bounding_regions[0].page_number, Some(1));
    }

    #[test]
    fn test_text_elements_order_and_filtering() {
        let layout: LayoutAnalysis = serde_json::from_str(LAYOUT_JSON).unwrap();
        let contents: Vec<String> = layout
            .text_elements()
            .into_iter()
            .map(|e| e.content)
            .collect();
        assert_eq!(contents, vec!["Full Name", "City:", "Zip Code"]);
    }

    #[test]
    fn test_keyword_locator() {
        let layout: LayoutAnalysis = serde_json::from_str(LAYOUT_JSON).unwrap();
        let map = KeywordLocator.locate(&layout);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("name"), Some(NormalizedPoint::new(0.2, 0.11)));
        assert_eq!(map.get("city"), Some(NormalizedPoint::new(0.15, 0.21)));
        // "Zip Code" has a one-point polygon and is skipped
        assert_eq!(map.get("zip"), None);
    }

    #[test]
    fn test_identify_specific_before_generic() {
        assert_eq!(identify_field_label("Company Name:"), Some("business_name"));
        assert_eq!(identify_field_label("Legal name"), Some("name"));
        assert_eq!(identify_field_label("Social Security Number"), Some("ssn"));
        assert_eq!(identify_field_label("Sign here"), Some("signature"));
        assert_eq!(identify_field_label("Date"), Some("date"));
        assert_eq!(identify_field_label("Signature Date"), Some("date"));
        assert_eq!(identify_field_label("Signature"), Some("signature"));
        assert_eq!(identify_field_label("Favorite color"), None);
    }

    #[test]
    fn test_missing_pages() {
        let layout = LayoutAnalysis::default();
        assert!(layout.text_elements().is_empty());
        assert!(KeywordLocator.locate(&layout).is_empty());
    }

    #[test]
    fn test_missing_page_size_defaults_to_unit() {
        let layout: LayoutAnalysis =
            serde_json::from_str(r#"{"pages": [{"lines": [{"content": "State", "polygon": [0.2, 0.4, 0.4, 0.4]}]}]}"#)
                .unwrap();
        let map = KeywordLocator.locate(&layout);
        let p = map.get("state").unwrap();
        assert!((p.x - 0.3).abs() < 1e-12);
        assert!((p.y - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_json_layout_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.json");
        std::fs::write(&path, LAYOUT_JSON).unwrap();
        let layout = JsonLayoutFile::new(&path).analyze(Path::new("form.png")).unwrap();
        assert_eq!(layout.pages[0].lines.len(), 3);
    }
}
