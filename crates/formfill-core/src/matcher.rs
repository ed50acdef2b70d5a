//! Field-label matcher
//!
//! OCR-derived labels ("Zip:", "zip_code") rarely line up lexically with
//! schema labels ("Zip Code"). Matching therefore walks an ordered chain of
//! strategies, from precise to permissive, and the first tier that finds a
//! candidate wins:
//!
//! 1. [`MatchTier::Exact`]: same label (or same field name)
//! 2. [`MatchTier::Containment`]: one label is a substring of the other
//! 3. [`MatchTier::TokenOverlap`]: a word of one label occurs in the other
//! 4. [`MatchTier::SemanticCategory`]: both labels belong to the same
//!    [`SemanticCategory`]
//!
//! Each strategy is a pure `(candidate, target) -> bool` over lowercased,
//! trimmed labels. Within a tier candidates are visited in the coordinate
//! map's sorted order, so results are deterministic. The semantic tier walks
//! the target's categories in [`SemanticCategory::ALL`] order first and takes
//! the first candidate in the earliest category.

use crate::coordinates::CoordinateMap;
use crate::geometry::NormalizedPoint;
use crate::schema::Field;
use serde::{Deserialize, Serialize};

/// A matching strategy: `(candidate_label, target_label) -> matched`
pub type MatchStrategy = fn(&str, &str) -> bool;

// ============================================================================
// Semantic categories
// ============================================================================

/// Fixed label classes used to bridge vocabulary differences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticCategory {
    /// Person or business name
    Name,
    /// Street address
    Address,
    /// City or town
    City,
    /// State or province
    State,
    /// Zip or postal code
    Zip,
    /// Social security number
    Ssn,
    /// Employer identification number
    Ein,
}

impl SemanticCategory {
    /// All categories in evaluation order
    pub const ALL: [Self; 7] = [
        Self::Name,
        Self::Address,
        Self::City,
        Self::State,
        Self::Zip,
        Self::Ssn,
        Self::Ein,
    ];

    /// Keywords that place a label in this category
    #[inline]
    #[must_use = "keywords are returned but not used"]
    pub const fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Name => &["name", "legal", "business"],
            Self::Address => &["address", "street"],
            Self::City => &["city", "town"],
            Self::State => &["state", "province"],
            Self::Zip => &["zip", "postal"],
            Self::Ssn => &["ssn", "social", "security"],
            Self::Ein => &["ein", "employer", "identification"],
        }
    }

    /// Whether a lowercased label contains any of this category's keywords
    #[inline]
    #[must_use = "category check result is returned but not used"]
    pub fn contains_keyword(self, label_lower: &str) -> bool {
        self.keywords().iter().any(|k| label_lower.contains(k))
    }

    /// Every category a lowercased label belongs to
    pub fn classify(label_lower: &str) -> impl Iterator<Item = Self> + '_ {
        Self::ALL
            .into_iter()
            .filter(move |c| c.contains_keyword(label_lower))
    }
}

impl std::fmt::Display for SemanticCategory {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Name => "name",
            Self::Address => "address",
            Self::City => "city",
            Self::State => "state",
            Self::Zip => "zip",
            Self::Ssn => "ssn",
            Self::Ein => "ein",
        };
        write!(f, "{s}")
    }
}

// ============================================================================
// Strategies
// ============================================================================

fn exact(candidate: &str, target: &str) -> bool {
    !candidate.is_empty() && candidate == target
}

fn containment(candidate: &str, target: &str) -> bool {
    if candidate.is_empty() || target.is_empty() {
        return false;
    }
    target.contains(candidate) || candidate.contains(target)
}

fn token_overlap(candidate: &str, target: &str) -> bool {
    target.split_whitespace().any(|word| candidate.contains(word))
        || candidate.split_whitespace().any(|word| target.contains(word))
}

fn semantic_category(candidate: &str, target: &str) -> bool {
    SemanticCategory::classify(target).any(|c| c.contains_keyword(candidate))
}

/// One tier of the matching chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// Labels are equal
    Exact,
    /// One label is a substring of the other
    Containment,
    /// A word of one label occurs in the other
    TokenOverlap,
    /// Both labels share a semantic category
    SemanticCategory,
}

impl MatchTier {
    /// The default chain, most precise first
    pub const ALL: [Self; 4] = [
        Self::Exact,
        Self::Containment,
        Self::TokenOverlap,
        Self::SemanticCategory,
    ];

    /// The pure predicate implementing this tier
    #[inline]
    #[must_use = "strategy is returned but not used"]
    pub const fn strategy(self) -> MatchStrategy {
        match self {
            Self::Exact => exact,
            Self::Containment => containment,
            Self::TokenOverlap => token_overlap,
            Self::SemanticCategory => semantic_category,
        }
    }

    /// Only exact matching also considers the field's machine name
    #[inline]
    const fn checks_field_name(self) -> bool {
        matches!(self, Self::Exact)
    }
}

impl std::fmt::Display for MatchTier {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Exact => "exact",
            Self::Containment => "containment",
            Self::TokenOverlap => "token_overlap",
            Self::SemanticCategory => "semantic_category",
        };
        write!(f, "{s}")
    }
}

// ============================================================================
// Matcher
// ============================================================================

/// Result of a successful match
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelMatch<'a> {
    /// Coordinate-map label that matched
    pub candidate: &'a str,
    /// Its normalized coordinate
    pub point: NormalizedPoint,
    /// Tier that produced the match
    pub tier: MatchTier,
}

#[inline]
fn fold(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Tiered label matcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatcher {
    tiers: Vec<MatchTier>,
}

impl Default for FieldMatcher {
    #[inline]
    fn default() -> Self {
        Self {
            tiers: MatchTier::ALL.to_vec(),
        }
    }
}

impl FieldMatcher {
    /// Matcher with the default four-tier chain
    #[inline]
    #[must_use = "matcher is created but not used"]
    pub fn new() -> Self {
        Self::default()
    }

    /// Matcher with a custom chain (order is evaluation order)
    #[inline]
    #[must_use = "matcher is created but not used"]
    pub fn with_tiers(tiers: Vec<MatchTier>) -> Self {
        Self { tiers }
    }

    /// Tiers in evaluation order
    #[inline]
    #[must_use = "tiers are returned but not used"]
    pub fn tiers(&self) -> &[MatchTier] {
        &self.tiers
    }

    /// Find the best coordinate for `field`, or `None` if no tier matches.
    #[must_use = "match result is returned but not used"]
    pub fn find_match<'m>(&self, field: &Field, map: &'m CoordinateMap) -> Option<LabelMatch<'m>> {
        let label = fold(field.display_label());
        let name = field.name.as_deref().map(fold);
        let candidates: Vec<(String, &'m str, NormalizedPoint)> = map
            .into_iter()
            .map(|(k, v)| (fold(k), k.as_str(), *v))
            .collect();

        for &tier in &self.tiers {
            let hit = match tier {
                MatchTier::SemanticCategory => SemanticCategory::classify(&label).find_map(|c| {
                    candidates
                        .iter()
                        .find(|(folded, _, _)| c.contains_keyword(folded))
                }),
                _ => {
                    let strategy = tier.strategy();
                    candidates.iter().find(|(folded, _, _)| {
                        strategy(folded, &label)
                            || (tier.checks_field_name()
                                && name.as_deref().is_some_and(|n| strategy(folded, n)))
                    })
                }
            };
            if let Some((_, candidate, point)) = hit {
                return Some(LabelMatch {
                    candidate: *candidate,
                    point: *point,
                    tier,
                });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, f64, f64)]) -> CoordinateMap {
        entries
            .iter()
            .map(|(k, x, y)| ((*k).to_string(), NormalizedPoint::new(*x, *y)))
            .collect()
    }

    fn field(label: &str) -> Field {
        Field {
            label: label.to_string(),
            ..Field::default()
        }
    }

    #[test]
    fn test_exact_beats_containment() {
        let coords = map(&[("Last Name", 0.1, 0.1), ("Name", 0.2, 0.2)]);
        let m = FieldMatcher::new().find_match(&field("Last Name"), &coords).unwrap();
        assert_eq!(m.point, NormalizedPoint::new(0.1, 0.1));
        assert_eq!(m.tier, MatchTier::Exact);
    }

    #[test]
    fn test_exact_is_case_insensitive() {
        let coords = map(&[("aaa", 0.9, 0.9), ("EMAIL", 0.4, 0.4)]);
        let m = FieldMatcher::new().find_match(&field("email"), &coords).unwrap();
        assert_eq!(m.candidate, "EMAIL");
        assert_eq!(m.tier, MatchTier::Exact);
    }

    #[test]
    fn test_exact_on_field_name() {
        let coords = map(&[("job_title", 0.5, 0.7), ("title", 0.1, 0.1)]);
        let f = Field {
            label: "Position Applied For".to_string(),
            name: Some("job_title".to_string()),
            ..Field::default()
        };
        let m = FieldMatcher::new().find_match(&f, &coords).unwrap();
        assert_eq!(m.candidate, "job_title");
        assert_eq!(m.tier, MatchTier::Exact);
    }

    #[test]
    fn test_containment() {
        let coords = map(&[("phone", 0.55, 0.2)]);
        let m = FieldMatcher::new()
            .find_match(&field("Phone Number"), &coords)
            .unwrap();
        assert_eq!(m.tier, MatchTier::Containment);
    }

    #[test]
    fn test_token_overlap() {
        let coords = map(&[("zip_code", 0.3, 0.6)]);
        let m = FieldMatcher::new().find_match(&field("Zip Code"), &coords).unwrap();
        assert_eq!(m.tier, MatchTier::TokenOverlap);
        assert_eq!(m.point, NormalizedPoint::new(0.3, 0.6));
    }

    #[test]
    fn test_semantic_category() {
        let coords = map(&[("postal", 0.3, 0.6)]);
        let m = FieldMatcher::new().find_match(&field("ZIP Code"), &coords).unwrap();
        assert_eq!(m.tier, MatchTier::SemanticCategory);
        assert_eq!(m.point, NormalizedPoint::new(0.3, 0.6));
    }

    #[test]
    fn test_semantic_category_order_decides() {
        // "business street" is both a name and an address label
        let coords = map(&[("address", 0.1, 0.1), ("name", 0.2, 0.2)]);
        let matcher = FieldMatcher::with_tiers(vec![MatchTier::SemanticCategory]);
        let m = matcher.find_match(&field("Business Street"), &coords).unwrap();
        assert_eq!(m.candidate, "name");
        assert_eq!(m.point, NormalizedPoint::new(0.2, 0.2));

        let m = FieldMatcher::new()
            .find_match(&field("Business Street"), &coords)
            .unwrap();
        assert_eq!(m.tier, MatchTier::SemanticCategory);
        assert_eq!(m.candidate, "name");
    }

    #[test]
    fn test_zip_scenario() {
        let coords = map(&[("zip", 0.3, 0.6)]);
        let m = FieldMatcher::new().find_match(&field("Zip Code"), &coords).unwrap();
        assert_eq!(m.point, NormalizedPoint::new(0.3, 0.6));
    }

    #[test]
    fn test_semantic_tier_alone_matches_zip() {
        let matcher = FieldMatcher::with_tiers(vec![MatchTier::SemanticCategory]);
        let coords = map(&[("zip", 0.3, 0.6)]);
        let m = matcher.find_match(&field("zip code"), &coords).unwrap();
        assert_eq!(m.tier, MatchTier::SemanticCategory);
    }

    #[test]
    fn test_no_match() {
        let coords = map(&[("email", 0.1, 0.1)]);
        assert!(FieldMatcher::new()
            .find_match(&field("Unknown Field"), &coords)
            .is_none());
        assert!(FieldMatcher::new()
            .find_match(&field("Anything"), &CoordinateMap::new())
            .is_none());
    }

    #[test]
    fn test_empty_label_matches_nothing() {
        let coords = map(&[("email", 0.1, 0.1)]);
        assert!(FieldMatcher::new().find_match(&field(""), &coords).is_none());
    }

    #[test]
    fn test_strategies_are_symmetric_where_expected() {
        assert!(containment("name", "full name"));
        assert!(containment("full name", "name"));
        assert!(token_overlap("reason_for_leaving", "reason"));
        assert!(!exact("", ""));
        assert!(!containment("", "x"));
    }

    #[test]
    fn test_classify() {
        let cats: Vec<_> = SemanticCategory::classify("business address").collect();
        assert_eq!(cats, vec![SemanticCategory::Name, SemanticCategory::Address]);
        assert_eq!(SemanticCategory::classify("favorite color").count(), 0);
    }
}
