//! Post-match positional adjustments
//!
//! Rules are data: a keyword set and a page-fraction offset. They run after
//! matching and before denormalization, at most one rule per field.

use crate::geometry::NormalizedPoint;
use serde::{Deserialize, Serialize};

/// Default downward shift for last-name fields (5% of page height)
pub const DEFAULT_LAST_NAME_OFFSET: f64 = 0.05;

/// Name of the built-in last-name rule
pub const LAST_NAME_RULE: &str = "last_name";

/// Lowercase and read `_` / `-` as spaces, so "family_name" and
/// "Family Name" compare equal
fn fold_separators(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '_' || c == '-' { ' ' } else { c })
        .collect()
}

/// A single keyword-triggered offset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentRule {
    /// Rule identifier (used in logs and config overrides)
    pub name: String,
    /// Label keywords; any one of them occurring in the label fires the rule
    pub keywords: Vec<String>,
    /// Horizontal offset as a fraction of page width
    #[serde(default)]
    pub dx: f64,
    /// Vertical offset as a fraction of page height
    #[serde(default)]
    pub dy: f64,
}

impl AdjustmentRule {
    /// The built-in rule separating last name from a first name detected on
    /// the same line
    #[must_use = "rule is created but not used"]
    pub fn last_name(dy: f64) -> Self {
        Self {
            name: LAST_NAME_RULE.to_string(),
            keywords: ["last_name", "lastname", "last name", "surname", "family_name"]
                .iter()
                .map(|k| (*k).to_string())
                .collect(),
            dx: 0.0,
            dy,
        }
    }

    /// Whether this rule applies to `label`
    #[must_use = "rule check result is returned but not used"]
    pub fn applies_to(&self, label: &str) -> bool {
        let label = fold_separators(label);
        self.keywords
            .iter()
            .map(|k| fold_separators(k))
            .any(|k| !k.is_empty() && label.contains(&k))
    }
}

/// Ordered set of adjustment rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdjustmentRules {
    rules: Vec<AdjustmentRule>,
}

impl Default for AdjustmentRules {
    #[inline]
    fn default() -> Self {
        Self {
            rules: vec![AdjustmentRule::last_name(DEFAULT_LAST_NAME_OFFSET)],
        }
    }
}

impl AdjustmentRules {
    /// Rules from an explicit list
    #[inline]
    #[must_use = "rules are created but not used"]
    pub fn new(rules: Vec<AdjustmentRule>) -> Self {
        Self { rules }
    }

    /// No adjustments at all
    #[inline]
    #[must_use = "rules are created but not used"]
    pub fn none() -> Self {
        Self { rules: Vec::new() }
    }

    /// Rules in evaluation order
    #[inline]
    #[must_use = "rules are returned but not used"]
    pub fn rules(&self) -> &[AdjustmentRule] {
        &self.rules
    }

    /// Append a rule; it is evaluated after existing ones
    #[inline]
    pub fn push(&mut self, rule: AdjustmentRule) {
        self.rules.push(rule);
    }

    /// Mutable access to a rule by name
    #[inline]
    pub fn rule_mut(&mut self, name: &str) -> Option<&mut AdjustmentRule> {
        self.rules.iter_mut().find(|r| r.name == name)
    }

    /// First rule that applies to `label`
    #[inline]
    #[must_use = "matching rule is returned but not used"]
    pub fn rule_for(&self, label: &str) -> Option<&AdjustmentRule> {
        self.rules.iter().find(|r| r.applies_to(label))
    }

    /// Apply the first matching rule to a matched coordinate.
    #[must_use = "adjusted point is returned but not used"]
    pub fn apply(&self, label: &str, point: NormalizedPoint) -> NormalizedPoint {
        match self.rule_for(label) {
            Some(rule) => {
                let adjusted = point.offset(rule.dx, rule.dy);
                log::debug!("Adjusted '{label}' by rule '{}': {point} -> {adjusted}", rule.name);
                adjusted
            }
            None => point,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: NormalizedPoint, b: NormalizedPoint) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn test_family_name_moves_down() {
        let rules = AdjustmentRules::default();
        let out = rules.apply("Family Name", NormalizedPoint::new(0.3, 0.4));
        assert!(close(out, NormalizedPoint::new(0.3, 0.45)));
    }

    #[test]
    fn test_first_name_unchanged() {
        let rules = AdjustmentRules::default();
        let p = NormalizedPoint::new(0.3, 0.2);
        assert_eq!(rules.apply("First Name", p), p);
    }

    #[test]
    fn test_keyword_variants() {
        let rule = AdjustmentRule::last_name(0.05);
        for label in ["Last Name", "last_name", "LASTNAME", "Surname", "family-name", "Applicant's last name"] {
            assert!(rule.applies_to(label), "{label} should match");
        }
        for label in ["Name", "First Name", "Given Name", "Family"] {
            assert!(!rule.applies_to(label), "{label} should not match");
        }
    }

    #[test]
    fn test_first_rule_wins() {
        let mut rules = AdjustmentRules::default();
        rules.push(AdjustmentRule {
            name: "surname_right".to_string(),
            keywords: vec!["surname".to_string()],
            dx: 0.1,
            dy: 0.0,
        });
        let out = rules.apply("Surname", NormalizedPoint::new(0.2, 0.2));
        assert!(close(out, NormalizedPoint::new(0.2, 0.25)));
    }

    #[test]
    fn test_configurable_offset() {
        let mut rules = AdjustmentRules::default();
        rules.rule_mut(LAST_NAME_RULE).unwrap().dy = 0.1;
        let out = rules.apply("Last Name", NormalizedPoint::new(0.3, 0.3));
        assert!(close(out, NormalizedPoint::new(0.3, 0.4)));
    }

    #[test]
    fn test_rules_deserialize_from_list() {
        let json = r#"[{"name": "signature", "keywords": ["signature"], "dy": -0.01}]"#;
        let rules: AdjustmentRules = serde_json::from_str(json).unwrap();
        assert_eq!(rules.rules().len(), 1);
        assert_eq!(rules.rules()[0].dx, 0.0);
        assert!(AdjustmentRules::none().rule_for("Last Name").is_none());
    }
}
