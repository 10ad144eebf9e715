//! The versioned trigger-rule table
//!
//! Every rule the detector enforces is declared here as data, so the
//! mapping from trigger to violation category is reviewable and testable
//! rather than buried in string searches.

use claimguard_core::ViolationCategory;
use serde::{Deserialize, Serialize};

/// Version of the built-in rule table. Bump when rules are added, removed,
/// or recategorized.
pub const RULESET_VERSION: u32 = 1;

/// How a rule matches content
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "lowercase")]
pub enum TriggerKind {
    /// Fixed phrase, matched case-insensitively on word boundaries
    Phrase { phrase: String },

    /// Regular expression, compiled case-insensitively
    Pattern { pattern: String },
}

/// A single trigger rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerRule {
    /// Rule identifier
    pub name: String,

    /// Violation category reported on a match
    pub category: ViolationCategory,

    /// Match condition
    #[serde(flatten)]
    pub kind: TriggerKind,
}

impl TriggerRule {
    /// A phrase rule
    pub fn phrase(
        name: impl Into<String>,
        category: ViolationCategory,
        phrase: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            kind: TriggerKind::Phrase {
                phrase: phrase.into(),
            },
        }
    }

    /// A regex rule
    pub fn pattern(
        name: impl Into<String>,
        category: ViolationCategory,
        pattern: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            kind: TriggerKind::Pattern {
                pattern: pattern.into(),
            },
        }
    }
}

/// The built-in rule table
pub fn builtin_rules() -> Vec<TriggerRule> {
    use ViolationCategory::*;

    let mut rules = Vec::new();

    // First-person action language
    for (name, pattern) in [
        ("i-contraction-future", r"\bi'll\s+\w+"),
        ("i-am-doing", r"\bi\s+am\s+\w+ing\b"),
        ("i-will", r"\bi\s+will\s+\w+"),
        ("i-have-done", r"\bi\s+have\s+\w+ed\b"),
        ("im-doing", r"\bi'm\s+\w+ing\b"),
        ("ive-done", r"\bi've\s+\w+ed\b"),
        ("i-can-now", r"\bi\s+can\s+now\s+\w+"),
    ] {
        rules.push(TriggerRule::pattern(name, ActionLanguage, pattern));
    }

    // Completion claims
    for phrase in [
        "complete",
        "finished",
        "done",
        "ready",
        "live",
        "active",
        "deployed",
        "running",
        "working",
        "successful",
        "implemented",
    ] {
        rules.push(TriggerRule::phrase(
            format!("claims-{phrase}"),
            CompletionClaim,
            phrase,
        ));
    }
    rules.push(TriggerRule::pattern(
        "has-been-done",
        CompletionClaim,
        r"\bhas\s+been\s+\w+ed\b",
    ));

    // Status claims
    for phrase in ["enabled", "activated", "executed", "processed"] {
        rules.push(TriggerRule::phrase(
            format!("status-{phrase}"),
            StatusClaim,
            phrase,
        ));
    }
    for (name, pattern) in [
        ("is-now", r"\bis\s+now\s+\w+"),
        ("will-now", r"\bwill\s+now\s+\w+"),
        ("should-now-work", r"\bshould\s+now\s+work\b"),
    ] {
        rules.push(TriggerRule::pattern(name, StatusClaim, pattern));
    }

    // Feature claims
    for phrase in ["feature is live", "system is ready", "api is working"] {
        rules.push(TriggerRule::phrase(
            format!("feature-{}", phrase.replace(' ', "-")),
            FeatureClaim,
            phrase,
        ));
    }

    rules
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_rules_cover_all_categories() {
        let rules = builtin_rules();
        for category in [
            ViolationCategory::ActionLanguage,
            ViolationCategory::CompletionClaim,
            ViolationCategory::StatusClaim,
            ViolationCategory::FeatureClaim,
        ] {
            assert!(
                rules.iter().any(|r| r.category == category),
                "no rule for {category:?}"
            );
        }
    }

    #[test]
    fn test_rule_names_unique() {
        let rules = builtin_rules();
        let mut names: Vec<_> = rules.iter().map(|r| r.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), rules.len());
    }

    #[test]
    fn test_rule_serialization() {
        let rule = TriggerRule::phrase("claims-done", ViolationCategory::CompletionClaim, "done");
        let json = serde_json::to_string(&rule).unwrap();
        assert!(json.contains(r#""type":"phrase""#));

        let back: TriggerRule = serde_json::from_str(&json).unwrap();
        assert!(matches!(back.kind, TriggerKind::Phrase { ref phrase } if phrase == "done"));
    }
}
