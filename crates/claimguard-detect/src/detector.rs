//! Trigger detection over output content

use aho_corasick::AhoCorasick;
use claimguard_core::{Error, Result, Violation, ViolationCategory};
use regex::RegexBuilder;
use std::collections::HashSet;

use crate::rules::{builtin_rules, TriggerKind, TriggerRule};

/// Detector for unverified action/completion claims.
///
/// Fixed phrases go through a single Aho-Corasick automaton; inflected
/// first-person forms go through per-rule regexes. Detection is a pure
/// function of the content: no side effects, no stored state between calls.
pub struct TriggerDetector {
    phrases: AhoCorasick,
    phrase_categories: Vec<ViolationCategory>,
    patterns: Vec<(regex::Regex, ViolationCategory)>,
}

impl TriggerDetector {
    /// Build a detector from an explicit rule table
    pub fn new(rules: &[TriggerRule]) -> Result<Self> {
        let mut phrase_strs = Vec::new();
        let mut phrase_categories = Vec::new();
        let mut patterns = Vec::new();

        for rule in rules {
            match &rule.kind {
                TriggerKind::Phrase { phrase } => {
                    phrase_strs.push(phrase.clone());
                    phrase_categories.push(rule.category);
                }
                TriggerKind::Pattern { pattern } => {
                    let regex = RegexBuilder::new(pattern)
                        .case_insensitive(true)
                        .build()
                        .map_err(|e| {
                            Error::detection(format!("invalid pattern in rule {}: {e}", rule.name))
                        })?;
                    patterns.push((regex, rule.category));
                }
            }
        }

        let phrases = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(&phrase_strs)
            .map_err(|e| Error::detection(format!("failed to build phrase matcher: {e}")))?;

        Ok(Self {
            phrases,
            phrase_categories,
            patterns,
        })
    }

    /// Build a detector over the built-in rule table
    pub fn builtin() -> Result<Self> {
        Self::new(&builtin_rules())
    }

    /// Detect violations in `content`.
    ///
    /// Matches from all trigger groups are deduplicated by matched
    /// substring (case-insensitive); the first category to claim a
    /// substring is the one reported. An empty result is the sole
    /// condition for a compliant verdict.
    pub fn detect(&self, content: &str) -> Vec<Violation> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut violations = Vec::new();

        // Overlapping search so "feature is live" and "live" both surface
        for hit in self.phrases.find_overlapping_iter(content) {
            if !on_word_boundary(content, hit.start(), hit.end()) {
                continue;
            }
            let matched = &content[hit.start()..hit.end()];
            if seen.insert(matched.to_ascii_lowercase()) {
                violations.push(Violation::new(
                    self.phrase_categories[hit.pattern().as_usize()],
                    matched,
                ));
            }
        }

        for (regex, category) in &self.patterns {
            for hit in regex.find_iter(content) {
                if seen.insert(hit.as_str().to_ascii_lowercase()) {
                    violations.push(Violation::new(*category, hit.as_str()));
                }
            }
        }

        violations
    }
}

/// Phrase hits must not extend a surrounding word ("done" inside
/// "abandoned" is not a claim).
fn on_word_boundary(content: &str, start: usize, end: usize) -> bool {
    let before = content[..start].chars().next_back();
    let after = content[end..].chars().next();

    !before.is_some_and(|c| c.is_alphanumeric()) && !after.is_some_and(|c| c.is_alphanumeric())
}
