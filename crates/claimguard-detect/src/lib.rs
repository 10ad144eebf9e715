//! ClaimGuard Detect
//!
//! Pattern-based detection of unverified action and completion claims.
//!
//! The trigger inventory is an explicit, versioned rule table
//! ([`rules::builtin_rules`]); the detector compiles it into one
//! Aho-Corasick automaton for fixed phrases plus case-insensitive regexes
//! for inflected first-person forms. Detection is pure: the same content
//! always yields the same violations, and nothing is logged or persisted.

pub mod detector;
pub mod rules;

pub use detector::TriggerDetector;
pub use rules::{builtin_rules, TriggerKind, TriggerRule, RULESET_VERSION};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::detector::TriggerDetector;
    pub use crate::rules::{builtin_rules, TriggerKind, TriggerRule, RULESET_VERSION};
}
