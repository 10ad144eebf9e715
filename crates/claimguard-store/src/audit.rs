//! Audit record types

use chrono::{DateTime, Utc};
use claimguard_core::{
    ConfirmationStatus, OutputChannel, OutputContext, OutputSource, Violation,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Snippet cap for audit entries
const AUDIT_SNIPPET_CHARS: usize = 200;

/// An immutable record of one compliance decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Unique entry id
    pub id: String,

    /// When the decision was made
    pub timestamp: DateTime<Utc>,

    /// Channel the output was destined for
    pub channel: OutputChannel,

    /// Call site that emitted the output
    pub source: OutputSource,

    /// SHA-256 of the full original content
    pub content_hash: String,

    /// Leading slice of the content, capped at 200 chars
    pub content_snippet: String,

    /// Violations found by detection
    pub violations: Vec<Violation>,

    /// Warnings surfaced to the caller
    pub warnings: Vec<String>,

    /// Whether the output was withheld
    pub blocked: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    /// Confirmation evidence that accompanied the attempt, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_status: Option<ConfirmationStatus>,
}

impl AuditLogEntry {
    /// Build an entry recording one decision
    pub fn from_decision(
        content: &str,
        context: &OutputContext,
        violations: &[Violation],
        warnings: &[String],
        blocked: bool,
    ) -> Self {
        Self {
            id: format!("evt_{}", uuid::Uuid::new_v4()),
            timestamp: Utc::now(),
            channel: context.channel,
            source: context.source.clone(),
            content_hash: content_hash(content),
            content_snippet: snippet(content, AUDIT_SNIPPET_CHARS),
            violations: violations.to_vec(),
            warnings: warnings.to_vec(),
            blocked,
            user_id: context.user_id.clone(),
            session_id: context.session_id.clone(),
            request_id: context.request_id.clone(),
            confirmation_status: context.confirmation_status.clone(),
        }
    }
}

/// SHA-256 hex digest of content
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// First `max_chars` characters of content
pub fn snippet(content: &str, max_chars: usize) -> String {
    content.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use claimguard_core::output_source;

    #[test]
    fn test_snippet_is_capped() {
        let long = "x".repeat(500);
        assert_eq!(snippet(&long, 200).chars().count(), 200);
        assert_eq!(snippet("short", 200), "short");
    }

    #[test]
    fn test_entry_carries_context() {
        let context = OutputContext::new(OutputChannel::ChatResponse, output_source!("reply"))
            .with_session("s-9");
        let entry = AuditLogEntry::from_decision("hello", &context, &[], &[], false);

        assert!(entry.id.starts_with("evt_"));
        assert_eq!(entry.channel, OutputChannel::ChatResponse);
        assert_eq!(entry.session_id.as_deref(), Some("s-9"));
        assert_eq!(entry.content_hash, content_hash("hello"));
        assert!(!entry.blocked);
    }
}
