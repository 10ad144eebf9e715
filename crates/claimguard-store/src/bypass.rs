//! Bypass-attempt records

use chrono::{DateTime, Utc};
use claimguard_core::{OutputChannel, OutputContext, OutputSource};
use serde::{Deserialize, Serialize};

use crate::audit::snippet;

/// Snippet cap for bypass records
const BYPASS_SNIPPET_CHARS: usize = 100;

/// Frames retained from a captured backtrace
pub const BYPASS_FRAME_LIMIT: usize = 5;

/// A detected instance of output potentially escaping the enforcement
/// pipeline. Recorded independently of the compliance verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BypassAttempt {
    /// When the attempt was observed
    pub timestamp: DateTime<Utc>,

    /// Channel the output was destined for
    pub channel: OutputChannel,

    /// Call site that emitted the output
    pub source: OutputSource,

    /// Leading slice of the content, capped at 100 chars
    pub content_snippet: String,

    /// Up to five frames of the captured call stack
    pub stack_trace: Vec<String>,
}

impl BypassAttempt {
    /// Build a record from the output attempt and a captured stack
    pub fn new(context: &OutputContext, content: &str, mut stack_trace: Vec<String>) -> Self {
        stack_trace.truncate(BYPASS_FRAME_LIMIT);
        Self {
            timestamp: Utc::now(),
            channel: context.channel,
            source: context.source.clone(),
            content_snippet: snippet(content, BYPASS_SNIPPET_CHARS),
            stack_trace,
        }
    }
}
