//! Best-effort detection of direct-output call sites
//!
//! This is a diagnostic signal, not an enforcement mechanism: the explicit
//! call-site info in the context is matched against names that usually
//! mean content went straight to an output sink instead of through the
//! gate. A hit records a bypass attempt; a miss proves nothing.

use claimguard_core::OutputContext;
use claimguard_store::bypass::BYPASS_FRAME_LIMIT;
use claimguard_store::BypassAttempt;

/// Function names that indicate content is being written to an output
/// sink directly
const DIRECT_OUTPUT_INDICATORS: &[&str] = &[
    "println",
    "eprintln",
    "print",
    "writeln",
    "dbg",
    "jsonify",
    "render_template",
    "console.log",
    "response.send",
    "send_raw",
];

/// Scan one output attempt. Returns a record when the call site looks
/// like a direct output, `None` otherwise. Never fails.
pub(crate) fn scan(context: &OutputContext, content: &str) -> Option<BypassAttempt> {
    let function = context.source.function.to_ascii_lowercase();
    let hit = DIRECT_OUTPUT_INDICATORS
        .iter()
        .any(|indicator| function.contains(indicator));

    if !hit {
        return None;
    }

    Some(BypassAttempt::new(context, content, capture_frames()))
}

/// Up to five trimmed frames of the current backtrace. Backtrace capture
/// is best-effort; an empty result is acceptable.
fn capture_frames() -> Vec<String> {
    let backtrace = std::backtrace::Backtrace::force_capture().to_string();
    backtrace
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(BYPASS_FRAME_LIMIT)
        .map(str::to_string)
        .collect()
}
