//! Rendering of blocked notices and annotations

use claimguard_core::{ConfirmationStatus, OutputContext, Violation};

/// The structured notice that replaces blocked content
pub(crate) fn blocked_notice(violations: &[Violation], context: &OutputContext) -> String {
    let detected = violations
        .iter()
        .map(Violation::describe)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Output withheld: unverified action or completion claims detected.\n\
         \n\
         Channel: {channel}\n\
         Source: {source}\n\
         Detected: {detected}\n\
         \n\
         Next steps:\n\
         1. Run a fresh endpoint check (GET /health, GET /system-health)\n\
         2. Re-send with an explicit confirmation status attached\n\
         3. Request human operator confirmation if automated validation fails\n\
         \n\
         The original message is held as a pending action until confirmed.",
        channel = context.channel,
        source = context.source,
        detected = detected,
    )
}

/// The annotation appended under MODERATE enforcement
pub(crate) fn warning_annotation(content: &str, violations: &[Violation]) -> String {
    let detected = violations
        .iter()
        .map(Violation::describe)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "{content}\n\n[compliance warning] unverified claims detected: {detected}. \
         Confirmation is recommended before presenting work as complete."
    )
}

/// The annotation appended when a claim arrives with valid confirmation
pub(crate) fn confirmation_annotation(content: &str, status: &ConfirmationStatus) -> String {
    let method = status
        .method
        .map(|m| m.as_str())
        .unwrap_or("unknown");

    format!(
        "{content}\n\n[confirmed via {method} at {}]",
        status.timestamp.format("%Y-%m-%dT%H:%M:%SZ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use claimguard_core::{
        output_source, ConfirmationMethod, OutputChannel, ViolationCategory,
    };

    #[test]
    fn test_blocked_notice_enumerates_violations() {
        let context = OutputContext::new(OutputChannel::ApiResponse, output_source!("deploy"));
        let violations = vec![
            Violation::new(ViolationCategory::CompletionClaim, "deployed"),
            Violation::new(ViolationCategory::ActionLanguage, "i'll push"),
        ];

        let notice = blocked_notice(&violations, &context);
        assert!(notice.contains("api_response"));
        assert!(notice.contains("deployed"));
        assert!(notice.contains("i'll push"));
        assert!(notice.contains("Next steps"));
    }

    #[test]
    fn test_warning_annotation_preserves_content_prefix() {
        let violations = vec![Violation::new(ViolationCategory::CompletionClaim, "done")];
        let annotated = warning_annotation("task update", &violations);
        assert!(annotated.starts_with("task update"));
        assert!(annotated.contains("compliance warning"));
    }

    #[test]
    fn test_confirmation_annotation_names_method() {
        let status = ConfirmationStatus::confirmed(ConfirmationMethod::ApiEndpointCheck);
        let annotated = confirmation_annotation("deploy finished", &status);
        assert!(annotated.starts_with("deploy finished"));
        assert!(annotated.contains("api_endpoint_check"));
    }
}
