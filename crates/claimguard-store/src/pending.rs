//! Pending actions awaiting confirmation

use chrono::{DateTime, Utc};
use claimguard_core::{ConfirmationMethod, OutputContext, Violation};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a pending action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingStatus {
    /// Created on a blocked decision, waiting for confirmation
    PendingConfirmation,
    /// Explicitly confirmed; terminal
    Confirmed,
}

/// A blocked output awaiting explicit confirmation.
///
/// Created only when a decision blocks; reaches its terminal state only
/// through an explicit clear-with-confirmation. Entries are never deleted,
/// only evicted by the queue cap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingAction {
    /// Unique action id
    pub id: String,

    /// When the block happened
    pub timestamp: DateTime<Utc>,

    /// Violations that caused the block
    pub detected_patterns: Vec<Violation>,

    /// The withheld original content
    pub original_output: String,

    /// Context of the blocked attempt
    pub context: OutputContext,

    /// Lifecycle state
    pub status: PendingStatus,

    /// Ways this action can be confirmed
    pub confirmation_hints: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_method: Option<ConfirmationMethod>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_by: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl PendingAction {
    /// Create a pending action for a blocked output
    pub fn new(violations: &[Violation], original_output: &str, context: &OutputContext) -> Self {
        Self {
            id: format!("act_{}", uuid::Uuid::new_v4()),
            timestamp: Utc::now(),
            detected_patterns: violations.to_vec(),
            original_output: original_output.to_string(),
            context: context.clone(),
            status: PendingStatus::PendingConfirmation,
            confirmation_hints: vec![
                "GET /health - check system health".to_string(),
                "GET /system-health - comprehensive status".to_string(),
                "manual operator confirmation".to_string(),
                "targeted endpoint validation".to_string(),
            ],
            confirmation_method: None,
            confirmed_by: None,
            confirmed_at: None,
        }
    }

    /// Mark the action confirmed in place
    pub(crate) fn confirm(&mut self, method: ConfirmationMethod, operator: &str) {
        self.status = PendingStatus::Confirmed;
        self.confirmation_method = Some(method);
        self.confirmed_by = Some(operator.to_string());
        self.confirmed_at = Some(Utc::now());
    }
}

/// Result of clearing a pending action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    /// The action was pending and is now confirmed
    Confirmed,
    /// The action had already been confirmed; nothing changed
    AlreadyConfirmed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use claimguard_core::{output_source, OutputChannel, ViolationCategory};

    #[test]
    fn test_new_action_is_pending() {
        let context = OutputContext::new(OutputChannel::ApiResponse, output_source!("deploy"));
        let violations = vec![Violation::new(ViolationCategory::CompletionClaim, "deployed")];
        let action = PendingAction::new(&violations, "it is deployed", &context);

        assert!(action.id.starts_with("act_"));
        assert_eq!(action.status, PendingStatus::PendingConfirmation);
        assert!(action.confirmation_method.is_none());
        assert!(!action.confirmation_hints.is_empty());
    }

    #[test]
    fn test_confirm_sets_terminal_state() {
        let context = OutputContext::new(OutputChannel::ApiResponse, output_source!("deploy"));
        let mut action = PendingAction::new(&[], "done", &context);

        action.confirm(ConfirmationMethod::HumanConfirmation, "ops");
        assert_eq!(action.status, PendingStatus::Confirmed);
        assert_eq!(action.confirmed_by.as_deref(), Some("ops"));
        assert!(action.confirmed_at.is_some());
    }
}
