//! The pass/warn/block decision engine

use std::sync::Arc;
use tracing::{debug, warn};

use claimguard_core::{ComplianceLevel, ComplianceResult, OutputContext, Violation};
use claimguard_detect::TriggerDetector;
use claimguard_store::{AuditLogEntry, ComplianceStore, PendingAction};

use crate::bypass_scan;
use crate::notice;
use crate::registry::ChannelPolicyRegistry;

/// Combines detection, channel policy, and confirmation evidence into a
/// compliance verdict, and records every decision in the audit store.
///
/// All collaborators are injected; the engine holds no global state and
/// does no locking of its own.
pub struct ComplianceEngine {
    registry: ChannelPolicyRegistry,
    detector: TriggerDetector,
    store: Arc<ComplianceStore>,
}

impl ComplianceEngine {
    /// Assemble an engine from its collaborators
    pub fn new(
        registry: ChannelPolicyRegistry,
        detector: TriggerDetector,
        store: Arc<ComplianceStore>,
    ) -> Self {
        Self {
            registry,
            detector,
            store,
        }
    }

    /// Validate one output attempt.
    ///
    /// `is_compliant` reflects detection alone; `blocked` reflects
    /// enforcement. The two can disagree: MODERATE and PERMISSIVE channels
    /// let non-compliant content through annotated or untouched.
    pub fn validate_output(&self, content: &str, context: &OutputContext) -> ComplianceResult {
        let policy = self.registry.resolve(context.channel);
        let violations = self.detector.detect(content);

        let mut warnings: Vec<String> = Vec::new();
        let mut blocked = false;
        let mut processed_content = content.to_string();

        if !violations.is_empty() {
            let confirmation = context
                .confirmation_status
                .as_ref()
                .filter(|status| status.is_valid());

            match confirmation {
                // a valid confirmation lets the claim through on any level,
                // but only counts on channels that ask for one
                Some(status) if policy.require_confirmation => {
                    processed_content = notice::confirmation_annotation(content, status);
                    debug!(
                        channel = %context.channel,
                        method = ?status.method,
                        "claims confirmed, passing annotated"
                    );
                }
                _ => match policy.level {
                    ComplianceLevel::Strict if policy.require_confirmation => {
                        blocked = true;
                        processed_content = notice::blocked_notice(&violations, context);
                        let pending_id = self.store.push_pending(PendingAction::new(
                            &violations,
                            content,
                            context,
                        ));
                        warn!(
                            channel = %context.channel,
                            source = %context.source,
                            pending = %pending_id,
                            violations = violations.len(),
                            "blocked unconfirmed claims"
                        );
                    }
                    ComplianceLevel::Permissive => {
                        // log only, never touch the content
                        debug!(
                            channel = %context.channel,
                            violations = violations.len(),
                            "claims on permissive channel, passing unchanged"
                        );
                    }
                    _ => {
                        // MODERATE, and STRICT configured without a
                        // confirmation requirement, degrade to warnings
                        warnings = violations.iter().map(Violation::describe).collect();
                        processed_content = notice::warning_annotation(content, &violations);
                        debug!(
                            channel = %context.channel,
                            violations = violations.len(),
                            "claims annotated with warnings"
                        );
                    }
                },
            }
        }

        // the audit entry is written before the bypass scan so diagnostics
        // can never get in the way of the record
        let audit_log_id = self.store.record_audit(AuditLogEntry::from_decision(
            content,
            context,
            &violations,
            &warnings,
            blocked,
        ));

        if let Some(attempt) = bypass_scan::scan(context, content) {
            self.store.record_bypass(attempt);
        }

        ComplianceResult {
            is_compliant: violations.is_empty(),
            processed_content,
            violations,
            warnings,
            blocked,
            level: policy.level,
            audit_log_id,
        }
    }

    /// The store this engine records into
    pub fn store(&self) -> &Arc<ComplianceStore> {
        &self.store
    }
}
