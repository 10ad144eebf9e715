//! The assembled pipeline and its interception entry points

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use claimguard_core::{
    ComplianceResult, ConfirmationMethod, ConfirmationStatus, Error, OutputChannel, OutputContext,
    OutputPayload, OutputSource, Result,
};
use claimguard_detect::TriggerDetector;
use claimguard_policy::{ChannelPolicyRegistry, ComplianceEngine};
use claimguard_probe::{ConnectionValidationResult, ConnectionValidator};
use claimguard_store::{ClearOutcome, ComplianceStats, ComplianceStore, PendingAction, StoreConfig};

use crate::config::GateConfig;

/// Metadata key carrying confirmation evidence into a wrapped payload
pub const CONFIRMATION_KEY: &str = "confirmation_status";

/// The single choke point for user/agent-facing output.
///
/// Everything that ends up in front of a user goes through one of the
/// entry points here: [`enforce`](Self::enforce) for wrapped producers,
/// [`send_output`](Self::send_output) for plain strings, or
/// [`log_and_respond`](Self::log_and_respond) for the log+reply pair.
/// Construction is explicit — build one gate at startup and hand it to
/// whatever emits output; there is no global instance.
pub struct ComplianceGate {
    engine: ComplianceEngine,
    store: Arc<ComplianceStore>,
    validator: Option<ConnectionValidator>,
}

impl ComplianceGate {
    /// Assemble the pipeline from configuration
    pub fn new(config: GateConfig) -> Result<Self> {
        let registry = match config.policy_path() {
            Some(path) => ChannelPolicyRegistry::load(&path),
            None => ChannelPolicyRegistry::with_defaults(),
        };
        let detector = TriggerDetector::builtin()?;

        let mut store_config = StoreConfig {
            data_dir: config.data_dir.clone(),
            ..StoreConfig::default()
        };
        if let Some(cap) = config.audit_cap {
            store_config.audit_cap = cap;
        }
        if let Some(cap) = config.bypass_cap {
            store_config.bypass_cap = cap;
        }
        if let Some(cap) = config.pending_cap {
            store_config.pending_cap = cap;
        }
        let store = Arc::new(ComplianceStore::open(store_config));

        let validator = match config.probe {
            Some(mut probe_config) => {
                if probe_config.data_dir.is_none() {
                    probe_config.data_dir = config.data_dir.clone();
                }
                Some(ConnectionValidator::new(probe_config)?)
            }
            None => None,
        };

        info!(
            persistent = config.data_dir.is_some(),
            probing = validator.is_some(),
            "compliance gate ready"
        );

        Ok(Self {
            engine: ComplianceEngine::new(registry, detector, store.clone()),
            store,
            validator,
        })
    }

    /// Validate one output attempt directly
    pub fn validate(&self, content: &str, context: &OutputContext) -> ComplianceResult {
        self.engine.validate_output(content, context)
    }

    /// Run a producer and funnel its payload through validation.
    ///
    /// A blocked verdict replaces the payload text and attaches
    /// `compliance_blocked` and `compliance_violations` metadata; a
    /// warned verdict attaches `compliance_warnings` and leaves the text
    /// alone. Confirmation evidence can ride along in the payload's
    /// `confirmation_status` metadata entry.
    pub fn enforce<F>(&self, channel: OutputChannel, source: OutputSource, produce: F) -> OutputPayload
    where
        F: FnOnce() -> OutputPayload,
    {
        let mut payload = produce();

        let mut context = OutputContext::new(channel, source);
        if let Some(value) = payload.get(CONFIRMATION_KEY) {
            match serde_json::from_value::<ConfirmationStatus>(value.clone()) {
                Ok(status) => context = context.with_confirmation(status),
                Err(e) => debug!(error = %e, "ignoring unparseable confirmation metadata"),
            }
        }

        let result = self.engine.validate_output(&payload.text, &context);

        if result.blocked {
            payload.text = result.processed_content;
            payload.insert("compliance_blocked", true);
            payload.insert(
                "compliance_violations",
                serde_json::Value::from(
                    result
                        .violations
                        .iter()
                        .map(|v| v.describe())
                        .collect::<Vec<_>>(),
                ),
            );
        } else if !result.warnings.is_empty() {
            payload.insert(
                "compliance_warnings",
                serde_json::Value::from(result.warnings.clone()),
            );
        } else {
            payload.text = result.processed_content;
        }

        payload
    }

    /// Validate a plain string and return the processed text
    pub fn send_output(
        &self,
        content: &str,
        channel: OutputChannel,
        confirmation: Option<ConfirmationStatus>,
        source: OutputSource,
    ) -> String {
        let mut context = OutputContext::new(channel, source);
        if let Some(status) = confirmation {
            context = context.with_confirmation(status);
        }
        self.engine.validate_output(content, &context).processed_content
    }

    /// Validate the same content as a log line and as an API response,
    /// returning a structured acknowledgement
    pub fn log_and_respond(
        &self,
        content: &str,
        confirmation: Option<ConfirmationStatus>,
        source: OutputSource,
    ) -> Acknowledgement {
        let logged = {
            let mut context = OutputContext::new(OutputChannel::LogMessage, source.clone());
            if let Some(status) = confirmation.clone() {
                context = context.with_confirmation(status);
            }
            self.engine.validate_output(content, &context)
        };
        info!(source = %source, "{}", logged.processed_content);

        let mut context = OutputContext::new(OutputChannel::ApiResponse, source);
        if let Some(status) = confirmation {
            context = context.with_confirmation(status);
        }
        let response = self.engine.validate_output(content, &context);

        Acknowledgement {
            status: response.processed_content,
            blocked: response.blocked,
            logged: true,
            compliance_validated: true,
        }
    }

    /// Probe the backend for an action type and convert a passed
    /// validation into confirmation evidence
    pub async fn confirm_connection(&self, action_type: &str) -> Result<Option<ConfirmationStatus>> {
        let validator = self.validator()?;
        let result = validator.validate_fresh_connection(action_type, None).await;
        Ok(result.to_confirmation())
    }

    /// Run a connection validation, bypassing the cache when forced
    pub async fn validate_connection(
        &self,
        action_type: &str,
        force: bool,
    ) -> Result<ConnectionValidationResult> {
        let validator = self.validator()?;
        Ok(if force {
            validator.force_fresh_validation(action_type, None).await
        } else {
            validator.validate_fresh_connection(action_type, None).await
        })
    }

    /// Statistics over the audit and bypass logs
    pub fn stats(&self) -> ComplianceStats {
        self.store.stats()
    }

    /// Pending actions awaiting confirmation, oldest first
    pub fn pending_actions(&self) -> Vec<PendingAction> {
        self.store.pending_actions()
    }

    /// Confirm a pending action
    pub fn clear_pending(
        &self,
        id: &str,
        method: ConfirmationMethod,
        operator: &str,
    ) -> Result<ClearOutcome> {
        self.store.clear_pending(id, method, operator)
    }

    /// The underlying store (read paths for hosts that report on it)
    pub fn store(&self) -> &Arc<ComplianceStore> {
        &self.store
    }

    fn validator(&self) -> Result<&ConnectionValidator> {
        self.validator
            .as_ref()
            .ok_or_else(|| Error::probe("no probe endpoint configured"))
    }
}

/// Structured acknowledgement returned by
/// [`log_and_respond`](ComplianceGate::log_and_respond)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Acknowledgement {
    /// The processed response content
    pub status: String,

    /// Whether the response content was withheld
    pub blocked: bool,

    /// The content went through the logging channel
    pub logged: bool,

    /// Both channels were validated
    pub compliance_validated: bool,
}
