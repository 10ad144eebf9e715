//! End-to-end tests over the assembled pipeline

use claimguard_core::{
    output_source, ConfirmationMethod, ConfirmationStatus, OutputChannel, OutputContext,
    OutputPayload,
};
use claimguard_gate::{ComplianceGate, GateConfig, CONFIRMATION_KEY};
use claimguard_store::PendingStatus;
use tempfile::TempDir;

fn gate() -> ComplianceGate {
    ComplianceGate::new(GateConfig::default()).unwrap()
}

#[test]
fn test_clean_output_passes_every_entry_point() {
    let gate = gate();
    let content = "The request was queued for review.";

    let context = OutputContext::new(OutputChannel::ApiResponse, output_source!("respond"));
    let result = gate.validate(content, &context);
    assert!(result.is_compliant);
    assert_eq!(result.processed_content, content);

    let text = gate.send_output(content, OutputChannel::ChatResponse, None, output_source!("reply"));
    assert_eq!(text, content);

    let payload = gate.enforce(OutputChannel::UiMessage, output_source!("render"), || {
        OutputPayload::new(content)
    });
    assert_eq!(payload.text, content);
    assert!(payload.get("compliance_blocked").is_none());
}

#[test]
fn test_enforce_rewrites_blocked_payload() {
    let gate = gate();

    let payload = gate.enforce(OutputChannel::ApiResponse, output_source!("deploy"), || {
        OutputPayload::new("I have completed the deployment").with_metadata("job", "deploy-42")
    });

    assert_ne!(payload.text, "I have completed the deployment");
    assert_eq!(payload.get("compliance_blocked").unwrap(), true);
    assert!(payload
        .get("compliance_violations")
        .unwrap()
        .as_array()
        .unwrap()
        .len()
        > 0);
    // unrelated metadata survives the rewrite
    assert_eq!(payload.get("job").unwrap(), "deploy-42");
}

#[test]
fn test_enforce_attaches_warnings_without_rewriting() {
    let gate = gate();

    let payload = gate.enforce(OutputChannel::LogMessage, output_source!("worker"), || {
        OutputPayload::new("task finished early")
    });

    assert_eq!(payload.text, "task finished early");
    assert!(payload.get("compliance_warnings").is_some());
    assert!(payload.get("compliance_blocked").is_none());
}

#[test]
fn test_enforce_honors_confirmation_metadata() {
    let gate = gate();
    let confirmation = ConfirmationStatus::confirmed(ConfirmationMethod::BackendValidation);

    let payload = gate.enforce(OutputChannel::ApiResponse, output_source!("deploy"), || {
        OutputPayload::new("I have completed the deployment").with_metadata(
            CONFIRMATION_KEY,
            serde_json::to_value(&confirmation).unwrap(),
        )
    });

    assert!(payload.get("compliance_blocked").is_none());
    assert!(payload.text.starts_with("I have completed the deployment"));
    assert!(payload.text.contains("backend_validation"));
}

#[test]
fn test_blocked_output_creates_clearable_pending_action() {
    let gate = gate();

    gate.send_output(
        "deployment is done",
        OutputChannel::ApiResponse,
        None,
        output_source!("deploy"),
    );

    let pending = gate.pending_actions();
    assert_eq!(pending.len(), 1);
    let id = pending[0].id.clone();

    gate.clear_pending(&id, ConfirmationMethod::HumanConfirmation, "operator")
        .unwrap();
    // a second clear is safe
    gate.clear_pending(&id, ConfirmationMethod::HumanConfirmation, "operator")
        .unwrap();

    let pending = gate.pending_actions();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].status, PendingStatus::Confirmed);
    assert_eq!(pending[0].confirmed_by.as_deref(), Some("operator"));
}

#[test]
fn test_log_and_respond_validates_both_channels() {
    let gate = gate();

    let ack = gate.log_and_respond("deployment is done", None, output_source!("deploy"));
    assert!(ack.blocked);
    assert!(ack.logged);
    assert!(ack.compliance_validated);
    assert_ne!(ack.status, "deployment is done");

    // one decision per channel
    assert_eq!(gate.store().audit_entries().len(), 2);

    let clean = gate.log_and_respond("queued for review", None, output_source!("respond"));
    assert!(!clean.blocked);
    assert_eq!(clean.status, "queued for review");
}

#[test]
fn test_stats_reflect_traffic() {
    let gate = gate();

    gate.send_output("all quiet", OutputChannel::ApiResponse, None, output_source!("a"));
    gate.send_output(
        "deployment is done",
        OutputChannel::ApiResponse,
        None,
        output_source!("b"),
    );

    let stats = gate.stats();
    assert_eq!(stats.total_outputs, 2);
    assert_eq!(stats.blocked_outputs, 1);
    assert!(stats.total_violations >= 1);
    assert_eq!(stats.channel_breakdown["api_response"].total, 2);
}

#[test]
fn test_state_survives_restart() {
    let dir = TempDir::new().unwrap();

    {
        let gate = ComplianceGate::new(GateConfig::persistent(dir.path())).unwrap();
        gate.send_output(
            "deployment is done",
            OutputChannel::ApiResponse,
            None,
            output_source!("deploy"),
        );
    }

    let reopened = ComplianceGate::new(GateConfig::persistent(dir.path())).unwrap();
    assert_eq!(reopened.stats().total_outputs, 1);
    assert_eq!(reopened.pending_actions().len(), 1);

    // the default policy config was written out on first run
    assert!(dir.path().join("compliance_policy.yaml").exists());
}

#[test]
fn test_probeless_gate_reports_missing_probe() {
    let gate = gate();
    let result = futures_executor(gate.validate_connection("live_claim", false));
    assert!(result.is_err());
}

/// Minimal block_on for the one async assertion in this sync test file
fn futures_executor<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}
