//! Core types for the output-compliance pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Named output surfaces that content can be emitted on.
///
/// The set is fixed; per-channel enforcement is configured through the
/// channel policy registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputChannel {
    ApiResponse,
    UiMessage,
    ChatResponse,
    LogMessage,
    ErrorMessage,
    StatusUpdate,
}

impl OutputChannel {
    /// All channels, in declaration order
    pub const ALL: [OutputChannel; 6] = [
        OutputChannel::ApiResponse,
        OutputChannel::UiMessage,
        OutputChannel::ChatResponse,
        OutputChannel::LogMessage,
        OutputChannel::ErrorMessage,
        OutputChannel::StatusUpdate,
    ];

    /// Stable snake_case name used in configs and persisted records
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputChannel::ApiResponse => "api_response",
            OutputChannel::UiMessage => "ui_message",
            OutputChannel::ChatResponse => "chat_response",
            OutputChannel::LogMessage => "log_message",
            OutputChannel::ErrorMessage => "error_message",
            OutputChannel::StatusUpdate => "status_update",
        }
    }
}

impl std::fmt::Display for OutputChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OutputChannel {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "api_response" => Ok(OutputChannel::ApiResponse),
            "ui_message" => Ok(OutputChannel::UiMessage),
            "chat_response" => Ok(OutputChannel::ChatResponse),
            "log_message" => Ok(OutputChannel::LogMessage),
            "error_message" => Ok(OutputChannel::ErrorMessage),
            "status_update" => Ok(OutputChannel::StatusUpdate),
            other => Err(crate::Error::config(format!("unknown channel: {other}"))),
        }
    }
}

/// Enforcement strictness for a channel.
///
/// Variants are declared weakest-first so the derived ordering is the
/// strictness ordering: `Permissive < Moderate < Strict`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceLevel {
    /// Log only, never rewrite or block
    Permissive,
    /// Annotate with warnings, never block
    Moderate,
    /// Block unconfirmed claims outright
    #[default]
    Strict,
}

impl ComplianceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceLevel::Strict => "strict",
            ComplianceLevel::Moderate => "moderate",
            ComplianceLevel::Permissive => "permissive",
        }
    }
}

impl std::fmt::Display for ComplianceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The mechanisms by which a claim counts as verified.
///
/// Anything outside this set is not a confirmation; the type makes the
/// allowlist structural instead of a string comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationMethod {
    ApiEndpointCheck,
    BackendValidation,
    HumanConfirmation,
    SystemVerification,
    ConnectionValidation,
}

impl ConfirmationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfirmationMethod::ApiEndpointCheck => "api_endpoint_check",
            ConfirmationMethod::BackendValidation => "backend_validation",
            ConfirmationMethod::HumanConfirmation => "human_confirmation",
            ConfirmationMethod::SystemVerification => "system_verification",
            ConfirmationMethod::ConnectionValidation => "connection_validation",
        }
    }
}

impl std::fmt::Display for ConfirmationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConfirmationMethod {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "api_endpoint_check" => Ok(ConfirmationMethod::ApiEndpointCheck),
            "backend_validation" => Ok(ConfirmationMethod::BackendValidation),
            "human_confirmation" => Ok(ConfirmationMethod::HumanConfirmation),
            "system_verification" => Ok(ConfirmationMethod::SystemVerification),
            "connection_validation" => Ok(ConfirmationMethod::ConnectionValidation),
            other => Err(crate::Error::config(format!(
                "unknown confirmation method: {other}"
            ))),
        }
    }
}

/// Evidence that a claimed action actually happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationStatus {
    /// Whether the claim was confirmed
    pub confirmed: bool,

    /// How it was confirmed; absent means unverified
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<ConfirmationMethod>,

    /// When the confirmation was produced
    pub timestamp: DateTime<Utc>,
}

impl ConfirmationStatus {
    /// A confirmation via the given method, stamped now
    pub fn confirmed(method: ConfirmationMethod) -> Self {
        Self {
            confirmed: true,
            method: Some(method),
            timestamp: Utc::now(),
        }
    }

    /// An explicit "not confirmed" marker
    pub fn unconfirmed() -> Self {
        Self {
            confirmed: false,
            method: None,
            timestamp: Utc::now(),
        }
    }

    /// A confirmation is valid only when it is both affirmative and names
    /// one of the recognized methods.
    pub fn is_valid(&self) -> bool {
        self.confirmed && self.method.is_some()
    }
}

/// Call-site identification for an output attempt.
///
/// Callers construct this explicitly (usually via [`output_source!`]); the
/// pipeline never infers it from stack frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSource {
    /// Function emitting the output
    pub function: String,

    /// Source file of the call site
    pub file: String,

    /// Line of the call site
    pub line: u32,
}

impl OutputSource {
    pub fn new(function: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self {
            function: function.into(),
            file: file.into(),
            line,
        }
    }
}

impl std::fmt::Display for OutputSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}:{})", self.function, self.file, self.line)
    }
}

/// Capture the current call site as an [`OutputSource`].
///
/// ```
/// use claimguard_core::output_source;
///
/// let source = output_source!("handle_request");
/// assert_eq!(source.function, "handle_request");
/// ```
#[macro_export]
macro_rules! output_source {
    ($function:expr) => {
        $crate::OutputSource::new($function, ::std::file!(), ::std::line!())
    };
}

/// Context for a single output attempt. Created once per attempt and not
/// mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputContext {
    /// Channel the content is destined for
    pub channel: OutputChannel,

    /// Explicit call-site identification
    pub source: OutputSource,

    /// When the attempt was made
    pub timestamp: DateTime<Utc>,

    /// Requesting user, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Session the attempt belongs to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Request correlation id, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    /// Confirmation evidence supplied by the caller
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_status: Option<ConfirmationStatus>,
}

impl OutputContext {
    /// Create a new context for an output attempt, stamped now
    pub fn new(channel: OutputChannel, source: OutputSource) -> Self {
        Self {
            channel,
            source,
            timestamp: Utc::now(),
            user_id: None,
            session_id: None,
            request_id: None,
            confirmation_status: None,
        }
    }

    /// Attach a user id
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Attach a session id
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Attach a request id
    pub fn with_request(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Attach confirmation evidence
    pub fn with_confirmation(mut self, status: ConfirmationStatus) -> Self {
        self.confirmation_status = Some(status);
        self
    }
}

/// The kind of unverified claim a trigger detects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationCategory {
    /// First-person action language ("I'll ...", "I have ...ed")
    ActionLanguage,
    /// Completion claims ("done", "deployed", "implemented")
    CompletionClaim,
    /// Status claims ("is now ...", "enabled")
    StatusClaim,
    /// Feature claims ("feature is live", "api is working")
    FeatureClaim,
}

impl ViolationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationCategory::ActionLanguage => "action language",
            ViolationCategory::CompletionClaim => "completion claim",
            ViolationCategory::StatusClaim => "status claim",
            ViolationCategory::FeatureClaim => "feature claim",
        }
    }
}

impl std::fmt::Display for ViolationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected trigger phrase indicating an unverified action/completion claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// What kind of claim was matched
    pub category: ViolationCategory,

    /// The exact matched substring, as it appeared in the content
    pub matched: String,
}

impl Violation {
    pub fn new(category: ViolationCategory, matched: impl Into<String>) -> Self {
        Self {
            category,
            matched: matched.into(),
        }
    }

    /// Human-readable description used in warnings and notices
    pub fn describe(&self) -> String {
        format!("{}: \"{}\"", self.category, self.matched)
    }
}

/// Verdict of one decision-engine invocation. Every field is populated on
/// every call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceResult {
    /// True iff detection found no violations. Deliberately independent of
    /// `blocked`: MODERATE/PERMISSIVE content can be non-compliant yet pass
    /// through unblocked.
    pub is_compliant: bool,

    /// The content to actually emit (possibly rewritten or annotated)
    pub processed_content: String,

    /// Violations found by detection
    pub violations: Vec<Violation>,

    /// Warnings surfaced to the caller (MODERATE enforcement)
    pub warnings: Vec<String>,

    /// Whether the original content was withheld
    pub blocked: bool,

    /// Enforcement level that was applied
    pub level: ComplianceLevel,

    /// Id of the audit entry recording this decision ("audit_error" when
    /// the audit write failed)
    pub audit_log_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(ComplianceLevel::Strict > ComplianceLevel::Moderate);
        assert!(ComplianceLevel::Moderate > ComplianceLevel::Permissive);
    }

    #[test]
    fn test_channel_names_round_trip() {
        for channel in OutputChannel::ALL {
            let parsed: OutputChannel = channel.as_str().parse().unwrap();
            assert_eq!(parsed, channel);

            let json = serde_json::to_string(&channel).unwrap();
            assert_eq!(json, format!("\"{}\"", channel.as_str()));
        }
    }

    #[test]
    fn test_confirmation_validity() {
        let valid = ConfirmationStatus::confirmed(ConfirmationMethod::ApiEndpointCheck);
        assert!(valid.is_valid());

        let unconfirmed = ConfirmationStatus::unconfirmed();
        assert!(!unconfirmed.is_valid());

        // confirmed flag without a recognized method is not valid
        let confirmed_no_method = ConfirmationStatus {
            confirmed: true,
            method: None,
            timestamp: Utc::now(),
        };
        assert!(!confirmed_no_method.is_valid());
    }

    #[test]
    fn test_output_source_macro() {
        let source = output_source!("emit_status");
        assert_eq!(source.function, "emit_status");
        assert!(source.file.ends_with("types.rs"));
        assert!(source.line > 0);
    }

    #[test]
    fn test_context_builders() {
        let context = OutputContext::new(OutputChannel::ApiResponse, output_source!("test"))
            .with_user("u-1")
            .with_request("req-1");

        assert_eq!(context.channel, OutputChannel::ApiResponse);
        assert_eq!(context.user_id.as_deref(), Some("u-1"));
        assert_eq!(context.request_id.as_deref(), Some("req-1"));
        assert!(context.session_id.is_none());
    }
}
