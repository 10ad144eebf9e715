//! ClaimGuard Gate
//!
//! The interception layer: the only entry point other code should use to
//! emit user/agent-facing text. The gate assembles the whole pipeline —
//! trigger detection, channel policy, confirmation checking, audit and
//! pending-action stores, optional connection probing — behind three
//! call shapes:
//!
//! ```
//! use claimguard_core::{output_source, OutputChannel, OutputPayload};
//! use claimguard_gate::{ComplianceGate, GateConfig};
//!
//! let gate = ComplianceGate::new(GateConfig::default()).unwrap();
//!
//! // wrap a producer
//! let payload = gate.enforce(OutputChannel::ApiResponse, output_source!("status"), || {
//!     OutputPayload::new("The request was queued.")
//! });
//! assert_eq!(payload.text, "The request was queued.");
//!
//! // or validate a plain string
//! let text = gate.send_output(
//!     "The request was queued.",
//!     OutputChannel::ChatResponse,
//!     None,
//!     output_source!("reply"),
//! );
//! assert_eq!(text, "The request was queued.");
//! ```

pub mod config;
pub mod gate;

pub use config::GateConfig;
pub use gate::{Acknowledgement, ComplianceGate, CONFIRMATION_KEY};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::GateConfig;
    pub use crate::gate::{Acknowledgement, ComplianceGate, CONFIRMATION_KEY};
    pub use claimguard_core::prelude::*;
}
