//! ClaimGuard Core
//!
//! Core types, errors, and utilities shared across ClaimGuard components.
//!
//! This crate provides:
//! - Output channels, compliance levels, and per-attempt context
//! - Confirmation evidence types and their validity rule
//! - Violation and decision-result types
//! - The `OutputPayload` rewrite target for intercepted structured results
//! - Error types and result handling

pub mod error;
pub mod payload;
pub mod types;

pub use error::{Error, Result};
pub use payload::OutputPayload;
pub use types::{
    ComplianceLevel, ComplianceResult, ConfirmationMethod, ConfirmationStatus, OutputChannel,
    OutputContext, OutputSource, Violation, ViolationCategory,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::output_source;
    pub use crate::payload::OutputPayload;
    pub use crate::types::{
        ComplianceLevel, ComplianceResult, ConfirmationMethod, ConfirmationStatus, OutputChannel,
        OutputContext, OutputSource, Violation, ViolationCategory,
    };
}
