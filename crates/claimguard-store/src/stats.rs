//! Statistics over the audit and bypass logs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::audit::AuditLogEntry;

/// Window (in entries) used for the recent-violation count
const RECENT_WINDOW: usize = 100;

/// Per-channel counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub total: u64,
    pub blocked: u64,
    pub violations: u64,
}

/// Aggregate view over the current audit and bypass logs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceStats {
    /// Outputs that went through the pipeline
    pub total_outputs: u64,

    /// Outputs that were withheld
    pub blocked_outputs: u64,

    /// Violations across all outputs
    pub total_violations: u64,

    /// `(total - violations) / total` as a percentage; 100 when idle
    pub compliance_rate: f64,

    /// Counters keyed by channel name
    pub channel_breakdown: BTreeMap<String, ChannelStats>,

    /// Entries with violations inside the most recent 100-entry window
    pub recent_violations: u64,

    /// Bypass attempts on record
    pub bypass_attempts: u64,
}

impl ComplianceStats {
    /// Compute the view from an audit snapshot and the bypass count
    pub fn compute(entries: &[AuditLogEntry], bypass_attempts: usize) -> Self {
        let total_outputs = entries.len() as u64;
        let blocked_outputs = entries.iter().filter(|e| e.blocked).count() as u64;
        let total_violations: u64 = entries.iter().map(|e| e.violations.len() as u64).sum();

        let mut channel_breakdown: BTreeMap<String, ChannelStats> = BTreeMap::new();
        for entry in entries {
            let stats = channel_breakdown
                .entry(entry.channel.as_str().to_string())
                .or_default();
            stats.total += 1;
            if entry.blocked {
                stats.blocked += 1;
            }
            stats.violations += entry.violations.len() as u64;
        }

        let recent_start = entries.len().saturating_sub(RECENT_WINDOW);
        let recent_violations = entries[recent_start..]
            .iter()
            .filter(|e| !e.violations.is_empty())
            .count() as u64;

        let compliance_rate = if total_outputs == 0 {
            100.0
        } else {
            (total_outputs as f64 - total_violations as f64) / total_outputs as f64 * 100.0
        };

        Self {
            total_outputs,
            blocked_outputs,
            total_violations,
            compliance_rate,
            channel_breakdown,
            recent_violations,
            bypass_attempts: bypass_attempts as u64,
        }
    }
}
