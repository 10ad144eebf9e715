//! Gate configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use claimguard_core::Result;
use claimguard_probe::ProbeConfig;

/// Configuration for the assembled pipeline.
///
/// With a `data_dir`, the policy config, the three stores, and the probe
/// cache all persist underneath it; without one everything stays in
/// memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GateConfig {
    /// Directory for persisted state
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Probe settings; absent disables connection-backed confirmations
    #[serde(default)]
    pub probe: Option<ProbeConfig>,

    /// Store cap overrides
    #[serde(default)]
    pub audit_cap: Option<usize>,

    #[serde(default)]
    pub bypass_cap: Option<usize>,

    #[serde(default)]
    pub pending_cap: Option<usize>,
}

impl GateConfig {
    /// Persist all state under the given directory
    pub fn persistent(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(data_dir.into()),
            ..Self::default()
        }
    }

    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content)
            .map_err(|e| claimguard_core::Error::config(format!("invalid gate config: {e}")))
    }

    /// Path of the persisted policy config, if state is persisted
    pub(crate) fn policy_path(&self) -> Option<PathBuf> {
        self.data_dir
            .as_ref()
            .map(|d| d.join("compliance_policy.yaml"))
    }
}
