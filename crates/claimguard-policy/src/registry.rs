//! Channel policy resolution

use claimguard_core::{ComplianceLevel, OutputChannel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// The resolved enforcement policy for one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelPolicy {
    pub channel: OutputChannel,
    pub level: ComplianceLevel,
    pub require_confirmation: bool,
}

/// Per-channel policy override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRule {
    pub level: ComplianceLevel,
    pub require_confirmation: bool,
}

/// The persisted policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Level applied to channels with no explicit rule
    #[serde(default)]
    pub default_level: ComplianceLevel,

    /// Confirmation requirement for channels with no explicit rule
    #[serde(default = "default_true")]
    pub default_require_confirmation: bool,

    /// Explicit per-channel rules
    #[serde(default)]
    pub channels: BTreeMap<OutputChannel, ChannelRule>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        let mut channels = BTreeMap::new();
        channels.insert(
            OutputChannel::ApiResponse,
            ChannelRule {
                level: ComplianceLevel::Strict,
                require_confirmation: true,
            },
        );
        channels.insert(
            OutputChannel::UiMessage,
            ChannelRule {
                level: ComplianceLevel::Strict,
                require_confirmation: true,
            },
        );
        channels.insert(
            OutputChannel::ChatResponse,
            ChannelRule {
                level: ComplianceLevel::Strict,
                require_confirmation: true,
            },
        );
        channels.insert(
            OutputChannel::LogMessage,
            ChannelRule {
                level: ComplianceLevel::Moderate,
                require_confirmation: false,
            },
        );
        channels.insert(
            OutputChannel::ErrorMessage,
            ChannelRule {
                level: ComplianceLevel::Permissive,
                require_confirmation: false,
            },
        );

        Self {
            default_level: ComplianceLevel::Strict,
            default_require_confirmation: true,
            channels,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Resolves the enforcement level and confirmation requirement for every
/// channel. Loaded once at startup; resolution itself never fails.
#[derive(Debug, Clone)]
pub struct ChannelPolicyRegistry {
    config: PolicyConfig,
}

impl ChannelPolicyRegistry {
    /// A registry over an explicit configuration
    pub fn new(config: PolicyConfig) -> Self {
        Self { config }
    }

    /// A registry over the built-in defaults
    pub fn with_defaults() -> Self {
        Self::new(PolicyConfig::default())
    }

    /// Load the configuration from a YAML document, merging it over the
    /// built-in defaults. A missing file or a parse failure is non-fatal:
    /// the defaults are written back for next time and used as-is.
    pub fn load(path: &Path) -> Self {
        let config = match std::fs::read_to_string(path) {
            Ok(content) => match serde_yaml::from_str::<PolicyConfig>(&content) {
                Ok(mut config) => {
                    // explicit rules win; defaults fill the gaps
                    for (channel, rule) in PolicyConfig::default().channels {
                        config.channels.entry(channel).or_insert(rule);
                    }
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e,
                        "unparseable policy config, falling back to defaults");
                    let defaults = PolicyConfig::default();
                    write_back(path, &defaults);
                    defaults
                }
            },
            Err(_) => {
                info!(path = %path.display(), "no policy config found, writing defaults");
                let defaults = PolicyConfig::default();
                write_back(path, &defaults);
                defaults
            }
        };

        Self { config }
    }

    /// Resolve the policy for a channel. Channels without an explicit rule
    /// fall back to the configured default level and confirmation
    /// requirement.
    pub fn resolve(&self, channel: OutputChannel) -> ChannelPolicy {
        match self.config.channels.get(&channel) {
            Some(rule) => ChannelPolicy {
                channel,
                level: rule.level,
                require_confirmation: rule.require_confirmation,
            },
            None => ChannelPolicy {
                channel,
                level: self.config.default_level,
                require_confirmation: self.config.default_require_confirmation,
            },
        }
    }

    /// The underlying configuration
    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }
}

/// Best-effort persistence of the active configuration
fn write_back(path: &Path, config: &PolicyConfig) {
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    match serde_yaml::to_string(config) {
        Ok(yaml) => {
            if let Err(e) = std::fs::write(path, yaml) {
                warn!(path = %path.display(), error = %e, "could not persist policy config");
            }
        }
        Err(e) => warn!(error = %e, "could not serialize policy config"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_table() {
        let registry = ChannelPolicyRegistry::with_defaults();

        for channel in [
            OutputChannel::ApiResponse,
            OutputChannel::UiMessage,
            OutputChannel::ChatResponse,
        ] {
            let policy = registry.resolve(channel);
            assert_eq!(policy.level, ComplianceLevel::Strict);
            assert!(policy.require_confirmation);
        }

        let log = registry.resolve(OutputChannel::LogMessage);
        assert_eq!(log.level, ComplianceLevel::Moderate);
        assert!(!log.require_confirmation);

        let error = registry.resolve(OutputChannel::ErrorMessage);
        assert_eq!(error.level, ComplianceLevel::Permissive);
        assert!(!error.require_confirmation);
    }

    #[test]
    fn test_unlisted_channel_falls_back_to_default() {
        let registry = ChannelPolicyRegistry::with_defaults();
        let policy = registry.resolve(OutputChannel::StatusUpdate);
        assert_eq!(policy.level, ComplianceLevel::Strict);
        assert!(policy.require_confirmation);
    }

    #[test]
    fn test_missing_file_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("compliance_policy.yaml");

        let registry = ChannelPolicyRegistry::load(&path);
        assert_eq!(
            registry.resolve(OutputChannel::ApiResponse).level,
            ComplianceLevel::Strict
        );

        // defaults were persisted and reload cleanly
        assert!(path.exists());
        let reloaded = ChannelPolicyRegistry::load(&path);
        assert_eq!(
            reloaded.resolve(OutputChannel::LogMessage).level,
            ComplianceLevel::Moderate
        );
    }

    #[test]
    fn test_parse_failure_is_non_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("compliance_policy.yaml");
        std::fs::write(&path, ":- not yaml [").unwrap();

        let registry = ChannelPolicyRegistry::load(&path);
        assert_eq!(
            registry.resolve(OutputChannel::ChatResponse).level,
            ComplianceLevel::Strict
        );
    }

    #[test]
    fn test_overrides_merge_over_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("compliance_policy.yaml");
        std::fs::write(
            &path,
            "default_level: strict\nchannels:\n  chat_response:\n    level: permissive\n    require_confirmation: false\n",
        )
        .unwrap();

        let registry = ChannelPolicyRegistry::load(&path);

        // the override applies
        let chat = registry.resolve(OutputChannel::ChatResponse);
        assert_eq!(chat.level, ComplianceLevel::Permissive);
        assert!(!chat.require_confirmation);

        // untouched channels keep their defaults
        let log = registry.resolve(OutputChannel::LogMessage);
        assert_eq!(log.level, ComplianceLevel::Moderate);
    }
}
