//! Connection validation against live health endpoints

use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, warn};

use claimguard_core::{ConfirmationMethod, ConfirmationStatus, Error, Result};

use crate::endpoints::endpoints_for;

/// Validator tuning. The pass threshold, TTL, and probe timeout default to
/// the documented 66% / 60 s / 5 s but are plain fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Base URL the endpoint paths are appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Seconds a passed validation stays reusable
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Per-probe timeout in seconds
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Minimum health score (percent) for a validation to pass
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: f64,

    /// Directory for the persisted cache and validation log; `None` keeps
    /// both in memory
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            cache_ttl_secs: default_cache_ttl(),
            probe_timeout_secs: default_probe_timeout(),
            pass_threshold: default_pass_threshold(),
            data_dir: None,
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:80".to_string()
}

fn default_cache_ttl() -> u64 {
    60
}

fn default_probe_timeout() -> u64 {
    5
}

fn default_pass_threshold() -> f64 {
    66.0
}

/// Validation log cap
const VALIDATION_LOG_CAP: usize = 100;

/// Outcome of probing one endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    /// Endpoint answered with a non-error status
    Success,
    /// Endpoint answered with an error status
    Failed,
    /// Endpoint could not be reached (timeout, refused, DNS)
    Error,
}

/// Detail for one probed endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointProbe {
    pub endpoint: String,
    pub status: ProbeStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    pub latency_ms: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// `connection_health_score` reported by a /health body, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_health_score: Option<f64>,

    /// `agent_confirmation_ready` reported by a /health body, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_ready: Option<bool>,
}

/// An endpoint that did not validate, with the reason
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedEndpoint {
    pub endpoint: String,
    pub error: String,
}

/// Result of one connection validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionValidationResult {
    pub timestamp: DateTime<Utc>,
    pub action_type: String,
    pub validation_passed: bool,
    pub connection_fresh: bool,
    pub endpoints_validated: Vec<String>,
    pub failed_endpoints: Vec<FailedEndpoint>,
    pub overall_health_score: f64,
    pub confirmation_allowed: bool,
    pub cache_used: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_age_seconds: Option<f64>,

    /// Per-endpoint probe details
    pub probes: Vec<EndpointProbe>,
}

impl ConnectionValidationResult {
    /// Convert a passed validation into confirmation evidence; a failed
    /// one converts to nothing.
    pub fn to_confirmation(&self) -> Option<ConfirmationStatus> {
        if !self.confirmation_allowed {
            return None;
        }
        Some(ConfirmationStatus::confirmed(
            ConfirmationMethod::ConnectionValidation,
        ))
    }
}

/// One cached validation with its expiry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedValidation {
    validation_result: ConnectionValidationResult,
    cached_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// One line of the validation audit log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationLogEntry {
    pub timestamp: DateTime<Utc>,
    pub action_type: String,
    pub validation_passed: bool,
    pub health_score: f64,
    pub endpoints_tested: usize,
    pub confirmation_allowed: bool,
}

// Persisted document shapes
#[derive(Serialize, Deserialize, Default)]
struct CacheDocument {
    validations: HashMap<String, CachedValidation>,
}

#[derive(Serialize, Deserialize, Default)]
struct ValidationLogDocument {
    validation_log: Vec<ValidationLogEntry>,
}

/// Probes health endpoints to back "it really happened" confirmations.
///
/// Probes within one validation run concurrently; the validation itself
/// completes only once every probe has answered or timed out. A probe
/// failure only lowers the health score, it never fails the validation
/// call.
pub struct ConnectionValidator {
    config: ProbeConfig,
    client: reqwest::Client,
    cache: Mutex<HashMap<String, CachedValidation>>,
    log: Mutex<VecDeque<ValidationLogEntry>>,
}

impl ConnectionValidator {
    /// Build a validator, loading any persisted cache and log
    pub fn new(config: ProbeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.probe_timeout_secs))
            .build()
            .map_err(|e| Error::probe(format!("could not build http client: {e}")))?;

        let cache_doc: CacheDocument = load_document(&config, "connection_cache.json");
        let log_doc: ValidationLogDocument = load_document(&config, "connection_audit.json");

        let mut log = VecDeque::from(log_doc.validation_log);
        while log.len() > VALIDATION_LOG_CAP {
            log.pop_front();
        }

        Ok(Self {
            config,
            client,
            cache: Mutex::new(cache_doc.validations),
            log: Mutex::new(log),
        })
    }

    /// Validate the connection for an action type.
    ///
    /// An unexpired cached result for the same action type is returned
    /// (with `cache_used = true`) instead of re-probing; use
    /// [`force_fresh_validation`](Self::force_fresh_validation) to bypass
    /// the cache.
    pub async fn validate_fresh_connection(
        &self,
        action_type: &str,
        endpoints: Option<Vec<String>>,
    ) -> ConnectionValidationResult {
        if let Some(cached) = self.cached_validation(action_type) {
            debug!(action_type, "reusing cached validation");
            return cached;
        }
        self.run_probes(action_type, endpoints).await
    }

    /// Discard any cached result for the action type, then probe
    pub async fn force_fresh_validation(
        &self,
        action_type: &str,
        endpoints: Option<Vec<String>>,
    ) -> ConnectionValidationResult {
        {
            let mut cache = self.cache.lock();
            if cache.remove(action_type).is_some() {
                persist_cache(&self.config, &cache);
            }
        }
        self.run_probes(action_type, endpoints).await
    }

    /// The cached result for an action type, while unexpired
    pub fn cached_validation(&self, action_type: &str) -> Option<ConnectionValidationResult> {
        let cache = self.cache.lock();
        let cached = cache.get(action_type)?;

        let now = Utc::now();
        if now >= cached.expires_at {
            return None;
        }

        let mut result = cached.validation_result.clone();
        result.cache_used = true;
        result.cache_age_seconds =
            Some((now - cached.cached_at).num_milliseconds() as f64 / 1000.0);
        Some(result)
    }

    /// The validation audit log, oldest first
    pub fn validation_log(&self) -> Vec<ValidationLogEntry> {
        self.log.lock().iter().cloned().collect()
    }

    async fn run_probes(
        &self,
        action_type: &str,
        endpoints: Option<Vec<String>>,
    ) -> ConnectionValidationResult {
        let endpoints = endpoints.unwrap_or_else(|| endpoints_for(action_type));

        let probes: Vec<EndpointProbe> =
            join_all(endpoints.iter().map(|e| self.probe_endpoint(e))).await;

        let successes = probes
            .iter()
            .filter(|p| p.status == ProbeStatus::Success)
            .count();
        let total = probes.len();

        let overall_health_score = if total == 0 {
            0.0
        } else {
            successes as f64 / total as f64 * 100.0
        };
        let validation_passed = total > 0 && overall_health_score >= self.config.pass_threshold;

        let endpoints_validated = probes
            .iter()
            .filter(|p| p.status == ProbeStatus::Success)
            .map(|p| p.endpoint.clone())
            .collect();
        let failed_endpoints = probes
            .iter()
            .filter(|p| p.status != ProbeStatus::Success)
            .map(|p| FailedEndpoint {
                endpoint: p.endpoint.clone(),
                error: p
                    .error
                    .clone()
                    .or_else(|| p.status_code.map(|c| format!("http status {c}")))
                    .unwrap_or_else(|| "unknown failure".to_string()),
            })
            .collect();

        let result = ConnectionValidationResult {
            timestamp: Utc::now(),
            action_type: action_type.to_string(),
            validation_passed,
            connection_fresh: true,
            endpoints_validated,
            failed_endpoints,
            overall_health_score,
            confirmation_allowed: validation_passed,
            cache_used: false,
            cache_age_seconds: None,
            probes,
        };

        debug!(
            action_type,
            score = overall_health_score,
            passed = validation_passed,
            "connection validation finished"
        );

        self.log_validation(&result);
        if result.validation_passed {
            self.cache_result(&result);
        }

        result
    }

    async fn probe_endpoint(&self, endpoint: &str) -> EndpointProbe {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let start = Instant::now();

        match self.client.get(&url).send().await {
            Ok(response) => {
                let latency_ms = start.elapsed().as_millis() as u64;
                let code = response.status().as_u16();
                let status = if code < 400 {
                    ProbeStatus::Success
                } else {
                    ProbeStatus::Failed
                };

                let mut probe = EndpointProbe {
                    endpoint: endpoint.to_string(),
                    status,
                    status_code: Some(code),
                    latency_ms,
                    error: None,
                    reported_health_score: None,
                    agent_ready: None,
                };

                // /health bodies may carry extra detail; absence is fine
                if endpoint == "/health" && code == 200 {
                    if let Ok(body) = response.json::<serde_json::Value>().await {
                        probe.reported_health_score =
                            body.get("connection_health_score").and_then(|v| v.as_f64());
                        probe.agent_ready =
                            body.get("agent_confirmation_ready").and_then(|v| v.as_bool());
                    }
                }

                probe
            }
            Err(e) => EndpointProbe {
                endpoint: endpoint.to_string(),
                status: ProbeStatus::Error,
                status_code: None,
                latency_ms: start.elapsed().as_millis() as u64,
                error: Some(e.to_string()),
                reported_health_score: None,
                agent_ready: None,
            },
        }
    }

    fn log_validation(&self, result: &ConnectionValidationResult) {
        let mut log = self.log.lock();
        log.push_back(ValidationLogEntry {
            timestamp: result.timestamp,
            action_type: result.action_type.clone(),
            validation_passed: result.validation_passed,
            health_score: result.overall_health_score,
            endpoints_tested: result.probes.len(),
            confirmation_allowed: result.confirmation_allowed,
        });
        while log.len() > VALIDATION_LOG_CAP {
            log.pop_front();
        }

        if let Some(dir) = &self.config.data_dir {
            let doc = ValidationLogDocument {
                validation_log: log.iter().cloned().collect(),
            };
            persist(&dir.join("connection_audit.json"), &doc);
        }
    }

    fn cache_result(&self, result: &ConnectionValidationResult) {
        let now = Utc::now();
        let mut cache = self.cache.lock();
        cache.insert(
            result.action_type.clone(),
            CachedValidation {
                validation_result: result.clone(),
                cached_at: now,
                expires_at: now + Duration::seconds(self.config.cache_ttl_secs as i64),
            },
        );
        persist_cache(&self.config, &cache);
    }
}

fn load_document<T: serde::de::DeserializeOwned + Default>(
    config: &ProbeConfig,
    file: &str,
) -> T {
    let Some(dir) = &config.data_dir else {
        return T::default();
    };

    match std::fs::read_to_string(dir.join(file)) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!(file, error = %e, "malformed probe document, starting empty");
            T::default()
        }),
        Err(_) => T::default(),
    }
}

fn persist_cache(config: &ProbeConfig, cache: &HashMap<String, CachedValidation>) {
    if let Some(dir) = &config.data_dir {
        let doc = CacheDocument {
            validations: cache.clone(),
        };
        persist(&dir.join("connection_cache.json"), &doc);
    }
}

fn persist<T: Serialize>(path: &std::path::Path, value: &T) {
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    match serde_json::to_vec_pretty(value) {
        Ok(json) => {
            if let Err(e) = std::fs::write(path, json) {
                warn!(path = %path.display(), error = %e, "could not persist probe document");
            }
        }
        Err(e) => warn!(error = %e, "could not serialize probe document"),
    }
}
