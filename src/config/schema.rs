//! Configuration schema types
//!
//! This module defines the configuration structure for deid-ledger. Every
//! section has defaults, so an empty file yields a working development setup
//! (regex detector, in-memory ledger).

use crate::config::SecretString;
use crate::deidentification::models::EntityCategory;
use crate::domain::identity::Role;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development environment
    #[default]
    Development,
    /// Staging environment
    Staging,
    /// Production environment
    Production,
}

/// Main configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Entity detector selection
    #[serde(default)]
    pub detector: DetectorConfig,

    /// Redaction rules
    #[serde(default)]
    pub redaction: RedactionConfig,

    /// Role gating
    #[serde(default)]
    pub authorization: AuthorizationConfig,

    /// Audit defaults and local journal
    #[serde(default)]
    pub audit: AuditConfig,

    /// External ledger connection
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.detector.validate()?;
        self.redaction.validate()?;
        self.authorization.validate()?;
        self.audit.validate()?;
        self.ledger.validate(self.application.environment)?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: Environment,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            environment: Environment::default(),
        }
    }
}

/// Entity detector implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DetectorBackend {
    /// Built-in pattern detector
    #[default]
    Regex,
    /// External NER model served over HTTP
    NerHttp,
}

/// Entity detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Which detector to run
    #[serde(default)]
    pub backend: DetectorBackend,

    /// Custom pattern library (regex backend); built-in patterns when unset
    #[serde(default)]
    pub pattern_library: Option<PathBuf>,

    /// Minimum pattern confidence (regex backend)
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,

    /// NER service URL (ner_http backend)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Bearer token for the NER service
    #[serde(default, skip_serializing)]
    pub api_key: Option<SecretString>,

    /// NER request timeout in seconds
    #[serde(default = "default_detector_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl DetectorConfig {
    fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(format!(
                "detector.confidence_threshold must be between 0.0 and 1.0, got {}",
                self.confidence_threshold
            ));
        }

        if self.timeout_seconds == 0 {
            return Err("detector.timeout_seconds must be > 0".to_string());
        }
        if self.api_key.as_ref().is_some_and(|k| k.expose_secret().is_blank()) {
            return Err("detector.api_key is set but blank".to_string());
        }

        if self.backend == DetectorBackend::NerHttp {
            match self.endpoint.as_deref() {
                Some(endpoint) => validate_http_url("detector.endpoint", endpoint)?,
                None => {
                    return Err(
                        "detector.endpoint is required when backend = 'ner_http'".to_string()
                    )
                }
            }
        }

        Ok(())
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            backend: DetectorBackend::default(),
            pattern_library: None,
            confidence_threshold: default_confidence_threshold(),
            endpoint: None,
            api_key: None,
            timeout_seconds: default_detector_timeout_seconds(),
        }
    }
}

/// How overlapping allow-listed spans are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
    /// Collapse overlapping spans into one placeholder covering their union
    #[default]
    Merge,
    /// Fail the request on any overlap
    Reject,
}

/// Redaction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionConfig {
    /// Categories that are substituted; everything else is left in place
    #[serde(default = "EntityCategory::default_allow_list")]
    pub allowed_categories: Vec<EntityCategory>,

    /// Overlap handling
    #[serde(default)]
    pub overlap_policy: OverlapPolicy,
}

impl RedactionConfig {
    fn validate(&self) -> Result<(), String> {
        if self.allowed_categories.is_empty() {
            return Err("redaction.allowed_categories cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            allowed_categories: EntityCategory::default_allow_list(),
            overlap_policy: OverlapPolicy::default(),
        }
    }
}

/// Role gating configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationConfig {
    /// Roles permitted to de-identify
    #[serde(default = "default_allowed_roles")]
    pub allowed_roles: Vec<String>,
}

impl AuthorizationConfig {
    fn validate(&self) -> Result<(), String> {
        if self.allowed_roles.is_empty() {
            return Err("authorization.allowed_roles cannot be empty".to_string());
        }
        if self.allowed_roles.iter().any(|r| r.trim().is_empty()) {
            return Err("authorization.allowed_roles cannot contain blank roles".to_string());
        }
        Ok(())
    }
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            allowed_roles: default_allowed_roles(),
        }
    }
}

/// Audit configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Purpose recorded when the request supplies none
    #[serde(default = "default_purpose")]
    pub default_purpose: String,

    /// Action tag written to every record
    #[serde(default = "default_action")]
    pub action: String,

    /// Write a local JSON-lines journal of every run
    #[serde(default)]
    pub journal_enabled: bool,

    /// Journal file path
    #[serde(default = "default_journal_path")]
    pub journal_path: PathBuf,
}

impl AuditConfig {
    fn validate(&self) -> Result<(), String> {
        if self.default_purpose.trim().is_empty() {
            return Err("audit.default_purpose cannot be empty".to_string());
        }
        if self.action.trim().is_empty() {
            return Err("audit.action cannot be empty".to_string());
        }
        if self.journal_enabled && self.journal_path.as_os_str().is_empty() {
            return Err("audit.journal_path is required when journal_enabled = true".to_string());
        }
        Ok(())
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            default_purpose: default_purpose(),
            action: default_action(),
            journal_enabled: false,
            journal_path: default_journal_path(),
        }
    }
}

/// Ledger implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LedgerBackend {
    /// In-process ledger (development and tests only)
    #[default]
    Memory,
    /// REST ledger gateway
    Http,
}

/// Retry configuration for ledger reads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_retries == 0 {
            return Err("ledger.retry.max_retries must be > 0".to_string());
        }
        if self.backoff_multiplier < 1.0 {
            return Err(format!(
                "ledger.retry.backoff_multiplier must be >= 1.0, got {}",
                self.backoff_multiplier
            ));
        }
        if self.initial_delay_ms > self.max_delay_ms {
            return Err(
                "ledger.retry.initial_delay_ms cannot exceed ledger.retry.max_delay_ms".to_string(),
            );
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// Ledger connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Which ledger to anchor to
    #[serde(default)]
    pub backend: LedgerBackend,

    /// Gateway base URL (http backend)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Bearer token for the gateway
    #[serde(default, skip_serializing)]
    pub api_key: Option<SecretString>,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    /// Upper bound on waiting for a submitted record to be confirmed
    #[serde(default = "default_confirmation_timeout_seconds")]
    pub confirmation_timeout_seconds: u64,

    /// Interval between confirmation polls
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Simulated inclusion delay for the memory backend
    #[serde(default)]
    pub memory_confirmation_delay_ms: u64,

    /// Retry configuration for reads
    #[serde(default)]
    pub retry: RetryConfig,
}

impl LedgerConfig {
    fn validate(&self, environment: Environment) -> Result<(), String> {
        if self.request_timeout_seconds == 0 {
            return Err("ledger.request_timeout_seconds must be > 0".to_string());
        }
        if self.confirmation_timeout_seconds == 0 {
            return Err("ledger.confirmation_timeout_seconds must be > 0".to_string());
        }
        if self.poll_interval_ms == 0 {
            return Err("ledger.poll_interval_ms must be > 0".to_string());
        }
        if self.api_key.as_ref().is_some_and(|k| k.expose_secret().is_blank()) {
            return Err("ledger.api_key is set but blank".to_string());
        }

        if self.backend == LedgerBackend::Http {
            match self.endpoint.as_deref() {
                Some(endpoint) => validate_http_url("ledger.endpoint", endpoint)?,
                None => {
                    return Err("ledger.endpoint is required when backend = 'http'".to_string())
                }
            }
        }

        // The audit trail must live outside the service in production
        if environment == Environment::Production {
            if self.backend != LedgerBackend::Http {
                return Err(
                    "The memory ledger cannot be used in production environments. \
                    Set 'ledger.backend = \"http\"' and point 'ledger.endpoint' at the ledger gateway."
                        .to_string(),
                );
            }
            let is_https = self
                .endpoint
                .as_deref()
                .and_then(|e| url::Url::parse(e).ok())
                .map(|u| u.scheme() == "https")
                .unwrap_or(false);
            if !is_https {
                return Err(
                    "ledger.endpoint must use https:// in production environments".to_string(),
                );
            }
        }

        self.retry.validate()?;
        Ok(())
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            backend: LedgerBackend::default(),
            endpoint: None,
            api_key: None,
            request_timeout_seconds: default_request_timeout_seconds(),
            confirmation_timeout_seconds: default_confirmation_timeout_seconds(),
            poll_interval_ms: default_poll_interval_ms(),
            memory_confirmation_delay_ms: 0,
            retry: RetryConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local JSON file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local_enabled = true".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<(), String> {
    let parsed = url::Url::parse(value).map_err(|e| format!("{field} is not a valid URL: {e}"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!(
            "{field} must start with http:// or https://, got scheme '{other}'"
        )),
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_confidence_threshold() -> f32 {
    0.7
}

fn default_detector_timeout_seconds() -> u64 {
    10
}

fn default_allowed_roles() -> Vec<String> {
    vec![Role::MEDICAL_PROFESSIONAL.to_string()]
}

fn default_purpose() -> String {
    "General Use".to_string()
}

fn default_action() -> String {
    crate::domain::DEIDENTIFY_ACTION.to_string()
}

fn default_journal_path() -> PathBuf {
    PathBuf::from("./audit/deid-journal.jsonl")
}

fn default_max_retries() -> usize {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    10000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_request_timeout_seconds() -> u64 {
    30
}

fn default_confirmation_timeout_seconds() -> u64 {
    60
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
