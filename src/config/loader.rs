//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{AppConfig, DetectorBackend, Environment, LedgerBackend, OverlapPolicy};
use super::secret::secret_string;
use crate::domain::errors::DeidError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "DEID_";

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into AppConfig
/// 4. Applies environment variable overrides (DEID_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use deid_ledger::config::loader::load_config;
///
/// let config = load_config("deid-ledger.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(DeidError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        DeidError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    load_config_from_str(&contents)
}

/// Parses, overrides and validates configuration from TOML text
pub fn load_config_from_str(contents: &str) -> Result<AppConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: AppConfig = toml::from_str(&contents)
        .map_err(|e| DeidError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        DeidError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap_or_else(|e| unreachable!("{e}"))
    })
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied unchanged.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = env_var_pattern();
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let processed = re.replace_all(line, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    String::new()
                }
            }
        });
        result.push_str(&processed);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(DeidError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env(key: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{key}")).ok()
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        DeidError::Configuration(format!(
            "Invalid value '{value}' for environment variable {ENV_PREFIX}{key}"
        ))
    })
}

/// Applies environment variable overrides using the DEID_* prefix
///
/// Environment variables follow the pattern: DEID_<SECTION>_<KEY>
/// For example: DEID_LEDGER_ENDPOINT, DEID_APPLICATION_ENVIRONMENT
fn apply_env_overrides(config: &mut AppConfig) -> Result<()> {
    // Application overrides
    if let Some(val) = env("APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Some(val) = env("APPLICATION_ENVIRONMENT") {
        config.application.environment = match val.trim().to_lowercase().as_str() {
            "development" => Environment::Development,
            "staging" => Environment::Staging,
            "production" => Environment::Production,
            other => {
                return Err(DeidError::Configuration(format!(
                    "Invalid value '{other}' for {ENV_PREFIX}APPLICATION_ENVIRONMENT"
                )))
            }
        };
    }

    // Detector overrides
    if let Some(val) = env("DETECTOR_BACKEND") {
        config.detector.backend = match val.trim().to_lowercase().as_str() {
            "regex" => DetectorBackend::Regex,
            "ner_http" => DetectorBackend::NerHttp,
            other => {
                return Err(DeidError::Configuration(format!(
                    "Invalid value '{other}' for {ENV_PREFIX}DETECTOR_BACKEND"
                )))
            }
        };
    }
    if let Some(val) = env("DETECTOR_ENDPOINT") {
        config.detector.endpoint = Some(val);
    }
    if let Some(val) = env("DETECTOR_API_KEY") {
        config.detector.api_key = Some(secret_string(val));
    }
    if let Some(val) = env("DETECTOR_PATTERN_LIBRARY") {
        config.detector.pattern_library = Some(PathBuf::from(val));
    }
    if let Some(val) = env("DETECTOR_CONFIDENCE_THRESHOLD") {
        config.detector.confidence_threshold = parse_env("DETECTOR_CONFIDENCE_THRESHOLD", &val)?;
    }

    // Redaction overrides
    if let Some(val) = env("REDACTION_ALLOWED_CATEGORIES") {
        config.redaction.allowed_categories = val
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.parse().map_err(DeidError::Configuration))
            .collect::<Result<Vec<_>>>()?;
    }
    if let Some(val) = env("REDACTION_OVERLAP_POLICY") {
        config.redaction.overlap_policy = match val.trim().to_lowercase().as_str() {
            "merge" => OverlapPolicy::Merge,
            "reject" => OverlapPolicy::Reject,
            other => {
                return Err(DeidError::Configuration(format!(
                    "Invalid value '{other}' for {ENV_PREFIX}REDACTION_OVERLAP_POLICY"
                )))
            }
        };
    }

    // Authorization overrides
    if let Some(val) = env("AUTHORIZATION_ALLOWED_ROLES") {
        config.authorization.allowed_roles = val
            .split(',')
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();
    }

    // Audit overrides
    if let Some(val) = env("AUDIT_DEFAULT_PURPOSE") {
        config.audit.default_purpose = val;
    }
    if let Some(val) = env("AUDIT_JOURNAL_ENABLED") {
        config.audit.journal_enabled = parse_env("AUDIT_JOURNAL_ENABLED", &val)?;
    }
    if let Some(val) = env("AUDIT_JOURNAL_PATH") {
        config.audit.journal_path = PathBuf::from(val);
    }

    // Ledger overrides
    if let Some(val) = env("LEDGER_BACKEND") {
        config.ledger.backend = match val.trim().to_lowercase().as_str() {
            "memory" => LedgerBackend::Memory,
            "http" => LedgerBackend::Http,
            other => {
                return Err(DeidError::Configuration(format!(
                    "Invalid value '{other}' for {ENV_PREFIX}LEDGER_BACKEND"
                )))
            }
        };
    }
    if let Some(val) = env("LEDGER_ENDPOINT") {
        config.ledger.endpoint = Some(val);
    }
    if let Some(val) = env("LEDGER_API_KEY") {
        config.ledger.api_key = Some(secret_string(val));
    }
    if let Some(val) = env("LEDGER_CONFIRMATION_TIMEOUT_SECONDS") {
        config.ledger.confirmation_timeout_seconds =
            parse_env("LEDGER_CONFIRMATION_TIMEOUT_SECONDS", &val)?;
    }
    if let Some(val) = env("LEDGER_POLL_INTERVAL_MS") {
        config.ledger.poll_interval_ms = parse_env("LEDGER_POLL_INTERVAL_MS", &val)?;
    }

    // Logging overrides
    if let Some(val) = env("LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_env("LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Some(val) = env("LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("DEID_TEST_LOADER_VAR", "test_value");
        let input = "api_key = \"${DEID_TEST_LOADER_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "api_key = \"test_value\"\n");
        std::env::remove_var("DEID_TEST_LOADER_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("DEID_TEST_MISSING_VAR");
        let input = "api_key = \"${DEID_TEST_MISSING_VAR}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("DEID_TEST_MISSING_VAR"));
    }

    #[test]
    fn test_substitute_skips_comments() {
        let input = "# api_key = \"${DEID_TEST_COMMENTED_VAR}\"";
        assert!(substitute_env_vars(input).is_ok());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
[application]
log_level = "debug"
environment = "staging"

[redaction]
allowed_categories = ["PERSON", "DATE", "EMAIL"]

[audit]
default_purpose = "Quality Review"

[ledger]
backend = "http"
endpoint = "https://ledger.example.com"
confirmation_timeout_seconds = 30
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.application.environment, Environment::Staging);
        assert_eq!(config.redaction.allowed_categories.len(), 3);
        assert_eq!(config.audit.default_purpose, "Quality Review");
        assert_eq!(config.ledger.backend, LedgerBackend::Http);
        assert_eq!(config.ledger.confirmation_timeout_seconds, 30);
    }

    #[test]
    fn test_load_config_rejects_invalid() {
        let result = load_config_from_str(
            r#"
[ledger]
backend = "http"
"#,
        );
        assert!(matches!(result, Err(DeidError::Configuration(_))));
    }

    #[test]
    fn test_parse_env_reports_key() {
        let err = parse_env::<u64>("LEDGER_POLL_INTERVAL_MS", "soon").unwrap_err();
        assert!(err.to_string().contains("DEID_LEDGER_POLL_INTERVAL_MS"));
    }
}
