//! Validate config command implementation
//!
//! Loads and validates the configuration file, then prints a summary.
//! Secrets are never printed.

use super::{EXIT_CONFIG, EXIT_SUCCESS};
use crate::config::{load_config, AppConfig, DetectorBackend, LedgerBackend};
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        match load_config(config_path) {
            Ok(config) => {
                println!("✅ Configuration is valid");
                println!();
                print_summary(&config);
                Ok(EXIT_SUCCESS)
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                Ok(EXIT_CONFIG)
            }
        }
    }
}

fn print_summary(config: &AppConfig) {
    println!("Configuration Summary:");
    println!("  Environment: {:?}", config.application.environment);
    println!("  Log Level: {}", config.application.log_level);

    match config.detector.backend {
        DetectorBackend::Regex => {
            let library = config
                .detector
                .pattern_library
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in".to_string());
            println!("  Detector: regex (patterns: {library})");
        }
        DetectorBackend::NerHttp => {
            println!(
                "  Detector: ner_http ({})",
                config.detector.endpoint.as_deref().unwrap_or("-")
            );
        }
    }
    println!(
        "  Confidence Threshold: {}",
        config.detector.confidence_threshold
    );

    let categories: Vec<&str> = config
        .redaction
        .allowed_categories
        .iter()
        .map(|c| c.label())
        .collect();
    println!("  Redacted Categories: {}", categories.join(", "));
    println!("  Overlap Policy: {:?}", config.redaction.overlap_policy);
    println!(
        "  Allowed Roles: {}",
        config.authorization.allowed_roles.join(", ")
    );
    println!("  Default Purpose: {}", config.audit.default_purpose);
    if config.audit.journal_enabled {
        println!("  Audit Journal: {}", config.audit.journal_path.display());
    }

    match config.ledger.backend {
        LedgerBackend::Memory => println!("  Ledger: memory (records are lost on exit)"),
        LedgerBackend::Http => println!(
            "  Ledger: http ({})",
            config.ledger.endpoint.as_deref().unwrap_or("-")
        ),
    }
    println!(
        "  Ledger API Key: {}",
        if config.ledger.api_key.is_some() {
            "set"
        } else {
            "not set"
        }
    );
    println!(
        "  Confirmation Timeout: {}s",
        config.ledger.confirmation_timeout_seconds
    );
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_validate_default_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[application]\nlog_level = \"info\"").unwrap();

        let code = ValidateArgs {}
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, EXIT_SUCCESS);
    }

    #[tokio::test]
    async fn test_validate_rejects_memory_ledger_in_production() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[application]\nenvironment = \"production\"").unwrap();

        let code = ValidateArgs {}
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, EXIT_CONFIG);
    }
}
