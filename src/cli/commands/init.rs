//! Init command implementation
//!
//! Writes a starter configuration file.

use super::{EXIT_CONFIG, EXIT_FATAL, EXIT_SUCCESS};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "deid-ledger.toml")]
    pub output: String,

    /// Include every option with comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing deid-ledger configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        let content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, content) {
            Ok(()) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Point [ledger] at your ledger gateway and set DEID_LEDGER_TOKEN");
                println!("  3. Validate configuration: deid-ledger validate-config");
                println!("  4. Check the ledger: deid-ledger check-ledger");
                println!("  5. De-identify: deid-ledger deidentify --operator <id> --file note.txt");
                println!();
                Ok(EXIT_SUCCESS)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# deid-ledger configuration

[application]
log_level = "info"
environment = "development"

[detector]
backend = "regex"

[redaction]
allowed_categories = ["PERSON", "DATE", "LOCATION", "ORGANIZATION", "EMAIL", "PHONE", "SSN", "MEDICAL_RECORD_NUMBER"]
overlap_policy = "merge"

[authorization]
allowed_roles = ["medical_professional"]

[audit]
default_purpose = "General Use"

[ledger]
backend = "memory"
"#
        .to_string()
    }

    /// Generate configuration with every option and comments
    fn generate_config_with_examples() -> String {
        r#"# deid-ledger configuration
#
# Values of the form ${VAR} are read from the environment (or .env).
# Any key can also be overridden with DEID_<SECTION>_<KEY>, for example
# DEID_LEDGER_ENDPOINT or DEID_APPLICATION_ENVIRONMENT.

# ============================================================================
# Application
# ============================================================================
[application]
# trace, debug, info, warn, error
log_level = "info"

# development, staging, production
# Production requires the http ledger with an https:// endpoint.
environment = "development"

# ============================================================================
# Entity detection
# ============================================================================
[detector]
# regex: built-in or custom pattern library
# ner_http: remote named-entity recognition service
backend = "regex"

# Custom pattern library (TOML); the built-in library is used when unset
# pattern_library = "./patterns/entity_patterns.toml"

# Patterns below this confidence are ignored
confidence_threshold = 0.7

# NER service (backend = "ner_http")
# endpoint = "https://ner.example.com/v1/entities"
# api_key = "${DEID_NER_TOKEN}"
timeout_seconds = 10

# ============================================================================
# Redaction
# ============================================================================
[redaction]
# Categories replaced with [CATEGORY] placeholders. Others pass through.
# PERSON, DATE, LOCATION, ORGANIZATION, EMAIL, PHONE, SSN,
# MEDICAL_RECORD_NUMBER, URL, IP_ADDRESS
allowed_categories = ["PERSON", "DATE", "LOCATION", "ORGANIZATION", "EMAIL", "PHONE", "SSN", "MEDICAL_RECORD_NUMBER"]

# merge: overlapping spans become one span (first category wins)
# reject: overlapping spans fail the request
overlap_policy = "merge"

# ============================================================================
# Authorization
# ============================================================================
[authorization]
allowed_roles = ["medical_professional"]

# ============================================================================
# Audit
# ============================================================================
[audit]
# Purpose recorded when a request gives none
default_purpose = "General Use"

# Action tag written to every record
action = "DE-IDENTIFY"

# Local JSON-lines journal (fingerprints and counts only, never note text)
journal_enabled = false
journal_path = "./audit/deid-journal.jsonl"

# ============================================================================
# Audit ledger
# ============================================================================
[ledger]
# memory: in-process ledger for development and tests
# http: ledger gateway REST API
backend = "memory"

# endpoint = "https://ledger.example.com"
# api_key = "${DEID_LEDGER_TOKEN}"

request_timeout_seconds = 30

# A commit that is not confirmed within this window is reported as
# ledger_confirmation_timeout
confirmation_timeout_seconds = 60
poll_interval_ms = 500

# Read retries (submissions are never retried)
[ledger.retry]
max_retries = 3
initial_delay_ms = 500
max_delay_ms = 10000
backoff_multiplier = 2.0

# ============================================================================
# Logging
# ============================================================================
[logging]
local_enabled = false
local_path = "./logs"

# daily, hourly, never
local_rotation = "daily"
"#
        .to_string()
    }
}
