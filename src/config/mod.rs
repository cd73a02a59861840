//! Configuration management for deid-ledger.
//!
//! TOML files with `${VAR_NAME}` substitution, `DEID_*` environment overrides,
//! serde defaults for every section, and validation on load.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use deid_ledger::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("deid-ledger.toml")?;
//!
//! println!("Detector: {:?}", config.detector.backend);
//! println!("Ledger: {:?}", config.ledger.backend);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level and deployment environment
//! - [`DetectorConfig`] - Entity span detector backend
//! - [`RedactionConfig`] - Category allow-list and overlap policy
//! - [`AuthorizationConfig`] - Roles allowed to de-identify
//! - [`AuditConfig`] - Purpose default, action tag, local journal
//! - [`LedgerConfig`] - Audit ledger backend, timeouts and read retries
//! - [`LoggingConfig`] - Local file logging
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//! environment = "production"
//!
//! [redaction]
//! allowed_categories = ["PERSON", "DATE", "LOCATION", "ORGANIZATION"]
//! overlap_policy = "merge"
//!
//! [ledger]
//! backend = "http"
//! endpoint = "https://ledger.example.com"
//! api_key = "${DEID_LEDGER_TOKEN}"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, load_config_from_str};
pub use schema::{
    AppConfig, ApplicationConfig, AuditConfig, AuthorizationConfig, DetectorBackend,
    DetectorConfig, Environment, LedgerBackend, LedgerConfig, LoggingConfig, OverlapPolicy,
    RedactionConfig, RetryConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
