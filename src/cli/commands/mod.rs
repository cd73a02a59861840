//! CLI command implementations
//!
//! Every command returns its process exit code:
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Success |
//! | 1 | Request refused (unauthorized, detection or redaction failure) |
//! | 2 | Configuration error |
//! | 3 | Redacted, but the audit record was not committed |
//! | 4 | Ledger error |
//! | 5 | Fatal error |
//! | 6 | Verification found a tampered document |
//! | 130 | Interrupted |

pub mod check_ledger;
pub mod deidentify;
pub mod init;
pub mod records;
pub mod validate;
pub mod verify;

use crate::adapters::ledger::AuditLedgerClient;
use crate::config::{load_config, AppConfig};
use crate::domain::DeidError;

pub(crate) const EXIT_SUCCESS: i32 = 0;
pub(crate) const EXIT_REFUSED: i32 = 1;
pub(crate) const EXIT_CONFIG: i32 = 2;
pub(crate) const EXIT_AUDIT_FAILED: i32 = 3;
pub(crate) const EXIT_LEDGER: i32 = 4;
pub(crate) const EXIT_FATAL: i32 = 5;
pub(crate) const EXIT_TAMPERED: i32 = 6;
pub(crate) const EXIT_INTERRUPTED: i32 = 130;

/// Exit code for an error raised while handling a request
pub(crate) fn exit_code_for(err: &DeidError) -> i32 {
    match err {
        DeidError::Unauthorized(_)
        | DeidError::Detection(_)
        | DeidError::Redaction(_)
        | DeidError::Validation(_) => EXIT_REFUSED,
        DeidError::Configuration(_) => EXIT_CONFIG,
        DeidError::Ledger(_) => EXIT_LEDGER,
        DeidError::Serialization(_) | DeidError::Io(_) | DeidError::Other(_) => EXIT_FATAL,
    }
}

/// Load configuration, printing the failure
pub(crate) fn load_or_report(config_path: &str) -> Result<AppConfig, i32> {
    load_config(config_path).map_err(|e| {
        println!("❌ Failed to load configuration file");
        println!("   Error: {e}");
        EXIT_CONFIG
    })
}

/// Build a ledger client from configuration, printing the failure
pub(crate) fn ledger_or_report(config: &AppConfig) -> Result<AuditLedgerClient, i32> {
    AuditLedgerClient::from_config(&config.ledger, config.application.environment).map_err(|e| {
        println!("❌ Failed to create ledger client");
        println!("   Error: {e}");
        EXIT_CONFIG
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DetectionError, LedgerError};
    use test_case::test_case;

    #[test_case(DeidError::Unauthorized("nurse".into()) => EXIT_REFUSED; "unauthorized")]
    #[test_case(DeidError::Detection(DetectionError::ModelUnavailable("down".into())) => EXIT_REFUSED; "detection")]
    #[test_case(DeidError::Configuration("bad".into()) => EXIT_CONFIG; "configuration")]
    #[test_case(DeidError::Ledger(LedgerError::NotFound(3)) => EXIT_LEDGER; "ledger")]
    #[test_case(DeidError::Io("disk".into()) => EXIT_FATAL; "io")]
    fn test_exit_code_for(err: DeidError) -> i32 {
        exit_code_for(&err)
    }

    #[test]
    fn test_load_or_report_missing_file() {
        assert_eq!(load_or_report("does-not-exist.toml").unwrap_err(), EXIT_CONFIG);
    }
}
