//! Logging and observability
//!
//! Structured logging built on `tracing`:
//! - Human-readable console output
//! - JSON-formatted file logs with rotation
//! - Log levels from configuration, overridable through `RUST_LOG`
//!
//! Nothing logged by this crate carries note text or span content; events
//! reference fingerprints, counts and principals.
//!
//! # Example
//!
//! ```no_run
//! use deid_ledger::logging::init_logging;
//! use deid_ledger::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Service started");
//! ```

pub mod structured;

pub use structured::{init_logging, resolve_logging, LoggingGuard, CLI_DEFAULT_LOG_LEVEL};

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use deid_ledger::log_retry_attempt;
///
/// log_retry_attempt!(2, 3, "Connection timeout");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = %$reason,
            "Retrying operation"
        );
    };
}

/// Log a failed ledger commit
///
/// # Example
///
/// ```no_run
/// use deid_ledger::log_audit_failure;
/// use deid_ledger::deidentification::AuditFailureKind;
///
/// log_audit_failure!(AuditFailureKind::LedgerConfirmationTimeout, "no receipt after 60s");
/// ```
#[macro_export]
macro_rules! log_audit_failure {
    ($kind:expr, $reason:expr) => {
        tracing::error!(
            kind = ?$kind,
            reason = %$reason,
            "Audit commit failed"
        );
    };
}

#[cfg(test)]
mod tests {
    use crate::deidentification::AuditFailureKind;

    #[test]
    fn test_macros_expand_without_subscriber() {
        log_retry_attempt!(1, 3, "ledger unreachable");
        log_audit_failure!(AuditFailureKind::LedgerSubmissionRejected, "reverted");
    }
}
