//! Domain error types
//!
//! This module defines the error hierarchy for deid-ledger.
//! All errors are domain-specific and don't expose third-party types.

use std::time::Duration;
use thiserror::Error;

/// Main deid-ledger error type
///
/// This is the primary error type used throughout the application.
/// It wraps the component-specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum DeidError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Entity detection errors (fatal to a de-identification request)
    #[error("Detection error: {0}")]
    Detection(#[from] DetectionError),

    /// Redaction errors (fatal to a de-identification request)
    #[error("Redaction error: {0}")]
    Redaction(#[from] RedactionError),

    /// Audit ledger errors
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Role precondition failed; no processing occurred
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Entity detection errors
///
/// Raised by [`EntitySpanDetector`](crate::deidentification::detector::EntitySpanDetector)
/// implementations. Every variant aborts the pipeline: unredacted text is never passed through.
#[derive(Debug, Error)]
pub enum DetectionError {
    /// The underlying model or NER service cannot run
    #[error("Entity model unavailable: {0}")]
    ModelUnavailable(String),

    /// The model returned a span that cannot describe a text range
    #[error("Invalid entity span: {0}")]
    InvalidSpan(String),
}

/// Redaction errors
#[derive(Debug, Error)]
pub enum RedactionError {
    /// Two allow-listed spans overlap and the overlap policy rejects them
    #[error("Overlapping entity spans [{first_start}, {first_end}) and [{second_start}, {second_end})")]
    OffsetConflict {
        first_start: usize,
        first_end: usize,
        second_start: usize,
        second_end: usize,
    },

    /// A span is empty or its end precedes its start
    #[error("Entity span [{start}, {end}) is empty or inverted")]
    InvalidSpan { start: usize, end: usize },

    /// A span reaches past the end of the text
    #[error("Entity span [{start}, {end}) exceeds text length {text_len}")]
    SpanOutOfBounds {
        start: usize,
        end: usize,
        text_len: usize,
    },
}

/// Audit ledger errors
///
/// Errors that occur when talking to the external append-only ledger.
/// These errors don't expose third-party HTTP client types.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Ledger unreachable (transport failure or server-side error)
    #[error("Ledger unreachable: {0}")]
    Connectivity(String),

    /// Ledger refused the submission (authorization, funds, nonce, revert)
    #[error("Ledger rejected submission: {0}")]
    SubmissionRejected(String),

    /// Submission was accepted but inclusion was not confirmed in time
    #[error("Ledger confirmation timed out after {0:?}")]
    ConfirmationTimeout(Duration),

    /// No record at the requested sequence id
    #[error("Audit record not found: {0}")]
    NotFound(u64),

    /// Ledger answered with something we could not interpret
    #[error("Invalid response from ledger: {0}")]
    InvalidResponse(String),
}

impl LedgerError {
    /// Whether a read may be retried after this error
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connectivity(_))
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for DeidError {
    fn from(err: std::io::Error) -> Self {
        DeidError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for DeidError {
    fn from(err: serde_json::Error) -> Self {
        DeidError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for DeidError {
    fn from(err: toml::de::Error) -> Self {
        DeidError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deid_error_display() {
        let err = DeidError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_detection_error_conversion() {
        let err: DeidError = DetectionError::ModelUnavailable("offline".to_string()).into();
        assert!(matches!(
            err,
            DeidError::Detection(DetectionError::ModelUnavailable(_))
        ));
    }

    #[test]
    fn test_redaction_error_display() {
        let err = RedactionError::OffsetConflict {
            first_start: 0,
            first_end: 5,
            second_start: 3,
            second_end: 8,
        };
        assert_eq!(
            err.to_string(),
            "Overlapping entity spans [0, 5) and [3, 8)"
        );
    }

    #[test]
    fn test_ledger_error_conversion() {
        let err: DeidError = LedgerError::ConfirmationTimeout(Duration::from_secs(30)).into();
        assert!(matches!(err, DeidError::Ledger(_)));
        assert!(err.to_string().contains("30s"));
    }

    #[test]
    fn test_ledger_error_retryable() {
        assert!(LedgerError::Connectivity("refused".to_string()).is_retryable());
        assert!(!LedgerError::SubmissionRejected("funds".to_string()).is_retryable());
        assert!(!LedgerError::NotFound(7).is_retryable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: DeidError = io_err.into();
        assert!(matches!(err, DeidError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: DeidError = json_err.into();
        assert!(matches!(err, DeidError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: DeidError = toml_err.into();
        assert!(matches!(err, DeidError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_deid_error_implements_std_error() {
        let err = DeidError::Unauthorized("normal_user".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
