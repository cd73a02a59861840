//! Integrity verification
//!
//! Recomputes the fingerprint of a candidate document and compares it with a
//! previously committed fingerprint. A mismatch is a normal outcome
//! (`TAMPERED`), not an error.

use crate::adapters::ledger::AuditLedgerClient;
use crate::core::verification::fingerprint::{fingerprint, fingerprint_bytes};
use crate::core::verification::report::{VerificationFailure, VerificationReport};
use crate::domain::{AuditRecord, ContentFingerprint, Result};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

/// Checks run at once by [`IntegrityVerifier::verify_all`]
pub const VERIFY_CONCURRENCY: usize = 8;

/// Verification verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    /// Candidate content is byte-identical to the committed content
    Match,
    /// Candidate content differs from the committed content
    Tampered,
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Match => write!(f, "MATCH"),
            Self::Tampered => write!(f, "TAMPERED"),
        }
    }
}

/// Result of one comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    /// Verdict
    pub status: VerificationStatus,
    /// Fingerprint the candidate was checked against, exactly as supplied
    pub expected_fingerprint: String,
    /// Fingerprint recomputed from the candidate
    pub actual_fingerprint: ContentFingerprint,
}

impl VerificationOutcome {
    fn compare(expected: &str, actual: ContentFingerprint) -> Self {
        let status = if expected == actual.as_str() {
            VerificationStatus::Match
        } else {
            VerificationStatus::Tampered
        };
        Self {
            status,
            expected_fingerprint: expected.to_string(),
            actual_fingerprint: actual,
        }
    }

    /// Whether the candidate matched
    pub fn is_match(&self) -> bool {
        self.status == VerificationStatus::Match
    }
}

/// Which fingerprint of a record to check against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintField {
    /// Fingerprint of the raw document
    Original,
    /// Fingerprint of the redacted document
    #[default]
    Redacted,
}

impl FingerprintField {
    /// Select the field from a record
    pub fn select<'a>(&self, record: &'a AuditRecord) -> &'a ContentFingerprint {
        match self {
            Self::Original => &record.original_fingerprint,
            Self::Redacted => &record.new_fingerprint,
        }
    }
}

impl fmt::Display for FingerprintField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Original => write!(f, "original"),
            Self::Redacted => write!(f, "redacted"),
        }
    }
}

impl FromStr for FingerprintField {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "original" => Ok(Self::Original),
            "redacted" | "new" => Ok(Self::Redacted),
            other => Err(format!(
                "Unknown fingerprint field '{other}'. Must be one of: original, redacted"
            )),
        }
    }
}

/// Compare `candidate` against an expected fingerprint
///
/// Comparison is exact string equality: an uppercase or whitespace-padded
/// expected value does not match.
///
/// # Examples
///
/// ```
/// use deid_ledger::core::verification::{fingerprint, verify, VerificationStatus};
///
/// let text = "Patient [PERSON] was admitted on [DATE].";
/// let expected = fingerprint(text);
/// assert_eq!(verify(expected.as_str(), text).status, VerificationStatus::Match);
/// assert_eq!(verify(expected.as_str(), "altered").status, VerificationStatus::Tampered);
/// ```
pub fn verify(expected_fingerprint: &str, candidate: &str) -> VerificationOutcome {
    VerificationOutcome::compare(expected_fingerprint, fingerprint(candidate))
}

/// Compare raw bytes against an expected fingerprint
pub fn verify_bytes(expected_fingerprint: &str, candidate: &[u8]) -> VerificationOutcome {
    VerificationOutcome::compare(expected_fingerprint, fingerprint_bytes(candidate))
}

/// Where the expected fingerprint of a check comes from
#[derive(Debug, Clone)]
pub enum ExpectedFingerprint {
    /// Supplied by the caller
    Literal(String),
    /// Read from a committed ledger record
    Record {
        /// Record to read
        sequence_id: u64,
        /// Fingerprint field to compare against
        field: FingerprintField,
    },
}

/// One document to check
#[derive(Debug, Clone)]
pub struct VerificationCheck {
    /// Name used in the report (usually the file path)
    pub document: String,
    /// Expected fingerprint source
    pub expected: ExpectedFingerprint,
    /// Candidate content
    pub candidate: Vec<u8>,
}

/// Integrity verifier
///
/// Literal checks are pure. Record checks read the ledger through the shared
/// client; a read failure is reported as an error, never as `TAMPERED`.
#[derive(Clone, Default)]
pub struct IntegrityVerifier {
    ledger: Option<Arc<AuditLedgerClient>>,
}

impl IntegrityVerifier {
    /// Create a verifier for literal fingerprints only
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a verifier that can read records from the ledger
    pub fn with_ledger(ledger: Arc<AuditLedgerClient>) -> Self {
        Self {
            ledger: Some(ledger),
        }
    }

    /// Compare text against an expected fingerprint
    pub fn verify(&self, expected_fingerprint: &str, candidate: &str) -> VerificationOutcome {
        verify(expected_fingerprint, candidate)
    }

    /// Compare bytes against an expected fingerprint
    pub fn verify_bytes(&self, expected_fingerprint: &str, candidate: &[u8]) -> VerificationOutcome {
        verify_bytes(expected_fingerprint, candidate)
    }

    /// Compare bytes against a fingerprint stored in a committed record
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no ledger is attached, and the
    /// ledger error when the record cannot be read.
    pub async fn verify_against_record(
        &self,
        sequence_id: u64,
        field: FingerprintField,
        candidate: &[u8],
    ) -> Result<VerificationOutcome> {
        let ledger = self.ledger.as_ref().ok_or_else(|| {
            crate::domain::DeidError::Configuration(
                "Record verification requires a ledger connection".to_string(),
            )
        })?;

        let record = ledger.read_record(sequence_id).await?;
        let outcome = verify_bytes(field.select(&record).as_str(), candidate);

        tracing::info!(
            sequence_id,
            field = %field,
            status = %outcome.status,
            "Verified document against ledger record"
        );
        Ok(outcome)
    }

    /// Run many checks and aggregate them into a report
    ///
    /// Up to [`VERIFY_CONCURRENCY`] checks run at once; the report lists
    /// failures in input order.
    pub async fn verify_all(&self, checks: Vec<VerificationCheck>) -> VerificationReport {
        let start = Instant::now();

        let outcomes: Vec<(String, Result<VerificationOutcome>)> = stream::iter(checks)
            .map(|check| async move {
                let outcome = match check.expected {
                    ExpectedFingerprint::Literal(ref expected) => {
                        Ok(verify_bytes(expected, &check.candidate))
                    }
                    ExpectedFingerprint::Record { sequence_id, field } => {
                        self.verify_against_record(sequence_id, field, &check.candidate)
                            .await
                    }
                };
                (check.document, outcome)
            })
            .buffered(VERIFY_CONCURRENCY)
            .collect()
            .await;

        let mut report = VerificationReport::new();
        for (document, outcome) in outcomes {
            match outcome {
                Ok(outcome) if outcome.is_match() => report.record_match(),
                Ok(outcome) => report.record_tampered(VerificationFailure {
                    document,
                    expected_fingerprint: outcome.expected_fingerprint,
                    actual_fingerprint: outcome.actual_fingerprint.to_string(),
                    reason: "Fingerprint mismatch".to_string(),
                }),
                Err(e) => {
                    tracing::warn!(document = %document, error = %e, "Verification skipped");
                    report.record_skip(document, e.to_string());
                }
            }
        }

        report.set_duration(start.elapsed().as_millis() as u64);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ledger::{FaultMode, MemoryLedger};
    use crate::domain::{AuditEntry, Principal};
    use std::time::Duration;

    const ORIGINAL: &str = "Patient John Smith was admitted on October 8, 2025.";
    const REDACTED: &str = "Patient [PERSON] was admitted on [DATE].";

    #[test]
    fn test_match_and_tampered() {
        let expected = fingerprint(ORIGINAL);
        assert_eq!(
            verify(expected.as_str(), ORIGINAL).status,
            VerificationStatus::Match
        );
        assert_eq!(
            verify(
                expected.as_str(),
                "Patient Jane Doe was admitted on October 8, 2025."
            )
            .status,
            VerificationStatus::Tampered
        );
    }

    #[test]
    fn test_comparison_is_exact() {
        let expected = fingerprint(ORIGINAL);
        let upper = expected.as_str().to_uppercase();
        let padded = format!(" {}", expected.as_str());

        assert_eq!(verify(&upper, ORIGINAL).status, VerificationStatus::Tampered);
        assert_eq!(verify(&padded, ORIGINAL).status, VerificationStatus::Tampered);
        assert_eq!(
            verify(expected.as_str(), &format!("{ORIGINAL}\n")).status,
            VerificationStatus::Tampered
        );
    }

    #[test]
    fn test_outcome_carries_both_fingerprints() {
        let outcome = verify("abc", ORIGINAL);
        assert_eq!(outcome.expected_fingerprint, "abc");
        assert_eq!(outcome.actual_fingerprint, fingerprint(ORIGINAL));
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(
            serde_json::to_string(&VerificationStatus::Tampered).unwrap(),
            "\"TAMPERED\""
        );
    }

    #[test]
    fn test_field_from_str() {
        assert_eq!(
            "Original".parse::<FingerprintField>().unwrap(),
            FingerprintField::Original
        );
        assert_eq!(
            "redacted".parse::<FingerprintField>().unwrap(),
            FingerprintField::Redacted
        );
        assert!("other".parse::<FingerprintField>().is_err());
    }

    async fn ledger_with_record() -> (Arc<MemoryLedger>, Arc<AuditLedgerClient>) {
        let memory = Arc::new(MemoryLedger::new());
        let client = Arc::new(AuditLedgerClient::new(memory.clone(), Duration::from_secs(5)));
        client
            .commit(
                &Principal::new("dr_strange").unwrap(),
                &AuditEntry {
                    action: "DE-IDENTIFY".to_string(),
                    purpose: "General Use".to_string(),
                    original_fingerprint: fingerprint(ORIGINAL),
                    new_fingerprint: fingerprint(REDACTED),
                },
            )
            .await
            .unwrap();
        (memory, client)
    }

    #[tokio::test]
    async fn test_verify_against_record() {
        let (_memory, client) = ledger_with_record().await;
        let verifier = IntegrityVerifier::with_ledger(client);

        let outcome = verifier
            .verify_against_record(0, FingerprintField::Redacted, REDACTED.as_bytes())
            .await
            .unwrap();
        assert!(outcome.is_match());

        let outcome = verifier
            .verify_against_record(0, FingerprintField::Original, ORIGINAL.as_bytes())
            .await
            .unwrap();
        assert!(outcome.is_match());

        let outcome = verifier
            .verify_against_record(0, FingerprintField::Redacted, ORIGINAL.as_bytes())
            .await
            .unwrap();
        assert_eq!(outcome.status, VerificationStatus::Tampered);
    }

    #[tokio::test]
    async fn test_ledger_failure_is_error_not_tampered() {
        let (memory, client) = ledger_with_record().await;
        let verifier = IntegrityVerifier::with_ledger(client);

        assert!(verifier
            .verify_against_record(9, FingerprintField::Redacted, REDACTED.as_bytes())
            .await
            .is_err());

        memory.set_fault(FaultMode::Unreachable);
        assert!(verifier
            .verify_against_record(0, FingerprintField::Redacted, REDACTED.as_bytes())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_record_check_without_ledger() {
        let verifier = IntegrityVerifier::new();
        assert!(verifier
            .verify_against_record(0, FingerprintField::Redacted, b"x")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_verify_all_report() {
        let (_memory, client) = ledger_with_record().await;
        let verifier = IntegrityVerifier::with_ledger(client);

        let report = verifier
            .verify_all(vec![
                VerificationCheck {
                    document: "a.txt".to_string(),
                    expected: ExpectedFingerprint::Record {
                        sequence_id: 0,
                        field: FingerprintField::Redacted,
                    },
                    candidate: REDACTED.as_bytes().to_vec(),
                },
                VerificationCheck {
                    document: "b.txt".to_string(),
                    expected: ExpectedFingerprint::Literal(fingerprint(ORIGINAL).to_string()),
                    candidate: b"tampered".to_vec(),
                },
                VerificationCheck {
                    document: "c.txt".to_string(),
                    expected: ExpectedFingerprint::Record {
                        sequence_id: 42,
                        field: FingerprintField::Original,
                    },
                    candidate: b"whatever".to_vec(),
                },
            ])
            .await;

        assert_eq!(report.total_verified, 3);
        assert_eq!(report.matched, 1);
        assert_eq!(report.tampered, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failures[0].document, "b.txt");
        assert_eq!(report.skipped_documents[0].document, "c.txt");
        assert!(!report.is_success());
    }

    #[tokio::test]
    async fn test_verify_all_keeps_input_order_beyond_concurrency() {
        let checks: Vec<VerificationCheck> = (0..VERIFY_CONCURRENCY * 2 + 1)
            .map(|i| VerificationCheck {
                document: format!("note-{i}.txt"),
                expected: ExpectedFingerprint::Literal(fingerprint(ORIGINAL).to_string()),
                candidate: if i % 2 == 0 {
                    format!("altered {i}").into_bytes()
                } else {
                    ORIGINAL.as_bytes().to_vec()
                },
            })
            .collect();

        let report = IntegrityVerifier::new().verify_all(checks).await;

        assert_eq!(report.tampered, VERIFY_CONCURRENCY + 1);
        assert_eq!(report.matched, VERIFY_CONCURRENCY);
        let order: Vec<&str> = report.failures.iter().map(|f| f.document.as_str()).collect();
        let expected: Vec<String> = (0..VERIFY_CONCURRENCY * 2 + 1)
            .step_by(2)
            .map(|i| format!("note-{i}.txt"))
            .collect();
        assert_eq!(order, expected);
    }
}
