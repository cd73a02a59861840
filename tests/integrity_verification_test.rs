//! Integration tests for integrity verification against committed records

use deid_ledger::adapters::ledger::{AuditLedgerClient, FaultMode, MemoryLedger};
use deid_ledger::core::verification::{
    fingerprint, verify_bytes, ExpectedFingerprint, FingerprintField, IntegrityVerifier,
    VerificationCheck, VerificationStatus,
};
use deid_ledger::config::OverlapPolicy;
use deid_ledger::deidentification::{
    DeidentificationPipeline, EntityCategory, Redactor, RegexDetector,
};
use deid_ledger::domain::{DeidError, Identity, LedgerError};
use std::sync::Arc;
use std::time::Duration;

const NOTE: &str = "Patient John Smith was admitted on October 8, 2025.";

async fn committed_ledger() -> (Arc<MemoryLedger>, Arc<AuditLedgerClient>, String) {
    let memory = Arc::new(MemoryLedger::new());
    let client = Arc::new(AuditLedgerClient::new(memory.clone(), Duration::from_secs(5)));
    let pipeline = DeidentificationPipeline::new(
        Arc::new(RegexDetector::new().unwrap()),
        Redactor::new(EntityCategory::default_allow_list(), OverlapPolicy::Merge),
        Arc::clone(&client),
    );
    let identity = Identity::parse("dr_strange", "medical_professional").unwrap();
    let result = pipeline.process(NOTE, "Research", &identity).await.unwrap();
    (memory, client, result.redacted_text)
}

#[test]
fn test_literal_verification_is_byte_exact() {
    let redacted = "Patient [PERSON] was admitted on [DATE].";
    let expected = fingerprint(redacted);

    assert!(verify_bytes(expected.as_str(), redacted.as_bytes()).is_match());

    let trailing_newline = format!("{redacted}\n");
    let outcome = verify_bytes(expected.as_str(), trailing_newline.as_bytes());
    assert_eq!(outcome.status, VerificationStatus::Tampered);
}

#[tokio::test]
async fn test_verify_against_both_record_fields() {
    let (_memory, client, redacted) = committed_ledger().await;
    let verifier = IntegrityVerifier::with_ledger(client);

    let original = verifier
        .verify_against_record(0, FingerprintField::Original, NOTE.as_bytes())
        .await
        .unwrap();
    assert!(original.is_match());

    let redacted_outcome = verifier
        .verify_against_record(0, FingerprintField::Redacted, redacted.as_bytes())
        .await
        .unwrap();
    assert!(redacted_outcome.is_match());

    let swapped = verifier
        .verify_against_record(0, FingerprintField::Original, redacted.as_bytes())
        .await
        .unwrap();
    assert_eq!(swapped.status, VerificationStatus::Tampered);
}

#[tokio::test]
async fn test_missing_record_is_an_error_not_a_mismatch() {
    let (_memory, client, _) = committed_ledger().await;
    let verifier = IntegrityVerifier::with_ledger(client);

    let err = verifier
        .verify_against_record(42, FingerprintField::Original, NOTE.as_bytes())
        .await
        .unwrap_err();
    assert!(matches!(err, DeidError::Ledger(LedgerError::NotFound(42))));
}

#[tokio::test]
async fn test_verify_all_aggregates_report() {
    let (memory, client, redacted) = committed_ledger().await;
    let verifier = IntegrityVerifier::with_ledger(client);

    let checks = vec![
        VerificationCheck {
            document: "redacted.txt".to_string(),
            expected: ExpectedFingerprint::Record {
                sequence_id: 0,
                field: FingerprintField::Redacted,
            },
            candidate: redacted.clone().into_bytes(),
        },
        VerificationCheck {
            document: "edited.txt".to_string(),
            expected: ExpectedFingerprint::Record {
                sequence_id: 0,
                field: FingerprintField::Redacted,
            },
            candidate: redacted.replace("[DATE]", "[PERSON]").into_bytes(),
        },
        VerificationCheck {
            document: "literal.txt".to_string(),
            expected: ExpectedFingerprint::Literal(fingerprint(NOTE).to_string()),
            candidate: NOTE.as_bytes().to_vec(),
        },
    ];

    let report = verifier.verify_all(checks).await;
    assert_eq!(report.total_verified, 3);
    assert_eq!(report.matched, 2);
    assert_eq!(report.tampered, 1);
    assert_eq!(report.failures[0].document, "edited.txt");
    assert!(report.has_tampered());

    memory.set_fault(FaultMode::Unreachable);
    let outage = verifier
        .verify_all(vec![VerificationCheck {
            document: "redacted.txt".to_string(),
            expected: ExpectedFingerprint::Record {
                sequence_id: 0,
                field: FingerprintField::Redacted,
            },
            candidate: redacted.into_bytes(),
        }])
        .await;
    assert_eq!(outage.skipped, 1);
    assert!(!outage.has_tampered());
}
