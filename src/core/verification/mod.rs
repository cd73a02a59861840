//! Content fingerprinting and integrity verification
//!
//! [`fingerprint`] is used on both sides of the audit trail: the pipeline
//! fingerprints documents before they are committed, and the verifier
//! recomputes fingerprints later to detect tampering.

pub mod fingerprint;
pub mod report;
pub mod verify;

pub use fingerprint::{fingerprint, fingerprint_bytes};
pub use report::{SkippedDocument, VerificationFailure, VerificationReport};
pub use verify::{
    verify, verify_bytes, ExpectedFingerprint, FingerprintField, IntegrityVerifier,
    VerificationCheck, VerificationOutcome, VerificationStatus,
};
