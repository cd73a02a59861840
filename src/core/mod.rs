//! Core integrity logic for deid-ledger.
//!
//! # Modules
//!
//! - [`verification`] - Content fingerprints and tamper detection
//!
//! # Verification Workflow
//!
//! 1. **Fingerprint**: the pipeline hashes the raw and redacted text
//! 2. **Commit**: both fingerprints are anchored in the ledger
//! 3. **Verify** (any time later): recompute the fingerprint of a document and
//!    compare it with the committed one
//!
//! # Example
//!
//! ```rust
//! use deid_ledger::core::verification::{fingerprint, IntegrityVerifier, VerificationStatus};
//!
//! let committed = fingerprint("Patient [PERSON] was admitted on [DATE].");
//! let verifier = IntegrityVerifier::new();
//!
//! let outcome = verifier.verify(committed.as_str(), "Patient [PERSON] was admitted on [DATE].");
//! assert_eq!(outcome.status, VerificationStatus::Match);
//! ```

pub mod verification;
