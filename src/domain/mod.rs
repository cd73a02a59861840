//! Domain models and types for deid-ledger.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identity** ([`Identity`], [`Principal`], [`Role`])
//! - **Fingerprints** ([`ContentFingerprint`])
//! - **Audit records** ([`AuditRecord`], [`AuditEntry`], [`CommitReceipt`])
//! - **Error types** ([`DeidError`], [`DetectionError`], [`RedactionError`], [`LedgerError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations that cross component boundaries return [`Result<T>`]:
//!
//! ```rust
//! use deid_ledger::domain::{DeidError, Identity, Result};
//!
//! fn operator() -> Result<Identity> {
//!     Identity::parse("dr_strange", "medical_professional").map_err(DeidError::Validation)
//! }
//! ```

pub mod audit;
pub mod errors;
pub mod fingerprint;
pub mod identity;
pub mod result;

// Re-export commonly used types for convenience
pub use audit::{AuditEntry, AuditRecord, CommitReceipt, DEIDENTIFY_ACTION};
pub use errors::{DeidError, DetectionError, LedgerError, RedactionError};
pub use fingerprint::ContentFingerprint;
pub use identity::{Identity, Principal, Role};
pub use result::Result;
