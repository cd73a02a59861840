//! Audit record types
//!
//! [`AuditRecord`] is owned by the external ledger: the service only appends
//! and reads, it never rewrites. [`CommitReceipt`] is what the ledger client
//! hands back once a record is confirmed.

use super::fingerprint::ContentFingerprint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Action tag recorded for de-identification events
pub const DEIDENTIFY_ACTION: &str = "DE-IDENTIFY";

/// One committed audit entry as read back from the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Ledger-assigned, monotonically increasing index
    pub sequence_id: u64,

    /// Ledger-assigned inclusion time
    pub timestamp: DateTime<Utc>,

    /// Principal that committed the record, as reported by the ledger
    pub operator_identity: String,

    /// Action tag (e.g. `DE-IDENTIFY`)
    pub action: String,

    /// Free-text justification
    pub purpose: String,

    /// Fingerprint of the raw document
    pub original_fingerprint: ContentFingerprint,

    /// Fingerprint of the redacted document
    pub new_fingerprint: ContentFingerprint,
}

/// The four fields the service writes for every event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Action tag
    pub action: String,
    /// Free-text justification
    pub purpose: String,
    /// Fingerprint of the raw document
    pub original_fingerprint: ContentFingerprint,
    /// Fingerprint of the redacted document
    pub new_fingerprint: ContentFingerprint,
}

/// Proof that an [`AuditEntry`] was included in the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReceipt {
    /// Ledger transaction reference
    pub tx_reference: String,
    /// Sequence id assigned to the record
    pub sequence_id: u64,
    /// Inclusion time reported by the ledger
    pub confirmed_at: DateTime<Utc>,
}
