//! Verification report structures
//!
//! This module defines the structures for reporting verification results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Verification report aggregating many document checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    /// When the verification was performed
    pub verified_at: DateTime<Utc>,

    /// Total number of documents checked
    pub total_verified: usize,

    /// Documents whose fingerprint matched
    pub matched: usize,

    /// Documents whose fingerprint did not match
    pub tampered: usize,

    /// Documents that could not be checked (e.g., ledger read failure)
    pub skipped: usize,

    /// Tampered documents with details
    pub failures: Vec<VerificationFailure>,

    /// Documents that could not be checked, with the reason
    pub skipped_documents: Vec<SkippedDocument>,

    /// Duration of verification in milliseconds
    pub duration_ms: u64,
}

/// Details of a tampered document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationFailure {
    /// Document name
    pub document: String,

    /// Expected fingerprint (from the caller or the ledger)
    pub expected_fingerprint: String,

    /// Actual fingerprint (recalculated)
    pub actual_fingerprint: String,

    /// Reason for failure
    pub reason: String,
}

/// A document that could not be checked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedDocument {
    /// Document name
    pub document: String,
    /// Why it was skipped
    pub reason: String,
}

impl VerificationReport {
    /// Create a new verification report
    pub fn new() -> Self {
        Self {
            verified_at: Utc::now(),
            total_verified: 0,
            matched: 0,
            tampered: 0,
            skipped: 0,
            failures: Vec::new(),
            skipped_documents: Vec::new(),
            duration_ms: 0,
        }
    }

    /// Record a matching document
    pub fn record_match(&mut self) {
        self.total_verified += 1;
        self.matched += 1;
    }

    /// Record a tampered document
    pub fn record_tampered(&mut self, failure: VerificationFailure) {
        self.total_verified += 1;
        self.tampered += 1;
        self.failures.push(failure);
    }

    /// Record a document that could not be checked
    pub fn record_skip(&mut self, document: String, reason: String) {
        self.total_verified += 1;
        self.skipped += 1;
        self.skipped_documents.push(SkippedDocument { document, reason });
    }

    /// Set the duration of verification
    pub fn set_duration(&mut self, duration_ms: u64) {
        self.duration_ms = duration_ms;
    }

    /// True when every document was checked and matched
    pub fn is_success(&self) -> bool {
        self.tampered == 0 && self.skipped == 0
    }

    /// Whether any document was tampered
    pub fn has_tampered(&self) -> bool {
        self.tampered > 0
    }

    /// Get the match rate as a percentage
    pub fn match_rate(&self) -> f64 {
        if self.total_verified == 0 {
            return 100.0;
        }
        (self.matched as f64 / self.total_verified as f64) * 100.0
    }

    /// Format the report as a human-readable string
    pub fn format_summary(&self) -> String {
        let mut summary = String::new();
        summary.push_str("📊 Verification Report\n");
        summary.push_str(&format!("  Verified at: {}\n", self.verified_at));
        summary.push_str(&format!("  Duration: {} ms\n", self.duration_ms));
        summary.push_str(&format!("  Total verified: {}\n", self.total_verified));
        summary.push_str(&format!("  ✅ Matched: {}\n", self.matched));
        summary.push_str(&format!("  ❌ Tampered: {}\n", self.tampered));
        summary.push_str(&format!("  ⏭️  Skipped: {}\n", self.skipped));
        summary.push_str(&format!("  Match rate: {:.2}%\n", self.match_rate()));

        if !self.failures.is_empty() {
            summary.push_str("\n❌ Tampered documents:\n");
            for (i, failure) in self.failures.iter().enumerate() {
                summary.push_str(&format!("  {}. {}\n", i + 1, failure.document));
                summary.push_str(&format!("     Expected: {}\n", failure.expected_fingerprint));
                summary.push_str(&format!("     Actual:   {}\n", failure.actual_fingerprint));
            }
        }

        if !self.skipped_documents.is_empty() {
            summary.push_str("\n⏭️  Skipped documents:\n");
            for skipped in &self.skipped_documents {
                summary.push_str(&format!("  - {}: {}\n", skipped.document, skipped.reason));
            }
        }

        summary
    }
}

impl Default for VerificationReport {
    fn default() -> Self {
        Self::new()
    }
}
