//! Verify command implementation
//!
//! Checks one or more files against a literal fingerprint or a fingerprint
//! stored in a committed ledger record.

use super::{ledger_or_report, load_or_report, EXIT_LEDGER, EXIT_SUCCESS, EXIT_TAMPERED};
use crate::core::verification::{
    ExpectedFingerprint, FingerprintField, IntegrityVerifier, VerificationCheck,
    VerificationReport,
};
use anyhow::Context;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments for the verify command
#[derive(Args, Debug)]
#[command(group = clap::ArgGroup::new("expectation").required(true).args(["expected", "record"]))]
pub struct VerifyArgs {
    /// Expected SHA-256 fingerprint (64 hex characters)
    #[arg(long)]
    pub expected: Option<String>,

    /// Sequence id of the committed record to check against
    #[arg(long)]
    pub record: Option<u64>,

    /// Which fingerprint of the record to compare
    #[arg(long, default_value = "original", requires = "record")]
    pub against: FingerprintField,

    /// Files to verify
    #[arg(long = "file", required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl VerifyArgs {
    /// Execute the verify command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(files = self.files.len(), "Verifying documents");

        let verifier = match self.record {
            Some(_) => {
                let config = match load_or_report(config_path) {
                    Ok(c) => c,
                    Err(code) => return Ok(code),
                };
                match ledger_or_report(&config) {
                    Ok(ledger) => IntegrityVerifier::with_ledger(Arc::new(ledger)),
                    Err(code) => return Ok(code),
                }
            }
            None => IntegrityVerifier::new(),
        };

        let checks = self.checks().await?;
        let report = verifier.verify_all(checks).await;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("{}", report.format_summary());
        }

        Ok(exit_code(&report))
    }

    fn expectation(&self) -> ExpectedFingerprint {
        match (self.record, &self.expected) {
            (Some(sequence_id), _) => ExpectedFingerprint::Record {
                sequence_id,
                field: self.against,
            },
            (None, Some(expected)) => ExpectedFingerprint::Literal(expected.clone()),
            (None, None) => ExpectedFingerprint::Literal(String::new()),
        }
    }

    async fn checks(&self) -> anyhow::Result<Vec<VerificationCheck>> {
        let mut checks = Vec::with_capacity(self.files.len());
        for path in &self.files {
            let candidate = tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            checks.push(VerificationCheck {
                document: path.display().to_string(),
                expected: self.expectation(),
                candidate,
            });
        }
        Ok(checks)
    }
}

/// Tampering outranks ledger errors
fn exit_code(report: &VerificationReport) -> i32 {
    if report.has_tampered() {
        EXIT_TAMPERED
    } else if report.skipped > 0 {
        EXIT_LEDGER
    } else {
        EXIT_SUCCESS
    }
}
