//! Deidentify command implementation
//!
//! Runs one note (or a JSON-lines batch of notes) through the pipeline and
//! prints the response as JSON.

use super::{
    exit_code_for, load_or_report, EXIT_AUDIT_FAILED, EXIT_CONFIG, EXIT_INTERRUPTED,
    EXIT_REFUSED, EXIT_SUCCESS,
};
use crate::deidentification::{
    DeidentificationPipeline, DocumentRequest, PipelineResult, ProcessingStatus,
};
use crate::domain::{Identity, Result as DeidResult};
use anyhow::Context;
use clap::Args;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::sync::watch;

/// Arguments for the deidentify command
#[derive(Args, Debug)]
pub struct DeidentifyArgs {
    /// Note text (reads stdin when neither --text, --file nor --batch is given)
    #[arg(long, conflicts_with_all = ["file", "batch"])]
    pub text: Option<String>,

    /// Read the note from a file
    #[arg(long, conflicts_with = "batch")]
    pub file: Option<PathBuf>,

    /// JSON-lines file of {"text": ..., "purpose": ...} documents
    #[arg(long)]
    pub batch: Option<PathBuf>,

    /// Purpose recorded with the audit event
    #[arg(long, default_value = "")]
    pub purpose: String,

    /// Operator principal committing the record
    #[arg(long, env = "DEID_OPERATOR")]
    pub operator: String,

    /// Operator role
    #[arg(long, env = "DEID_ROLE", default_value = "medical_professional")]
    pub role: String,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl DeidentifyArgs {
    /// Execute the deidentify command
    pub async fn execute(
        &self,
        config_path: &str,
        mut shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        let config = match load_or_report(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        let identity = match Identity::parse(&self.operator, &self.role) {
            Ok(identity) => identity,
            Err(e) => {
                eprintln!("❌ Invalid operator identity: {e}");
                return Ok(EXIT_REFUSED);
            }
        };

        let pipeline = match DeidentificationPipeline::from_config(&config) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("❌ Failed to initialize pipeline");
                eprintln!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        tracing::info!(
            operator = %identity.principal,
            detector = ?config.detector.backend,
            ledger = pipeline.ledger().backend(),
            "Starting de-identification"
        );

        let documents = self.documents().await?;
        let run = pipeline.process_batch(&documents, &identity);

        let results = tokio::select! {
            results = run => results,
            Ok(()) = shutdown_signal.changed() => {
                eprintln!("⚠️  Interrupted; waiting for in-flight audit commits to finish");
                let grace = Duration::from_secs(config.ledger.confirmation_timeout_seconds);
                if !pipeline.drain_commits(grace).await {
                    eprintln!("⚠️  Some audit commits were still unconfirmed at exit");
                }
                return Ok(EXIT_INTERRUPTED);
            }
        };

        for result in &results {
            self.print(result)?;
        }

        Ok(batch_exit_code(&results))
    }

    async fn documents(&self) -> anyhow::Result<Vec<DocumentRequest>> {
        if let Some(ref path) = self.batch {
            return read_batch(path).await;
        }

        let text = match (&self.text, &self.file) {
            (Some(text), _) => text.clone(),
            (None, Some(path)) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read note from {}", path.display()))?,
            (None, None) => {
                let mut buf = String::new();
                tokio::io::stdin()
                    .read_to_string(&mut buf)
                    .await
                    .context("Failed to read note from stdin")?;
                buf
            }
        };

        Ok(vec![DocumentRequest {
            text,
            purpose: self.purpose.clone(),
        }])
    }

    fn print(&self, result: &DeidResult<PipelineResult>) -> anyhow::Result<()> {
        match result {
            Ok(result) => {
                let json = if self.pretty {
                    serde_json::to_string_pretty(result)?
                } else {
                    serde_json::to_string(result)?
                };
                println!("{json}");
            }
            Err(e) => eprintln!("❌ {e}"),
        }
        Ok(())
    }
}

async fn read_batch(path: &Path) -> anyhow::Result<Vec<DocumentRequest>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read batch file {}", path.display()))?;

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| {
                format!("Invalid document on line {} of {}", i + 1, path.display())
            })
        })
        .collect()
}

/// Worst outcome across the batch wins
fn batch_exit_code(results: &[DeidResult<PipelineResult>]) -> i32 {
    results
        .iter()
        .map(|result| match result {
            Ok(r) if r.status == ProcessingStatus::Success => EXIT_SUCCESS,
            Ok(_) => EXIT_AUDIT_FAILED,
            Err(e) => exit_code_for(e),
        })
        .fold(EXIT_SUCCESS, |worst, code| {
            if severity(code) > severity(worst) {
                code
            } else {
                worst
            }
        })
}

fn severity(code: i32) -> u8 {
    match code {
        EXIT_SUCCESS => 0,
        EXIT_AUDIT_FAILED => 1,
        EXIT_REFUSED => 2,
        _ => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DeidError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_read_batch_skips_blank_lines() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"text": "Patient John Smith", "purpose": "Research"}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"text": "Seen by Dr. Jane Doe"}}"#).unwrap();

        let docs = read_batch(file.path()).await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].purpose, "Research");
        assert_eq!(docs[1].purpose, "");
    }

    #[tokio::test]
    async fn test_read_batch_reports_line() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();

        let err = read_batch(file.path()).await.unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_batch_exit_code_prefers_refusal_over_audit_failure() {
        let results: Vec<DeidResult<PipelineResult>> =
            vec![Err(DeidError::Unauthorized("nurse".to_string()))];
        assert_eq!(batch_exit_code(&results), EXIT_REFUSED);
        assert_eq!(batch_exit_code(&[]), EXIT_SUCCESS);
    }
}
