//! Local audit journal
//!
//! One JSON line per pipeline run. Entries carry fingerprints, counts and the
//! audit outcome; they never carry note text or the content of any span.

use crate::deidentification::models::EntityCategory;
use crate::deidentification::pipeline::{AuditStatus, PipelineResult};
use crate::domain::ContentFingerprint;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

/// Journal line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// When the run finished
    pub timestamp: DateTime<Utc>,
    /// Pipeline request id
    pub request_id: Uuid,
    /// Committing principal
    pub operator: String,
    /// Action tag
    pub action: String,
    /// Purpose recorded with the event
    pub purpose: String,
    /// Fingerprint of the raw document
    pub original_fingerprint: ContentFingerprint,
    /// Fingerprint of the redacted document
    pub new_fingerprint: ContentFingerprint,
    /// Applied spans per category
    pub entities_by_category: BTreeMap<EntityCategory, usize>,
    /// Ledger outcome
    pub audit_status: AuditStatus,
}

impl From<&PipelineResult> for JournalEntry {
    fn from(result: &PipelineResult) -> Self {
        Self {
            timestamp: Utc::now(),
            request_id: result.request_id,
            operator: result.operator.to_string(),
            action: result.action.clone(),
            purpose: result.purpose.clone(),
            original_fingerprint: result.original_fingerprint.clone(),
            new_fingerprint: result.new_fingerprint.clone(),
            entities_by_category: result.entities_by_category.clone(),
            audit_status: result.audit_status.clone(),
        }
    }
}

/// Append-only JSON-lines journal
pub struct AuditJournal {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl AuditJournal {
    /// Open a journal, creating its parent directory
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create audit journal directory: {}", parent.display())
            })?;
        }

        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Journal file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append the outcome of one run
    pub fn record(&self, result: &PipelineResult) -> Result<()> {
        self.write_entry(&JournalEntry::from(result))
    }

    fn write_entry(&self, entry: &JournalEntry) -> Result<()> {
        let line = serde_json::to_string(entry).context("Failed to serialize journal entry")?;

        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open audit journal: {}", self.path.display()))?;
        writeln!(file, "{line}").context("Failed to write journal entry")?;

        Ok(())
    }

    /// Read every entry back
    pub fn read_entries(&self) -> Result<Vec<JournalEntry>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read audit journal: {}", self.path.display())
                })
            }
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(i, line)| {
                serde_json::from_str(line)
                    .with_context(|| format!("Invalid journal entry on line {}", i + 1))
            })
            .collect()
    }
}
