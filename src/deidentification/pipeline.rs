//! De-identification pipeline
//!
//! One request flows authorize → detect → redact → fingerprint → commit.
//! Every step before the commit is a hard dependency: if any of them fails the
//! request fails and nothing is returned. A failed commit does not undo the
//! redaction; it is reported in [`PipelineResult::audit_status`].

use crate::adapters::ledger::AuditLedgerClient;
use crate::config::AppConfig;
use crate::core::verification::fingerprint;
use crate::deidentification::detector::{create_detector, EntitySpanDetector};
use crate::deidentification::journal::AuditJournal;
use crate::deidentification::models::{EntityCategory, EntitySpan};
use crate::deidentification::redactor::Redactor;
use crate::domain::{
    AuditEntry, CommitReceipt, ContentFingerprint, DeidError, Identity, LedgerError, Principal,
    Result, DEIDENTIFY_ACTION,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{oneshot, watch};
use tracing::Instrument;
use uuid::Uuid;

/// Purpose recorded when the request supplies none
pub const DEFAULT_PURPOSE: &str = "General Use";

/// Overall request status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    /// Redacted and committed
    Success,
    /// Redacted, but no audit record was committed
    AuditFailed,
}

/// Why a commit failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditFailureKind {
    /// Ledger could not be reached
    LedgerConnectivityFailure,
    /// Ledger refused or reverted the record
    LedgerSubmissionRejected,
    /// Record was submitted but not confirmed in time
    LedgerConfirmationTimeout,
    /// Ledger answered with something unreadable
    LedgerInvalidResponse,
    /// The commit task ended without reporting a result
    CommitAborted,
}

impl From<&LedgerError> for AuditFailureKind {
    fn from(err: &LedgerError) -> Self {
        match err {
            LedgerError::Connectivity(_) => Self::LedgerConnectivityFailure,
            LedgerError::SubmissionRejected(_) => Self::LedgerSubmissionRejected,
            LedgerError::ConfirmationTimeout(_) => Self::LedgerConfirmationTimeout,
            LedgerError::NotFound(_) | LedgerError::InvalidResponse(_) => {
                Self::LedgerInvalidResponse
            }
        }
    }
}

/// Ledger outcome of one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    /// The record is confirmed in the ledger
    Committed {
        /// Ledger transaction reference
        tx_reference: String,
        /// Sequence id of the record
        sequence_id: u64,
        /// Confirmation time
        confirmed_at: DateTime<Utc>,
    },
    /// No record was committed
    Failed {
        /// Failure class
        kind: AuditFailureKind,
        /// Human-readable reason, never empty
        reason: String,
    },
}

impl AuditStatus {
    /// Whether a record was committed
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }

    fn from_outcome(outcome: std::result::Result<CommitReceipt, LedgerError>) -> Self {
        match outcome {
            Ok(receipt) => Self::Committed {
                tx_reference: receipt.tx_reference,
                sequence_id: receipt.sequence_id,
                confirmed_at: receipt.confirmed_at,
            },
            Err(e) => Self::Failed {
                kind: AuditFailureKind::from(&e),
                reason: e.to_string(),
            },
        }
    }
}

/// Response for one de-identification request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Overall status
    pub status: ProcessingStatus,
    /// Request id, also present in logs and the journal
    pub request_id: Uuid,
    /// Committing principal
    pub operator: Principal,
    /// Action tag recorded with the event
    pub action: String,
    /// Purpose recorded with the event
    pub purpose: String,
    /// Redacted text
    pub redacted_text: String,
    /// Fingerprint of the raw text
    pub original_fingerprint: ContentFingerprint,
    /// Fingerprint of the redacted text
    pub new_fingerprint: ContentFingerprint,
    /// Spans substituted, ascending by start offset
    pub applied_spans: Vec<EntitySpan>,
    /// Applied spans per category
    pub entities_by_category: BTreeMap<EntityCategory, usize>,
    /// Ledger outcome
    pub audit_status: AuditStatus,
}

/// One document in a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRequest {
    /// Raw note text
    pub text: String,
    /// Purpose; the default purpose is used when empty
    #[serde(default)]
    pub purpose: String,
}

/// De-identification pipeline
///
/// Shared across requests; all state lives in the injected collaborators.
pub struct DeidentificationPipeline {
    detector: Arc<dyn EntitySpanDetector>,
    redactor: Redactor,
    ledger: Arc<AuditLedgerClient>,
    allowed_roles: Vec<String>,
    default_purpose: String,
    action: String,
    journal: Option<Arc<AuditJournal>>,
    in_flight: Arc<watch::Sender<usize>>,
}

/// Counts a spawned commit until its task finishes
struct InFlightCommit(Arc<watch::Sender<usize>>);

impl InFlightCommit {
    fn enter(counter: &Arc<watch::Sender<usize>>) -> Self {
        counter.send_modify(|n| *n += 1);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlightCommit {
    fn drop(&mut self) {
        self.0.send_modify(|n| *n = n.saturating_sub(1));
    }
}

impl DeidentificationPipeline {
    /// Create a pipeline with default roles, purpose and action
    pub fn new(
        detector: Arc<dyn EntitySpanDetector>,
        redactor: Redactor,
        ledger: Arc<AuditLedgerClient>,
    ) -> Self {
        Self {
            detector,
            redactor,
            ledger,
            allowed_roles: vec![crate::domain::Role::MEDICAL_PROFESSIONAL.to_string()],
            default_purpose: DEFAULT_PURPOSE.to_string(),
            action: DEIDENTIFY_ACTION.to_string(),
            journal: None,
            in_flight: Arc::new(watch::channel(0).0),
        }
    }

    /// Build every component from configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the detector, ledger or journal
    /// cannot be created.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let detector = create_detector(&config.detector)?;
        let redactor = Redactor::from_config(&config.redaction);
        let ledger = Arc::new(AuditLedgerClient::from_config(
            &config.ledger,
            config.application.environment,
        )?);

        let mut pipeline = Self::new(detector, redactor, ledger)
            .with_allowed_roles(config.authorization.allowed_roles.clone())
            .with_default_purpose(config.audit.default_purpose.clone())
            .with_action(config.audit.action.clone());

        if config.audit.journal_enabled {
            let journal = AuditJournal::new(&config.audit.journal_path)
                .map_err(|e| DeidError::Configuration(format!("{e:#}")))?;
            pipeline = pipeline.with_journal(Arc::new(journal));
        }

        Ok(pipeline)
    }

    /// Roles permitted to de-identify
    pub fn with_allowed_roles(mut self, roles: Vec<String>) -> Self {
        self.allowed_roles = roles;
        self
    }

    /// Purpose used when a request supplies none
    pub fn with_default_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.default_purpose = purpose.into();
        self
    }

    /// Action tag written to every record
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    /// Append every run to a local journal
    pub fn with_journal(mut self, journal: Arc<AuditJournal>) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Shared ledger client
    pub fn ledger(&self) -> &Arc<AuditLedgerClient> {
        &self.ledger
    }

    /// Commits still running on their own tasks
    pub fn commits_in_flight(&self) -> usize {
        *self.in_flight.borrow()
    }

    /// Wait until every spawned commit has finished
    ///
    /// Returns `false` if commits were still running when `timeout` expired.
    pub async fn drain_commits(&self, timeout: Duration) -> bool {
        let mut in_flight = self.in_flight.subscribe();
        let pending = *in_flight.borrow_and_update();
        if pending == 0 {
            return true;
        }

        tracing::info!(pending, "Waiting for in-flight audit commits");
        let drained = tokio::time::timeout(timeout, in_flight.wait_for(|n| *n == 0))
            .await
            .is_ok_and(|waited| waited.is_ok());
        if !drained {
            tracing::warn!(
                pending = self.commits_in_flight(),
                "Audit commits still in flight after {timeout:?}"
            );
        }
        drained
    }

    /// Check the role precondition
    ///
    /// # Errors
    ///
    /// Returns [`DeidError::Unauthorized`] if the role is not allowed.
    pub fn authorize(&self, identity: &Identity) -> Result<()> {
        if self.allowed_roles.iter().any(|r| identity.role.matches(r)) {
            return Ok(());
        }
        Err(DeidError::Unauthorized(format!(
            "role '{}' of {} may not de-identify documents",
            identity.role, identity.principal
        )))
    }

    /// De-identify one document and commit its audit record
    ///
    /// # Errors
    ///
    /// - [`DeidError::Unauthorized`] if the role check fails (nothing runs)
    /// - [`DeidError::Detection`] if the detector cannot run
    /// - [`DeidError::Redaction`] if the spans cannot be applied
    ///
    /// Ledger failures are not errors; they are reported in the result.
    pub async fn process(
        &self,
        raw_text: &str,
        purpose: &str,
        identity: &Identity,
    ) -> Result<PipelineResult> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "deidentify",
            request_id = %request_id,
            operator = %identity.principal
        );
        self.process_inner(request_id, raw_text, purpose, identity)
            .instrument(span)
            .await
    }

    async fn process_inner(
        &self,
        request_id: Uuid,
        raw_text: &str,
        purpose: &str,
        identity: &Identity,
    ) -> Result<PipelineResult> {
        let started = Instant::now();

        if let Err(e) = self.authorize(identity) {
            tracing::warn!(role = %identity.role, "De-identification refused");
            return Err(e);
        }

        let purpose = if purpose.trim().is_empty() {
            self.default_purpose.clone()
        } else {
            purpose.to_string()
        };

        let spans = self.detector.detect(raw_text).await.map_err(|e| {
            tracing::error!(detector = self.detector.name(), error = %e, "Entity detection failed");
            DeidError::from(e)
        })?;

        let redaction = self.redactor.redact(raw_text, &spans).map_err(|e| {
            tracing::error!(error = %e, "Redaction failed");
            DeidError::from(e)
        })?;

        let original_fingerprint = fingerprint(raw_text);
        let new_fingerprint = fingerprint(&redaction.redacted_text);
        let entities_by_category = redaction.counts_by_category();

        tracing::debug!(
            detected = spans.len(),
            applied = redaction.applied_spans.len(),
            original_fingerprint = %original_fingerprint,
            new_fingerprint = %new_fingerprint,
            "Document redacted"
        );

        let entry = AuditEntry {
            action: self.action.clone(),
            purpose: purpose.clone(),
            original_fingerprint: original_fingerprint.clone(),
            new_fingerprint: new_fingerprint.clone(),
        };
        let audit_status = self.commit(&identity.principal, entry).await;

        let status = if audit_status.is_committed() {
            ProcessingStatus::Success
        } else {
            ProcessingStatus::AuditFailed
        };

        let result = PipelineResult {
            status,
            request_id,
            operator: identity.principal.clone(),
            action: self.action.clone(),
            purpose,
            redacted_text: redaction.redacted_text,
            original_fingerprint,
            new_fingerprint,
            applied_spans: redaction.applied_spans,
            entities_by_category,
            audit_status,
        };

        if let Some(ref journal) = self.journal {
            if let Err(e) = journal.record(&result) {
                tracing::error!(
                    path = %journal.path().display(),
                    error = %format!("{e:#}"),
                    "Failed to write audit journal entry"
                );
            }
        }

        tracing::info!(
            status = ?result.status,
            applied = result.applied_spans.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "De-identification request completed"
        );

        Ok(result)
    }

    /// Run the commit on its own task so a dropped caller cannot cancel a
    /// ledger write halfway
    async fn commit(&self, operator: &Principal, entry: AuditEntry) -> AuditStatus {
        let (tx, rx) = oneshot::channel();
        let ledger = Arc::clone(&self.ledger);
        let operator = operator.clone();
        let tracked = InFlightCommit::enter(&self.in_flight);

        tokio::spawn(
            async move {
                let _tracked = tracked;
                let outcome = ledger.commit(&operator, &entry).await;
                if let Err(unclaimed) = tx.send(outcome) {
                    match unclaimed {
                        Ok(receipt) => tracing::warn!(
                            tx_reference = %receipt.tx_reference,
                            sequence_id = receipt.sequence_id,
                            "Orphaned commit: record confirmed after the caller went away"
                        ),
                        Err(e) => tracing::warn!(
                            error = %e,
                            "Orphaned commit: commit failed after the caller went away"
                        ),
                    }
                }
            }
            .in_current_span(),
        );

        let status = match rx.await {
            Ok(outcome) => AuditStatus::from_outcome(outcome),
            Err(_) => AuditStatus::Failed {
                kind: AuditFailureKind::CommitAborted,
                reason: "commit task ended without a result".to_string(),
            },
        };

        if let AuditStatus::Failed { kind, ref reason } = status {
            crate::log_audit_failure!(kind, reason);
        }
        status
    }

    /// De-identify many documents concurrently
    ///
    /// Returns one result per document, in input order.
    pub async fn process_batch(
        &self,
        documents: &[DocumentRequest],
        identity: &Identity,
    ) -> Vec<Result<PipelineResult>> {
        let futures = documents
            .iter()
            .map(|doc| self.process(&doc.text, &doc.purpose, identity));
        futures::future::join_all(futures).await
    }
}
