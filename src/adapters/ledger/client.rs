//! Ledger client shared by every pipeline run

use super::{AuditLedger, HttpLedger, LedgerResult, MemoryLedger};
use crate::config::{Environment, LedgerBackend, LedgerConfig};
use crate::domain::{AuditEntry, AuditRecord, CommitReceipt, DeidError, LedgerError, Principal, Result};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Concurrent reads when listing records
const READ_CONCURRENCY: usize = 4;

/// Result of a connectivity check
#[derive(Debug, Clone, Serialize)]
pub struct LedgerHealth {
    /// Backend name
    pub backend: String,
    /// Ledger location
    pub endpoint: String,
    /// Records currently committed
    pub record_count: u64,
    /// Round-trip time of the count query
    pub latency_ms: u64,
}

/// Client for committing and reading audit records
///
/// Commits from one operator are serialized: the operator's lock is held
/// from submission until confirmation, so records from the same operator are
/// appended in call order and never collide. Different operators commit in
/// parallel.
pub struct AuditLedgerClient {
    ledger: Arc<dyn AuditLedger>,
    confirmation_timeout: Duration,
    operator_locks: Mutex<HashMap<Principal, Arc<tokio::sync::Mutex<()>>>>,
}

impl AuditLedgerClient {
    /// Wrap a ledger
    pub fn new(ledger: Arc<dyn AuditLedger>, confirmation_timeout: Duration) -> Self {
        Self {
            ledger,
            confirmation_timeout,
            operator_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Build the configured ledger and wrap it
    pub fn from_config(config: &LedgerConfig, environment: Environment) -> Result<Self> {
        let ledger = create_ledger(config, environment)?;
        Ok(Self::new(
            ledger,
            Duration::from_secs(config.confirmation_timeout_seconds),
        ))
    }

    /// Backend name
    pub fn backend(&self) -> &'static str {
        self.ledger.name()
    }

    /// Ledger location
    pub fn endpoint(&self) -> String {
        self.ledger.endpoint()
    }

    fn locks(&self) -> MutexGuard<'_, HashMap<Principal, Arc<tokio::sync::Mutex<()>>>> {
        self.operator_locks.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn operator_lock(&self, operator: &Principal) -> Arc<tokio::sync::Mutex<()>> {
        Arc::clone(self.locks().entry(operator.clone()).or_default())
    }

    /// Forget the operator's lock once no other commit holds or waits on it
    fn release_operator_lock(&self, operator: &Principal, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.locks();
        drop(lock);
        if locks
            .get(operator)
            .is_some_and(|held| Arc::strong_count(held) == 1)
        {
            locks.remove(operator);
        }
    }

    /// Commit one audit entry and wait for confirmation
    ///
    /// Returns a receipt only for a confirmed record.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Connectivity`] if the ledger cannot be reached
    /// - [`LedgerError::SubmissionRejected`] if the ledger refuses or reverts it
    /// - [`LedgerError::ConfirmationTimeout`] if confirmation does not arrive in time
    pub async fn commit(
        &self,
        operator: &Principal,
        entry: &AuditEntry,
    ) -> LedgerResult<CommitReceipt> {
        let lock = self.operator_lock(operator);
        let result = {
            let _guard = lock.lock().await;
            self.submit_and_confirm(operator, entry).await
        };
        self.release_operator_lock(operator, lock);
        result
    }

    async fn submit_and_confirm(
        &self,
        operator: &Principal,
        entry: &AuditEntry,
    ) -> LedgerResult<CommitReceipt> {
        let pending = self.ledger.submit(operator, entry).await?;
        tracing::debug!(
            tx_reference = %pending.tx_reference,
            operator = %operator,
            "Audit entry submitted, awaiting confirmation"
        );

        let receipt = tokio::time::timeout(
            self.confirmation_timeout,
            self.ledger.wait_for_confirmation(&pending),
        )
        .await
        .map_err(|_| LedgerError::ConfirmationTimeout(self.confirmation_timeout))??;

        tracing::info!(
            tx_reference = %receipt.tx_reference,
            sequence_id = receipt.sequence_id,
            operator = %operator,
            original_fingerprint = %entry.original_fingerprint,
            new_fingerprint = %entry.new_fingerprint,
            "Audit record confirmed"
        );
        Ok(receipt)
    }

    #[cfg(test)]
    fn tracked_operators(&self) -> usize {
        self.locks().len()
    }

    /// Read a record by sequence id
    pub async fn read_record(&self, sequence_id: u64) -> LedgerResult<AuditRecord> {
        self.ledger.read_record(sequence_id).await
    }

    /// Number of committed records
    pub async fn record_count(&self) -> LedgerResult<u64> {
        self.ledger.record_count().await
    }

    /// Read up to `limit` records starting at `from`, in sequence order
    pub async fn read_range(&self, from: u64, limit: usize) -> LedgerResult<Vec<AuditRecord>> {
        let count = self.record_count().await?;
        let end = count.min(from.saturating_add(limit as u64));

        stream::iter(from..end)
            .map(|id| self.read_record(id))
            .buffered(READ_CONCURRENCY)
            .try_collect()
            .await
    }

    /// Check connectivity by counting records
    pub async fn health_check(&self) -> LedgerResult<LedgerHealth> {
        let started = Instant::now();
        let record_count = self.record_count().await?;
        let latency_ms = started.elapsed().as_millis() as u64;

        tracing::info!(
            backend = self.backend(),
            endpoint = %self.endpoint(),
            record_count,
            latency_ms,
            "Ledger reachable"
        );

        Ok(LedgerHealth {
            backend: self.backend().to_string(),
            endpoint: self.endpoint(),
            record_count,
            latency_ms,
        })
    }
}

/// Build the ledger selected in configuration
///
/// # Errors
///
/// Refuses the memory ledger in production, and fails when the HTTP client
/// cannot be built.
pub fn create_ledger(
    config: &LedgerConfig,
    environment: Environment,
) -> Result<Arc<dyn AuditLedger>> {
    match config.backend {
        LedgerBackend::Http => Ok(Arc::new(HttpLedger::new(config)?)),
        LedgerBackend::Memory => {
            if environment == Environment::Production {
                return Err(DeidError::Configuration(
                    "The memory ledger is not an external audit trail and cannot be used in production"
                        .to_string(),
                ));
            }
            tracing::warn!("Using in-memory ledger; audit records are lost on exit");
            Ok(Arc::new(MemoryLedger::new().with_confirmation_delay(
                Duration::from_millis(config.memory_confirmation_delay_ms),
            )))
        }
    }
}
