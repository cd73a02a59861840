//! In-process append-only ledger
//!
//! Behaves like an external ledger from the caller's point of view: records
//! become visible only when confirmed, an operator can have only one
//! submission in flight (a second one collides, like a reused nonce), and
//! confirmed records are never changed. Inclusion happens on its own task
//! after the confirmation delay, whether or not anyone is still waiting for
//! it. Faults can be injected for tests.

use super::{AuditLedger, LedgerResult, PendingTransaction};
use crate::domain::{AuditEntry, AuditRecord, CommitReceipt, LedgerError, Principal};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use uuid::Uuid;

/// Injected failure behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaultMode {
    /// Normal operation
    #[default]
    None,
    /// Every operation fails with a connectivity error
    Unreachable,
    /// Submissions are refused
    RejectAll,
    /// Submissions are accepted but never confirmed
    Stall,
}

#[derive(Debug)]
struct PendingEntry {
    operator: Principal,
    entry: AuditEntry,
}

#[derive(Debug, Default)]
struct LedgerState {
    records: Vec<AuditRecord>,
    pending: HashMap<String, PendingEntry>,
    receipts: HashMap<String, CommitReceipt>,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<LedgerState>,
    fault: Mutex<FaultMode>,
    /// Bumped after every inclusion
    included: watch::Sender<u64>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Move a pending entry into the record list
    fn include(&self, tx_reference: &str) {
        {
            let mut state = self.state();
            let Some(submitted) = state.pending.remove(tx_reference) else {
                return;
            };

            let sequence_id = state.records.len() as u64;
            let confirmed_at = Utc::now();
            state.records.push(AuditRecord {
                sequence_id,
                timestamp: confirmed_at,
                operator_identity: submitted.operator.to_string(),
                action: submitted.entry.action,
                purpose: submitted.entry.purpose,
                original_fingerprint: submitted.entry.original_fingerprint,
                new_fingerprint: submitted.entry.new_fingerprint,
            });
            state.receipts.insert(
                tx_reference.to_string(),
                CommitReceipt {
                    tx_reference: tx_reference.to_string(),
                    sequence_id,
                    confirmed_at,
                },
            );
        }
        self.included.send_modify(|n| *n += 1);
    }
}

/// In-memory ledger for development and tests
#[derive(Debug)]
pub struct MemoryLedger {
    shared: Arc<Shared>,
    confirmation_delay: Duration,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        let (included, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(LedgerState::default()),
                fault: Mutex::new(FaultMode::None),
                included,
            }),
            confirmation_delay: Duration::ZERO,
        }
    }
}

impl MemoryLedger {
    /// Create an empty ledger that confirms immediately
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate inclusion latency
    pub fn with_confirmation_delay(mut self, delay: Duration) -> Self {
        self.confirmation_delay = delay;
        self
    }

    /// Change the injected fault
    pub fn set_fault(&self, fault: FaultMode) {
        *self.shared.fault.lock().unwrap_or_else(|p| p.into_inner()) = fault;
    }

    /// Snapshot of all confirmed records
    pub fn records(&self) -> Vec<AuditRecord> {
        self.shared.state().records.clone()
    }

    fn fault(&self) -> FaultMode {
        *self.shared.fault.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn check_reachable(&self) -> LedgerResult<()> {
        if self.fault() == FaultMode::Unreachable {
            return Err(LedgerError::Connectivity(
                "memory ledger is marked unreachable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl AuditLedger for MemoryLedger {
    async fn submit(
        &self,
        operator: &Principal,
        entry: &AuditEntry,
    ) -> LedgerResult<PendingTransaction> {
        self.check_reachable()?;
        let fault = self.fault();
        if fault == FaultMode::RejectAll {
            return Err(LedgerError::SubmissionRejected(
                "memory ledger rejects all submissions".to_string(),
            ));
        }

        let tx_reference = format!("0x{}", Uuid::new_v4().simple());
        {
            let mut state = self.shared.state();
            if state.pending.values().any(|p| &p.operator == operator) {
                return Err(LedgerError::SubmissionRejected(format!(
                    "operator {operator} already has a pending submission"
                )));
            }
            state.pending.insert(
                tx_reference.clone(),
                PendingEntry {
                    operator: operator.clone(),
                    entry: entry.clone(),
                },
            );
        }

        if fault != FaultMode::Stall {
            let shared = Arc::clone(&self.shared);
            let delay = self.confirmation_delay;
            let tx = tx_reference.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                shared.include(&tx);
            });
        }

        Ok(PendingTransaction {
            tx_reference,
            operator: operator.clone(),
            submitted_at: Utc::now(),
        })
    }

    async fn wait_for_confirmation(
        &self,
        pending: &PendingTransaction,
    ) -> LedgerResult<CommitReceipt> {
        self.check_reachable()?;
        let mut included = self.shared.included.subscribe();

        loop {
            {
                let mut state = self.shared.state();
                if let Some(receipt) = state.receipts.remove(&pending.tx_reference) {
                    return Ok(receipt);
                }
                if !state.pending.contains_key(&pending.tx_reference) {
                    return Err(LedgerError::InvalidResponse(format!(
                        "unknown transaction {}",
                        pending.tx_reference
                    )));
                }
            }
            if included.changed().await.is_err() {
                return Err(LedgerError::Connectivity(
                    "memory ledger shut down".to_string(),
                ));
            }
        }
    }

    async fn read_record(&self, sequence_id: u64) -> LedgerResult<AuditRecord> {
        self.check_reachable()?;
        let state = self.shared.state();
        usize::try_from(sequence_id)
            .ok()
            .and_then(|index| state.records.get(index))
            .cloned()
            .ok_or(LedgerError::NotFound(sequence_id))
    }

    async fn record_count(&self) -> LedgerResult<u64> {
        self.check_reachable()?;
        Ok(self.shared.state().records.len() as u64)
    }

    fn endpoint(&self) -> String {
        "memory://local".to_string()
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
