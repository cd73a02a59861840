//! Append-only audit ledger adapters
//!
//! The service anchors every redaction event to a ledger it does not control.
//! [`AuditLedger`] models the four operations such a ledger offers: submit a
//! record, wait for it to be confirmed, read a record by index and count
//! records. [`AuditLedgerClient`] layers per-operator ordering and a bounded
//! confirmation wait on top of any implementation.
//!
//! # Example
//!
//! ```rust,no_run
//! use deid_ledger::adapters::ledger::{AuditLedgerClient, MemoryLedger};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = AuditLedgerClient::new(Arc::new(MemoryLedger::new()), Duration::from_secs(30));
//! let health = client.health_check().await?;
//! println!("{} records on {}", health.record_count, health.endpoint);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod http;
pub mod memory;

use crate::domain::{AuditEntry, AuditRecord, CommitReceipt, LedgerError, Principal};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use client::{create_ledger, AuditLedgerClient, LedgerHealth};
pub use http::HttpLedger;
pub use memory::{FaultMode, MemoryLedger};

/// Result type for ledger operations
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Handle for a submitted, not yet confirmed record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransaction {
    /// Ledger transaction reference
    pub tx_reference: String,
    /// Principal that submitted the record
    pub operator: Principal,
    /// When the submission was accepted
    pub submitted_at: DateTime<Utc>,
}

/// External append-only ledger
///
/// Implementations never modify or delete a confirmed record.
#[async_trait]
pub trait AuditLedger: Send + Sync {
    /// Submit a record; returns once the ledger has accepted it for inclusion
    async fn submit(&self, operator: &Principal, entry: &AuditEntry)
        -> LedgerResult<PendingTransaction>;

    /// Wait until a submitted record is included
    ///
    /// May wait indefinitely; callers bound it with a timeout.
    async fn wait_for_confirmation(&self, pending: &PendingTransaction)
        -> LedgerResult<CommitReceipt>;

    /// Read a committed record by sequence id
    async fn read_record(&self, sequence_id: u64) -> LedgerResult<AuditRecord>;

    /// Number of committed records
    async fn record_count(&self) -> LedgerResult<u64>;

    /// Where the ledger lives, for logs and health output
    fn endpoint(&self) -> String;

    /// Short backend name
    fn name(&self) -> &'static str;
}
