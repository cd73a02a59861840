//! External system integrations for deid-ledger.
//!
//! - [`ledger`] - Append-only audit ledger (REST gateway or in-memory)
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate external dependencies and
//! enable testing with in-process implementations. The ledger layer uses a
//! trait ([`ledger::AuditLedger`]) so the pipeline never depends on a concrete
//! backend.
//!
//! ```rust,no_run
//! use deid_ledger::adapters::ledger::AuditLedgerClient;
//! use deid_ledger::config::{Environment, LedgerBackend, LedgerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = LedgerConfig {
//!     backend: LedgerBackend::Http,
//!     endpoint: Some("https://ledger.example.com".to_string()),
//!     ..Default::default()
//! };
//!
//! let client = AuditLedgerClient::from_config(&config, Environment::Staging)?;
//! println!("{} records", client.record_count().await?);
//! # Ok(())
//! # }
//! ```

pub mod ledger;
