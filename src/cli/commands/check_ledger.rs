//! Check-ledger command implementation

use super::{ledger_or_report, load_or_report, EXIT_LEDGER, EXIT_SUCCESS};
use clap::Args;

/// Arguments for the check-ledger command
#[derive(Args, Debug)]
pub struct CheckLedgerArgs {}

impl CheckLedgerArgs {
    /// Execute the check-ledger command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        println!("🔌 Checking audit ledger");
        println!();

        let config = match load_or_report(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };
        let ledger = match ledger_or_report(&config) {
            Ok(l) => l,
            Err(code) => return Ok(code),
        };

        match ledger.health_check().await {
            Ok(health) => {
                println!("✅ Ledger reachable");
                println!("  Backend: {}", health.backend);
                println!("  Endpoint: {}", health.endpoint);
                println!("  Records: {}", health.record_count);
                println!("  Latency: {} ms", health.latency_ms);
                println!();
                Ok(EXIT_SUCCESS)
            }
            Err(e) => {
                tracing::error!(
                    endpoint = %ledger.endpoint(),
                    error = %e,
                    "Ledger health check failed"
                );
                println!("❌ Ledger check failed");
                println!("   Endpoint: {}", ledger.endpoint());
                println!("   Error: {e}");
                println!();
                Ok(EXIT_LEDGER)
            }
        }
    }
}
