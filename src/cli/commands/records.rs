//! Records command implementation
//!
//! Lists committed audit records from the configured ledger.

use super::{ledger_or_report, load_or_report, EXIT_LEDGER, EXIT_SUCCESS};
use clap::Args;

/// Arguments for the records command
#[derive(Args, Debug)]
pub struct RecordsArgs {
    /// First sequence id to list
    #[arg(long, default_value_t = 0)]
    pub from: u64,

    /// Maximum number of records
    #[arg(long, default_value_t = 20)]
    pub limit: usize,

    /// Print records as JSON lines
    #[arg(long)]
    pub json: bool,
}

impl RecordsArgs {
    /// Execute the records command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(from = self.from, limit = self.limit, "Listing audit records");

        let config = match load_or_report(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };
        let ledger = match ledger_or_report(&config) {
            Ok(l) => l,
            Err(code) => return Ok(code),
        };

        let records = match ledger.read_range(self.from, self.limit).await {
            Ok(r) => r,
            Err(e) => {
                println!("❌ Failed to read audit records");
                println!("   Error: {e}");
                return Ok(EXIT_LEDGER);
            }
        };

        if self.json {
            for record in &records {
                println!("{}", serde_json::to_string(record)?);
            }
            return Ok(EXIT_SUCCESS);
        }

        if records.is_empty() {
            println!("No audit records found from sequence id {}.", self.from);
            return Ok(EXIT_SUCCESS);
        }

        println!("📜 {} audit record(s) on {}", records.len(), ledger.endpoint());
        println!();
        println!(
            "{:<8} {:<20} {:<20} {:<14} {:<20} {:<18} {:<18}",
            "Seq", "Timestamp", "Operator", "Action", "Purpose", "Original", "Redacted"
        );
        println!("{}", "-".repeat(124));

        for record in &records {
            println!(
                "{:<8} {:<20} {:<20} {:<14} {:<20} {:<18} {:<18}",
                record.sequence_id,
                record.timestamp.format("%Y-%m-%d %H:%M:%S"),
                truncate(&record.operator_identity, 20),
                truncate(&record.action, 14),
                truncate(&record.purpose, 20),
                short_fingerprint(record.original_fingerprint.as_str()),
                short_fingerprint(record.new_fingerprint.as_str()),
            );
        }

        println!();
        Ok(EXIT_SUCCESS)
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut out: String = value.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn short_fingerprint(hex: &str) -> String {
    format!("{}…", &hex[..hex.len().min(16)])
}
