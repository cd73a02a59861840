//! CLI interface and argument parsing
//!
//! Command-line interface for deid-ledger using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// deid-ledger - Clinical note de-identification with a ledger-anchored audit trail
#[derive(Parser, Debug)]
#[command(name = "deid-ledger")]
#[command(version, about, long_about = None)]
#[command(author = "deid-ledger Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "deid-ledger.toml", env = "DEID_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "DEID_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// De-identify a clinical note and commit its audit record
    Deidentify(commands::deidentify::DeidentifyArgs),

    /// Check a document against a fingerprint or a committed record
    Verify(commands::verify::VerifyArgs),

    /// List committed audit records
    Records(commands::records::RecordsArgs),

    /// Check ledger connectivity
    CheckLedger(commands::check_ledger::CheckLedgerArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_deidentify() {
        let cli = Cli::parse_from([
            "deid-ledger",
            "deidentify",
            "--operator",
            "dr_strange",
            "--text",
            "Patient John Smith",
        ]);
        assert_eq!(cli.config, "deid-ledger.toml");
        match cli.command {
            Commands::Deidentify(args) => {
                assert_eq!(args.operator, "dr_strange");
                assert_eq!(args.role, "medical_professional");
                assert_eq!(args.text.as_deref(), Some("Patient John Smith"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["deid-ledger", "--config", "custom.toml", "check-ledger"]);
        assert_eq!(cli.config, "custom.toml");
        assert!(matches!(cli.command, Commands::CheckLedger(_)));
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["deid-ledger", "--log-level", "debug", "records"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_verify_record() {
        let cli = Cli::parse_from([
            "deid-ledger",
            "verify",
            "--record",
            "7",
            "--against",
            "redacted",
            "--file",
            "note.txt",
        ]);
        match cli.command {
            Commands::Verify(args) => {
                assert_eq!(args.record, Some(7));
                assert_eq!(args.files.len(), 1);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_verify_requires_expected_or_record() {
        let result = Cli::try_parse_from(["deid-ledger", "verify", "--file", "note.txt"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["deid-ledger", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["deid-ledger", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }
}
