// deid-ledger - Clinical note de-identification with a ledger-anchored audit trail
// Copyright (c) 2025 deid-ledger Contributors
// Licensed under the MIT License

use clap::Parser;
use deid_ledger::cli::{Cli, Commands};
use deid_ledger::config::load_config;
use deid_ledger::logging::{init_logging, resolve_logging};
use std::process;
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    // Optional .env with DEID_* overrides and secrets
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Config errors are reported by the command itself
    let config = match cli.command {
        Commands::Init(_) => None,
        _ => load_config(&cli.config).ok(),
    };
    let (log_level, logging_config) = resolve_logging(cli.log_level.as_deref(), config.as_ref());
    let guard = match init_logging(&log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(5);
        }
    };

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "deid-ledger starting");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGTERM handler");
                    return;
                }
            };

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received SIGINT, shutting down");
                }
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, shutting down");
                }
            }
            let _ = shutdown_tx.send(true);
        }

        #[cfg(not(unix))]
        {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            } else {
                tracing::info!("Received SIGINT, shutting down");
                let _ = shutdown_tx.send(true);
            }
        }
    });

    let exit_code = match execute_command(&cli, shutdown_rx).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e:#}");
            5
        }
    };

    drop(guard);
    process::exit(exit_code);
}

async fn execute_command(cli: &Cli, shutdown_signal: watch::Receiver<bool>) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Deidentify(args) => args.execute(&cli.config, shutdown_signal).await,
        Commands::Verify(args) => args.execute(&cli.config).await,
        Commands::Records(args) => args.execute(&cli.config).await,
        Commands::CheckLedger(args) => args.execute(&cli.config).await,
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
        Commands::Init(args) => args.execute().await,
    }
}
