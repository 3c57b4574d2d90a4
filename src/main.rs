// DICOM Indexer - DICOM tag extraction and indexing tool
// Copyright (c) 2025 DICOM Indexer Contributors
// Licensed under the MIT License

use clap::Parser;
use dicom_indexer::cli::{exit_code, Cli, Commands};
use dicom_indexer::config::{load_config, LoggingConfig};
use dicom_indexer::logging::init_logging;
use std::process;
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    // Optional; a missing .env is ignored
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Logging settings come from the config file when it loads; the command
    // itself reports a broken config.
    let (config_level, logging_config) = match load_config(&cli.config) {
        Ok(config) => (Some(config.application.log_level), config.logging),
        Err(_) => (None, LoggingConfig::default()),
    };
    let log_level = cli
        .log_level
        .clone()
        .or(config_level)
        .unwrap_or_else(|| "info".to_string());

    let logging_guard = match init_logging(&log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(exit_code::FATAL);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "DICOM Indexer - DICOM tag extraction and indexing tool"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(wait_for_shutdown(shutdown_tx));

    let code = match execute_command(&cli, shutdown_rx).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            exit_code::FATAL
        }
    };

    // process::exit skips destructors; flush the file logger first
    drop(logging_guard);
    process::exit(code);
}

/// Flip the shutdown channel on SIGINT or SIGTERM
async fn wait_for_shutdown(shutdown_tx: watch::Sender<bool>) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler, listening for Ctrl+C only");
                if tokio::signal::ctrl_c().await.is_ok() {
                    notify_shutdown(&shutdown_tx, "SIGINT");
                }
                return;
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => notify_shutdown(&shutdown_tx, "SIGINT"),
            _ = sigterm.recv() => notify_shutdown(&shutdown_tx, "SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        match tokio::signal::ctrl_c().await {
            Ok(()) => notify_shutdown(&shutdown_tx, "SIGINT"),
            Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C"),
        }
    }
}

fn notify_shutdown(shutdown_tx: &watch::Sender<bool>, signal: &str) {
    tracing::info!(signal, "Shutdown signal received, finishing in-flight files");
    println!("\n⚠️  Shutdown signal received, finishing in-flight files...");
    let _ = shutdown_tx.send(true);
}

/// Execute the CLI command
async fn execute_command(cli: &Cli, shutdown_signal: watch::Receiver<bool>) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Scan(args) => args.execute(&cli.config, shutdown_signal).await,
        Commands::Search(args) => args.execute(&cli.config).await,
        Commands::SetupSchema(args) => args.execute(&cli.config).await,
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
        Commands::Init(args) => args.execute().await,
    }
}
