//! Scan command implementation
//!
//! Enumerates the scan roots, then ingests every candidate file into the
//! configured record store.

use super::{connect_store, store_error_exit_code};
use crate::adapters::database::{InMemoryStore, RecordStore};
use crate::adapters::dicom::DicomFileDecoder;
use crate::cli::exit_code;
use crate::config::{load_config_unvalidated, IndexerConfig};
use crate::core::extract::RecordNormalizer;
use crate::core::scan::{DirectoryEnumerator, IngestCoordinator, IngestOptions, IngestSummary};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the scan command
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Dry run mode - extract records without writing them
    #[arg(long)]
    pub dry_run: bool,

    /// Override the number of concurrent workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Directories to scan instead of `scan.scan_directories`
    pub directories: Vec<PathBuf>,
}

impl ScanArgs {
    /// Apply CLI overrides on top of the loaded configuration
    pub fn apply_overrides(&self, config: &mut IndexerConfig) {
        if !self.directories.is_empty() {
            tracing::info!(directories = ?self.directories, "Overriding scan directories from CLI");
            config.scan.scan_directories = self.directories.clone();
        }

        if let Some(workers) = self.workers {
            tracing::info!(workers, "Overriding worker count from CLI");
            config.scan.max_workers = workers;
        }

        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.application.dry_run = true;
        }
    }

    /// Execute the scan command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting scan command");

        let mut config = match load_config_unvalidated(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(exit_code::CONFIGURATION);
            }
        };

        self.apply_overrides(&mut config);

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(exit_code::CONFIGURATION);
        }

        let dry_run = config.application.dry_run;
        let store: Arc<dyn RecordStore> = if dry_run {
            println!("🔍 DRY RUN MODE - No records will be written");
            println!();
            Arc::new(InMemoryStore::new())
        } else {
            let store = match connect_store(&config).await {
                Ok(store) => store,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to connect to record store");
                    eprintln!("Failed to connect to record store: {e}");
                    return Ok(store_error_exit_code(&e));
                }
            };

            if let Err(e) = store.ensure_schema().await {
                tracing::error!(error = %e, "Failed to prepare record store schema");
                eprintln!("Failed to prepare record store schema: {e}");
                return Ok(store_error_exit_code(&e));
            }
            store
        };

        let roots = config.scan.scan_directories.clone();
        let enumerator = DirectoryEnumerator::new(config.scan.follow_symlinks);
        let enumeration = tokio::task::spawn_blocking(move || enumerator.enumerate(&roots)).await?;

        for (root, reason) in &enumeration.failed_roots {
            eprintln!("⚠️  Skipped {}: {reason}", root.display());
        }

        println!(
            "🚀 Indexing {} file(s) into {}...",
            enumeration.files.len(),
            store.backend_name()
        );
        println!();

        let coordinator = IngestCoordinator::new(
            RecordNormalizer::new(Arc::new(DicomFileDecoder::new())),
            store,
            IngestOptions::from_config(&config.scan, dry_run),
            shutdown_signal,
        );
        let summary = coordinator.run(enumeration.files).await;

        print_summary(&summary);

        let code = scan_exit_code(&summary, enumeration.failed_roots.len());
        match code {
            exit_code::INTERRUPTED => {
                println!("⚠️  Scan interrupted. Re-run the same command to continue;");
                println!("   already indexed files are deduplicated.");
            }
            exit_code::SUCCESS => println!("✅ Scan completed successfully!"),
            _ => println!("⚠️  Scan completed with failures"),
        }

        Ok(code)
    }
}

fn print_summary(summary: &IngestSummary) {
    println!();
    println!("📊 Scan Summary:");
    println!("  Total Files: {}", summary.total_count());
    println!("  Successful: {}", summary.success_count());
    println!("  Failed: {}", summary.failed);
    if summary.dry_run {
        println!("  (dry run, nothing written)");
    } else {
        println!("  Inserted: {}", summary.inserted);
        println!("  Updated: {}", summary.updated);
        println!("  Duplicates Skipped: {}", summary.skipped_duplicates);
    }
    if summary.timed_out > 0 {
        println!("  Timed Out: {}", summary.timed_out);
    }
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    println!("  Success Rate: {:.2}%", summary.success_rate());
    println!();

    if !summary.failures.is_empty() {
        println!("  Failures:");
        for failure in summary.failures.iter().take(10) {
            println!("    - {}: {}", failure.path.display(), failure.message);
        }
        if summary.failures.len() > 10 {
            println!("    ... and {} more failures", summary.failures.len() - 10);
        }
        println!();
    }
}

/// Exit code for a finished scan
pub fn scan_exit_code(summary: &IngestSummary, failed_roots: usize) -> i32 {
    if summary.interrupted {
        exit_code::INTERRUPTED
    } else if summary.failed > 0 || failed_roots > 0 {
        exit_code::PARTIAL_FAILURE
    } else {
        exit_code::SUCCESS
    }
}
