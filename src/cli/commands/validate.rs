//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the configuration file.

use crate::cli::exit_code;
use crate::config::schema::{DatabaseTarget, IndexerConfig};
use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates before returning
        match load_config(config_path) {
            Ok(config) => {
                println!("✅ Configuration is valid");
                println!();
                print_summary(&config);
                Ok(exit_code::SUCCESS)
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                Ok(exit_code::CONFIGURATION)
            }
        }
    }
}

fn print_summary(config: &IndexerConfig) {
    println!("Configuration Summary:");
    println!("  Log Level: {}", config.application.log_level);
    println!("  Dry Run: {}", config.application.dry_run);

    match config.database_target {
        DatabaseTarget::PostgreSQL => {
            if let Some(ref pg_config) = config.postgresql {
                use secrecy::ExposeSecret;
                println!("  Database Target: PostgreSQL");
                println!(
                    "  PostgreSQL Connection: {}",
                    pg_config
                        .connection_string
                        .expose_secret()
                        .as_ref()
                        .split('@')
                        .next_back()
                        .unwrap_or("***")
                );
                println!("  Max Connections: {}", pg_config.max_connections);
                println!("  SSL Mode: {}", pg_config.ssl_mode);
            }
        }
        DatabaseTarget::PocketBase => {
            if let Some(ref pb_config) = config.pocketbase {
                println!("  Database Target: PocketBase");
                println!("  PocketBase URL: {}", pb_config.base_url);
                println!("  Collection: {}", pb_config.collection_name);
                println!("  Admin: {}", pb_config.admin_email);
            }
        }
        DatabaseTarget::Memory => {
            println!("  Database Target: in-memory (records are discarded on exit)");
        }
    }

    println!("  Scan Directories: {:?}", config.scan.scan_directories);
    println!("  Max Workers: {}", config.scan.max_workers);
    println!("  Task Timeout: {}s", config.scan.task_timeout_seconds);
    println!("  On Duplicate: {}", config.scan.on_duplicate);
    println!("  Follow Symlinks: {}", config.scan.follow_symlinks);
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_valid_config_exits_zero() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
database_target = "memory"

[scan]
scan_directories = ["/data"]
"#
        )
        .unwrap();

        let code = ValidateArgs {}
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, exit_code::SUCCESS);
    }

    #[tokio::test]
    async fn test_invalid_config_exits_two() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
database_target = "memory"

[scan]
scan_directories = []
"#
        )
        .unwrap();

        let code = ValidateArgs {}
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, exit_code::CONFIGURATION);
    }

    #[tokio::test]
    async fn test_missing_file_exits_two() {
        let code = ValidateArgs {}
            .execute("/nonexistent/dicom-indexer.toml")
            .await
            .unwrap();
        assert_eq!(code, exit_code::CONFIGURATION);
    }
}
