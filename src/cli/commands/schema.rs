//! Setup-schema command implementation

use super::{connect_store, store_error_exit_code};
use crate::cli::exit_code;
use crate::config::load_config;
use clap::Args;

/// Arguments for the setup-schema command
#[derive(Args, Debug)]
pub struct SetupSchemaArgs {}

impl SetupSchemaArgs {
    /// Execute the setup-schema command
    ///
    /// Safe to run repeatedly; existing tables and collections are kept.
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load configuration: {e}");
                return Ok(exit_code::CONFIGURATION);
            }
        };

        let store = match connect_store(&config).await {
            Ok(store) => store,
            Err(e) => {
                eprintln!("Failed to connect to record store: {e}");
                return Ok(store_error_exit_code(&e));
            }
        };

        match store.ensure_schema().await {
            Ok(()) => {
                println!("✅ Schema ready on {}", store.backend_name());
                Ok(exit_code::SUCCESS)
            }
            Err(e) => {
                tracing::error!(error = %e, "Schema setup failed");
                eprintln!("❌ Schema setup failed: {e}");
                Ok(store_error_exit_code(&e))
            }
        }
    }
}
