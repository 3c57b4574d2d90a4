//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod init;
pub mod scan;
pub mod schema;
pub mod search;
pub mod validate;

use super::exit_code;
use crate::adapters::database::{create_record_store, RecordStore};
use crate::config::IndexerConfig;
use crate::domain::IndexerError;
use std::sync::Arc;

/// Exit code for a failure to reach or authenticate with the store
pub(crate) fn store_error_exit_code(error: &IndexerError) -> i32 {
    match error {
        IndexerError::Configuration(_) | IndexerError::Validation(_) => exit_code::CONFIGURATION,
        IndexerError::Connection(_)
        | IndexerError::Authentication(_)
        | IndexerError::Database(_)
        | IndexerError::PocketBase(_)
        | IndexerError::Timeout { .. } => exit_code::CONNECTION,
        _ => exit_code::FATAL,
    }
}

/// Create the configured store and check it answers
pub(crate) async fn connect_store(
    config: &IndexerConfig,
) -> Result<Arc<dyn RecordStore>, IndexerError> {
    let store = create_record_store(config).await?;
    store.test_connection().await?;
    Ok(store)
}
