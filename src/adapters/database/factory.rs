//! Record store factory
//!
//! This module provides the factory function that creates the configured
//! record store backend.

use crate::adapters::database::memory::InMemoryStore;
use crate::adapters::database::traits::RecordStore;
use crate::adapters::pocketbase::PocketBaseAdapter;
use crate::adapters::postgresql::{PostgreSQLAdapter, PostgreSQLClient};
use crate::config::schema::{DatabaseTarget, IndexerConfig};
use crate::domain::{IndexerError, Result};
use std::sync::Arc;

/// Create a record store based on the configuration
///
/// This factory function examines the `database_target` in the configuration
/// and creates the matching backend. PocketBase authenticates here; the
/// PostgreSQL pool connects lazily.
///
/// # Errors
///
/// Returns an error if the target's section is missing or the backend
/// cannot be created.
pub async fn create_record_store(config: &IndexerConfig) -> Result<Arc<dyn RecordStore>> {
    match config.database_target {
        DatabaseTarget::PostgreSQL => {
            let pg_config = config.postgresql.as_ref().ok_or_else(|| {
                IndexerError::Configuration("[postgresql] section is required".to_string())
            })?;

            tracing::info!("Creating PostgreSQL record store");
            let client = PostgreSQLClient::new(pg_config.clone()).await?;
            Ok(Arc::new(PostgreSQLAdapter::new(client)))
        }
        DatabaseTarget::PocketBase => {
            let pb_config = config.pocketbase.as_ref().ok_or_else(|| {
                IndexerError::Configuration("[pocketbase] section is required".to_string())
            })?;

            tracing::info!("Creating PocketBase record store");
            let adapter = PocketBaseAdapter::connect(pb_config).await?;
            Ok(Arc::new(adapter))
        }
        DatabaseTarget::Memory => {
            tracing::info!("Creating in-memory record store");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}
