//! Record store abstraction
//!
//! This module defines the trait that store backends implement to persist
//! canonical records, deduplicated by SOP instance id.

use super::query::SearchQuery;
use crate::domain::{CanonicalRecord, Result, StoredRecord};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What to do when a record with the same SOP instance id already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Overwrite every field of the existing record
    #[default]
    Update,
    /// Leave the existing record untouched
    Skip,
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicatePolicy::Update => write!(f, "update"),
            DuplicatePolicy::Skip => write!(f, "skip"),
        }
    }
}

/// Result of a single upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    SkippedDuplicate,
}

/// Persistence interface for canonical records
///
/// Implementations must tolerate concurrent use from every ingest worker.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Check the store is reachable
    ///
    /// # Errors
    ///
    /// Returns an error if the connection test fails.
    async fn test_connection(&self) -> Result<()>;

    /// Create the table/collection for records if it does not exist
    async fn ensure_schema(&self) -> Result<()>;

    /// Look up the record holding `sop_instance_id`
    async fn find_by_instance_id(&self, sop_instance_id: &str) -> Result<Option<StoredRecord>>;

    /// Add a new record, returning its store id
    async fn insert(&self, record: &CanonicalRecord) -> Result<String>;

    /// Overwrite every field of the record with store id `id`
    async fn update(&self, id: &str, record: &CanonicalRecord) -> Result<()>;

    /// Records matching every condition of `query`, at most `query.limit()`
    async fn search(&self, query: &SearchQuery) -> Result<Vec<StoredRecord>>;

    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;

    /// Insert `record`, or resolve a duplicate SOP instance id per `policy`
    ///
    /// Records without an instance id are always inserted. This default is
    /// a find followed by a write; backends that can do it atomically
    /// override it.
    async fn upsert(
        &self,
        record: &CanonicalRecord,
        policy: DuplicatePolicy,
    ) -> Result<UpsertOutcome> {
        if !record.has_instance_id() {
            self.insert(record).await?;
            return Ok(UpsertOutcome::Inserted);
        }

        match self.find_by_instance_id(&record.sop_instance_id).await? {
            None => {
                self.insert(record).await?;
                Ok(UpsertOutcome::Inserted)
            }
            Some(existing) => match policy {
                DuplicatePolicy::Update => {
                    self.update(&existing.id, record).await?;
                    Ok(UpsertOutcome::Updated)
                }
                DuplicatePolicy::Skip => Ok(UpsertOutcome::SkippedDuplicate),
            },
        }
    }
}
