//! In-process record store
//!
//! Used for dry runs, tests, and trying the pipeline without a database.
//! A single lock is held across the find and the write of an upsert, so
//! concurrent workers never create duplicate instance ids.

use super::query::SearchQuery;
use super::traits::{DuplicatePolicy, RecordStore, UpsertOutcome};
use crate::domain::{CanonicalRecord, IndexerError, Result, StoredRecord};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: Mutex<Vec<StoredRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored record, in insertion order
    ///
    /// Reads through a poisoned lock; store operations still fail on it.
    pub fn records(&self) -> Vec<StoredRecord> {
        self.snapshot().clone()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<StoredRecord>>> {
        self.records
            .lock()
            .map_err(|_| IndexerError::Database("in-memory store lock poisoned".to_string()))
    }

    fn snapshot(&self) -> MutexGuard<'_, Vec<StoredRecord>> {
        self.records.lock().unwrap_or_else(|poisoned| {
            warn!("In-memory store lock poisoned, reading last written state");
            poisoned.into_inner()
        })
    }

    fn insert_locked(records: &mut Vec<StoredRecord>, record: &CanonicalRecord) -> String {
        let id = Uuid::new_v4().to_string();
        records.push(StoredRecord {
            id: id.clone(),
            record: record.clone(),
        });
        id
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn test_connection(&self) -> Result<()> {
        self.lock().map(|_| ())
    }

    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn find_by_instance_id(&self, sop_instance_id: &str) -> Result<Option<StoredRecord>> {
        Ok(self
            .lock()?
            .iter()
            .find(|r| r.record.sop_instance_id == sop_instance_id)
            .cloned())
    }

    async fn insert(&self, record: &CanonicalRecord) -> Result<String> {
        let mut records = self.lock()?;
        Ok(Self::insert_locked(&mut records, record))
    }

    async fn update(&self, id: &str, record: &CanonicalRecord) -> Result<()> {
        let mut records = self.lock()?;
        let existing = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| IndexerError::Database(format!("No record with id {id}")))?;
        existing.record = record.clone();
        Ok(())
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<StoredRecord>> {
        Ok(self
            .lock()?
            .iter()
            .filter(|r| query.matches(&r.record))
            .take(query.limit())
            .cloned()
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn upsert(
        &self,
        record: &CanonicalRecord,
        policy: DuplicatePolicy,
    ) -> Result<UpsertOutcome> {
        let mut records = self.lock()?;

        let position = if record.has_instance_id() {
            records
                .iter()
                .position(|r| r.record.sop_instance_id == record.sop_instance_id)
        } else {
            None
        };

        match (position, policy) {
            (None, _) => {
                Self::insert_locked(&mut records, record);
                Ok(UpsertOutcome::Inserted)
            }
            (Some(index), DuplicatePolicy::Update) => {
                records[index].record = record.clone();
                Ok(UpsertOutcome::Updated)
            }
            (Some(_), DuplicatePolicy::Skip) => Ok(UpsertOutcome::SkippedDuplicate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::tests::sample_record;
    use crate::domain::UNKNOWN_ID;
    use serde_json::json;

    #[tokio::test]
    async fn test_update_policy_overwrites_existing() {
        let store = InMemoryStore::new();
        let first = sample_record("1.2.3");
        let mut second = sample_record("1.2.3");
        second.file_path = "/moved/1.2.3.dcm".to_string();

        assert_eq!(
            store.upsert(&first, DuplicatePolicy::Update).await.unwrap(),
            UpsertOutcome::Inserted
        );
        assert_eq!(
            store.upsert(&second, DuplicatePolicy::Update).await.unwrap(),
            UpsertOutcome::Updated
        );

        let records = store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].record, second);
    }

    #[tokio::test]
    async fn test_poisoned_lock_snapshot_keeps_records() {
        let store = std::sync::Arc::new(InMemoryStore::new());
        store
            .upsert(&sample_record("1.2.3"), DuplicatePolicy::Update)
            .await
            .unwrap();

        let holder = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = holder.records.lock().unwrap();
            panic!("poison the store lock");
        })
        .join();

        assert_eq!(store.len(), 1);
        assert_eq!(store.records()[0].record.sop_instance_id, "1.2.3");
        assert!(matches!(
            store.find_by_instance_id("1.2.3").await,
            Err(IndexerError::Database(_))
        ));
    }

    #[tokio::test]
    async fn test_skip_policy_keeps_first() {
        let store = InMemoryStore::new();
        let first = sample_record("1.2.3");
        let mut second = sample_record("1.2.3");
        second.modality = "CT".to_string();

        store.upsert(&first, DuplicatePolicy::Skip).await.unwrap();
        assert_eq!(
            store.upsert(&second, DuplicatePolicy::Skip).await.unwrap(),
            UpsertOutcome::SkippedDuplicate
        );

        let records = store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].record, first);
    }

    #[tokio::test]
    async fn test_unknown_instance_id_always_inserts() {
        let store = InMemoryStore::new();
        let record = sample_record(UNKNOWN_ID);

        for _ in 0..3 {
            assert_eq!(
                store.upsert(&record, DuplicatePolicy::Update).await.unwrap(),
                UpsertOutcome::Inserted
            );
        }
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_search_filters_and_caps() {
        let store = InMemoryStore::new();
        for i in 0..3 {
            let mut record = sample_record(&format!("1.{i}"));
            record.slice_thickness = i as f64;
            store.insert(&record).await.unwrap();
        }

        let query = SearchQuery::from_json(&json!({"slice_thickness": {"$gte": 1}})).unwrap();
        let found = store.search(&query).await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|r| r.record.slice_thickness >= 1.0));
    }

    #[tokio::test]
    async fn test_update_missing_id_fails() {
        let store = InMemoryStore::new();
        let err = store.update("nope", &sample_record("1")).await.unwrap_err();
        assert!(matches!(err, IndexerError::Database(_)));
    }
}
