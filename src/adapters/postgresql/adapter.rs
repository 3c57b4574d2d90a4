//! PostgreSQL implementation of [`RecordStore`]
//!
//! Upserts run as one `INSERT ... ON CONFLICT` statement against the partial
//! unique index on `sop_instance_id`, so concurrent workers cannot race
//! between the lookup and the write.

use super::client::PostgreSQLClient;
use super::models::{
    find_by_instance_id_sql, insert_sql, row_to_stored, search_sql, update_sql, upsert_sql,
    RecordParams,
};
use crate::adapters::database::query::SearchQuery;
use crate::adapters::database::traits::{DuplicatePolicy, RecordStore, UpsertOutcome};
use crate::domain::{CanonicalRecord, IndexerError, Result, StoredRecord};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_postgres::types::ToSql;

pub struct PostgreSQLAdapter {
    client: Arc<PostgreSQLClient>,
}

impl PostgreSQLAdapter {
    pub fn new(client: PostgreSQLClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub fn client(&self) -> &Arc<PostgreSQLClient> {
        &self.client
    }
}

fn parse_id(id: &str) -> Result<i64> {
    id.parse()
        .map_err(|_| IndexerError::Validation(format!("Invalid PostgreSQL record id '{id}'")))
}

#[async_trait]
impl RecordStore for PostgreSQLAdapter {
    async fn test_connection(&self) -> Result<()> {
        self.client.test_connection().await
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.client.ensure_schema().await
    }

    async fn find_by_instance_id(&self, sop_instance_id: &str) -> Result<Option<StoredRecord>> {
        let row = self
            .client
            .query_opt(&find_by_instance_id_sql(), &[&sop_instance_id])
            .await?;
        row.as_ref().map(row_to_stored).transpose()
    }

    async fn insert(&self, record: &CanonicalRecord) -> Result<String> {
        let params = RecordParams::new(record);
        let rows = self.client.query(&insert_sql(), &params.as_params()).await?;
        let row = rows
            .first()
            .ok_or_else(|| IndexerError::Database("INSERT returned no id".to_string()))?;
        let id: i64 = row
            .try_get("id")
            .map_err(|e| IndexerError::Database(format!("Bad INSERT result: {e}")))?;
        Ok(id.to_string())
    }

    async fn update(&self, id: &str, record: &CanonicalRecord) -> Result<()> {
        let row_id = parse_id(id)?;
        let record_params = RecordParams::new(record);
        let mut params = record_params.as_params();
        params.push(&row_id);

        let affected = self.client.execute(&update_sql(), &params).await?;
        if affected == 0 {
            return Err(IndexerError::Database(format!("No record with id {id}")));
        }
        Ok(())
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<StoredRecord>> {
        let (sql, owned) = search_sql(query);
        let params: Vec<&(dyn ToSql + Sync)> = owned
            .iter()
            .map(|p| p.as_ref() as &(dyn ToSql + Sync))
            .collect();

        let rows = self.client.query(&sql, &params).await?;
        rows.iter().map(row_to_stored).collect()
    }

    fn backend_name(&self) -> &'static str {
        "postgresql"
    }

    async fn upsert(
        &self,
        record: &CanonicalRecord,
        policy: DuplicatePolicy,
    ) -> Result<UpsertOutcome> {
        if !record.has_instance_id() {
            self.insert(record).await?;
            return Ok(UpsertOutcome::Inserted);
        }

        let sql = upsert_sql(policy == DuplicatePolicy::Update);
        let params = RecordParams::new(record);
        let row = self.client.query_opt(&sql, &params.as_params()).await?;

        match row {
            None => Ok(UpsertOutcome::SkippedDuplicate),
            Some(row) => {
                let inserted: bool = row
                    .try_get("inserted")
                    .map_err(|e| IndexerError::Database(format!("Bad upsert result: {e}")))?;
                Ok(if inserted {
                    UpsertOutcome::Inserted
                } else {
                    UpsertOutcome::Updated
                })
            }
        }
    }
}
