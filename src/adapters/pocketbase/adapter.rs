//! PocketBase implementation of [`RecordStore`]
//!
//! Records are stored in one base collection whose fields mirror the
//! [`RecordField`] catalog. Upserts use the trait's find-then-write default.

use super::client::PocketBaseClient;
use crate::adapters::database::query::{Condition, SearchQuery};
use crate::adapters::database::traits::RecordStore;
use crate::config::schema::PocketBaseConfig;
use crate::domain::{
    CanonicalRecord, FieldKind, FieldValue, IndexerError, PocketBaseError, RecordField, Result,
    StoredRecord,
};
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

/// Date format PocketBase uses in filters and `date` fields
const PB_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3fZ";

pub struct PocketBaseAdapter {
    client: PocketBaseClient,
    collection: String,
}

impl PocketBaseAdapter {
    /// Authenticate and bind to the configured collection
    pub async fn connect(config: &PocketBaseConfig) -> Result<Self> {
        let client = PocketBaseClient::connect(config).await?;
        Ok(Self {
            client,
            collection: config.collection_name.clone(),
        })
    }

    fn records_path(&self) -> String {
        format!("/api/collections/{}/records", self.collection)
    }

    async fn list(&self, filter: Option<String>, per_page: usize) -> Result<Vec<StoredRecord>> {
        let mut params = vec![
            ("perPage".to_string(), per_page.to_string()),
            ("sort".to_string(), "created".to_string()),
        ];
        if let Some(filter) = filter {
            params.push(("filter".to_string(), filter));
        }

        let request = self
            .client
            .request(Method::GET, &self.records_path())
            .query(&params);
        let body = self.client.send_json(request).await?;

        let items = body
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| PocketBaseError::InvalidResponse("list response has no items".to_string()))?;

        items.iter().map(parse_stored).collect()
    }
}

/// Collection definition built from the field catalog
pub fn collection_schema(name: &str) -> Value {
    let fields: Vec<Value> = RecordField::ALL
        .iter()
        .map(|field| {
            let kind = match field.kind() {
                FieldKind::Text => "text",
                FieldKind::Number => "number",
                FieldKind::Boolean => "bool",
                FieldKind::Timestamp => "date",
            };
            json!({
                "name": field.name(),
                "type": kind,
                "required": false,
            })
        })
        .collect();

    json!({
        "name": name,
        "type": "base",
        "schema": fields,
        "indexes": [
            format!("CREATE INDEX idx_{name}_sop_instance_id ON {name} (sop_instance_id)"),
            format!("CREATE INDEX idx_{name}_series_instance_id ON {name} (series_instance_id)"),
        ],
    })
}

/// Filter expression for PocketBase's list endpoint
pub fn filter_expression(conditions: &[Condition]) -> Option<String> {
    if conditions.is_empty() {
        return None;
    }

    let parts: Vec<String> = conditions
        .iter()
        .map(|c| {
            format!(
                "{}{}{}",
                c.field.name(),
                c.comparison.pocketbase(),
                filter_literal(&c.value)
            )
        })
        .collect();
    Some(parts.join(" && "))
}

fn filter_literal(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(s) => quote(s),
        FieldValue::Number(n) => n.to_string(),
        FieldValue::Boolean(b) => b.to_string(),
        FieldValue::Timestamp(ts) => quote(&ts.format(PB_DATETIME_FORMAT).to_string()),
    }
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn record_body(record: &CanonicalRecord) -> Result<Value> {
    let mut body = serde_json::to_value(record)?;
    if let Some(map) = body.as_object_mut() {
        map.insert(
            RecordField::SeriesDatetime.name().to_string(),
            Value::String(record.series_datetime.format(PB_DATETIME_FORMAT).to_string()),
        );
    }
    Ok(body)
}

fn parse_stored(item: &Value) -> Result<StoredRecord> {
    serde_json::from_value(item.clone()).map_err(|e| {
        PocketBaseError::InvalidResponse(format!("unexpected record shape: {e}")).into()
    })
}

#[async_trait]
impl RecordStore for PocketBaseAdapter {
    async fn test_connection(&self) -> Result<()> {
        let request = self.client.request(Method::GET, "/api/health");
        self.client.send(request).await?;
        tracing::info!(base_url = %self.client.base_url(), "PocketBase connection test successful");
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<()> {
        let path = format!("/api/collections/{}", self.collection);
        let request = self.client.request(Method::GET, &path);

        match self.client.send(request).await {
            Ok(_) => {
                tracing::debug!(collection = %self.collection, "PocketBase collection exists");
                return Ok(());
            }
            Err(IndexerError::PocketBase(PocketBaseError::Status { status, .. }))
                if status == StatusCode::NOT_FOUND.as_u16() => {}
            Err(e) => return Err(e),
        }

        let request = self
            .client
            .request(Method::POST, "/api/collections")
            .json(&collection_schema(&self.collection));
        self.client.send(request).await?;

        tracing::info!(collection = %self.collection, "Created PocketBase collection");
        Ok(())
    }

    async fn find_by_instance_id(&self, sop_instance_id: &str) -> Result<Option<StoredRecord>> {
        let filter = format!("sop_instance_id={}", quote(sop_instance_id));
        Ok(self.list(Some(filter), 1).await?.into_iter().next())
    }

    async fn insert(&self, record: &CanonicalRecord) -> Result<String> {
        let request = self
            .client
            .request(Method::POST, &self.records_path())
            .json(&record_body(record)?);
        let body = self.client.send_json(request).await?;

        body.get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                PocketBaseError::InvalidResponse("create response has no id".to_string()).into()
            })
    }

    async fn update(&self, id: &str, record: &CanonicalRecord) -> Result<()> {
        let path = format!("{}/{id}", self.records_path());
        let request = self
            .client
            .request(Method::PATCH, &path)
            .json(&record_body(record)?);
        self.client.send(request).await?;
        Ok(())
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<StoredRecord>> {
        self.list(filter_expression(query.conditions()), query.limit())
            .await
    }

    fn backend_name(&self) -> &'static str {
        "pocketbase"
    }
}
