//! Search command implementation
//!
//! Prints the records matching a JSON filter as a JSON array.

use super::{connect_store, store_error_exit_code};
use crate::adapters::database::SearchQuery;
use crate::cli::exit_code;
use crate::config::load_config;
use crate::domain::{Result, StoredRecord};
use clap::Args;

/// Arguments for the search command
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Filter object, e.g. '{"modality": "MR", "slice_thickness": {"$lte": 3}}'
    #[arg(short, long, default_value = "{}")]
    pub filters: String,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl SearchArgs {
    /// Parse the filter argument
    pub fn query(&self) -> Result<SearchQuery> {
        let value: serde_json::Value = serde_json::from_str(&self.filters)?;
        SearchQuery::from_json(&value)
    }

    /// Execute the search command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let query = match self.query() {
            Ok(q) => q,
            Err(e) => {
                eprintln!("Invalid search filters: {e}");
                return Ok(exit_code::CONFIGURATION);
            }
        };

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
                tracing::error!(error = %e, "Failed to connect to record store");
                eprintln!("Failed to connect to record store: {e}");
                return Ok(store_error_exit_code(&e));
            }
        };

        let records = match store.search(&query).await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(error = %e, "Search failed");
                eprintln!("Search failed: {e}");
                return Ok(store_error_exit_code(&e));
            }
        };

        tracing::info!(
            matches = records.len(),
            limit = query.limit(),
            "Search completed"
        );
        println!("{}", render(&records, self.pretty)?);
        Ok(exit_code::SUCCESS)
    }
}

fn render(records: &[StoredRecord], pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(records)
    } else {
        serde_json::to_string(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::tests::sample_record;
    use crate::domain::IndexerError;

    fn args(filters: &str) -> SearchArgs {
        SearchArgs {
            filters: filters.to_string(),
            pretty: false,
        }
    }

    #[test]
    fn test_query_parses_filters() {
        let query = args(r#"{"modality": "MR"}"#).query().unwrap();
        assert_eq!(query.conditions().len(), 1);
    }

    #[test]
    fn test_query_rejects_bad_json() {
        assert!(matches!(
            args("{modality").query(),
            Err(IndexerError::Serialization(_))
        ));
    }

    #[test]
    fn test_query_rejects_unknown_field() {
        assert!(matches!(
            args(r#"{"colour": "red"}"#).query(),
            Err(IndexerError::Validation(_))
        ));
    }

    #[test]
    fn test_render_flattens_record() {
        let records = vec![StoredRecord {
            id: "r1".to_string(),
            record: sample_record("1.2.3"),
        }];
        let json = render(&records, false).unwrap();
        assert!(json.starts_with(r#"[{"id":"r1","#));
        assert!(json.contains(r#""sop_instance_id":"1.2.3""#));
        assert!(json.contains(r#""series_datetime":"2021-03-14 09:26:53""#));
    }
}
