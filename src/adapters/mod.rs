//! External system integrations.
//!
//! - [`dicom`] - DICOM Part 10 file decoding
//! - [`database`] - Record store abstraction (trait-based) and in-memory backend
//! - [`postgresql`] - PostgreSQL record store
//! - [`pocketbase`] - PocketBase record store
//!
//! # Design Pattern
//!
//! Adapters isolate external dependencies behind traits so the ingest
//! pipeline can be tested with in-process implementations.
//!
//! ```rust,no_run
//! use dicom_indexer::adapters::database::{DuplicatePolicy, InMemoryStore, RecordStore};
//!
//! # async fn example(record: dicom_indexer::domain::CanonicalRecord) -> dicom_indexer::domain::Result<()> {
//! let store = InMemoryStore::new();
//! store.upsert(&record, DuplicatePolicy::Update).await?;
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod dicom;
pub mod pocketbase;
pub mod postgresql;
