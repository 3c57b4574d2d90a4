//! PostgreSQL record store
//!
//! Records live in the single `dicom_records` table created by
//! `migrations/001_initial_schema.sql`.

pub mod adapter;
pub mod client;
pub mod models;

pub use adapter::PostgreSQLAdapter;
pub use client::PostgreSQLClient;
