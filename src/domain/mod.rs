//! Domain models and types for the indexer.
//!
//! The domain layer provides:
//! - **Record model** ([`CanonicalRecord`], [`StoredRecord`], [`PlaneLabel`])
//! - **Field catalog** ([`RecordField`], [`FieldKind`])
//! - **Error types** ([`IndexerError`], [`ExtractionError`], [`ReadError`], [`PocketBaseError`])
//! - **Result type alias** ([`Result`])

pub mod errors;
pub mod record;
pub mod result;

pub use errors::{ExtractionError, IndexerError, PocketBaseError, ReadError};
pub use record::{
    CanonicalRecord, FieldKind, FieldValue, PlaneLabel, RecordField, StoredRecord, UNKNOWN_ID,
};
pub use result::Result;
