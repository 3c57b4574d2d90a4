//! Scan and ingest pipeline
//!
//! [`DirectoryEnumerator`] collects candidate files, then
//! [`IngestCoordinator`] fans them out over a worker pool and reports an
//! [`IngestSummary`].

pub mod coordinator;
pub mod enumerator;
pub mod summary;

pub use coordinator::{IngestCoordinator, IngestOptions};
pub use enumerator::{DirectoryEnumerator, EnumerationResult};
pub use summary::{IngestFailure, IngestSummary};
