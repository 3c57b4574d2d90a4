//! Core business logic.
//!
//! # Modules
//!
//! - [`extract`] - Attribute reads, plane classification and record normalization
//! - [`scan`] - Directory enumeration and the concurrent ingest pipeline
//!
//! # Ingest Workflow
//!
//! 1. **Enumerate**: walk every scan root and collect candidate files
//! 2. **Dispatch**: queue paths to a fixed-size worker pool
//! 3. **Extract**: decode each file and normalize it into a record
//! 4. **Upsert**: persist the record, deduplicated by SOP instance id
//! 5. **Report**: aggregate counts into an ingest summary
//!
//! # Example
//!
//! ```rust,no_run
//! use dicom_indexer::adapters::database::InMemoryStore;
//! use dicom_indexer::adapters::dicom::DicomFileDecoder;
//! use dicom_indexer::core::extract::RecordNormalizer;
//! use dicom_indexer::core::scan::{DirectoryEnumerator, IngestCoordinator, IngestOptions};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let files = DirectoryEnumerator::new(false).enumerate(&[PathBuf::from("/data/dicom")]);
//!
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! let coordinator = IngestCoordinator::new(
//!     RecordNormalizer::new(Arc::new(DicomFileDecoder::new())),
//!     Arc::new(InMemoryStore::new()),
//!     IngestOptions::default(),
//!     shutdown_rx,
//! );
//!
//! let summary = coordinator.run(files.files).await;
//! println!("{}/{} files ingested", summary.success_count(), summary.total_count());
//! # }
//! ```

pub mod extract;
pub mod scan;
