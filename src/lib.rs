// DICOM Indexer - DICOM tag extraction and indexing tool
// Copyright (c) 2025 DICOM Indexer Contributors
// Licensed under the MIT License

//! # DICOM Indexer
//!
//! DICOM Indexer walks directories of medical image files, extracts a
//! normalized set of descriptive attributes from each, and stores one
//! deduplicated record per image instance in PostgreSQL or PocketBase.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Extracting** header attributes with per-field defaults and coercion
//! - **Classifying** the acquisition plane from the patient orientation
//! - **Ingesting** files concurrently with a bounded worker pool
//! - **Upserting** records keyed by SOP instance id
//! - **Searching** stored records with JSON filters
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (extraction, normalization, scan and ingest)
//! - [`adapters`] - External integrations (DICOM decoding, PostgreSQL, PocketBase)
//! - [`domain`] - Record model and error types
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dicom_indexer::adapters::database::{create_record_store, RecordStore};
//! use dicom_indexer::adapters::dicom::DicomFileDecoder;
//! use dicom_indexer::config::load_config;
//! use dicom_indexer::core::extract::RecordNormalizer;
//! use dicom_indexer::core::scan::{DirectoryEnumerator, IngestCoordinator, IngestOptions};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("dicom-indexer.toml")?;
//!     let store = create_record_store(&config).await?;
//!     store.ensure_schema().await?;
//!
//!     let files = DirectoryEnumerator::new(config.scan.follow_symlinks)
//!         .enumerate(&config.scan.scan_directories);
//!
//!     let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!     let coordinator = IngestCoordinator::new(
//!         RecordNormalizer::new(Arc::new(DicomFileDecoder::new())),
//!         store,
//!         IngestOptions::from_config(&config.scan, false),
//!         shutdown_rx,
//!     );
//!
//!     let summary = coordinator.run(files.files).await;
//!     println!("Indexed {} of {} files", summary.success_count(), summary.total_count());
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Library code returns [`domain::IndexerError`]. Per-file failures never
//! escape the ingest coordinator; they are counted in the summary.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
