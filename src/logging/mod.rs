//! Logging and observability
//!
//! Structured logging with:
//! - Console output
//! - JSON file output with daily, hourly or no rotation
//! - Level from config, overridable by `RUST_LOG`
//!
//! # Example
//!
//! ```no_run
//! use dicom_indexer::config::LoggingConfig;
//! use dicom_indexer::logging::init_logging;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, parse_log_level, LoggingGuard};
