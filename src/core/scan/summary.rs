//! Ingest summary and reporting
//!
//! This module defines structures for tracking and reporting ingest results.

use std::path::PathBuf;
use std::time::Duration;

/// One file that could not be ingested
#[derive(Debug, Clone, PartialEq)]
pub struct IngestFailure {
    /// Path as it was dispatched
    pub path: PathBuf,

    /// Rendered error
    pub message: String,
}

impl IngestFailure {
    pub fn new(path: PathBuf, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }
}

/// Summary of an ingest run
#[derive(Debug, Clone, Default)]
pub struct IngestSummary {
    /// Number of paths handed to the coordinator
    pub total: usize,

    /// Files normalized and persisted (or normalized only, in dry-run mode)
    pub successful: usize,

    /// Files that failed at any stage, including timeouts
    pub failed: usize,

    /// New records written
    pub inserted: usize,

    /// Existing records overwritten
    pub updated: usize,

    /// Existing records left untouched under the skip policy
    pub skipped_duplicates: usize,

    /// Tasks that hit the per-task timeout (also counted in `failed`)
    pub timed_out: usize,

    /// Paths never dispatched because shutdown was requested
    pub not_dispatched: usize,

    /// Whether the run stopped early on a shutdown request
    pub interrupted: bool,

    /// Whether records were normalized without being written
    pub dry_run: bool,

    /// Wall-clock duration of the run
    pub duration: Duration,

    /// Per-file failure details
    pub failures: Vec<IngestFailure>,
}

impl IngestSummary {
    /// Create a new empty summary
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn success_count(&self) -> usize {
        self.successful
    }

    pub fn total_count(&self) -> usize {
        self.total
    }

    /// Check if every dispatched file succeeded and the run was not interrupted
    pub fn is_successful(&self) -> bool {
        self.failed == 0 && !self.interrupted
    }

    /// Get success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.successful as f64 / self.total as f64) * 100.0
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            total = self.total,
            successful = self.successful,
            failed = self.failed,
            inserted = self.inserted,
            updated = self.updated,
            skipped_duplicates = self.skipped_duplicates,
            timed_out = self.timed_out,
            dry_run = self.dry_run,
            duration_secs = self.duration.as_secs(),
            success_rate = format!("{:.2}%", self.success_rate()),
            "Ingest completed"
        );

        if self.interrupted {
            tracing::warn!(
                not_dispatched = self.not_dispatched,
                "Ingest interrupted before all files were dispatched"
            );
        }

        if !self.failures.is_empty() {
            tracing::warn!(
                failure_count = self.failures.len(),
                "Ingest completed with failures"
            );
            for failure in &self.failures {
                tracing::warn!(
                    path = %failure.path.display(),
                    message = %failure.message,
                    "Ingest failure"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_summary_creation() {
        let summary = IngestSummary::new(10);

        assert_eq!(summary.total_count(), 10);
        assert_eq!(summary.success_count(), 0);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.duration, Duration::from_secs(0));
        assert!(summary.failures.is_empty());
        assert!(!summary.interrupted);
    }

    #[test]
    fn test_ingest_summary_is_successful() {
        let mut summary = IngestSummary::new(3);
        summary.successful = 3;
        assert!(summary.is_successful());

        summary.failed = 1;
        assert!(!summary.is_successful());

        summary.failed = 0;
        summary.interrupted = true;
        assert!(!summary.is_successful());
    }

    #[test]
    fn test_ingest_summary_success_rate() {
        let mut summary = IngestSummary::new(100);
        summary.successful = 95;
        assert_eq!(summary.success_rate(), 95.0);

        assert_eq!(IngestSummary::new(0).success_rate(), 100.0);
    }

    #[test]
    fn test_ingest_summary_with_duration() {
        let summary = IngestSummary::new(1).with_duration(Duration::from_secs(42));
        assert_eq!(summary.duration, Duration::from_secs(42));
    }
}
