//! Result type alias for the indexer

use super::errors::IndexerError;

/// Result type alias using `IndexerError` as the error type.
///
/// # Examples
///
/// ```
/// use dicom_indexer::domain::result::Result;
/// use dicom_indexer::domain::errors::IndexerError;
///
/// fn failing_function() -> Result<()> {
///     Err(IndexerError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, IndexerError>;
