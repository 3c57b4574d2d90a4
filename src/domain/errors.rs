//! Domain error types
//!
//! This module defines the error hierarchy for the indexer.
//! Errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main indexer error type
///
/// This is the primary error type used throughout the application.
/// It wraps the component-specific error types below.
#[derive(Debug, Error)]
pub enum IndexerError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Tag extraction errors for a single file
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// PocketBase-related errors
    #[error("PocketBase error: {0}")]
    PocketBase(#[from] PocketBaseError),

    /// Database-related errors (generic)
    #[error("Database error: {0}")]
    Database(String),

    /// Directory scan errors
    #[error("Scan error: {0}")]
    Scan(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Network/connection errors
    #[error("Connection error: {0}")]
    Connection(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// A per-file task exceeded its time budget
    #[error("Timed out after {seconds}s: {context}")]
    Timeout { seconds: u64, context: String },

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Errors that fail extraction of a whole record.
///
/// Any of these means the file produces no record and is counted as a failure.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExtractionError {
    /// The file disappeared between enumeration and decode
    #[error("File vanished before decode: {0}")]
    FileVanished(String),

    /// The external decoder rejected the file
    #[error("Failed to decode {path}: {message}")]
    Decode { path: String, message: String },

    /// Series date and time did not parse as `YYYYMMDDHHMMSS`
    #[error("Invalid series date/time '{value}': {message}")]
    InvalidDateTime { value: String, message: String },
}

/// Failure to coerce a single attribute.
///
/// Never fails a record on its own; the normalizer substitutes the default.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReadError {
    /// Raw value could not be coerced to the requested type
    #[error("Attribute {attribute} has malformed value '{value}' (expected {expected})")]
    Malformed {
        attribute: String,
        value: String,
        expected: &'static str,
    },

    /// A multi-valued attribute lacks the requested component
    #[error("Attribute {attribute} has no component at index {index}")]
    MissingComponent { attribute: String, index: usize },
}

/// PocketBase REST errors
#[derive(Debug, Error)]
pub enum PocketBaseError {
    /// Admin authentication was rejected
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Request could not be sent or timed out
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Server answered with an error status
    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body did not have the expected shape
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for IndexerError {
    fn from(err: std::io::Error) -> Self {
        IndexerError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for IndexerError {
    fn from(err: serde_json::Error) -> Self {
        IndexerError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for IndexerError {
    fn from(err: toml::de::Error) -> Self {
        IndexerError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl From<tokio_postgres::Error> for IndexerError {
    fn from(err: tokio_postgres::Error) -> Self {
        IndexerError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexer_error_display() {
        let err = IndexerError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_extraction_error_conversion() {
        let err = ExtractionError::FileVanished("/data/a.dcm".to_string());
        let indexer_err: IndexerError = err.into();
        assert!(matches!(indexer_err, IndexerError::Extraction(_)));
        assert!(indexer_err.to_string().contains("/data/a.dcm"));
    }

    #[test]
    fn test_pocketbase_error_conversion() {
        let err = PocketBaseError::Status {
            status: 403,
            message: "forbidden".to_string(),
        };
        let indexer_err: IndexerError = err.into();
        assert!(matches!(indexer_err, IndexerError::PocketBase(_)));
        assert_eq!(
            indexer_err.to_string(),
            "PocketBase error: Server returned 403: forbidden"
        );
    }

    #[test]
    fn test_read_error_display() {
        let err = ReadError::Malformed {
            attribute: "KVP".to_string(),
            value: "abc".to_string(),
            expected: "float",
        };
        assert_eq!(
            err.to_string(),
            "Attribute KVP has malformed value 'abc' (expected float)"
        );
    }

    #[test]
    fn test_timeout_display() {
        let err = IndexerError::Timeout {
            seconds: 5,
            context: "/data/slow.dcm".to_string(),
        };
        assert_eq!(err.to_string(), "Timed out after 5s: /data/slow.dcm");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: IndexerError = io_err.into();
        assert!(matches!(err, IndexerError::Io(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: IndexerError = toml_err.into();
        assert!(matches!(err, IndexerError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }
}
