//! Integration tests for configuration loading and validation
//!
//! Note: Tests that modify environment variables hold `ENV_MUTEX` to avoid
//! interference between tests.

use dicom_indexer::adapters::database::DuplicatePolicy;
use dicom_indexer::config::schema::DatabaseTarget;
use dicom_indexer::config::load_config;
use dicom_indexer::domain::IndexerError;
use secrecy::ExposeSecret;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn cleanup_env_vars() {
    std::env::remove_var("DICOM_INDEXER_POCKETBASE_COLLECTION_NAME");
    std::env::remove_var("DICOM_INDEXER_SCAN_ON_DUPLICATE");
    std::env::remove_var("DICOM_INDEXER_SCAN_MAX_WORKERS");
    std::env::remove_var("TEST_PB_PASSWORD");
}

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_complete_pocketbase_config() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("TEST_PB_PASSWORD", "pb-secret");

    let file = write_config(
        r#"
database_target = "pocketbase"

[application]
log_level = "debug"
dry_run = true

[scan]
scan_directories = ["/data/a", "/data/b"]
max_workers = 4
queue_capacity = 32
task_timeout_seconds = 10
follow_symlinks = true
on_duplicate = "skip"

[pocketbase]
base_url = "http://pb.internal:8090"
collection_name = "mri_files"
admin_email = "admin@example.com"
admin_password = "${TEST_PB_PASSWORD}"
timeout_seconds = 15

[logging]
local_enabled = true
local_path = "/tmp/dicom-indexer"
local_rotation = "hourly"
"#,
    );

    let config = load_config(file.path()).unwrap();

    assert_eq!(config.database_target, DatabaseTarget::PocketBase);
    assert_eq!(config.application.log_level, "debug");
    assert!(config.application.dry_run);
    assert_eq!(
        config.scan.scan_directories,
        vec![PathBuf::from("/data/a"), PathBuf::from("/data/b")]
    );
    assert_eq!(config.scan.max_workers, 4);
    assert_eq!(config.scan.queue_capacity, 32);
    assert_eq!(config.scan.task_timeout_seconds, 10);
    assert!(config.scan.follow_symlinks);
    assert_eq!(config.scan.on_duplicate, DuplicatePolicy::Skip);

    let pb = config.pocketbase.unwrap();
    assert_eq!(pb.base_url, "http://pb.internal:8090");
    assert_eq!(pb.collection_name, "mri_files");
    assert_eq!(pb.admin_password.expose_secret().as_ref(), "pb-secret");
    assert_eq!(pb.timeout_seconds, 15);

    assert!(config.logging.local_enabled);
    assert_eq!(config.logging.local_rotation, "hourly");

    cleanup_env_vars();
}

#[test]
fn test_minimal_config_uses_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config(
        r#"
database_target = "postgresql"

[scan]
scan_directories = ["/data/dicom"]

[postgresql]
connection_string = "postgresql://indexer:pw@localhost:5432/dicom"
"#,
    );

    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.log_level, "info");
    assert!(!config.application.dry_run);
    assert_eq!(config.scan.max_workers, 8);
    assert_eq!(config.scan.queue_capacity, 256);
    assert_eq!(config.scan.task_timeout_seconds, 120);
    assert!(!config.scan.follow_symlinks);
    assert_eq!(config.scan.on_duplicate, DuplicatePolicy::Update);

    let pg = config.postgresql.unwrap();
    assert_eq!(pg.max_connections, 16);
    assert_eq!(pg.ssl_mode, "prefer");
    assert!(config.pocketbase.is_none());
    assert!(!config.logging.local_enabled);
}

#[test]
fn test_env_overrides_take_precedence() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("DICOM_INDEXER_POCKETBASE_COLLECTION_NAME", "override_files");
    std::env::set_var("DICOM_INDEXER_SCAN_ON_DUPLICATE", "skip");
    std::env::set_var("DICOM_INDEXER_SCAN_MAX_WORKERS", "2");

    let file = write_config(
        r#"
database_target = "pocketbase"

[scan]
scan_directories = ["/data/dicom"]
on_duplicate = "update"

[pocketbase]
admin_email = "admin@example.com"
admin_password = "secret"
"#,
    );

    let config = load_config(file.path()).unwrap();
    cleanup_env_vars();

    assert_eq!(config.scan.on_duplicate, DuplicatePolicy::Skip);
    assert_eq!(config.scan.max_workers, 2);
    assert_eq!(
        config.pocketbase.unwrap().collection_name,
        "override_files"
    );
}

#[test]
fn test_invalid_env_override_is_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("DICOM_INDEXER_SCAN_ON_DUPLICATE", "replace");

    let file = write_config(
        r#"
database_target = "memory"

[scan]
scan_directories = ["/data/dicom"]
"#,
    );

    let result = load_config(file.path());
    cleanup_env_vars();

    assert!(matches!(result, Err(IndexerError::Configuration(_))));
}

#[test]
fn test_missing_target_section_fails_validation() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config(
        r#"
database_target = "postgresql"

[scan]
scan_directories = ["/data/dicom"]
"#,
    );

    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("postgresql"));
}

#[test]
fn test_out_of_range_workers_fails_validation() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config(
        r#"
database_target = "memory"

[scan]
scan_directories = ["/data/dicom"]
max_workers = 0
"#,
    );

    assert!(load_config(file.path()).is_err());
}

#[test]
fn test_missing_file() {
    let result = load_config("/nonexistent/dicom-indexer.toml");
    assert!(matches!(result, Err(IndexerError::Configuration(_))));
}
