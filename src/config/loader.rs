//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{DatabaseTarget, IndexerConfig};
use crate::adapters::database::DuplicatePolicy;
use crate::config::secret_string;
use crate::domain::errors::IndexerError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Prefix of environment variables that override file settings
pub const ENV_PREFIX: &str = "DICOM_INDEXER_";

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`IndexerConfig`]
/// 4. Applies environment variable overrides (`DICOM_INDEXER_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns a configuration error if the file cannot be read or parsed, a
/// referenced variable is unset, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use dicom_indexer::config::load_config;
///
/// let config = load_config("dicom-indexer.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<IndexerConfig> {
    let config = load_config_unvalidated(path)?;
    validate(&config)?;
    Ok(config)
}

/// Loads configuration like [`load_config`] but skips validation
///
/// For callers that layer their own overrides (CLI arguments) on top and
/// validate the merged result with [`IndexerConfig::validate`].
pub fn load_config_unvalidated(path: impl AsRef<Path>) -> Result<IndexerConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(IndexerError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        IndexerError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_unvalidated(&contents)
}

/// Parses configuration from TOML text
///
/// Applies the same substitution, overrides and validation as [`load_config`].
pub fn parse_config(contents: &str) -> Result<IndexerConfig> {
    let config = parse_unvalidated(contents)?;
    validate(&config)?;
    Ok(config)
}

fn parse_unvalidated(contents: &str) -> Result<IndexerConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: IndexerConfig = toml::from_str(&contents)
        .map_err(|e| IndexerError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;
    Ok(config)
}

fn validate(config: &IndexerConfig) -> Result<()> {
    config.validate().map_err(|e| {
        IndexerError::Configuration(format!("Configuration validation failed: {e}"))
    })
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are left untouched. Every unset variable is reported at once.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| IndexerError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&format!("${{{var_name}}}"), &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(IndexerError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{key}")).ok()
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>> {
    match env_var(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            IndexerError::Configuration(format!("Invalid value '{raw}' for {ENV_PREFIX}{key}"))
        }),
    }
}

fn env_enum<T: serde::de::DeserializeOwned>(key: &str) -> Result<Option<T>> {
    match env_var(key) {
        None => Ok(None),
        Some(raw) => serde_json::from_value(serde_json::Value::String(raw.trim().to_lowercase()))
            .map(Some)
            .map_err(|_| {
                IndexerError::Configuration(format!(
                    "Invalid value '{raw}' for {ENV_PREFIX}{key}"
                ))
            }),
    }
}

/// Applies `DICOM_INDEXER_<SECTION>_<KEY>` environment overrides
///
/// Store sections are only overridden when present in the file.
fn apply_env_overrides(config: &mut IndexerConfig) -> Result<()> {
    if let Some(target) = env_enum::<DatabaseTarget>("DATABASE_TARGET")? {
        config.database_target = target;
    }

    // Application overrides
    if let Some(val) = env_var("APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Some(val) = env_parse("APPLICATION_DRY_RUN")? {
        config.application.dry_run = val;
    }

    // Scan overrides
    if let Some(val) = env_var("SCAN_DIRECTORIES") {
        config.scan.scan_directories = std::env::split_paths(&val).collect();
    }
    if let Some(val) = env_parse("SCAN_MAX_WORKERS")? {
        config.scan.max_workers = val;
    }
    if let Some(val) = env_parse("SCAN_QUEUE_CAPACITY")? {
        config.scan.queue_capacity = val;
    }
    if let Some(val) = env_parse("SCAN_TASK_TIMEOUT_SECONDS")? {
        config.scan.task_timeout_seconds = val;
    }
    if let Some(val) = env_parse("SCAN_FOLLOW_SYMLINKS")? {
        config.scan.follow_symlinks = val;
    }
    if let Some(val) = env_enum::<DuplicatePolicy>("SCAN_ON_DUPLICATE")? {
        config.scan.on_duplicate = val;
    }

    // PostgreSQL overrides
    if let Some(ref mut pg) = config.postgresql {
        if let Some(val) = env_var("POSTGRESQL_CONNECTION_STRING") {
            pg.connection_string = secret_string(val);
        }
        if let Some(val) = env_parse("POSTGRESQL_MAX_CONNECTIONS")? {
            pg.max_connections = val;
        }
        if let Some(val) = env_var("POSTGRESQL_SSL_MODE") {
            pg.ssl_mode = val;
        }
    }

    // PocketBase overrides
    if let Some(ref mut pb) = config.pocketbase {
        if let Some(val) = env_var("POCKETBASE_BASE_URL") {
            pb.base_url = val;
        }
        if let Some(val) = env_var("POCKETBASE_COLLECTION_NAME") {
            pb.collection_name = val;
        }
        if let Some(val) = env_var("POCKETBASE_ADMIN_EMAIL") {
            pb.admin_email = val;
        }
        if let Some(val) = env_var("POCKETBASE_ADMIN_PASSWORD") {
            pb.admin_password = secret_string(val);
        }
    }

    // Logging overrides
    if let Some(val) = env_parse("LOGGING_LOCAL_ENABLED")? {
        config.logging.local_enabled = val;
    }
    if let Some(val) = env_var("LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}
