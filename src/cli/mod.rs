//! CLI interface and argument parsing
//!
//! This module provides the command-line interface using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Exit codes shared by every command
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const PARTIAL_FAILURE: i32 = 1;
    pub const CONFIGURATION: i32 = 2;
    pub const CONNECTION: i32 = 4;
    pub const FATAL: i32 = 5;
    pub const INTERRUPTED: i32 = 130;
}

/// DICOM Indexer - DICOM tag extraction and indexing tool
#[derive(Parser, Debug)]
#[command(name = "dicom-indexer")]
#[command(version, about, long_about = None)]
#[command(author = "DICOM Indexer Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "dicom-indexer.toml", env = "DICOM_INDEXER_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "DICOM_INDEXER_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan the configured directories and index every DICOM file
    Scan(commands::scan::ScanArgs),

    /// Query indexed records with a JSON filter
    Search(commands::search::SearchArgs),

    /// Create the table or collection for records
    SetupSchema(commands::schema::SetupSchemaArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
