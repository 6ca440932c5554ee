//! Error types for modelgen.
//!
//! `ModelgenError` is fatal to a run. `EmitError` is scoped to a single table
//! and never aborts generation of the others.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that abort a generation run.
#[derive(Error, Debug)]
pub enum ModelgenError {
    #[error("failed to read migrations directory: {path}")]
    MigrationsDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read migration file: {path}")]
    MigrationRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create output directory: {path}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("database connection string is not set (use --database-url or DB_CONNECTION_STRING)")]
    MissingDatabaseUrl,

    #[error("failed to connect to database")]
    Connect(#[source] sqlx::Error),

    #[error("catalog query failed")]
    Catalog(#[from] sqlx::Error),

    #[error("catalog introspection timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Per-table rendering failures. Logged and skipped by the run.
#[derive(Error, Debug)]
pub enum EmitError {
    #[error("table `{table}` does not produce a valid type name")]
    InvalidTypeName { table: String },

    #[error("table `{table}` does not produce a plain file name")]
    InvalidFileName { table: String },

    #[error("columns of table `{table}` collide on field `{field}`")]
    DuplicateField { table: String, field: String },

    #[error("generated source for table `{table}` does not parse: {message}")]
    Unparsable { table: String, message: String },

    #[error("failed to write model file: {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors loading the TOML settings file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ModelgenError>;
