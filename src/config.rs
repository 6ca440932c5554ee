//! Layered settings.
//!
//! Precedence, lowest first: built-in defaults, TOML file, environment
//! (after loading the `.env` file), command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ConfigError;

pub const DEFAULT_MIGRATIONS_DIR: &str = "internal/migrations/sql";
pub const DEFAULT_OUTPUT_DIR: &str = "internal/db/models";
pub const DEFAULT_ENV_FILE: &str = ".env";
pub const DEFAULT_SCHEMA: &str = "public";
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

/// Project-local settings file name.
pub const CONFIG_FILE_NAME: &str = "modelgen.toml";

pub const ENV_DATABASE_URL: &str = "DB_CONNECTION_STRING";
pub const ENV_DATABASE_URL_FALLBACK: &str = "DATABASE_URL";
pub const ENV_MIGRATIONS_DIR: &str = "MIGRATIONS_DIR";
pub const ENV_OUTPUT_DIR: &str = "MODELS_OUTPUT_DIR";
pub const ENV_SCHEMA: &str = "DB_SCHEMA";

/// Contents of `modelgen.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub migrations_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub from_db: Option<bool>,
    pub database_url: Option<String>,
    pub db_schema: Option<String>,
    pub query_timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub env_file: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub migrations_dir: Option<PathBuf>,
    pub from_db: bool,
    pub database_url: Option<String>,
    pub db_schema: Option<String>,
    pub query_timeout_secs: Option<u64>,
}

/// Result of loading the `.env`-style file. Logged by the caller once
/// logging is set up, so the file can itself configure `RUST_LOG`.
#[derive(Debug)]
pub enum EnvFile {
    Loaded(PathBuf),
    NotLoaded { path: PathBuf, error: dotenvy::Error },
}

impl EnvFile {
    pub fn log(&self) {
        match self {
            EnvFile::Loaded(path) => debug!(path = %path.display(), "loaded env file"),
            EnvFile::NotLoaded { path, error } => {
                warn!(path = %path.display(), error = %error, "env file not loaded")
            }
        }
    }
}

/// Load `path` (default `.env`) into the process environment. Variables that
/// are already set win.
pub fn load_env_file(path: Option<&Path>) -> EnvFile {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ENV_FILE));
    match dotenvy::from_path(&path) {
        Ok(()) => EnvFile::Loaded(path),
        Err(error) => EnvFile::NotLoaded { path, error },
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub output_dir: PathBuf,
    pub migrations_dir: PathBuf,
    pub from_db: bool,
    pub database_url: Option<String>,
    pub db_schema: String,
    pub query_timeout: Duration,
}

impl Settings {
    /// Load the `.env` file, the TOML file and the process environment, then
    /// apply `overrides` on top.
    pub fn load(overrides: &Overrides) -> Result<Self, ConfigError> {
        load_env_file(overrides.env_file.as_deref()).log();
        Self::from_environment(overrides)
    }

    /// Like [`Settings::load`], for callers that already loaded the env file.
    pub fn from_environment(overrides: &Overrides) -> Result<Self, ConfigError> {
        let file = match config_file(overrides.config_file.as_deref()) {
            Some(path) => {
                debug!(path = %path.display(), "reading config file");
                FileConfig::from_path(&path)?
            }
            None => FileConfig::default(),
        };

        Ok(Self::resolve(file, |key| std::env::var(key).ok(), overrides))
    }

    /// Merge an already parsed file, an environment lookup and the flags.
    pub fn resolve(
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
        overrides: &Overrides,
    ) -> Self {
        let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let migrations_dir = overrides
            .migrations_dir
            .clone()
            .or_else(|| lookup(ENV_MIGRATIONS_DIR).map(PathBuf::from))
            .or(file.migrations_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MIGRATIONS_DIR));

        let output_dir = overrides
            .output_dir
            .clone()
            .or_else(|| lookup(ENV_OUTPUT_DIR).map(PathBuf::from))
            .or(file.output_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        let database_url = overrides
            .database_url
            .clone()
            .or_else(|| lookup(ENV_DATABASE_URL))
            .or_else(|| lookup(ENV_DATABASE_URL_FALLBACK))
            .or(file.database_url);

        let db_schema = overrides
            .db_schema
            .clone()
            .or_else(|| lookup(ENV_SCHEMA))
            .or(file.db_schema)
            .unwrap_or_else(|| DEFAULT_SCHEMA.to_string());

        let timeout_secs = overrides
            .query_timeout_secs
            .or(file.query_timeout_secs)
            .unwrap_or(DEFAULT_QUERY_TIMEOUT_SECS);

        Self {
            output_dir,
            migrations_dir,
            from_db: overrides.from_db || file.from_db.unwrap_or(false),
            database_url,
            db_schema,
            query_timeout: Duration::from_secs(timeout_secs),
        }
    }
}

/// The explicit `--config` path, else `./modelgen.toml`, else the user config
/// directory. Implicit locations are only used when they exist.
fn config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("modelgen").join("config.toml"))
        .filter(|path| path.is_file())
}
