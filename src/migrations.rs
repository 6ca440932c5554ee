//! Migration file discovery.
//!
//! Migrations live in one flat directory as `<version>_<description>.up.sql`.
//! Only `.up.sql` files are read; they are applied in ascending version order.

use std::future::Future;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::accumulator::apply_sql;
use crate::error::{ModelgenError, Result};
use crate::schema::{SchemaStore, TableSchema};
use crate::source::SchemaSource;

const UP_SUFFIX: &str = ".up.sql";

/// One `.up.sql` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    pub version: u64,
    pub file_name: String,
    pub path: PathBuf,
}

/// Version from the numeric prefix before the first `_`; anything that does
/// not parse is version 0.
pub fn parse_version(file_name: &str) -> u64 {
    let prefix = file_name.split('_').next().unwrap_or_default();
    prefix.parse().unwrap_or(0)
}

/// List `.up.sql` files in `dir`, ordered by version then file name.
pub fn discover(dir: &Path) -> Result<Vec<MigrationFile>> {
    let entries = std::fs::read_dir(dir).map_err(|source| ModelgenError::MigrationsDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ModelgenError::MigrationsDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !file_name.ends_with(UP_SUFFIX) {
            continue;
        }
        files.push(MigrationFile {
            version: parse_version(file_name),
            file_name: file_name.to_string(),
            path: path.clone(),
        });
    }

    files.sort_by(|a, b| {
        a.version
            .cmp(&b.version)
            .then_with(|| a.file_name.cmp(&b.file_name))
    });
    Ok(files)
}

/// Read and apply each file in order.
pub fn accumulate(files: &[MigrationFile]) -> Result<SchemaStore> {
    let mut store = SchemaStore::new();

    for file in files {
        let sql = std::fs::read_to_string(&file.path).map_err(|source| ModelgenError::MigrationRead {
            path: file.path.clone(),
            source,
        })?;
        debug!(file = %file.file_name, version = file.version, "applying migration");
        apply_sql(&mut store, &sql);
    }

    Ok(store)
}

/// Schema source backed by a migrations directory.
#[derive(Debug, Clone)]
pub struct MigrationSource {
    dir: PathBuf,
}

impl MigrationSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Discover, read and fold every migration into a settled store.
    pub fn build_store(&self) -> Result<SchemaStore> {
        let files = discover(&self.dir)?;
        if files.is_empty() {
            warn!(dir = %self.dir.display(), "no .up.sql migrations found");
        }
        let store = accumulate(&files)?;
        info!(
            dir = %self.dir.display(),
            migrations = files.len(),
            tables = store.len(),
            "schema accumulated from migrations"
        );
        Ok(store)
    }
}

impl SchemaSource for MigrationSource {
    fn label(&self) -> &'static str {
        "migrations"
    }

    fn load_tables(&self) -> impl Future<Output = Result<Vec<TableSchema>>> + Send {
        std::future::ready(self.build_store().map(SchemaStore::into_tables))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("000001_create_users.up.sql"), 1);
        assert_eq!(parse_version("20240120120000_add_age.up.sql"), 20240120120000);
        assert_eq!(parse_version("init_schema.up.sql"), 0);
        assert_eq!(parse_version("v2_thing.up.sql"), 0);
    }

    #[test]
    fn test_discover_filters_and_orders() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "10_later.up.sql",
            "2_second.up.sql",
            "2_second.down.sql",
            "1_first.up.sql",
            "notes.txt",
            "seed_data.up.sql",
        ] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        std::fs::create_dir(dir.path().join("3_dir.up.sql")).unwrap();

        let files = discover(dir.path()).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["seed_data.up.sql", "1_first.up.sql", "2_second.up.sql", "10_later.up.sql"]
        );
    }

    #[test]
    fn test_discover_missing_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, ModelgenError::MigrationsDir { .. }));
    }

    #[test]
    fn test_accumulate_in_version_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("2_add_age.up.sql"),
            "ALTER TABLE users ADD COLUMN age INT;",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("1_users.up.sql"),
            "CREATE TABLE users (id SERIAL PRIMARY KEY);",
        )
        .unwrap();

        let store = MigrationSource::new(dir.path()).build_store().unwrap();
        let users = store.get("users").unwrap();
        let names: Vec<_> = users.columns().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["id", "age"]);
    }
}
