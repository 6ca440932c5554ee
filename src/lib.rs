//! modelgen - typed Rust models from SQL migrations or a live Postgres catalog.
//!
//! Two interchangeable sources produce the same settled table list:
//! - [`migrations::MigrationSource`] folds an ordered set of `.up.sql` files
//!   through a small DDL interpreter (`CREATE TABLE`, `ALTER TABLE ... ADD /
//!   ALTER / DROP COLUMN`).
//! - [`introspect::CatalogSource`] reads `information_schema` directly.
//!
//! [`generate::generate`] renders one `<table>.rs` model per table.
//!
//! # Example
//! ```no_run
//! use modelgen::{generate, MigrationSource};
//! use std::path::Path;
//!
//! # async fn run() -> modelgen::Result<()> {
//! let source = MigrationSource::new("internal/migrations/sql");
//! let report = generate(&source, Path::new("internal/db/models")).await?;
//! println!("{} models", report.succeeded());
//! # Ok(())
//! # }
//! ```

pub mod accumulator;
pub mod config;
pub mod ddl;
pub mod emit;
pub mod error;
pub mod generate;
pub mod introspect;
pub mod migrations;
pub mod schema;
pub mod source;
pub mod types;

pub use config::{Overrides, Settings};
pub use error::{ConfigError, EmitError, ModelgenError, Result};
pub use generate::{emit_all, generate, GenerationReport};
pub use introspect::CatalogSource;
pub use migrations::MigrationSource;
pub use schema::{ColumnSchema, SchemaStore, TableSchema};
pub use source::SchemaSource;
pub use types::{map_sql_type, RustType, TypeKind};

/// Parse DDL text into a fresh schema store.
///
/// ```
/// let store = modelgen::parse_schema("CREATE TABLE users (id SERIAL PRIMARY KEY);");
/// assert!(store.contains("users"));
/// ```
pub fn parse_schema(sql: &str) -> SchemaStore {
    let mut store = SchemaStore::new();
    accumulator::apply_sql(&mut store, sql);
    store
}
