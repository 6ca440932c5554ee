//! The capability shared by every schema producer.

use std::future::Future;

use crate::error::Result;
use crate::schema::TableSchema;

/// Something that produces the settled table list a generation run emits.
///
/// Implemented by [`crate::migrations::MigrationSource`] (DDL accumulation)
/// and [`crate::introspect::CatalogSource`] (live catalog). Tables come back
/// ordered by name.
pub trait SchemaSource {
    /// Short label for logs and generated file headers.
    fn label(&self) -> &'static str;

    fn load_tables(&self) -> impl Future<Output = Result<Vec<TableSchema>>> + Send;
}
