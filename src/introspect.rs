//! Live Postgres catalog introspection.
//!
//! Builds the same [`TableSchema`] values the migration accumulator produces,
//! straight from `information_schema`. There is no evolution phase: the
//! result reflects the database as it is now.

use std::future::Future;
use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use tracing::{debug, info};

use crate::error::{ModelgenError, Result};
use crate::schema::{ColumnSchema, TableSchema};
use crate::source::SchemaSource;

const TABLES_SQL: &str = "SELECT table_name::text AS table_name
     FROM information_schema.tables
     WHERE table_schema = $1 AND table_type = 'BASE TABLE'
     ORDER BY table_name";

const COLUMNS_SQL: &str = "SELECT c.column_name::text AS column_name,
            c.data_type::text AS data_type,
            c.udt_name::text AS udt_name,
            c.is_nullable::text AS is_nullable,
            (pk.column_name IS NOT NULL) AS is_primary_key
     FROM information_schema.columns c
     LEFT JOIN (
         SELECT kcu.column_name
         FROM information_schema.table_constraints tc
         JOIN information_schema.key_column_usage kcu
           ON tc.constraint_name = kcu.constraint_name
          AND tc.table_schema = kcu.table_schema
          AND tc.table_name = kcu.table_name
         WHERE tc.constraint_type = 'PRIMARY KEY'
           AND tc.table_schema = $1
           AND tc.table_name = $2
     ) pk ON pk.column_name = c.column_name
     WHERE c.table_schema = $1 AND c.table_name = $2
     ORDER BY c.ordinal_position";

/// Schema source backed by a live database.
#[derive(Debug, Clone)]
pub struct CatalogSource {
    url: String,
    schema: String,
    timeout: Duration,
}

impl CatalogSource {
    pub fn new(url: impl Into<String>, schema: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            schema: schema.into(),
            timeout,
        }
    }

    /// Run the whole introspection under the configured timeout. Dropping
    /// the returned future cancels any in-flight query.
    pub async fn introspect(&self) -> Result<Vec<TableSchema>> {
        tokio::time::timeout(self.timeout, self.introspect_unbounded())
            .await
            .map_err(|_| ModelgenError::Timeout(self.timeout))?
    }

    async fn introspect_unbounded(&self) -> Result<Vec<TableSchema>> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(self.timeout)
            .connect(&self.url)
            .await
            .map_err(ModelgenError::Connect)?;

        let tables = read_tables(&pool, &self.schema).await;
        pool.close().await;
        let tables = tables?;

        info!(schema = %self.schema, tables = tables.len(), "schema read from database catalog");
        Ok(tables)
    }
}

async fn read_tables(pool: &PgPool, schema: &str) -> Result<Vec<TableSchema>> {
    let names: Vec<String> = sqlx::query_scalar(TABLES_SQL)
        .bind(schema)
        .fetch_all(pool)
        .await?;

    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        let rows = sqlx::query(COLUMNS_SQL)
            .bind(schema)
            .bind(&name)
            .fetch_all(pool)
            .await?;

        let mut table = TableSchema::new(&name);
        for row in rows {
            let column: String = row.try_get("column_name")?;
            let data_type: String = row.try_get("data_type")?;
            let udt_name: String = row.try_get("udt_name")?;
            let is_nullable: String = row.try_get("is_nullable")?;
            let is_primary_key: bool = row.try_get("is_primary_key")?;

            table.push_column(column_from_catalog(
                &column,
                &data_type,
                &udt_name,
                &is_nullable,
                is_primary_key,
            ));
        }
        debug!(table = %name, columns = table.columns().len(), "table introspected");
        tables.push(table);
    }

    Ok(tables)
}

/// Build a column from one `information_schema.columns` row.
///
/// `USER-DEFINED` types (`citext`, enums) report their real name in
/// `udt_name`.
pub fn column_from_catalog(
    name: &str,
    data_type: &str,
    udt_name: &str,
    is_nullable: &str,
    is_primary_key: bool,
) -> ColumnSchema {
    let sql_type = if data_type.eq_ignore_ascii_case("USER-DEFINED") {
        udt_name
    } else {
        data_type
    };
    ColumnSchema::new(
        name,
        sql_type,
        is_nullable.eq_ignore_ascii_case("YES"),
        is_primary_key,
    )
}

impl SchemaSource for CatalogSource {
    fn label(&self) -> &'static str {
        "database"
    }

    fn load_tables(&self) -> impl Future<Output = Result<Vec<TableSchema>>> + Send {
        self.introspect()
    }
}
