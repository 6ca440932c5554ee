//! In-memory table and column schemas.
//!
//! Both schema producers (migration accumulation and catalog introspection)
//! build these types; the model emitter only ever reads them.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::{map_sql_type, RustType};

/// A column's current shape.
///
/// A primary-key column is never nullable; every mutator re-applies that
/// rule and recomputes the derived Rust type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSchema {
    name: String,
    sql_type: String,
    nullable: bool,
    primary_key: bool,
    rust_type: RustType,
}

impl ColumnSchema {
    pub fn new(
        name: impl Into<String>,
        sql_type: impl Into<String>,
        nullable: bool,
        primary_key: bool,
    ) -> Self {
        let sql_type = sql_type.into();
        let nullable = nullable && !primary_key;
        Self {
            name: name.into(),
            rust_type: map_sql_type(&sql_type, nullable),
            sql_type,
            nullable,
            primary_key,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sql_type(&self) -> &str {
        &self.sql_type
    }

    pub fn nullable(&self) -> bool {
        self.nullable
    }

    pub fn primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn rust_type(&self) -> RustType {
        self.rust_type
    }

    pub fn set_sql_type(&mut self, sql_type: impl Into<String>) {
        self.sql_type = sql_type.into();
        self.refresh();
    }

    /// Primary-key columns ignore requests to become nullable.
    pub fn set_nullable(&mut self, nullable: bool) {
        self.nullable = nullable;
        self.refresh();
    }

    pub fn mark_primary_key(&mut self) {
        self.primary_key = true;
        self.refresh();
    }

    fn refresh(&mut self) {
        if self.primary_key {
            self.nullable = false;
        }
        self.rust_type = map_sql_type(&self.sql_type, self.nullable);
    }
}

/// A table's ordered column list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSchema {
    name: String,
    columns: Vec<ColumnSchema>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut ColumnSchema> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// Append a column. Returns `false` and leaves the table untouched when
    /// a column with that name already exists.
    pub fn push_column(&mut self, column: ColumnSchema) -> bool {
        if self.column(&column.name).is_some() {
            return false;
        }
        self.columns.push(column);
        true
    }

    pub fn remove_column(&mut self, name: &str) -> Option<ColumnSchema> {
        let idx = self.columns.iter().position(|c| c.name == name)?;
        Some(self.columns.remove(idx))
    }

    pub fn primary_key(&self) -> impl Iterator<Item = &ColumnSchema> {
        self.columns.iter().filter(|c| c.primary_key)
    }
}

/// All tables known to a single generation run, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaStore {
    tables: BTreeMap<String, TableSchema>,
}

impl SchemaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    pub fn get(&self, table: &str) -> Option<&TableSchema> {
        self.tables.get(table)
    }

    pub fn get_mut(&mut self, table: &str) -> Option<&mut TableSchema> {
        self.tables.get_mut(table)
    }

    /// Insert a table unless one with the same name is already defined.
    pub fn define(&mut self, table: TableSchema) -> bool {
        if self.contains(&table.name) {
            return false;
        }
        self.tables.insert(table.name.clone(), table);
        true
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Settle the store into its tables, ordered by name.
    pub fn into_tables(self) -> Vec<TableSchema> {
        self.tables.into_values().collect()
    }
}
