//! Folds an ordered DDL stream into per-table schemas.
//!
//! A table is created by its first `CREATE TABLE` and mutated in place by
//! later `ALTER TABLE` statements. Statements that reference a table which is
//! not yet defined are ignored, so callers must feed sources in ascending
//! migration order.

use tracing::{debug, warn};

use crate::ddl::columns::{extract_fragments, parse_column_definition, primary_key_columns, Fragment};
use crate::ddl::splitter::split_statements;
use crate::ddl::statement::{classify, unsupported_change, ColumnAction, Statement};
use crate::schema::{ColumnSchema, SchemaStore, TableSchema};

/// Split, classify and apply every statement of one DDL source.
pub fn apply_sql(store: &mut SchemaStore, sql: &str) {
    for raw in split_statements(sql) {
        if let Some(change) = unsupported_change(&raw) {
            warn!(change, statement = %head(&raw), "unsupported schema change ignored");
        }
        for statement in classify(&raw) {
            if statement == Statement::Unrecognized {
                debug!(statement = %head(&raw), "skipping unrecognized statement");
                continue;
            }
            apply(store, &statement);
        }
    }
}

/// Apply a single classified statement.
pub fn apply(store: &mut SchemaStore, statement: &Statement) {
    match statement {
        Statement::CreateTable { table, columns } => create_table(store, table, columns),
        Statement::AlterAddColumn { table, clause } => {
            if let Some(schema) = defined(store, table) {
                add_columns(schema, clause);
            }
        }
        Statement::AlterAlterColumn {
            table,
            column,
            action,
        } => {
            let Some(schema) = defined(store, table) else {
                return;
            };
            let Some(col) = schema.column_mut(column) else {
                debug!(table = %table, column = %column, "ALTER COLUMN on unknown column ignored");
                return;
            };
            match action {
                ColumnAction::SetType(sql_type) => col.set_sql_type(sql_type.as_str()),
                ColumnAction::SetNotNull => col.set_nullable(false),
                ColumnAction::DropNotNull => col.set_nullable(true),
            }
        }
        Statement::AlterDropColumn { table, column } => {
            if let Some(schema) = defined(store, table) {
                if schema.remove_column(column).is_none() {
                    debug!(table = %table, column = %column, "DROP COLUMN on unknown column ignored");
                }
            }
        }
        Statement::Unrecognized => {}
    }
}

fn defined<'a>(store: &'a mut SchemaStore, table: &str) -> Option<&'a mut TableSchema> {
    let schema = store.get_mut(table);
    if schema.is_none() {
        debug!(table = %table, "ALTER on undefined table ignored");
    }
    schema
}

fn create_table(store: &mut SchemaStore, table: &str, columns: &str) {
    if store.contains(table) {
        debug!(table = %table, "table already defined, CREATE ignored");
        return;
    }

    let mut schema = TableSchema::new(table);
    let mut keys = Vec::new();

    for fragment in extract_fragments(columns) {
        match fragment {
            Fragment::Column(text) => {
                if let Some(def) = parse_column_definition(text) {
                    schema.push_column(ColumnSchema::new(
                        def.name,
                        def.sql_type,
                        def.nullable,
                        def.primary_key,
                    ));
                }
            }
            Fragment::Constraint(text) => keys.extend(primary_key_columns(text)),
        }
    }

    mark_primary_keys(&mut schema, &keys);
    store.define(schema);
}

fn add_columns(schema: &mut TableSchema, clause: &str) {
    let mut keys = Vec::new();

    for fragment in extract_fragments(clause) {
        match fragment {
            Fragment::Column(text) => {
                let text = strip_add_prefix(text);
                let Some(def) = parse_column_definition(text) else {
                    continue;
                };
                let name = def.name.clone();
                let added = schema.push_column(ColumnSchema::new(
                    def.name,
                    def.sql_type,
                    def.nullable,
                    def.primary_key,
                ));
                if !added {
                    debug!(table = %schema.name(), column = %name, "column already present, ADD ignored");
                }
            }
            Fragment::Constraint(text) => keys.extend(primary_key_columns(text)),
        }
    }

    mark_primary_keys(schema, &keys);
}

/// `ADD (a INT, ADD COLUMN b TEXT)` style clauses can repeat the keyword on
/// later fragments.
fn strip_add_prefix(fragment: &str) -> &str {
    let mut rest = fragment.trim();
    for word in ["ADD", "COLUMN"] {
        if let Some(after) = strip_word(rest, word) {
            rest = after;
        }
    }
    rest
}

fn strip_word<'a>(input: &'a str, word: &str) -> Option<&'a str> {
    let head = input.get(..word.len())?;
    let tail = &input[word.len()..];
    if head.eq_ignore_ascii_case(word) && tail.starts_with(char::is_whitespace) {
        Some(tail.trim_start())
    } else {
        None
    }
}

fn mark_primary_keys(schema: &mut TableSchema, keys: &[String]) {
    for key in keys {
        match schema.column_mut(key) {
            Some(col) => col.mark_primary_key(),
            None => debug!(table = %schema.name(), column = %key, "primary key names unknown column"),
        }
    }
}

/// First line of a statement, for log output.
fn head(statement: &str) -> &str {
    statement.lines().next().unwrap_or(statement).trim()
}
