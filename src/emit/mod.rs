//! Model emitter.
//!
//! Renders one Rust source file per settled [`TableSchema`]. Rendering is a
//! pure function of the table, so callers may run it in parallel; writing is
//! a separate step.

pub mod naming;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::EmitError;
use crate::schema::{ColumnSchema, TableSchema};

use naming::{field_ident, type_name, unraw};

/// Extension of every generated model file.
pub const FILE_EXTENSION: &str = "rs";

const DERIVES: &str = "Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow";

/// Properties of a table's final column set that shape the rendered file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModelFlags {
    /// At least one column maps to a `chrono` type.
    pub temporal: bool,
    /// At least one column is wrapped in `Option`.
    pub optional: bool,
    /// At least one column carries a raw JSON payload.
    pub json: bool,
}

impl ModelFlags {
    pub fn scan(table: &TableSchema) -> Self {
        table
            .columns()
            .iter()
            .map(ColumnSchema::rust_type)
            .fold(Self::default(), |flags, ty| Self {
                temporal: flags.temporal || ty.is_temporal(),
                optional: flags.optional || ty.optional,
                json: flags.json || ty.is_json(),
            })
    }
}

/// A rendered, syntactically valid model ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedModel {
    pub table: String,
    pub type_name: String,
    pub file_name: String,
    pub flags: ModelFlags,
    pub source: String,
}

/// What happened to a model file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(PathBuf),
    Unchanged(PathBuf),
}

/// `<table>.rs`, or `None` when the table name is not a plain file stem
/// (path separators, `..`, NUL, leading `.`).
pub fn file_name(table: &str) -> Option<String> {
    let plain = !table.is_empty()
        && !table.starts_with('.')
        && !table.contains(['/', '\\', '\0'])
        && !table.contains("..");
    plain.then(|| format!("{table}.{FILE_EXTENSION}"))
}

/// Render the model for one table. `origin` names the schema source in the
/// file header.
pub fn render_model(table: &TableSchema, origin: &str) -> Result<RenderedModel, EmitError> {
    let invalid = || EmitError::InvalidTypeName {
        table: table.name().to_string(),
    };
    let file_name = file_name(table.name()).ok_or_else(|| EmitError::InvalidFileName {
        table: table.name().to_string(),
    })?;
    let type_name = type_name(table.name()).ok_or_else(invalid)?;
    if syn::parse_str::<syn::Ident>(&type_name).is_err() {
        return Err(invalid());
    }

    let mut fields = BTreeSet::new();
    for col in table.columns() {
        let field = field_ident(col.name());
        if !fields.insert(unraw(&field).to_string()) {
            return Err(EmitError::DuplicateField {
                table: table.name().to_string(),
                field,
            });
        }
    }

    let flags = ModelFlags::scan(table);
    let source = render_source(table, &type_name, flags, origin);

    syn::parse_file(&source).map_err(|e| EmitError::Unparsable {
        table: table.name().to_string(),
        message: e.to_string(),
    })?;

    Ok(RenderedModel {
        table: table.name().to_string(),
        type_name,
        file_name,
        flags,
        source,
    })
}

fn render_source(table: &TableSchema, type_name: &str, flags: ModelFlags, origin: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "// Code generated by modelgen from {origin}. DO NOT EDIT.\n\n"
    ));
    output.push_str(&render_imports(table, flags));

    output.push_str(&format!("/// Row of the `{}` table.\n", table.name()));
    output.push_str(&format!("#[derive({DERIVES})]\n"));
    output.push_str(&format!("pub struct {type_name} {{\n"));
    for col in table.columns() {
        output.push_str(&render_field(col));
    }
    output.push_str("}\n\n");

    let columns: Vec<String> = table.columns().iter().map(|c| format!("{:?}", c.name())).collect();
    let keys: Vec<String> = table.primary_key().map(|c| format!("{:?}", c.name())).collect();

    output.push_str(&format!("impl {type_name} {{\n"));
    output.push_str(&format!(
        "    pub const TABLE_NAME: &'static str = {:?};\n\n",
        table.name()
    ));
    output.push_str(&format!(
        "    pub const COLUMNS: &'static [&'static str] = &[{}];\n\n",
        columns.join(", ")
    ));
    output.push_str(&format!(
        "    pub const PRIMARY_KEY: &'static [&'static str] = &[{}];\n\n",
        keys.join(", ")
    ));
    output.push_str("    pub fn table_name() -> &'static str {\n");
    output.push_str("        Self::TABLE_NAME\n");
    output.push_str("    }\n");
    output.push_str("}\n");

    output
}

fn render_imports(table: &TableSchema, flags: ModelFlags) -> String {
    let mut output = String::new();

    if flags.temporal {
        let names: BTreeSet<&str> = table
            .columns()
            .iter()
            .flat_map(|c| c.rust_type().kind.chrono_imports().iter().copied())
            .collect();
        let names: Vec<&str> = names.into_iter().collect();
        match names.as_slice() {
            [single] => output.push_str(&format!("use chrono::{single};\n")),
            many => output.push_str(&format!("use chrono::{{{}}};\n", many.join(", "))),
        }
    }
    output.push_str("use serde::{Deserialize, Serialize};\n");
    if flags.json {
        output.push_str("use serde_json::Value as JsonValue;\n");
    }
    output.push('\n');

    output
}

fn render_field(col: &ColumnSchema) -> String {
    let ident = field_ident(col.name());
    let ty = col.rust_type();
    let mut output = String::new();

    let sql_type = col.sql_type().split_whitespace().collect::<Vec<_>>().join(" ");
    if col.primary_key() {
        output.push_str(&format!("    /// `{sql_type}`, primary key\n"));
    } else {
        output.push_str(&format!("    /// `{sql_type}`\n"));
    }

    if unraw(&ident) != col.name() {
        output.push_str(&format!("    #[serde(rename = {:?})]\n", col.name()));
        output.push_str(&format!("    #[sqlx(rename = {:?})]\n", col.name()));
    }
    if ty.optional {
        output.push_str("    #[serde(default, skip_serializing_if = \"Option::is_none\")]\n");
    }
    output.push_str(&format!("    pub {ident}: {ty},\n"));

    output
}

/// Write a rendered model into `dir`, leaving byte-identical files alone.
pub fn write_model(dir: &Path, model: &RenderedModel) -> Result<WriteOutcome, EmitError> {
    if file_name(&model.table).as_deref() != Some(model.file_name.as_str()) {
        return Err(EmitError::InvalidFileName {
            table: model.table.clone(),
        });
    }
    let path = dir.join(&model.file_name);

    if let Ok(existing) = std::fs::read(&path) {
        if existing == model.source.as_bytes() {
            return Ok(WriteOutcome::Unchanged(path));
        }
    }

    std::fs::write(&path, &model.source).map_err(|source| EmitError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(WriteOutcome::Written(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn users() -> TableSchema {
        let mut table = TableSchema::new("users");
        table.push_column(ColumnSchema::new("id", "SERIAL", false, true));
        table.push_column(ColumnSchema::new("email", "VARCHAR(255)", false, false));
        table.push_column(ColumnSchema::new("bio", "TEXT", true, false));
        table
    }

    #[test]
    fn test_render_users_model() {
        let model = render_model(&users(), "migrations").unwrap();
        assert_eq!(model.type_name, "User");
        assert_eq!(model.file_name, "users.rs");
        assert_eq!(
            model.source,
            r#"// Code generated by modelgen from migrations. DO NOT EDIT.

use serde::{Deserialize, Serialize};

/// Row of the `users` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// `SERIAL`, primary key
    pub id: i32,
    /// `VARCHAR(255)`
    pub email: String,
    /// `TEXT`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl User {
    pub const TABLE_NAME: &'static str = "users";

    pub const COLUMNS: &'static [&'static str] = &["id", "email", "bio"];

    pub const PRIMARY_KEY: &'static [&'static str] = &["id"];

    pub fn table_name() -> &'static str {
        Self::TABLE_NAME
    }
}
"#
        );
    }

    #[test]
    fn test_flags() {
        let mut table = TableSchema::new("events");
        table.push_column(ColumnSchema::new("id", "BIGSERIAL", false, true));
        assert_eq!(ModelFlags::scan(&table), ModelFlags::default());

        table.push_column(ColumnSchema::new("payload", "JSONB", true, false));
        table.push_column(ColumnSchema::new("at", "TIMESTAMPTZ", true, false));
        assert_eq!(
            ModelFlags::scan(&table),
            ModelFlags {
                temporal: true,
                optional: true,
                json: true,
            }
        );
    }

    #[test]
    fn test_imports_only_used_chrono_names() {
        let mut table = TableSchema::new("events");
        table.push_column(ColumnSchema::new("at", "TIMESTAMPTZ", false, false));
        table.push_column(ColumnSchema::new("day", "DATE", true, false));
        table.push_column(ColumnSchema::new("payload", "JSON", true, false));

        let source = render_model(&table, "database").unwrap().source;
        assert!(source.contains("use chrono::{DateTime, NaiveDate, Utc};\n"));
        assert!(source.contains("use serde_json::Value as JsonValue;\n"));
        assert!(source.contains("pub payload: JsonValue,"));
        assert!(!source.contains("NaiveTime"));

        let mut table = TableSchema::new("logs");
        table.push_column(ColumnSchema::new("at", "TIMESTAMP", false, false));
        let source = render_model(&table, "database").unwrap().source;
        assert!(source.contains("use chrono::NaiveDateTime;\n"));
        assert!(!source.contains("serde_json"));
    }

    #[test]
    fn test_renamed_and_keyword_fields() {
        let mut table = TableSchema::new("items");
        table.push_column(ColumnSchema::new("type", "TEXT", false, false));
        table.push_column(ColumnSchema::new("displayName", "TEXT", false, false));

        let source = render_model(&table, "migrations").unwrap().source;
        assert!(source.contains("    pub r#type: String,\n"));
        assert!(!source.contains("rename = \"type\""));
        assert!(source.contains(
            "    #[serde(rename = \"displayName\")]\n    #[sqlx(rename = \"displayName\")]\n    pub display_name: String,\n"
        ));
    }

    #[test]
    fn test_invalid_type_name() {
        let table = TableSchema::new("123");
        let err = render_model(&table, "migrations").unwrap_err();
        assert!(matches!(err, EmitError::InvalidTypeName { .. }));

        let table = TableSchema::new("self");
        let err = render_model(&table, "migrations").unwrap_err();
        assert!(matches!(err, EmitError::InvalidTypeName { .. }));
    }

    #[test]
    fn test_colliding_fields() {
        let mut table = TableSchema::new("people");
        table.push_column(ColumnSchema::new("firstName", "TEXT", true, false));
        table.push_column(ColumnSchema::new("first_name", "TEXT", true, false));

        let err = render_model(&table, "migrations").unwrap_err();
        assert!(matches!(err, EmitError::DuplicateField { ref field, .. } if field == "first_name"));
    }

    #[test]
    fn test_file_name_must_be_plain() {
        assert_eq!(file_name("users").as_deref(), Some("users.rs"));
        assert_eq!(file_name("User Data").as_deref(), Some("User Data.rs"));
        for bad in ["../../escaped", "a/b", "a\\b", "..", ".hidden", "nul\0", ""] {
            assert_eq!(file_name(bad), None, "{bad:?}");
        }

        let mut table = TableSchema::new("../escaped");
        table.push_column(ColumnSchema::new("id", "INT", false, true));
        let err = render_model(&table, "migrations").unwrap_err();
        assert!(matches!(err, EmitError::InvalidFileName { .. }));
    }

    #[test]
    fn test_reserved_type_name_gets_suffix() {
        let mut table = TableSchema::new("options");
        table.push_column(ColumnSchema::new("id", "INT", false, true));
        table.push_column(ColumnSchema::new("label", "TEXT", true, false));

        let model = render_model(&table, "migrations").unwrap();
        assert_eq!(model.type_name, "OptionRow");
        assert_eq!(model.file_name, "options.rs");
        assert!(model.source.contains("pub struct OptionRow {"));
        assert!(model.source.contains("pub label: Option<String>,"));
        assert!(model.source.contains("impl OptionRow {"));
    }

    #[test]
    fn test_write_model_rejects_tampered_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut model = render_model(&users(), "migrations").unwrap();
        model.file_name = "../users.rs".to_string();

        let err = write_model(&dir.path().join("models"), &model).unwrap_err();
        assert!(matches!(err, EmitError::InvalidFileName { .. }));
        assert!(!dir.path().join("users.rs").exists());
    }

    #[test]
    fn test_write_model_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let model = render_model(&users(), "migrations").unwrap();

        let first = write_model(dir.path(), &model).unwrap();
        assert_eq!(first, WriteOutcome::Written(dir.path().join("users.rs")));

        let second = write_model(dir.path(), &model).unwrap();
        assert_eq!(second, WriteOutcome::Unchanged(dir.path().join("users.rs")));
    }
}
