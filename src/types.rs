//! SQL type to Rust type mapping.

use std::fmt;

use serde::{Serialize, Serializer};

/// Base Rust type a column maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TypeKind {
    Int32,
    Int64,
    Float64,
    Bool,
    Text,
    Date,
    Timestamp,
    TimestampTz,
    Time,
    Json,
}

impl TypeKind {
    /// Rust spelling used in generated models.
    pub fn rust_name(self) -> &'static str {
        match self {
            TypeKind::Int32 => "i32",
            TypeKind::Int64 => "i64",
            TypeKind::Float64 => "f64",
            TypeKind::Bool => "bool",
            TypeKind::Text => "String",
            TypeKind::Date => "NaiveDate",
            TypeKind::Timestamp => "NaiveDateTime",
            TypeKind::TimestampTz => "DateTime<Utc>",
            TypeKind::Time => "NaiveTime",
            TypeKind::Json => "JsonValue",
        }
    }

    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            TypeKind::Date | TypeKind::Timestamp | TypeKind::TimestampTz | TypeKind::Time
        )
    }

    /// Names a temporal type pulls in from `chrono`.
    pub fn chrono_imports(self) -> &'static [&'static str] {
        match self {
            TypeKind::Date => &["NaiveDate"],
            TypeKind::Timestamp => &["NaiveDateTime"],
            TypeKind::TimestampTz => &["DateTime", "Utc"],
            TypeKind::Time => &["NaiveTime"],
            _ => &[],
        }
    }
}

/// Derived target type of a column: a base kind plus optionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RustType {
    pub kind: TypeKind,
    pub optional: bool,
}

impl RustType {
    pub fn is_temporal(&self) -> bool {
        self.kind.is_temporal()
    }

    pub fn is_json(&self) -> bool {
        self.kind == TypeKind::Json
    }
}

impl fmt::Display for RustType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.optional {
            write!(f, "Option<{}>", self.kind.rust_name())
        } else {
            f.write_str(self.kind.rust_name())
        }
    }
}

impl Serialize for RustType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Lower-case a raw SQL type, drop every parenthesized precision/length group
/// and collapse whitespace: `NUMERIC (10, 2)` -> `numeric`,
/// `TIMESTAMP(3) WITH TIME ZONE` -> `timestamp with time zone`.
pub fn normalize_sql_type(raw: &str) -> String {
    let mut stripped = String::with_capacity(raw.len());
    let mut depth = 0usize;

    for c in raw.chars() {
        match c {
            '(' => {
                depth += 1;
                stripped.push(' ');
            }
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => stripped.push(c),
            _ => {}
        }
    }

    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Map a raw SQL type and nullability to the Rust type used in models.
///
/// Unknown types map to `String`. JSON payloads are never wrapped in
/// `Option`: `serde_json::Value::Null` already represents absence.
pub fn map_sql_type(sql_type: &str, nullable: bool) -> RustType {
    let kind = type_kind(&normalize_sql_type(sql_type));
    RustType {
        kind,
        optional: nullable && kind != TypeKind::Json,
    }
}

fn type_kind(normalized: &str) -> TypeKind {
    match normalized {
        "integer" | "int" | "int2" | "int4" | "smallint" | "serial" | "serial2" | "serial4"
        | "smallserial" => TypeKind::Int32,
        "bigint" | "int8" | "bigserial" | "serial8" => TypeKind::Int64,
        "numeric" | "decimal" | "real" | "float" | "float4" | "float8" | "double"
        | "double precision" => TypeKind::Float64,
        "boolean" | "bool" => TypeKind::Bool,
        "text" | "varchar" | "character varying" | "char" | "character" | "bpchar" | "citext" => {
            TypeKind::Text
        }
        "date" => TypeKind::Date,
        "timestamp" | "timestamp without time zone" | "datetime" => TypeKind::Timestamp,
        "timestamptz" | "timestamp with time zone" => TypeKind::TimestampTz,
        "time" | "timetz" | "time without time zone" | "time with time zone" => TypeKind::Time,
        "uuid" => TypeKind::Text,
        "json" | "jsonb" => TypeKind::Json,
        _ => TypeKind::Text,
    }
}
