//! Identifier conventions for generated models.

/// Rust keywords that cannot be used as plain identifiers.
const RUST_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl",
    "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub",
    "ref", "return", "self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// Keywords that are not allowed even as raw identifiers.
const NON_RAW_KEYWORDS: &[&str] = &["crate", "self", "super"];

/// Type names already used by generated models: prelude types, the field
/// types and the derives they import.
const RESERVED_TYPE_NAMES: &[&str] = &[
    "Box", "Clone", "DateTime", "Debug", "Deserialize", "Err", "FromRow", "JsonValue",
    "NaiveDate", "NaiveDateTime", "NaiveTime", "None", "Ok", "Option", "PartialEq", "Result",
    "Serialize", "Some", "String", "Utc", "Vec",
];

/// Appended to a type name that would shadow a reserved one.
const RESERVED_SUFFIX: &str = "Row";

/// Plural suffixes that drop a trailing `es`.
const ES_SUFFIXES: &[&str] = &["sses", "shes", "ches", "xes", "zes", "uses"];

/// Singular form of a lower-case English plural, good enough for table names.
pub fn singularize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    let len = word.len();

    if lower.ends_with("ies") && len > 3 {
        format!("{}y", &word[..len - 3])
    } else if ES_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
        word[..len - 2].to_string()
    } else if lower.ends_with("ss") || lower.ends_with("us") || lower.ends_with("is") {
        word.to_string()
    } else if lower.ends_with('s') && len > 1 {
        word[..len - 1].to_string()
    } else {
        word.to_string()
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// PascalCase singular type name for a table: `order_items` -> `OrderItem`.
///
/// A name that would shadow a type the model itself uses gets a `Row`
/// suffix (`options` -> `OptionRow`). Returns `None` when the table name has
/// no usable characters or would start with a digit.
pub fn type_name(table: &str) -> Option<String> {
    let words: Vec<&str> = table
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let (last, init) = words.split_last()?;

    let mut name: String = init.iter().map(|w| capitalize(w)).collect();
    name.push_str(&capitalize(&singularize(last)));

    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    if RESERVED_TYPE_NAMES.contains(&name.as_str()) {
        name.push_str(RESERVED_SUFFIX);
    }
    Some(name)
}

/// snake_case Rust field identifier for a column name. Keywords come back
/// as raw identifiers (`type` -> `r#type`).
pub fn field_ident(column: &str) -> String {
    let mut ident = String::with_capacity(column.len());
    let mut prev_lower = false;

    for c in column.chars() {
        if c.is_uppercase() {
            if prev_lower {
                ident.push('_');
            }
            ident.extend(c.to_lowercase());
            prev_lower = false;
        } else if c.is_alphanumeric() {
            ident.push(c);
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
        } else {
            if !ident.ends_with('_') {
                ident.push('_');
            }
            prev_lower = false;
        }
    }

    let trimmed = ident.trim_matches('_');
    let mut ident = if trimmed.is_empty() {
        "field".to_string()
    } else {
        trimmed.to_string()
    };
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }

    if NON_RAW_KEYWORDS.contains(&ident.as_str()) {
        ident.push('_');
    } else if RUST_KEYWORDS.contains(&ident.as_str()) {
        ident.insert_str(0, "r#");
    }
    ident
}

/// The identifier as it appears on the wire, without any raw prefix.
pub fn unraw(ident: &str) -> &str {
    ident.strip_prefix("r#").unwrap_or(ident)
}
