//! Column list extraction.
//!
//! Splits the body of a `CREATE TABLE (...)` or the clause of an
//! `ALTER TABLE ... ADD` into fragments, and tells column definitions apart
//! from table-level constraints.

use super::ident::normalize_identifier;

/// One comma-separated entry of a column clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment<'a> {
    Column(&'a str),
    Constraint(&'a str),
}

/// A column as declared in DDL, before type mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: String,
    pub sql_type: String,
    pub nullable: bool,
    pub primary_key: bool,
}

/// Leading words that mark a table-level constraint.
const CONSTRAINT_KEYWORDS: &[&str] = &["CONSTRAINT", "UNIQUE", "CHECK"];

/// Words that end the type part of a column definition.
const TYPE_TERMINATORS: &[&str] = &[
    "NOT",
    "NULL",
    "PRIMARY",
    "DEFAULT",
    "UNIQUE",
    "REFERENCES",
    "CHECK",
    "CONSTRAINT",
    "COLLATE",
    "GENERATED",
    "AUTO_INCREMENT",
    "AUTOINCREMENT",
];

/// Split on commas at parenthesis depth zero. Fragments are trimmed and
/// empty ones dropped.
pub fn split_top_level(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (idx, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                push_trimmed(&mut parts, &input[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    push_trimmed(&mut parts, &input[start..]);

    parts
}

fn push_trimmed<'a>(parts: &mut Vec<&'a str>, part: &'a str) {
    let part = part.trim();
    if !part.is_empty() {
        parts.push(part);
    }
}

/// Split a fragment into whitespace-separated tokens, keeping parenthesized
/// groups and double-quoted identifiers whole.
pub fn tokenize(fragment: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut start: Option<usize> = None;

    for (idx, c) in fragment.char_indices() {
        if c.is_whitespace() && depth == 0 && !in_quotes {
            if let Some(s) = start.take() {
                tokens.push(&fragment[s..idx]);
            }
            continue;
        }
        if start.is_none() {
            start = Some(idx);
        }
        match c {
            '"' => in_quotes = !in_quotes,
            '(' if !in_quotes => depth += 1,
            ')' if !in_quotes => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    if let Some(s) = start {
        tokens.push(&fragment[s..]);
    }

    tokens
}

/// The word part of a token, before any glued parenthesis (`KEY(id)` -> `KEY`).
fn leading_word(token: &str) -> &str {
    token.split('(').next().unwrap_or(token)
}

fn has_keyword_pair(tokens: &[&str], first: &str, second: &str) -> bool {
    tokens
        .windows(2)
        .any(|w| w[0].eq_ignore_ascii_case(first) && leading_word(w[1]).eq_ignore_ascii_case(second))
}

/// Whether a fragment starts with a table-level constraint keyword.
pub fn is_constraint(fragment: &str) -> bool {
    let tokens = tokenize(fragment);
    let Some(first) = tokens.first() else {
        return false;
    };
    let first = leading_word(first);

    if CONSTRAINT_KEYWORDS.iter().any(|k| first.eq_ignore_ascii_case(k)) {
        return true;
    }

    (first.eq_ignore_ascii_case("PRIMARY") || first.eq_ignore_ascii_case("FOREIGN"))
        && tokens
            .get(1)
            .is_some_and(|t| leading_word(t).eq_ignore_ascii_case("KEY"))
}

/// Split a column clause and classify each fragment.
pub fn extract_fragments(clause: &str) -> Vec<Fragment<'_>> {
    split_top_level(clause)
        .into_iter()
        .map(|part| {
            if is_constraint(part) {
                Fragment::Constraint(part)
            } else {
                Fragment::Column(part)
            }
        })
        .collect()
}

/// Parse `name type [modifiers...]`. Returns `None` for constraints and for
/// fragments without a type.
pub fn parse_column_definition(fragment: &str) -> Option<ColumnDefinition> {
    if is_constraint(fragment) {
        return None;
    }

    let tokens = tokenize(fragment);
    let (name, rest) = tokens.split_first()?;

    let type_len = rest
        .iter()
        .position(|t| {
            let word = leading_word(t);
            TYPE_TERMINATORS.iter().any(|k| word.eq_ignore_ascii_case(k))
        })
        .unwrap_or(rest.len());
    if type_len == 0 {
        return None;
    }

    let sql_type = rest[..type_len].join(" ");
    let modifiers = &rest[type_len..];
    let primary_key = has_keyword_pair(modifiers, "PRIMARY", "KEY");
    let nullable = !primary_key && !has_keyword_pair(modifiers, "NOT", "NULL");

    Some(ColumnDefinition {
        name: normalize_identifier(name),
        sql_type,
        nullable,
        primary_key,
    })
}

/// Column names listed in a `PRIMARY KEY (...)` constraint fragment, or an
/// empty list when the fragment is some other constraint.
pub fn primary_key_columns(fragment: &str) -> Vec<String> {
    let tokens = tokenize(fragment);
    let Some(idx) = tokens.windows(2).position(|w| {
        w[0].eq_ignore_ascii_case("PRIMARY") && leading_word(w[1]).eq_ignore_ascii_case("KEY")
    }) else {
        return Vec::new();
    };

    let key_token = tokens[idx + 1];
    let list = match key_token.find('(') {
        Some(open) => &key_token[open..],
        None => tokens.get(idx + 2).copied().unwrap_or(""),
    };
    let inner = list
        .trim()
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or("");

    split_top_level(inner)
        .into_iter()
        .map(normalize_identifier)
        .filter(|name| !name.is_empty())
        .collect()
}
