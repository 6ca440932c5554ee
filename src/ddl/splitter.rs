//! Lexical statement splitting for DDL sources.
//!
//! Comments (`-- ...` and `/* ... */`) are dropped, and the remaining text is
//! cut at every `;` that sits outside a comment and outside any parentheses.
//! String literals are not tracked: a `;`, `--` or `/*` inside quotes is
//! treated like any other occurrence.

use tracing::warn;

/// Split a DDL source into trimmed, non-empty statements.
///
/// A trailing fragment without a terminating `;` is returned as the last
/// statement. Unbalanced parentheses are reported, since every statement
/// after the imbalance is merged into one.
pub fn split_statements(source: &str) -> Vec<String> {
    let (statements, open_parens) = scan(source);
    if open_parens > 0 {
        warn!(
            open_parens,
            statements = statements.len(),
            "unbalanced parentheses in DDL source; statements after the imbalance were merged"
        );
    }
    statements
}

/// Statements plus the parenthesis depth left open at end of input.
fn scan(source: &str) -> (Vec<String>, usize) {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_block_comment = false;
    let mut depth: usize = 0;

    for line in source.lines() {
        let mut chars = line.chars().peekable();

        while let Some(c) = chars.next() {
            if in_block_comment {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    in_block_comment = false;
                }
                continue;
            }

            match c {
                // Single-line comment: the rest of this line is dropped.
                '-' if chars.peek() == Some(&'-') => break,
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    in_block_comment = true;
                    current.push(' ');
                }
                '(' => {
                    depth += 1;
                    current.push(c);
                }
                ')' => {
                    depth = depth.saturating_sub(1);
                    current.push(c);
                }
                ';' if depth == 0 => flush(&mut statements, &mut current),
                _ => current.push(c),
            }
        }

        current.push('\n');
    }

    flush(&mut statements, &mut current);
    (statements, depth)
}

fn flush(statements: &mut Vec<String>, current: &mut String) {
    let statement = current.trim();
    if !statement.is_empty() {
        statements.push(statement.to_string());
    }
    current.clear();
}
