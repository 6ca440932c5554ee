//! Statement classification.
//!
//! Matches a single statement's leading keywords against the supported DDL
//! subset: `CREATE TABLE` and `ALTER TABLE ... ADD / ALTER / DROP COLUMN`.
//! Everything else classifies as [`Statement::Unrecognized`].

use nom::{
    branch::alt,
    character::complete::{char, multispace0, multispace1},
    combinator::{not, opt, rest, value},
    sequence::{preceded, terminated, tuple},
    IResult,
};

use super::columns::{split_top_level, tokenize};
use super::ident::{keyword, qualified_identifier, take_until_balanced};

/// A classified DDL statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `CREATE TABLE name (columns)`; `columns` is the text between the
    /// outermost parentheses.
    CreateTable { table: String, columns: String },
    /// `ALTER TABLE name ADD [COLUMN] clause`.
    AlterAddColumn { table: String, clause: String },
    AlterAlterColumn {
        table: String,
        column: String,
        action: ColumnAction,
    },
    AlterDropColumn { table: String, column: String },
    Unrecognized,
}

/// The recognized `ALTER COLUMN` actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnAction {
    SetType(String),
    SetNotNull,
    DropNotNull,
}

/// Classify one statement.
///
/// `CREATE TABLE` yields exactly one variant. An `ALTER TABLE` carrying
/// several comma-separated actions yields one variant per action, in order.
pub fn classify(statement: &str) -> Vec<Statement> {
    let input = statement.trim();

    if let Ok((_, stmt)) = create_table(input) {
        return vec![stmt];
    }

    if let Ok((actions, table)) = alter_table_prefix(input) {
        let stmts: Vec<Statement> = split_top_level(actions)
            .into_iter()
            .map(|action| classify_action(&table, action))
            .collect();
        if !stmts.is_empty() {
            return stmts;
        }
    }

    vec![Statement::Unrecognized]
}

/// Names schema changes that fall outside the supported subset but would
/// alter the model shape (`DROP TABLE`, renames), so callers can flag them.
pub fn unsupported_change(statement: &str) -> Option<&'static str> {
    let input = statement.trim();

    if drop_table(input).is_ok() {
        return Some("DROP TABLE");
    }

    if let Ok((actions, _)) = alter_table_prefix(input) {
        let renames = split_top_level(actions)
            .into_iter()
            .any(|action| keyword("RENAME")(action).is_ok());
        if renames {
            return Some("RENAME");
        }
    }

    None
}

fn if_not_exists(input: &str) -> IResult<&str, ()> {
    value(
        (),
        tuple((
            keyword("IF"),
            multispace1,
            keyword("NOT"),
            multispace1,
            keyword("EXISTS"),
            multispace1,
        )),
    )(input)
}

fn if_exists(input: &str) -> IResult<&str, ()> {
    value((), tuple((keyword("IF"), multispace1, keyword("EXISTS"), multispace1)))(input)
}

fn create_table(input: &str) -> IResult<&str, Statement> {
    let (input, _) = keyword("CREATE")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, _) = opt(terminated(
        alt((keyword("TEMPORARY"), keyword("TEMP"), keyword("UNLOGGED"))),
        multispace1,
    ))(input)?;
    let (input, _) = keyword("TABLE")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, _) = opt(if_not_exists)(input)?;
    let (input, table) = qualified_identifier(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = char('(')(input)?;
    let (input, columns) = take_until_balanced('(', ')')(input)?;
    let (input, _) = char(')')(input)?;

    Ok((
        input,
        Statement::CreateTable {
            table,
            columns: columns.trim().to_string(),
        },
    ))
}

fn drop_table(input: &str) -> IResult<&str, ()> {
    value((), tuple((keyword("DROP"), multispace1, keyword("TABLE"))))(input)
}

/// `ALTER TABLE [IF EXISTS] [ONLY] name ` - returns the table name and
/// leaves the action list as remaining input.
fn alter_table_prefix(input: &str) -> IResult<&str, String> {
    let (input, _) = keyword("ALTER")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, _) = keyword("TABLE")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, _) = opt(if_exists)(input)?;
    let (input, _) = opt(terminated(keyword("ONLY"), multispace1))(input)?;
    let (input, table) = qualified_identifier(input)?;
    let (input, _) = multispace1(input)?;
    Ok((input, table))
}

fn classify_action(table: &str, action: &str) -> Statement {
    let action = action.trim();

    if let Ok((clause, _)) = add_prefix(action) {
        let clause = clause.trim();
        let clause = clause
            .strip_prefix('(')
            .and_then(|c| c.strip_suffix(')'))
            .unwrap_or(clause)
            .trim();
        if clause.is_empty() {
            return Statement::Unrecognized;
        }
        return Statement::AlterAddColumn {
            table: table.to_string(),
            clause: clause.to_string(),
        };
    }

    if let Ok((_, (column, action))) = alter_column(action) {
        return Statement::AlterAlterColumn {
            table: table.to_string(),
            column,
            action,
        };
    }

    if let Ok((_, column)) = drop_column(action) {
        return Statement::AlterDropColumn {
            table: table.to_string(),
            column,
        };
    }

    Statement::Unrecognized
}

fn add_prefix(input: &str) -> IResult<&str, ()> {
    let (input, _) = keyword("ADD")(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = opt(terminated(keyword("COLUMN"), multispace1))(input)?;
    let (input, _) = opt(if_not_exists)(input)?;
    Ok((input, ()))
}

fn alter_column(input: &str) -> IResult<&str, (String, ColumnAction)> {
    let (input, _) = keyword("ALTER")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, _) = opt(terminated(keyword("COLUMN"), multispace1))(input)?;
    let (input, column) = qualified_identifier(input)?;
    let (input, _) = multispace1(input)?;
    let (input, action) = column_action(input)?;
    Ok((input, (column, action)))
}

fn column_action(input: &str) -> IResult<&str, ColumnAction> {
    alt((
        value(
            ColumnAction::SetNotNull,
            tuple((keyword("SET"), multispace1, keyword("NOT"), multispace1, keyword("NULL"))),
        ),
        value(
            ColumnAction::DropNotNull,
            tuple((keyword("DROP"), multispace1, keyword("NOT"), multispace1, keyword("NULL"))),
        ),
        set_type,
    ))(input)
}

/// `TYPE t` or `SET DATA TYPE t`; a trailing `USING` or `COLLATE` clause is
/// not part of the type.
fn set_type(input: &str) -> IResult<&str, ColumnAction> {
    let (input, _) = opt(tuple((keyword("SET"), multispace1, keyword("DATA"), multispace1)))(input)?;
    let (input, raw) = preceded(terminated(keyword("TYPE"), multispace1), rest)(input)?;

    let sql_type = tokenize(raw)
        .into_iter()
        .take_while(|t| !t.eq_ignore_ascii_case("USING") && !t.eq_ignore_ascii_case("COLLATE"))
        .collect::<Vec<_>>()
        .join(" ");
    if sql_type.is_empty() {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Verify,
        )));
    }

    Ok((input, ColumnAction::SetType(sql_type)))
}

fn drop_column(input: &str) -> IResult<&str, String> {
    let (input, _) = keyword("DROP")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, _) = not(keyword("CONSTRAINT"))(input)?;
    let (input, _) = opt(terminated(keyword("COLUMN"), multispace1))(input)?;
    let (input, _) = opt(if_exists)(input)?;
    qualified_identifier(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(table: &str, columns: &str) -> Statement {
        Statement::CreateTable {
            table: table.into(),
            columns: columns.into(),
        }
    }

    #[test]
    fn test_create_table() {
        let stmts = classify("CREATE TABLE users (id SERIAL PRIMARY KEY, email VARCHAR(255) NOT NULL)");
        assert_eq!(
            stmts,
            vec![create("users", "id SERIAL PRIMARY KEY, email VARCHAR(255) NOT NULL")]
        );
    }

    #[test]
    fn test_create_table_variants() {
        let stmts = classify("create table if not exists public.\"Accounts\"(\n  id int\n) WITH (fillfactor=70)");
        assert_eq!(stmts, vec![create("Accounts", "id int")]);

        let stmts = classify("CREATE TEMP TABLE scratch (v TEXT)");
        assert_eq!(stmts, vec![create("scratch", "v TEXT")]);
    }

    #[test]
    fn test_create_table_as_is_unrecognized() {
        assert_eq!(
            classify("CREATE TABLE archive AS SELECT * FROM users"),
            vec![Statement::Unrecognized]
        );
    }

    #[test]
    fn test_alter_add_column() {
        assert_eq!(
            classify("ALTER TABLE users ADD COLUMN age INT"),
            vec![Statement::AlterAddColumn {
                table: "users".into(),
                clause: "age INT".into(),
            }]
        );
        assert_eq!(
            classify("alter table only users add column if not exists age int"),
            vec![Statement::AlterAddColumn {
                table: "users".into(),
                clause: "age int".into(),
            }]
        );
        assert_eq!(
            classify("ALTER TABLE users ADD (a INT, b TEXT)"),
            vec![Statement::AlterAddColumn {
                table: "users".into(),
                clause: "a INT, b TEXT".into(),
            }]
        );
    }

    #[test]
    fn test_alter_column_actions() {
        let stmts = classify(
            "ALTER TABLE users ALTER COLUMN age SET NOT NULL, ALTER bio DROP NOT NULL, \
             ALTER COLUMN price SET DATA TYPE NUMERIC(12, 2) USING price::numeric",
        );
        assert_eq!(
            stmts,
            vec![
                Statement::AlterAlterColumn {
                    table: "users".into(),
                    column: "age".into(),
                    action: ColumnAction::SetNotNull,
                },
                Statement::AlterAlterColumn {
                    table: "users".into(),
                    column: "bio".into(),
                    action: ColumnAction::DropNotNull,
                },
                Statement::AlterAlterColumn {
                    table: "users".into(),
                    column: "price".into(),
                    action: ColumnAction::SetType("NUMERIC(12, 2)".into()),
                },
            ]
        );
    }

    #[test]
    fn test_alter_column_type() {
        assert_eq!(
            classify("ALTER TABLE \"users\" ALTER COLUMN \"age\" TYPE BIGINT"),
            vec![Statement::AlterAlterColumn {
                table: "users".into(),
                column: "age".into(),
                action: ColumnAction::SetType("BIGINT".into()),
            }]
        );
    }

    #[test]
    fn test_alter_column_other_action_is_unrecognized() {
        assert_eq!(
            classify("ALTER TABLE users ALTER COLUMN age SET DEFAULT 0"),
            vec![Statement::Unrecognized]
        );
    }

    #[test]
    fn test_drop_column() {
        assert_eq!(
            classify("ALTER TABLE users DROP COLUMN IF EXISTS bio CASCADE"),
            vec![Statement::AlterDropColumn {
                table: "users".into(),
                column: "bio".into(),
            }]
        );
        assert_eq!(
            classify("ALTER TABLE users DROP CONSTRAINT users_email_key"),
            vec![Statement::Unrecognized]
        );
    }

    #[test]
    fn test_mixed_actions_keep_order() {
        let stmts = classify("ALTER TABLE t ADD COLUMN a INT, DROP COLUMN b, RENAME COLUMN c TO d");
        assert_eq!(stmts.len(), 3);
        assert!(matches!(stmts[0], Statement::AlterAddColumn { .. }));
        assert!(matches!(stmts[1], Statement::AlterDropColumn { .. }));
        assert_eq!(stmts[2], Statement::Unrecognized);
    }

    #[test]
    fn test_other_statements_unrecognized() {
        for sql in [
            "CREATE INDEX idx_users_email ON users(email)",
            "INSERT INTO users (id) VALUES (1)",
            "DROP TABLE users",
            "",
        ] {
            assert_eq!(classify(sql), vec![Statement::Unrecognized], "{sql}");
        }
    }

    #[test]
    fn test_unsupported_change() {
        assert_eq!(unsupported_change("DROP TABLE IF EXISTS users"), Some("DROP TABLE"));
        assert_eq!(unsupported_change("ALTER TABLE users RENAME TO people"), Some("RENAME"));
        assert_eq!(unsupported_change("CREATE INDEX i ON users(id)"), None);
    }
}
